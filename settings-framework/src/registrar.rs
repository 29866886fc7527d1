//! Registers a settings document with the host.

use tracing::debug;

use crate::host::{
    FieldContext, FieldRegistration, Sanitizer, SectionRegistration, SettingsRegistry,
};
use crate::store::settings_option_name;
use crate::types::{SectionDef, SettingsDocument};

/// Stable sort by `order`, ascending. Equal orders keep their relative
/// position.
pub fn sort_sections(sections: &mut [SectionDef]) {
    sections.sort_by(|a, b| a.order.total_cmp(&b.order));
}

/// Register the storage slot with its sanitizer, then every identifiable
/// section and field in display order.
///
/// Sections without an id or title are skipped along with all their fields;
/// fields without an id or title are skipped individually. Returns the
/// sections that were registered, in order.
pub fn register(
    document: &SettingsDocument,
    option_group: &str,
    registry: &mut dyn SettingsRegistry,
    sanitizer: Sanitizer,
) -> Vec<SectionDef> {
    registry.register_setting(option_group, &settings_option_name(option_group), sanitizer);

    let mut sections = document.sections.clone();
    sort_sections(&mut sections);

    let mut registered = Vec::new();
    let mut field_count = 0usize;
    for section in sections {
        if !section.is_registrable() {
            continue;
        }
        let section_id = section.id().to_string();
        registry.add_section(SectionRegistration {
            section_id: section_id.clone(),
            title: section.title.clone().unwrap_or_default(),
            option_group: option_group.to_string(),
        });

        for field in section.fields.iter().filter(|f| f.is_registrable()) {
            registry.add_field(FieldRegistration {
                field_id: field.id.clone().unwrap_or_default(),
                title: field.title.clone().unwrap_or_default(),
                option_group: option_group.to_string(),
                section_id: section_id.clone(),
                context: FieldContext {
                    section: section.clone(),
                    field: field.clone(),
                },
            });
            field_count += 1;
        }
        registered.push(section);
    }

    debug!(
        option_group,
        sections = registered.len(),
        fields = field_count,
        "settings registered"
    );
    registered
}

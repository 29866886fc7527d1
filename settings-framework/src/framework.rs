//! SettingsFramework — main API surface.
//!
//! Owns the loaded document, the option group and the injected
//! collaborators, and answers the host's render-time callbacks.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::Value;
use tracing::debug;

use crate::config::FrameworkConfig;
use crate::error::{Result, SettingsError};
use crate::hooks::{
    validate_hook, HookBus, AFTER_SETTINGS, AFTER_TAB_LINKS, BEFORE_SETTINGS,
    BEFORE_SETTINGS_FIELDS, BEFORE_TAB_LINKS,
};
use crate::host::{
    AssetQueue, FieldContext, OptionStore, Sanitizer, SettingsCallbacks, SettingsRegistry,
};
use crate::loader;
use crate::memory::MemoryOptionStore;
use crate::registrar;
use crate::render::FieldRenderer;
use crate::source::DocumentSource;
use crate::store;
use crate::types::{SectionDef, SettingsDocument, StoredValueMap};
use crate::widgets::{DefaultWidgets, Widgets};

/// Builder for [`SettingsFramework`]. Created by [`SettingsFramework::open`].
pub struct SettingsFrameworkBuilder {
    source: Option<DocumentSource>,
    option_group: Option<String>,
    config: Option<FrameworkConfig>,
    config_file: Option<PathBuf>,
    hooks: HookBus,
    store: Option<Arc<dyn OptionStore>>,
    widgets: Option<Arc<dyn Widgets>>,
}

impl SettingsFrameworkBuilder {
    /// Override the option group. Takes precedence over the configuration
    /// and the source file name.
    pub fn option_group(mut self, option_group: impl Into<String>) -> Self {
        self.option_group = Some(option_group.into());
        self
    }

    /// Use an explicit configuration instead of loading one.
    pub fn config(mut self, config: FrameworkConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from `path` layered over defaults and environment.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Extension points consulted while loading and rendering.
    pub fn hooks(mut self, hooks: HookBus) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn store(mut self, store: Arc<dyn OptionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn widgets(mut self, widgets: Arc<dyn Widgets>) -> Self {
        self.widgets = Some(widgets);
        self
    }

    /// Load the document and resolve the option group.
    pub fn build(self) -> Result<SettingsFramework> {
        let config = match (self.config, self.config_file) {
            (Some(config), _) => config,
            (None, path) => FrameworkConfig::load(path.as_deref())?,
        };

        let option_group = self
            .option_group
            .or_else(|| config.option_group.clone())
            .or_else(|| {
                self.source
                    .as_ref()
                    .and_then(DocumentSource::path)
                    .map(store::option_group_from_source)
            })
            .filter(|group| !group.is_empty())
            .ok_or_else(|| {
                SettingsError::schema("no option group given and none derivable from the source")
            })?;

        let document = match &self.source {
            Some(source) => loader::load(source, &self.hooks)?,
            None => loader::load_value(loader::empty_source(), &self.hooks)?,
        };

        debug!(
            option_group = %option_group,
            sections = document.sections.len(),
            "settings framework opened"
        );

        Ok(SettingsFramework {
            option_group,
            document,
            config,
            hooks: Arc::new(self.hooks),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryOptionStore::new())),
            widgets: self.widgets.unwrap_or_else(|| Arc::new(DefaultWidgets)),
        })
    }
}

/// A settings form bound to one option group.
pub struct SettingsFramework {
    option_group: String,
    document: SettingsDocument,
    config: FrameworkConfig,
    hooks: Arc<HookBus>,
    store: Arc<dyn OptionStore>,
    widgets: Arc<dyn Widgets>,
}

impl SettingsFramework {
    /// Start building a framework over `source`.
    ///
    /// ```rust,ignore
    /// let framework = SettingsFramework::open(DocumentSource::file("my-settings.yaml"))
    ///     .store(store)
    ///     .build()?;
    /// framework.admin_init(&mut page);
    /// let html = framework.settings(&page);
    /// ```
    pub fn open(source: impl Into<DocumentSource>) -> SettingsFrameworkBuilder {
        SettingsFrameworkBuilder {
            source: Some(source.into()),
            ..Self::builder()
        }
    }

    /// Start building a framework whose document comes entirely from
    /// document filters.
    pub fn builder() -> SettingsFrameworkBuilder {
        SettingsFrameworkBuilder {
            source: None,
            option_group: None,
            config: None,
            config_file: None,
            hooks: HookBus::new(),
            store: None,
            widgets: None,
        }
    }

    pub fn option_group(&self) -> &str {
        &self.option_group
    }

    pub fn document(&self) -> &SettingsDocument {
        &self.document
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    // --- Host lifecycle ---

    /// Register the storage slot, sections and fields with the host. The
    /// slot carries [`SettingsFramework::sanitizer`].
    pub fn admin_init(&self, registry: &mut dyn SettingsRegistry) -> Vec<SectionDef> {
        registrar::register(&self.document, &self.option_group, registry, self.sanitizer())
    }

    /// Host notice area contents.
    pub fn admin_notices(&self, registry: &dyn SettingsRegistry) -> String {
        registry.settings_errors()
    }

    /// Ask the host to load the assets the widgets need.
    pub fn enqueue_assets(&self, queue: &mut dyn AssetQueue) {
        for handle in self.widgets.styles() {
            queue.enqueue_style(handle);
        }
        for handle in self.widgets.scripts() {
            queue.enqueue_script(handle);
        }
    }

    // --- Rendering ---

    /// The complete settings form, wrapped in its before/after actions.
    pub fn settings(&self, registry: &dyn SettingsRegistry) -> String {
        let mut out = String::new();
        self.hooks.do_action(BEFORE_SETTINGS, &mut out);
        out.push_str(&self.tab_links());
        out.push_str(&format!(
            "<form action=\"{}\" method=\"post\">",
            encode_double_quoted_attribute(&self.config.form_action)
        ));
        self.hooks.do_action(BEFORE_SETTINGS_FIELDS, &mut out);
        out.push_str(&registry.settings_fields(&self.option_group));
        out.push_str(&registry.do_settings_sections(&self.option_group, self));
        out.push_str(&format!(
            "<p class=\"submit\"><input type=\"submit\" class=\"button-primary\" value=\"{}\" /></p>",
            encode_double_quoted_attribute(&self.config.submit_label)
        ));
        out.push_str("</form>");
        self.hooks.do_action(AFTER_SETTINGS, &mut out);
        out
    }

    /// Navigation links for the document's tabs; empty without tabs.
    pub fn tab_links(&self) -> String {
        if self.document.tabs.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        self.hooks.do_action(BEFORE_TAB_LINKS, &mut out);
        out.push_str("<h2 class=\"nav-tab-wrapper\">");
        for (i, tab) in self.document.tabs.iter().enumerate() {
            let class = if i == 0 {
                "nav-tab triggerTab nav-tab-active"
            } else {
                "nav-tab triggerTab"
            };
            out.push_str(&format!(
                "<a class=\"{class}\" href=\"#tab-{}\">{}</a>",
                encode_double_quoted_attribute(&tab.id),
                encode_text(&tab.title)
            ));
        }
        out.push_str("</h2>");
        self.hooks.do_action(AFTER_TAB_LINKS, &mut out);
        out
    }

    /// Render one field against the currently stored values.
    pub fn render_field(&self, context: &FieldContext) -> String {
        let stored = self.get_settings();
        self.renderer()
            .render(&context.section, &context.field, &stored)
    }

    fn renderer(&self) -> FieldRenderer<'_> {
        FieldRenderer::new(&self.option_group, &self.hooks, self.widgets.as_ref())
    }

    // --- Submission ---

    /// Run submitted values through the group's validation filters.
    pub fn validate(&self, input: StoredValueMap) -> StoredValueMap {
        self.hooks
            .apply_values(&validate_hook(&self.option_group), input)
    }

    /// The group's validation filters as a standalone sanitizer for the host.
    pub fn sanitizer(&self) -> Sanitizer {
        let hooks = Arc::clone(&self.hooks);
        let hook = validate_hook(&self.option_group);
        Arc::new(move |input: StoredValueMap| hooks.apply_values(&hook, input))
    }

    /// Validate and persist submitted values, returning what was stored.
    pub fn save(&self, input: StoredValueMap) -> StoredValueMap {
        let values = self.validate(input);
        self.store.update_option(
            &store::settings_option_name(&self.option_group),
            values.clone(),
        );
        debug!(option_group = %self.option_group, keys = values.len(), "settings saved");
        values
    }

    // --- Stored values ---

    pub fn get_settings(&self) -> StoredValueMap {
        store::get_settings(self.store.as_ref(), &self.option_group)
    }

    pub fn get_setting(&self, section_id: &str, field_id: &str) -> Option<Value> {
        store::get_setting(self.store.as_ref(), &self.option_group, section_id, field_id)
    }

    pub fn delete_settings(&self) -> bool {
        store::delete_settings(self.store.as_ref(), &self.option_group)
    }
}

impl SettingsCallbacks for SettingsFramework {
    fn section_intro(&self, section_id: &str) -> String {
        match self
            .document
            .section(section_id)
            .and_then(|s| s.description.as_deref())
        {
            Some(description) if !description.is_empty() => format!("<p>{description}</p>"),
            _ => String::new(),
        }
    }

    fn render_field(&self, context: &FieldContext) -> String {
        SettingsFramework::render_field(self, context)
    }
}

impl fmt::Debug for SettingsFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsFramework")
            .field("option_group", &self.option_group)
            .field("sections", &self.document.sections.len())
            .field("tabs", &self.document.tabs.len())
            .field("config", &self.config)
            .field("hooks", &*self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::BEFORE_FIELD;
    use crate::memory::{RecordedAssets, SettingsPage};
    use crate::types::FieldDef;
    use serde_json::json;

    fn demo_source() -> DocumentSource {
        DocumentSource::Value(json!({
            "sections": [
                {
                    "section_id": "general",
                    "title": "General",
                    "description": "Basic <em>things</em>",
                    "order": 2,
                    "fields": [
                        {"id": "name", "title": "Name", "type": "text", "default": "Bob"}
                    ]
                },
                {
                    "section_id": "info",
                    "title": "Info",
                    "order": 1,
                    "fields": [
                        {"id": "count", "title": "Count", "default": "1"}
                    ]
                }
            ],
            "tabs": [
                {"id": "general", "title": "General"},
                {"id": "info", "title": "Info"}
            ]
        }))
    }

    fn framework() -> SettingsFramework {
        SettingsFramework::open(demo_source())
            .option_group("demo")
            .config(FrameworkConfig::default())
            .build()
            .unwrap()
    }

    #[test]
    fn inline_source_without_group_fails() {
        let result = SettingsFramework::open(demo_source())
            .config(FrameworkConfig::default())
            .build();
        assert!(matches!(result, Err(SettingsError::Schema { .. })));
    }

    #[test]
    fn config_group_used_when_no_override() {
        let config = FrameworkConfig {
            option_group: Some("fromconfig".into()),
            ..FrameworkConfig::default()
        };
        let framework = SettingsFramework::open(demo_source())
            .config(config)
            .build()
            .unwrap();
        assert_eq!(framework.option_group(), "fromconfig");
    }

    #[test]
    fn section_intro_emits_description() {
        let framework = framework();
        assert_eq!(
            framework.section_intro("general"),
            "<p>Basic <em>things</em></p>"
        );
        assert_eq!(framework.section_intro("info"), "");
        assert_eq!(framework.section_intro("missing"), "");
    }

    #[test]
    fn tab_links_mark_first_active() {
        let framework = framework();
        let html = framework.tab_links();
        assert!(html.starts_with("<h2 class=\"nav-tab-wrapper\">"));
        assert!(html.contains(
            "<a class=\"nav-tab triggerTab nav-tab-active\" href=\"#tab-general\">General</a>"
        ));
        assert!(html.contains("<a class=\"nav-tab triggerTab\" href=\"#tab-info\">Info</a>"));
    }

    #[test]
    fn no_tabs_no_links() {
        let framework = SettingsFramework::open(DocumentSource::Value(json!([])))
            .option_group("demo")
            .config(FrameworkConfig::default())
            .build()
            .unwrap();
        assert_eq!(framework.tab_links(), "");
    }

    #[test]
    fn settings_form_renders_sorted_sections() {
        let framework = framework();
        let mut page = SettingsPage::new();
        framework.admin_init(&mut page);

        let html = framework.settings(&page);
        let info = html.find("<h3>Info</h3>").unwrap();
        let general = html.find("<h3>General</h3>").unwrap();
        assert!(info < general);
        assert!(html.contains("<form action=\"options.php\" method=\"post\">"));
        assert!(html.contains("value=\"Save Changes\""));
        assert!(html.contains("name=\"demo_settings[demo_general_name]\""));
        assert!(html.ends_with("</form>"));
    }

    #[test]
    fn save_runs_validation_filters() {
        let mut hooks = HookBus::new();
        hooks.add_values_filter(validate_hook("demo"), |mut values| {
            if let Some(Value::String(name)) = values.get_mut("demo_general_name") {
                *name = name.trim().to_string();
            }
            values
        });
        let framework = SettingsFramework::open(demo_source())
            .option_group("demo")
            .config(FrameworkConfig::default())
            .hooks(hooks)
            .build()
            .unwrap();

        let mut input = StoredValueMap::new();
        input.insert("demo_general_name".into(), json!("  Alice  "));
        framework.save(input);

        assert_eq!(
            framework.get_setting("general", "name"),
            Some(json!("Alice"))
        );
        assert!(framework.delete_settings());
        assert_eq!(framework.get_setting("general", "name"), None);
    }

    #[test]
    fn page_submission_uses_framework_sanitizer() {
        let mut hooks = HookBus::new();
        hooks.add_values_filter(validate_hook("demo"), |mut values| {
            values.insert("demo_info_count".into(), json!("0"));
            values
        });
        let store = Arc::new(MemoryOptionStore::new());
        let framework = SettingsFramework::open(demo_source())
            .option_group("demo")
            .config(FrameworkConfig::default())
            .hooks(hooks)
            .store(store.clone())
            .build()
            .unwrap();

        let mut page = SettingsPage::new();
        framework.admin_init(&mut page);
        page.submit(store.as_ref(), "demo", StoredValueMap::new());

        assert_eq!(framework.get_setting("info", "count"), Some(json!("0")));
        assert!(framework.admin_notices(&page).contains("Settings saved."));
    }

    #[test]
    fn settings_actions_wrap_form() {
        let mut hooks = HookBus::new();
        hooks
            .add_action(BEFORE_SETTINGS, |out| out.push_str("<div class=\"wrap\">"))
            .add_action(BEFORE_SETTINGS_FIELDS, |out| out.push_str("<!-- fields -->"))
            .add_action(AFTER_SETTINGS, |out| out.push_str("</div>"))
            .add_action(BEFORE_TAB_LINKS, |out| out.push_str("<nav>"))
            .add_action(AFTER_TAB_LINKS, |out| out.push_str("</nav>"))
            .add_action(BEFORE_FIELD, |out| out.push_str("<span>"));
        let framework = SettingsFramework::open(demo_source())
            .option_group("demo")
            .config(FrameworkConfig::default())
            .hooks(hooks)
            .build()
            .unwrap();

        let mut page = SettingsPage::new();
        framework.admin_init(&mut page);
        let html = framework.settings(&page);

        assert!(html.starts_with("<div class=\"wrap\"><nav><h2"));
        assert!(html.contains("</h2></nav><form"));
        assert!(html.contains("method=\"post\"><!-- fields --><input type=\"hidden\""));
        assert_eq!(html.matches("<span>").count(), 2);
        assert!(html.ends_with("</form></div>"));
    }

    #[test]
    fn render_field_reads_current_store() {
        let framework = framework();
        let context = FieldContext {
            section: SectionDef::new("info", "Info"),
            field: FieldDef::new("count", "Count").with_default("1"),
        };
        assert!(framework.render_field(&context).contains("value=\"1\""));

        let mut values = StoredValueMap::new();
        values.insert("demo_info_count".into(), json!("42"));
        framework.save(values);
        assert!(framework.render_field(&context).contains("value=\"42\""));
    }

    #[test]
    fn enqueue_assets_requests_widget_handles() {
        let framework = framework();
        let mut assets = RecordedAssets::default();
        framework.enqueue_assets(&mut assets);
        assert!(assets.styles.contains(&"color-picker".to_string()));
        assert!(assets.scripts.contains(&"media-browser".to_string()));
    }
}

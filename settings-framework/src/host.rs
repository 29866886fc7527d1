//! Contracts for the host admin framework.
//!
//! The settings framework never reaches for ambient host state. Storage,
//! section/field registration and asset loading are injected through these
//! traits; [`crate::memory`] has in-process implementations.

use std::sync::Arc;

use crate::types::{FieldDef, SectionDef, StoredValueMap};

/// Cleans submitted values before they are stored in a slot.
pub type Sanitizer = Arc<dyn Fn(StoredValueMap) -> StoredValueMap + Send + Sync>;

/// Persistent option storage, one [`StoredValueMap`] per option name.
///
/// Implementations own their concurrency control, so every method takes
/// `&self`.
pub trait OptionStore: Send + Sync {
    /// Fetch an option, `None` if it was never stored.
    fn get_option(&self, name: &str) -> Option<StoredValueMap>;

    /// Create or replace an option.
    fn update_option(&self, name: &str, value: StoredValueMap);

    /// Remove an option. Returns whether anything was removed.
    fn delete_option(&self, name: &str) -> bool;
}

/// A section as handed to the host for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRegistration {
    pub section_id: String,
    pub title: String,
    pub option_group: String,
}

/// The (section, field) pair passed back to the renderer at display time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldContext {
    pub section: SectionDef,
    pub field: FieldDef,
}

/// A field as handed to the host for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRegistration {
    pub field_id: String,
    pub title: String,
    pub option_group: String,
    pub section_id: String,
    pub context: FieldContext,
}

/// Render-time callbacks the host invokes for registered sections and fields.
pub trait SettingsCallbacks {
    /// Markup shown under a section heading.
    fn section_intro(&self, section_id: &str) -> String;

    /// Markup for one registered field.
    fn render_field(&self, context: &FieldContext) -> String;
}

/// The host's section/field registration and page-rendering API.
pub trait SettingsRegistry {
    /// Register the storage slot `option_name` for `option_group`.
    ///
    /// The host keeps `sanitizer` with the slot and runs submitted values
    /// through it before storing them.
    fn register_setting(&mut self, option_group: &str, option_name: &str, sanitizer: Sanitizer);

    fn add_section(&mut self, section: SectionRegistration);

    fn add_field(&mut self, field: FieldRegistration);

    /// Hidden inputs identifying the option group and verifying the request.
    fn settings_fields(&self, option_group: &str) -> String;

    /// Render every section registered for `option_group`, calling back into
    /// `callbacks` for intros and fields.
    fn do_settings_sections(&self, option_group: &str, callbacks: &dyn SettingsCallbacks)
        -> String;

    /// Pending error/update notices. Hosts without a notice area return
    /// nothing.
    fn settings_errors(&self) -> String {
        String::new()
    }
}

/// The host's script/style loader.
pub trait AssetQueue {
    fn enqueue_style(&mut self, handle: &str);
    fn enqueue_script(&mut self, handle: &str);
}

//! In-process implementations of the host contracts.
//!
//! These back the test suite and let the framework be embedded by services
//! that have no admin host of their own.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::{debug, warn};

use crate::host::{
    AssetQueue, FieldRegistration, OptionStore, Sanitizer, SectionRegistration,
    SettingsCallbacks, SettingsRegistry,
};
use crate::types::StoredValueMap;

/// Option store held in memory.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    options: RwLock<HashMap<String, StoredValueMap>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored options.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, StoredValueMap>> {
        self.options.read().unwrap_or_else(|poisoned| {
            warn!("option store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, StoredValueMap>> {
        self.options.write().unwrap_or_else(|poisoned| {
            warn!("option store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl OptionStore for MemoryOptionStore {
    fn get_option(&self, name: &str) -> Option<StoredValueMap> {
        self.read().get(name).cloned()
    }

    fn update_option(&self, name: &str, value: StoredValueMap) {
        self.write().insert(name.to_string(), value);
    }

    fn delete_option(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }
}

/// Severity of an admin notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Updated,
}

impl NoticeKind {
    fn css_class(self) -> &'static str {
        match self {
            NoticeKind::Error => "error",
            NoticeKind::Updated => "updated",
        }
    }
}

/// One queued admin notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: String,
    pub message: String,
    pub kind: NoticeKind,
}

/// A registered storage slot and the sanitizer bound to it.
#[derive(Clone)]
pub struct SettingSlot {
    pub option_group: String,
    pub option_name: String,
    sanitizer: Sanitizer,
}

impl SettingSlot {
    /// Run submitted values through the slot's sanitizer.
    pub fn sanitize(&self, input: StoredValueMap) -> StoredValueMap {
        (self.sanitizer)(input)
    }
}

impl fmt::Debug for SettingSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingSlot")
            .field("option_group", &self.option_group)
            .field("option_name", &self.option_name)
            .finish_non_exhaustive()
    }
}

/// A settings page that records registrations and renders them as a form
/// table.
#[derive(Debug, Default)]
pub struct SettingsPage {
    settings: Vec<SettingSlot>,
    sections: Vec<SectionRegistration>,
    fields: Vec<FieldRegistration>,
    notices: Vec<Notice>,
    nonce: String,
}

impl SettingsPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `nonce` as the request verification token in
    /// [`SettingsRegistry::settings_fields`].
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// Registered storage slots.
    pub fn settings(&self) -> &[SettingSlot] {
        &self.settings
    }

    pub fn sections(&self) -> &[SectionRegistration] {
        &self.sections
    }

    pub fn fields(&self) -> &[FieldRegistration] {
        &self.fields
    }

    /// Fields registered under one section, in registration order.
    pub fn fields_for_section<'a>(
        &'a self,
        option_group: &'a str,
        section_id: &'a str,
    ) -> impl Iterator<Item = &'a FieldRegistration> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.option_group == option_group && f.section_id == section_id)
    }

    pub fn add_settings_error(
        &mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        kind: NoticeKind,
    ) {
        self.notices.push(Notice {
            code: code.into(),
            message: message.into(),
            kind,
        });
    }

    /// Handle a form submission: run the input through each slot registered
    /// for the group and persist what its sanitizer returns.
    ///
    /// Returns the values stored in the first slot, or `None` when the group
    /// has no slot.
    pub fn submit(
        &mut self,
        store: &dyn OptionStore,
        option_group: &str,
        input: StoredValueMap,
    ) -> Option<StoredValueMap> {
        let mut saved = None;
        for slot in self.settings.iter().filter(|s| s.option_group == option_group) {
            let sanitized = slot.sanitize(input.clone());
            store.update_option(&slot.option_name, sanitized.clone());
            saved.get_or_insert(sanitized);
        }
        let saved = saved?;

        debug!(option_group, keys = saved.len(), "settings submitted");
        self.add_settings_error("settings_updated", "Settings saved.", NoticeKind::Updated);
        Some(saved)
    }
}

impl SettingsRegistry for SettingsPage {
    fn register_setting(&mut self, option_group: &str, option_name: &str, sanitizer: Sanitizer) {
        self.settings.push(SettingSlot {
            option_group: option_group.to_string(),
            option_name: option_name.to_string(),
            sanitizer,
        });
    }

    fn add_section(&mut self, section: SectionRegistration) {
        self.sections.push(section);
    }

    fn add_field(&mut self, field: FieldRegistration) {
        self.fields.push(field);
    }

    fn settings_fields(&self, option_group: &str) -> String {
        format!(
            "<input type=\"hidden\" name=\"option_page\" value=\"{group}\" />\
             <input type=\"hidden\" name=\"action\" value=\"update\" />\
             <input type=\"hidden\" id=\"_nonce\" name=\"_nonce\" value=\"{nonce}\" />",
            group = encode_double_quoted_attribute(option_group),
            nonce = encode_double_quoted_attribute(&self.nonce),
        )
    }

    fn do_settings_sections(
        &self,
        option_group: &str,
        callbacks: &dyn SettingsCallbacks,
    ) -> String {
        let mut out = String::new();
        for section in self.sections.iter().filter(|s| s.option_group == option_group) {
            out.push_str(&format!("<h3>{}</h3>", encode_text(&section.title)));
            out.push_str(&callbacks.section_intro(&section.section_id));

            let mut fields = self
                .fields_for_section(option_group, &section.section_id)
                .peekable();
            if fields.peek().is_none() {
                continue;
            }
            out.push_str("<table class=\"form-table\">");
            for field in fields {
                out.push_str(&format!(
                    "<tr><th scope=\"row\">{}</th><td>{}</td></tr>",
                    encode_text(&field.title),
                    callbacks.render_field(&field.context)
                ));
            }
            out.push_str("</table>");
        }
        out
    }

    fn settings_errors(&self) -> String {
        self.notices
            .iter()
            .map(|notice| {
                format!(
                    "<div id=\"setting-error-{code}\" class=\"{class} settings-error\"><p><strong>{message}</strong></p></div>",
                    code = encode_double_quoted_attribute(&notice.code),
                    class = notice.kind.css_class(),
                    message = encode_text(&notice.message),
                )
            })
            .collect()
    }
}

/// Asset queue that records requested handles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordedAssets {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
}

impl AssetQueue for RecordedAssets {
    fn enqueue_style(&mut self, handle: &str) {
        if !self.styles.iter().any(|h| h == handle) {
            self.styles.push(handle.to_string());
        }
    }

    fn enqueue_script(&mut self, handle: &str) {
        if !self.scripts.iter().any(|h| h == handle) {
            self.scripts.push(handle.to_string());
        }
    }
}

//! Key derivation and stored-value access for an option group.

use std::path::Path;

use serde_json::Value;

use crate::host::OptionStore;
use crate::types::StoredValueMap;

/// Derive an option group from a settings source file name.
///
/// The base name is taken without its extension and every character outside
/// `[A-Za-z0-9]` is dropped, so `my-settings.yaml` becomes `mysettings`.
pub fn option_group_from_source(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// The option name the whole group is persisted under.
pub fn settings_option_name(option_group: &str) -> String {
    format!("{option_group}_settings")
}

/// Storage key (and HTML id) of one field.
pub fn element_id(option_group: &str, section_id: &str, field_id: &str) -> String {
    format!("{option_group}_{section_id}_{field_id}")
}

/// Storage key of one choice of a `checkboxes` field.
pub fn choice_key(element_id: &str, choice: &str) -> String {
    format!("{element_id}_{choice}")
}

/// Form input name carrying `key` inside the group's option array.
pub fn input_name(option_group: &str, key: &str) -> String {
    format!("{}[{key}]", settings_option_name(option_group))
}

/// All stored values for a group; empty if nothing was saved.
pub fn get_settings(store: &dyn OptionStore, option_group: &str) -> StoredValueMap {
    store
        .get_option(&settings_option_name(option_group))
        .unwrap_or_default()
}

/// One stored value, `None` if it was never saved.
pub fn get_setting(
    store: &dyn OptionStore,
    option_group: &str,
    section_id: &str,
    field_id: &str,
) -> Option<Value> {
    let key = element_id(option_group, section_id, field_id);
    store
        .get_option(&settings_option_name(option_group))
        .and_then(|mut values| values.shift_remove(&key))
}

/// Remove every stored value of a group.
pub fn delete_settings(store: &dyn OptionStore, option_group: &str) -> bool {
    store.delete_option(&settings_option_name(option_group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryOptionStore;
    use serde_json::json;

    #[test]
    fn option_group_strips_path_extension_and_symbols() {
        assert_eq!(option_group_from_source("settings/my-settings.yaml"), "mysettings");
        assert_eq!(option_group_from_source("Plugin_Options_2.json"), "PluginOptions2");
        assert_eq!(option_group_from_source("plain"), "plain");
        assert_eq!(option_group_from_source(""), "");
    }

    #[test]
    fn keys_are_deterministic() {
        assert_eq!(element_id("group", "section", "field"), "group_section_field");
        assert_eq!(
            element_id("group", "section", "field"),
            element_id("group", "section", "field")
        );
        assert_eq!(choice_key("demo_a_b", "red"), "demo_a_b_red");
        assert_eq!(settings_option_name("demo"), "demo_settings");
        assert_eq!(input_name("demo", "demo_a_b"), "demo_settings[demo_a_b]");
    }

    #[test]
    fn get_settings_empty_when_absent() {
        let store = MemoryOptionStore::new();
        assert!(get_settings(&store, "demo").is_empty());
        assert_eq!(get_setting(&store, "demo", "info", "count"), None);
    }

    #[test]
    fn get_setting_reads_single_entry() {
        let store = MemoryOptionStore::new();
        let mut values = StoredValueMap::new();
        values.insert("demo_info_count".into(), json!("42"));
        store.update_option("demo_settings", values);

        assert_eq!(get_settings(&store, "demo").len(), 1);
        assert_eq!(get_setting(&store, "demo", "info", "count"), Some(json!("42")));
        assert_eq!(get_setting(&store, "demo", "info", "other"), None);
    }

    #[test]
    fn delete_settings_removes_group() {
        let store = MemoryOptionStore::new();
        store.update_option("demo_settings", StoredValueMap::new());
        store.update_option("other_settings", StoredValueMap::new());

        assert!(delete_settings(&store, "demo"));
        assert!(!delete_settings(&store, "demo"));
        assert!(store.get_option("demo_settings").is_none());
        assert!(store.get_option("other_settings").is_some());
    }
}

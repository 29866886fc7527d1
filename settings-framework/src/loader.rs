//! Builds a [`SettingsDocument`] from a raw source plus hook contributions.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SettingsError};
use crate::hooks::HookBus;
use crate::source::DocumentSource;
use crate::types::{from_entries, SectionDef, SettingsDocument, Tab};

/// Read `source`, let document filters adjust it, then normalize.
pub fn load(source: &DocumentSource, hooks: &HookBus) -> Result<SettingsDocument> {
    let raw = source.read()?;
    load_value(raw, hooks)
}

/// Apply document filters to an already-read value, then normalize.
pub fn load_value(raw: Value, hooks: &HookBus) -> Result<SettingsDocument> {
    let raw = hooks.apply_document(raw);
    let document = normalize(raw)?;
    debug!(
        sections = document.sections.len(),
        tabs = document.tabs.len(),
        "settings document loaded"
    );
    Ok(document)
}

/// Accept either `{sections, tabs}` or a bare list of sections.
///
/// Only a `sections` value that is not a list fails. Entries that are not
/// section objects, or whose attributes cannot be read, are dropped.
pub fn normalize(raw: Value) -> Result<SettingsDocument> {
    let (sections, tabs) = match raw {
        Value::Object(mut map)
            if map.contains_key("sections") || map.contains_key("tabs") =>
        {
            let sections = map
                .remove("sections")
                .unwrap_or_else(|| Value::Array(Vec::new()));
            let tabs = map.remove("tabs").unwrap_or(Value::Null);
            (sections, tabs)
        }
        // An object without "sections" is a legacy keyed list of sections.
        Value::Object(map) => (
            Value::Array(map.into_iter().map(|(_, v)| v).collect()),
            Value::Null,
        ),
        Value::Array(items) => (Value::Array(items), Value::Null),
        other => {
            return Err(SettingsError::schema(format!(
                "expected a list of sections or a {{sections, tabs}} object, found {}",
                kind_of(&other)
            )))
        }
    };

    let Value::Array(sections) = sections else {
        return Err(SettingsError::schema(format!(
            "sections must be a list, found {}",
            kind_of(&sections)
        )));
    };

    let sections: Vec<SectionDef> = from_entries(sections);
    let tabs: Vec<Tab> = match tabs {
        Value::Array(tabs) => from_entries(tabs),
        _ => Vec::new(),
    };

    Ok(SettingsDocument { sections, tabs })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// The empty wrapper handed to document filters when there is no file source.
pub fn empty_source() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "sections": [
                {
                    "section_id": "general",
                    "title": "General",
                    "order": 1,
                    "fields": [
                        {"id": "name", "title": "Name", "type": "text", "default": "Bob"}
                    ]
                }
            ],
            "tabs": [{"id": "general", "title": "General"}]
        })
    }

    #[test]
    fn wrapped_shape_keeps_tabs() {
        let doc = normalize(sample()).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.tabs.len(), 1);
        assert_eq!(doc.sections[0].fields[0].id.as_deref(), Some("name"));
    }

    #[test]
    fn bare_list_shape_has_no_tabs() {
        let doc = normalize(json!([
            {"section_id": "a", "title": "A"},
            {"section_id": "b", "title": "B"}
        ]))
        .unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.tabs.is_empty());
    }

    #[test]
    fn empty_wrapper_is_an_empty_document() {
        let doc = normalize(empty_source()).unwrap();
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn non_list_sections_fail() {
        let err = normalize(json!({"sections": "nope"})).unwrap_err();
        assert!(matches!(err, SettingsError::Schema { .. }));
        assert!(err.to_string().contains("sections must be a list"));

        assert!(normalize(json!("just text")).is_err());
        assert!(normalize(Value::Null).is_err());
    }

    #[test]
    fn loosely_typed_entries_are_read() {
        let doc = normalize(json!([{
            "section_id": "a",
            "title": "A",
            "section_order": "2",
            "fields": [{"id": 5, "title": "Five"}, {"id": "ok", "title": "Ok"}]
        }]))
        .unwrap();
        let section = &doc.sections[0];
        assert_eq!(section.order, 2.0);
        let ids: Vec<_> = section.fields.iter().filter_map(|f| f.id.as_deref()).collect();
        assert_eq!(ids, vec!["5", "ok"]);
    }

    #[test]
    fn bad_entries_are_skipped() {
        let doc = normalize(json!([
            "junk",
            42,
            ["not", "a", "section"],
            {"section_id": "a", "title": "A", "fields": null},
            {"section_id": "b", "title": "B", "fields": "none"}
        ]))
        .unwrap();
        let ids: Vec<_> = doc.sections.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(doc.sections.iter().all(|s| s.fields.is_empty()));
    }

    #[test]
    fn tabs_without_sections_is_an_empty_document() {
        let doc = normalize(json!({
            "tabs": [{"id": "general", "title": "General"}, "junk", {"id": "x"}]
        }))
        .unwrap();
        assert!(doc.sections.is_empty());
        assert_eq!(doc.tabs.len(), 1);
        assert_eq!(doc.tabs[0].id, "general");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [sample(), json!([{"section_id": "a", "title": "A", "order": 2}])] {
            let once = normalize(raw).unwrap();
            let twice = normalize(once.to_source().unwrap()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn filters_run_before_normalization() {
        let mut hooks = HookBus::new();
        hooks.add_document_filter(|doc| {
            let mut sections = doc.as_array().cloned().unwrap_or_default();
            sections.push(json!({"section_id": "hooked", "title": "Hooked"}));
            Value::Array(sections)
        });
        let doc = load_value(json!([{"section_id": "a", "title": "A"}]), &hooks).unwrap();
        let ids: Vec<_> = doc.sections.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["a", "hooked"]);
    }

    #[test]
    fn filter_can_provide_the_whole_document() {
        let mut hooks = HookBus::new();
        hooks.add_document_filter(|_| sample());
        let doc = load_value(empty_source(), &hooks).unwrap();
        assert_eq!(doc.sections[0].id(), "general");
    }
}

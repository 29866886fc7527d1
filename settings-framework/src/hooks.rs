//! Extension points for settings documents and rendered forms.
//!
//! Filters are ordered `T -> T` transformers; the value passes through each
//! one in registration order. Actions are ordered listeners fired by name
//! that may append markup to the output being built.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::types::{FieldDefaults, StoredValueMap};

/// Action fired before the settings form, where tab links are rendered.
pub const BEFORE_SETTINGS: &str = "before_settings";
/// Action fired inside the form before the hidden verification fields.
pub const BEFORE_SETTINGS_FIELDS: &str = "before_settings_fields";
/// Action fired after the settings form closes.
pub const AFTER_SETTINGS: &str = "after_settings";
/// Action fired before the tab link row.
pub const BEFORE_TAB_LINKS: &str = "before_tab_links";
/// Action fired after the tab link row.
pub const AFTER_TAB_LINKS: &str = "after_tab_links";
/// Action fired before every field; `before_field_{element_id}` follows it.
pub const BEFORE_FIELD: &str = "before_field";
/// Action fired after every field; `after_field_{element_id}` follows it.
pub const AFTER_FIELD: &str = "after_field";

/// Name of the per-field action fired before `element_id` renders.
pub fn before_field_hook(element_id: &str) -> String {
    format!("{BEFORE_FIELD}_{element_id}")
}

/// Name of the per-field action fired after `element_id` renders.
pub fn after_field_hook(element_id: &str) -> String {
    format!("{AFTER_FIELD}_{element_id}")
}

/// Name of the validation filter chain for an option group.
pub fn validate_hook(option_group: &str) -> String {
    format!("{option_group}_settings_validate")
}

type Filter<T> = Box<dyn Fn(T) -> T + Send + Sync>;
type Action = Box<dyn Fn(&mut String) + Send + Sync>;

/// An ordered chain of transformers over one value type.
pub struct FilterChain<T> {
    filters: Vec<Filter<T>>,
}

impl<T> FilterChain<T> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn add(&mut self, filter: impl Fn(T) -> T + Send + Sync + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Pass `value` through every filter in registration order.
    pub fn apply(&self, value: T) -> T {
        self.filters.iter().fold(value, |acc, filter| filter(acc))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<T> Default for FilterChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All extension points a settings framework consults.
#[derive(Default)]
pub struct HookBus {
    document: FilterChain<Value>,
    defaults: FilterChain<FieldDefaults>,
    values: HashMap<String, FilterChain<StoredValueMap>>,
    actions: HashMap<String, Vec<Action>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contribute to the raw settings document before it is normalized.
    pub fn add_document_filter(
        &mut self,
        filter: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> &mut Self {
        self.document.add(filter);
        self
    }

    /// Adjust the record unspecified field attributes fall back to.
    pub fn add_defaults_filter(
        &mut self,
        filter: impl Fn(FieldDefaults) -> FieldDefaults + Send + Sync + 'static,
    ) -> &mut Self {
        self.defaults.add(filter);
        self
    }

    /// Register a filter over submitted values under a named chain, such as
    /// [`validate_hook`].
    pub fn add_values_filter(
        &mut self,
        name: impl Into<String>,
        filter: impl Fn(StoredValueMap) -> StoredValueMap + Send + Sync + 'static,
    ) -> &mut Self {
        self.values.entry(name.into()).or_default().add(filter);
        self
    }

    /// Register a listener for a named action.
    pub fn add_action(
        &mut self,
        name: impl Into<String>,
        action: impl Fn(&mut String) + Send + Sync + 'static,
    ) -> &mut Self {
        self.actions
            .entry(name.into())
            .or_default()
            .push(Box::new(action));
        self
    }

    pub fn apply_document(&self, document: Value) -> Value {
        self.document.apply(document)
    }

    pub fn apply_defaults(&self, defaults: FieldDefaults) -> FieldDefaults {
        self.defaults.apply(defaults)
    }

    /// Run the named values chain; an unknown name returns `values` untouched.
    pub fn apply_values(&self, name: &str, values: StoredValueMap) -> StoredValueMap {
        match self.values.get(name) {
            Some(chain) => chain.apply(values),
            None => values,
        }
    }

    /// Fire every listener registered under `name`, in order.
    pub fn do_action(&self, name: &str, out: &mut String) {
        if let Some(listeners) = self.actions.get(name) {
            for listener in listeners {
                listener(out);
            }
        }
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.get(name).is_some_and(|l| !l.is_empty())
    }
}

impl fmt::Debug for HookBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBus")
            .field("document_filters", &self.document.len())
            .field("defaults_filters", &self.defaults.len())
            .field("values_chains", &self.values.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

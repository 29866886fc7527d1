//! Schema types for settings documents.
//!
//! A settings document is an ordered list of sections, each holding an
//! ordered list of fields, plus optional tabs. Every attribute is optional at
//! parse time so that malformed entries survive loading and are filtered by
//! the registrar instead of failing the whole document.

use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::Result;

/// Ordered mapping of choice value to display label.
pub type Choices = IndexMap<String, String>;

/// Flat key/value map persisted by the host for one option group.
pub type StoredValueMap = IndexMap<String, Value>;

/// The rendering type of a field.
///
/// Unrecognised names are kept verbatim in [`FieldType::Other`] and render
/// as nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Password,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Checkboxes,
    Color,
    File,
    Editor,
    /// Emits the field default verbatim. Trusted host markup only.
    Custom,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Password => "password",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Checkboxes => "checkboxes",
            FieldType::Color => "color",
            FieldType::File => "file",
            FieldType::Editor => "editor",
            FieldType::Custom => "custom",
            FieldType::Other(name) => name,
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => FieldType::Text,
            "password" => FieldType::Password,
            "textarea" => FieldType::Textarea,
            "select" => FieldType::Select,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "checkboxes" => FieldType::Checkboxes,
            "color" => FieldType::Color,
            "file" => FieldType::File,
            "editor" => FieldType::Editor,
            "custom" => FieldType::Custom,
            _ => FieldType::Other(name),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

/// A single field as declared in the source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldDef {
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "desc",
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, alias = "std", skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_field_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_: Option<FieldType>,
    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub placeholder: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_choices",
        skip_serializing_if = "Option::is_none"
    )]
    pub choices: Option<Choices>,
    #[serde(
        default,
        alias = "css_class",
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub class: Option<String>,
}

impl FieldDef {
    /// Start a field with the given id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, field_type: impl Into<FieldType>) -> Self {
        self.type_ = Some(field_type.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Add a choice, keeping declaration order.
    pub fn with_choice(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.choices
            .get_or_insert_with(Choices::new)
            .insert(value.into(), label.into());
        self
    }

    /// A field is registered only with a non-empty id and a title.
    pub fn is_registrable(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty()) && self.title.is_some()
    }

    /// Overlay this field onto `defaults`, producing a fully populated record.
    pub fn resolve(&self, defaults: &FieldDefaults) -> ResolvedField {
        ResolvedField {
            id: self.id.clone().unwrap_or_else(|| defaults.id.clone()),
            title: self.title.clone().unwrap_or_else(|| defaults.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| defaults.description.clone()),
            default: self.default.clone().unwrap_or_else(|| defaults.default.clone()),
            field_type: self.type_.clone().unwrap_or_else(|| defaults.field_type.clone()),
            placeholder: self
                .placeholder
                .clone()
                .unwrap_or_else(|| defaults.placeholder.clone()),
            choices: self.choices.clone().unwrap_or_else(|| defaults.choices.clone()),
            class: self.class.clone().unwrap_or_else(|| defaults.class.clone()),
        }
    }
}

/// The record that unspecified field attributes fall back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefaults {
    pub id: String,
    pub title: String,
    pub description: String,
    pub default: Value,
    pub field_type: FieldType,
    pub placeholder: String,
    pub choices: Choices,
    pub class: String,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            id: "default_field".into(),
            title: "Default Field".into(),
            description: String::new(),
            default: Value::String(String::new()),
            field_type: FieldType::Text,
            placeholder: String::new(),
            choices: Choices::new(),
            class: String::new(),
        }
    }
}

/// A field with every attribute populated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub id: String,
    pub title: String,
    pub description: String,
    pub default: Value,
    pub field_type: FieldType,
    pub placeholder: String,
    pub choices: Choices,
    pub class: String,
}

/// A titled, ordered group of fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SectionDef {
    #[serde(
        default,
        alias = "id",
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub section_id: Option<String>,
    #[serde(
        default,
        alias = "section_title",
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "section_description",
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Numeric strings such as `"2"` are accepted; anything else sorts as `0`.
    #[serde(default, alias = "section_order", deserialize_with = "deserialize_order")]
    pub order: f64,
    /// Entries that are not field objects are dropped; a non-list is empty.
    #[serde(default, deserialize_with = "deserialize_fields")]
    pub fields: Vec<FieldDef>,
}

impl SectionDef {
    pub fn new(section_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            section_id: Some(section_id.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// The section id, or the empty string when absent.
    pub fn id(&self) -> &str {
        self.section_id.as_deref().unwrap_or_default()
    }

    /// A section is registered only with a non-empty id and a title.
    pub fn is_registrable(&self) -> bool {
        !self.id().is_empty() && self.title.is_some()
    }
}

/// One navigation tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tab {
    pub id: String,
    pub title: String,
}

/// The whole settings form: sections plus optional tabs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsDocument {
    pub sections: Vec<SectionDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<Tab>,
}

impl SettingsDocument {
    pub fn new(sections: Vec<SectionDef>) -> Self {
        Self {
            sections,
            tabs: Vec::new(),
        }
    }

    pub fn with_tab(mut self, id: impl Into<String>, title: impl Into<String>) -> Self {
        self.tabs.push(Tab {
            id: id.into(),
            title: title.into(),
        });
        self
    }

    /// Find a section by id.
    pub fn section(&self, section_id: &str) -> Option<&SectionDef> {
        self.sections.iter().find(|s| s.id() == section_id)
    }

    /// Render back into the canonical `{sections, tabs}` source shape.
    pub fn to_source(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Deserialize the object entries of a list one at a time, dropping any
/// entry that is not an object or does not fit `T`.
pub(crate) fn from_entries<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// Text for a number, with whole floats written without a fraction.
pub(crate) fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

/// Text for a scalar attribute. Lists and objects have none.
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(number_text(&n)),
        Value::Bool(true) => Some("1".into()),
        Value::Bool(false) => Some(String::new()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_text))
}

fn deserialize_field_type<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<FieldType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_text(deserializer)?.map(FieldType::from))
}

fn deserialize_order<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn deserialize_fields<'de, D>(deserializer: D) -> std::result::Result<Vec<FieldDef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => from_entries(items),
        _ => Vec::new(),
    })
}

/// Choice keys and labels may be written as bare numbers or booleans in YAML.
#[derive(Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
enum ScalarText {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl From<ScalarText> for String {
    fn from(scalar: ScalarText) -> Self {
        match scalar {
            ScalarText::Text(s) => s,
            ScalarText::Integer(n) => n.to_string(),
            ScalarText::Flag(b) => b.to_string(),
        }
    }
}

fn deserialize_choices<'de, D>(deserializer: D) -> std::result::Result<Option<Choices>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IndexMap<ScalarText, ScalarText>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|map| {
        map.into_iter()
            .map(|(value, label)| (String::from(value), String::from(label)))
            .collect()
    }))
}

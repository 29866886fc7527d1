//! Field rendering: one field plus its stored value in, form markup out.
//!
//! User-controlled text is escaped for its context. Descriptions come from
//! the schema and are emitted as trusted markup, as is the `custom` type.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use serde_json::Value;
use tracing::trace;

use crate::hooks::{after_field_hook, before_field_hook, HookBus, AFTER_FIELD, BEFORE_FIELD};
use crate::store::{choice_key, element_id, input_name};
use crate::types::{
    number_text, FieldDef, FieldDefaults, FieldType, ResolvedField, SectionDef, StoredValueMap,
};
use crate::widgets::Widgets;

/// Text form of a stored or default value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".into(),
        Value::Bool(false) => String::new(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a value counts as "on" for a single checkbox.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Renders fields of one option group.
pub struct FieldRenderer<'a> {
    option_group: &'a str,
    defaults: FieldDefaults,
    hooks: &'a HookBus,
    widgets: &'a dyn Widgets,
}

impl<'a> FieldRenderer<'a> {
    /// The default record is passed through the hook bus once here.
    pub fn new(option_group: &'a str, hooks: &'a HookBus, widgets: &'a dyn Widgets) -> Self {
        Self {
            option_group,
            defaults: hooks.apply_defaults(FieldDefaults::default()),
            hooks,
            widgets,
        }
    }

    pub fn defaults(&self) -> &FieldDefaults {
        &self.defaults
    }

    /// Render `field` of `section` against the group's stored values.
    pub fn render(&self, section: &SectionDef, field: &FieldDef, stored: &StoredValueMap) -> String {
        let field = field.resolve(&self.defaults);
        let el_id = element_id(self.option_group, section.id(), &field.id);
        let value = stored.get(&el_id).unwrap_or(&field.default);

        trace!(element_id = %el_id, field_type = field.field_type.as_str(), "rendering field");

        let mut out = String::new();
        self.hooks.do_action(BEFORE_FIELD, &mut out);
        self.hooks.do_action(&before_field_hook(&el_id), &mut out);

        let ctx = Control {
            name: input_name(self.option_group, &el_id),
            el_id: &el_id,
            field: &field,
        };
        match &field.field_type {
            FieldType::Text => ctx.text_input(&mut out, "text", value),
            FieldType::Password => ctx.text_input(&mut out, "password", value),
            FieldType::Textarea => ctx.textarea(&mut out, value),
            FieldType::Select => ctx.select(&mut out, value),
            FieldType::Radio => ctx.radio(&mut out, value),
            FieldType::Checkbox => ctx.checkbox(&mut out, value),
            FieldType::Checkboxes => ctx.checkboxes(&mut out, self.option_group, stored),
            FieldType::Color => ctx.color(&mut out, value, self.widgets),
            FieldType::File => ctx.file(&mut out, value, self.widgets),
            FieldType::Editor => {
                out.push_str(&self.widgets.editor(&value_text(value), &el_id, &ctx.name));
                ctx.description(&mut out);
            }
            FieldType::Custom => out.push_str(&value_text(&field.default)),
            FieldType::Other(_) => {}
        }

        self.hooks.do_action(AFTER_FIELD, &mut out);
        self.hooks.do_action(&after_field_hook(&el_id), &mut out);
        out
    }
}

/// Per-field rendering state.
struct Control<'f> {
    name: String,
    el_id: &'f str,
    field: &'f ResolvedField,
}

impl Control<'_> {
    fn class_list(&self, base: &str) -> String {
        match (base.is_empty(), self.field.class.is_empty()) {
            (_, true) => base.to_string(),
            (true, false) => self.field.class.clone(),
            (false, false) => format!("{base} {}", self.field.class),
        }
    }

    fn description(&self, out: &mut String) {
        if !self.field.description.is_empty() {
            out.push_str(&format!(
                "<p class=\"description\">{}</p>",
                self.field.description
            ));
        }
    }

    fn text_input(&self, out: &mut String, input_type: &str, value: &Value) {
        out.push_str(&format!(
            "<input type=\"{input_type}\" name=\"{}\" id=\"{}\" value=\"{}\" placeholder=\"{}\" class=\"{}\" />",
            attr(&self.name),
            attr(self.el_id),
            attr(&value_text(value)),
            attr(&self.field.placeholder),
            attr(&self.class_list("regular-text")),
        ));
        self.description(out);
    }

    fn textarea(&self, out: &mut String, value: &Value) {
        out.push_str(&format!(
            "<textarea name=\"{}\" id=\"{}\" placeholder=\"{}\" rows=\"5\" cols=\"60\" class=\"{}\">{}</textarea>",
            attr(&self.name),
            attr(self.el_id),
            attr(&self.field.placeholder),
            attr(&self.class_list("")),
            text(&value_text(value)),
        ));
        self.description(out);
    }

    fn select(&self, out: &mut String, value: &Value) {
        let current = value_text(value);
        out.push_str(&format!(
            "<select name=\"{}\" id=\"{}\" class=\"{}\">",
            attr(&self.name),
            attr(self.el_id),
            attr(&self.class_list("")),
        ));
        for (choice, label) in &self.field.choices {
            let selected = if *choice == current { " selected=\"selected\"" } else { "" };
            out.push_str(&format!(
                "<option value=\"{}\"{selected}>{}</option>",
                attr(choice),
                text(label),
            ));
        }
        out.push_str("</select>");
        self.description(out);
    }

    fn radio(&self, out: &mut String, value: &Value) {
        let current = value_text(value);
        for (choice, label) in &self.field.choices {
            let checked = if *choice == current { " checked=\"checked\"" } else { "" };
            out.push_str(&format!(
                "<label><input type=\"radio\" name=\"{}\" id=\"{}\" value=\"{}\" class=\"{}\"{checked} /> {}</label><br />",
                attr(&self.name),
                attr(&choice_key(self.el_id, choice)),
                attr(choice),
                attr(&self.class_list("")),
                text(label),
            ));
        }
        self.description(out);
    }

    fn checkbox(&self, out: &mut String, value: &Value) {
        let checked = if is_truthy(value) { " checked=\"checked\"" } else { "" };
        out.push_str(&format!(
            "<input type=\"hidden\" name=\"{name}\" value=\"0\" />\
             <label><input type=\"checkbox\" name=\"{name}\" id=\"{}\" value=\"1\" class=\"{}\"{checked} /> {}</label>",
            attr(self.el_id),
            attr(&self.class_list("")),
            self.field.description,
            name = attr(&self.name),
        ));
    }

    fn checkboxes(&self, out: &mut String, option_group: &str, stored: &StoredValueMap) {
        for (choice, label) in &self.field.choices {
            let key = choice_key(self.el_id, choice);
            let current = match stored.get(&key) {
                Some(value) => value_text(value),
                None if default_contains(&self.field.default, choice) => choice.clone(),
                None => String::new(),
            };
            let checked = if current == *choice { " checked=\"checked\"" } else { "" };
            out.push_str(&format!(
                "<input type=\"hidden\" name=\"{name}\" value=\"0\" />\
                 <label><input type=\"checkbox\" name=\"{name}\" id=\"{}\" value=\"{}\" class=\"{}\"{checked} /> {}</label><br />",
                attr(&key),
                attr(choice),
                attr(&self.class_list("")),
                text(label),
                name = attr(&input_name(option_group, &key)),
            ));
        }
        self.description(out);
    }

    fn color(&self, out: &mut String, value: &Value, widgets: &dyn Widgets) {
        out.push_str("<div style=\"position:relative;\">");
        out.push_str(&format!(
            "<input type=\"text\" name=\"{}\" id=\"{}\" value=\"{}\" class=\"{}\" />",
            attr(&self.name),
            attr(self.el_id),
            attr(&value_text(value)),
            attr(&self.class_list("")),
        ));
        out.push_str(&widgets.color_picker(self.el_id));
        self.description(out);
        out.push_str("</div>");
    }

    fn file(&self, out: &mut String, value: &Value, widgets: &dyn Widgets) {
        out.push_str(&format!(
            "<input type=\"text\" name=\"{}\" id=\"{}\" value=\"{}\" class=\"{}\" /> ",
            attr(&self.name),
            attr(self.el_id),
            attr(&value_text(value)),
            attr(&self.class_list("regular-text")),
        ));
        out.push_str(&widgets.media_browser(self.el_id));
        self.description(out);
    }
}

/// Whether a `checkboxes` default lists `choice`.
fn default_contains(default: &Value, choice: &str) -> bool {
    match default {
        Value::Array(items) => items.iter().any(|item| value_text(item) == choice),
        _ => false,
    }
}

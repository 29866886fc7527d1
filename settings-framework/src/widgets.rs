//! Client-side widgets delegated to host UI components.
//!
//! The color picker, media browser and rich-text editor are owned by the host.
//! The renderer only asks for the markup that attaches them to an input.

use html_escape::{encode_double_quoted_attribute, encode_text};

/// Marker a color input falls back to when cleared.
pub const NO_COLOR: &str = "#";

/// Markup providers for the widgets some field types need.
pub trait Widgets: Send + Sync {
    /// Picker attached to the text input with id `element_id`.
    fn color_picker(&self, element_id: &str) -> String;

    /// Browse trigger that writes a chosen resource address into the text
    /// input with id `element_id`.
    fn media_browser(&self, element_id: &str) -> String;

    /// A complete rich-text editor for `value`, submitted as `name`.
    fn editor(&self, value: &str, element_id: &str, name: &str) -> String;

    /// Style handles the host must load for these widgets.
    fn styles(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Script handles the host must load for these widgets.
    fn scripts(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Widgets that attach to the host's `color-picker`, `media-browser` and
/// `rich-editor` assets through element ids and data attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultWidgets;

impl Widgets for DefaultWidgets {
    fn color_picker(&self, element_id: &str) -> String {
        let id = encode_double_quoted_attribute(element_id);
        format!(
            "<div id=\"{id}_cp\" class=\"color-picker\" data-target=\"{id}\" \
             style=\"position:absolute;top:0;left:190px;background:#fff;z-index:9999;\"></div>\
             <script type=\"text/javascript\">\
             (function(){{\
             var input=document.getElementById(\"{id}\");\
             var picker=document.getElementById(\"{id}_cp\");\
             if(!input||!picker)return;\
             picker.style.display=\"none\";\
             input.addEventListener(\"focus\",function(){{picker.style.display=\"block\";}});\
             input.addEventListener(\"blur\",function(){{picker.style.display=\"none\";\
             if(input.value===\"\")input.value=\"{NO_COLOR}\";}});\
             }})();\
             </script>"
        )
    }

    fn media_browser(&self, element_id: &str) -> String {
        let id = encode_double_quoted_attribute(element_id);
        format!(
            "<input type=\"button\" class=\"button media-browse\" id=\"{id}_button\" \
             data-target=\"{id}\" value=\"Browse\" />\
             <script type=\"text/javascript\">\
             (function(){{\
             var button=document.getElementById(\"{id}_button\");\
             if(!button)return;\
             button.addEventListener(\"click\",function(e){{\
             e.preventDefault();\
             if(typeof window.openMediaBrowser!==\"function\")return;\
             window.openMediaBrowser(function(url){{\
             document.getElementById(\"{id}\").value=url;}});\
             }});\
             }})();\
             </script>"
        )
    }

    fn editor(&self, value: &str, element_id: &str, name: &str) -> String {
        format!(
            "<textarea class=\"rich-editor\" id=\"{id}\" name=\"{name}\" rows=\"10\" cols=\"60\">{value}</textarea>",
            id = encode_double_quoted_attribute(element_id),
            name = encode_double_quoted_attribute(name),
            value = encode_text(value),
        )
    }

    fn styles(&self) -> Vec<&'static str> {
        vec!["color-picker", "media-browser"]
    }

    fn scripts(&self) -> Vec<&'static str> {
        vec!["color-picker", "media-browser", "rich-editor"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_picker_targets_input_and_restores_marker() {
        let html = DefaultWidgets.color_picker("demo_style_bg");
        assert!(html.contains("id=\"demo_style_bg_cp\""));
        assert!(html.contains("data-target=\"demo_style_bg\""));
        assert!(html.contains("input.value=\"#\""));
    }

    #[test]
    fn media_browser_has_browse_button() {
        let html = DefaultWidgets.media_browser("demo_media_logo");
        assert!(html.contains("id=\"demo_media_logo_button\""));
        assert!(html.contains("value=\"Browse\""));
    }

    #[test]
    fn editor_escapes_value() {
        let html = DefaultWidgets.editor("<script>x</script>", "demo_a_b", "demo_settings[demo_a_b]");
        assert!(html.contains("name=\"demo_settings[demo_a_b]\""));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>x"));
    }
}

//! Renderable message content and interactive controls.

use serde::{Deserialize, Serialize};

pub const ACTION_FIRST: &str = "First";
pub const ACTION_PREV: &str = "Prev";
pub const ACTION_PAGE: &str = "Page";
pub const ACTION_NEXT: &str = "Next";
pub const ACTION_LAST: &str = "Last";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Button {
    pub style: ButtonStyle,
    /// Action id reported back in the interaction when pressed.
    pub custom_id: String,
    pub label: String,
    pub disabled: bool,
}

impl Button {
    pub fn new(style: ButtonStyle, custom_id: &str, label: &str) -> Self {
        Self {
            style,
            custom_id: custom_id.to_string(),
            label: label.to_string(),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionRow {
    pub components: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

/// Everything needed to render one message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageContent {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ActionRow>,
}

impl MessageContent {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    pub fn with_components(mut self, components: Vec<ActionRow>) -> Self {
        self.components = components;
        self
    }

    pub fn has_controls(&self) -> bool {
        self.components.iter().any(|row| !row.components.is_empty())
    }
}

/// The standard navigation row: `First | Prev | Page i/n | Next | Last`.
///
/// `page` is 1-based; the page indicator is a disabled button.
pub fn default_controls(page: usize, total_pages: usize) -> Vec<ActionRow> {
    vec![ActionRow {
        components: vec![
            Button::new(ButtonStyle::Danger, ACTION_FIRST, "First"),
            Button::new(ButtonStyle::Success, ACTION_PREV, "Prev"),
            Button::new(
                ButtonStyle::Secondary,
                ACTION_PAGE,
                &format!("Page {}/{}", page, total_pages),
            )
            .disabled(),
            Button::new(ButtonStyle::Success, ACTION_NEXT, "Next"),
            Button::new(ButtonStyle::Danger, ACTION_LAST, "Last"),
        ],
    }]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_controls_layout() {
        let rows = default_controls(2, 5);
        assert_eq!(rows.len(), 1);

        let ids: Vec<&str> = rows[0]
            .components
            .iter()
            .map(|b| b.custom_id.as_str())
            .collect();
        assert_eq!(ids, vec!["First", "Prev", "Page", "Next", "Last"]);

        let indicator = &rows[0].components[2];
        assert_eq!(indicator.label, "Page 2/5");
        assert!(indicator.disabled);
        assert!(!rows[0].components[3].disabled);
    }

    #[test]
    fn test_has_controls() {
        assert!(!MessageContent::text("plain").has_controls());
        assert!(!MessageContent::text("empty row")
            .with_components(vec![ActionRow::default()])
            .has_controls());
        assert!(MessageContent::text("nav")
            .with_components(default_controls(1, 1))
            .has_controls());
    }

    #[test]
    fn test_serialization_skips_empty_parts() {
        let json = serde_json::to_value(MessageContent::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "hi" }));
    }
}

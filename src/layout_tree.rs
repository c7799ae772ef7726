//! Laid-out document tree – the frozen representation between pagination and
//! rendering. This encodes exactly what goes on each page; rendering is a
//! pure projection of it and must not alter any position.
//!
//! In `draft-preview` mode this tree *is* the output artifact, so it
//! round-trips through JSON.

use serde::{Deserialize, Serialize};

use crate::element::Align;

/// A complete laid-out document ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub title: String,
    /// Page size in layout units (points).
    pub page_width: f32,
    pub page_height: f32,
    /// Ordered list of pages; never empty.
    pub pages: Vec<PageLayout>,
}

/// One page of placed boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with its content. Position is relative to the page
/// top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageContent>,
    /// Horizontal rule across the box width.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rule: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines with per-line offsets inside the box.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub align: Align,
    pub line_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// X offset within the box (alignment).
    pub x_offset: f32,
    /// Y offset from the top of the box.
    pub y_offset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Base64 data URI.
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            text: None,
            image: None,
            rule: false,
        }
    }
}

impl DocumentLayout {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let mut layout = DocumentLayout {
            title: "Quote 2026-001".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            pages: vec![PageLayout {
                number: 1,
                boxes: vec![LayoutBox {
                    text: Some(TextContent {
                        lines: vec![TextLine {
                            text: "Acme".to_string(),
                            x_offset: 0.0,
                            y_offset: 0.0,
                        }],
                        font_size: 9.0,
                        bold: false,
                        italic: false,
                        align: Align::Left,
                        line_height: 1.3,
                    }),
                    ..LayoutBox::new(40.0, 40.0, 515.0, 11.7)
                }],
            }],
        };
        layout.pages[0].boxes.push(LayoutBox {
            rule: true,
            ..LayoutBox::new(40.0, 60.0, 515.0, 2.0)
        });

        let json = layout.to_json();
        let parsed = DocumentLayout::from_json(&json).unwrap();
        assert_eq!(parsed, layout);
    }
}

//! Element value types, one per pipeline phase.
//!
//! An element is immutable within a phase: [`ExpandedElement`] carries no
//! size or position, [`MeasuredElement`] adds the measured height and the
//! accumulated bottom margin, and positions only exist in the final
//! [`crate::layout_tree::DocumentLayout`]. Each phase boundary produces a new
//! value set, so phase invariants can be tested independently.

use serde::{Deserialize, Serialize};

use crate::schema::{ComponentKind, Visibility};

/// One of the three per-section areas, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Header,
    Content,
    Footer,
}

/// Horizontal alignment of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Resolved text style for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub align: Align,
    /// Multiplier applied to `font_size` to obtain the line height.
    pub line_height: f32,
}

impl TextStyle {
    pub fn body() -> Self {
        Self {
            font_size: 9.0,
            bold: false,
            italic: false,
            align: Align::Left,
            line_height: 1.3,
        }
    }

    pub fn sized(font_size: f32) -> Self {
        Self {
            font_size,
            ..Self::body()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn aligned(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Company logo reference with display dimensions resolved at expansion time.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoRef {
    /// Base64 data URI.
    pub src: String,
    pub width: f32,
    pub height: f32,
}

/// A wrapped-text payload slice: the text, its style, and a left indent
/// inside the content area (budget-line hierarchy).
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub style: TextStyle,
    pub indent: f32,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            indent: 0.0,
        }
    }

    pub fn indented(mut self, indent: f32) -> Self {
        self.indent = indent;
        self
    }
}

/// Renderable content of one element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementContent {
    Text(TextBlock),
    /// Company block: optional logo beside the text lines.
    Company {
        logo: Option<LogoRef>,
        block: TextBlock,
    },
    /// Horizontal rule across the content width.
    Separator,
    /// Running "page X of Y" marker, resolved after pagination completes.
    PageCounter { style: TextStyle },
}

/// One concrete instance of a component, produced by the expander.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedElement {
    pub kind: ComponentKind,
    pub section: String,
    pub area: Area,
    pub visibility: Option<Visibility>,
    /// Absolute Y, or `None` for flow elements.
    pub fixed_y: Option<f32>,
    /// The component's own declared trailing margin (applied to the last
    /// element of a group by the margin pre-pass).
    pub component_margin: f32,
    pub content: ElementContent,
}

impl ExpandedElement {
    pub fn component_name(&self) -> &str {
        self.kind.name()
    }

    /// Whether the element is included while laying out the given page.
    /// `Last` elements are never placed inline; the engine defers them until
    /// the final page exists.
    pub fn visible_on(&self, page: usize) -> bool {
        match self.visibility {
            Some(Visibility::First) => page == 1,
            Some(Visibility::Last) => false,
            Some(Visibility::All) | None => true,
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.visibility == Some(Visibility::Last)
    }
}

/// An expanded element with its measured height and accumulated bottom
/// margin, ready for pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredElement {
    pub element: ExpandedElement,
    pub height: f32,
    /// General inter-element margin, plus the component's own margin when
    /// this is the last element of its group.
    pub margin_bottom_total: f32,
}

impl MeasuredElement {
    /// Vertical space the element needs when placed in flow.
    pub fn required(&self) -> f32 {
        self.height + self.margin_bottom_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_element(visibility: Option<Visibility>) -> ExpandedElement {
        ExpandedElement {
            kind: ComponentKind::Title,
            section: "summary".to_string(),
            area: Area::Content,
            visibility,
            fixed_y: None,
            component_margin: 0.0,
            content: ElementContent::Text(TextBlock::new("t", TextStyle::body())),
        }
    }

    #[test]
    fn first_visibility_only_on_page_one() {
        let el = flow_element(Some(Visibility::First));
        assert!(el.visible_on(1));
        assert!(!el.visible_on(2));
    }

    #[test]
    fn last_visibility_is_deferred() {
        let el = flow_element(Some(Visibility::Last));
        assert!(el.is_deferred());
        assert!(!el.visible_on(1));
        assert!(!el.visible_on(7));
    }

    #[test]
    fn unset_visibility_is_always_included() {
        let el = flow_element(None);
        assert!(el.visible_on(1));
        assert!(el.visible_on(3));
    }

    #[test]
    fn required_space_includes_margin() {
        let measured = MeasuredElement {
            element: flow_element(None),
            height: 30.0,
            margin_bottom_total: 4.0,
        };
        assert_eq!(measured.required(), 34.0);
    }
}

//! Template schema – page geometry, the component registry, and the
//! per-section component lists grouped into header/content/footer areas.
//!
//! Component identifiers map onto a closed set of kinds; anything outside the
//! set becomes [`ComponentKind::Unrecognized`] and is skipped with a warning
//! during expansion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ExpandError, SchemaError};

/// Page geometry in layout units (points).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Y coordinate below which flow content may not be placed without
    /// triggering a page break.
    pub content_lower_bound: f32,
    /// General inter-element spacing unit.
    #[serde(default)]
    pub general_margin: f32,
}

impl PageGeometry {
    /// Width available to content between the side margins.
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Height available to flow content on an empty page.
    pub fn content_height(&self) -> f32 {
        self.content_lower_bound - self.margin_top
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let fail = |reason: &str| {
            Err(SchemaError::InvalidGeometry {
                reason: reason.to_string(),
            })
        };
        if !(self.width > 0.0 && self.height > 0.0) {
            return fail("page dimensions must be positive");
        }
        if self.content_width() <= 0.0 {
            return fail("side margins leave no content width");
        }
        if self.content_lower_bound <= self.margin_top {
            return fail("content lower bound must lie below the top margin");
        }
        if self.content_lower_bound > self.height {
            return fail("content lower bound must lie within the page");
        }
        if self.general_margin < 0.0 {
            return fail("general margin must not be negative");
        }
        Ok(())
    }
}

/// Visibility policy of a component across the pages it could appear on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only while laying out page 1.
    First,
    /// Only on the final page, resolved after pagination completes.
    Last,
    /// Every page the component's area is rendered on.
    All,
}

/// Static configuration of one named component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Reference to the component's markup source, for external backends.
    #[serde(default)]
    pub markup: Option<String>,
    /// Unset behaves like `all`.
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Absolute Y position; `0` means the element flows with the cursor.
    #[serde(default)]
    pub fixed_y: f32,
    /// Trailing margin applied after the last element of this component's
    /// group within an area.
    #[serde(default)]
    pub margin_bottom: f32,
}

impl ComponentConfig {
    /// The declared absolute position, or `None` for flow elements.
    pub fn fixed_position(&self) -> Option<f32> {
        (self.fixed_y > 0.0).then_some(self.fixed_y)
    }
}

/// Component lists of one document section, in render order per area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionLayout {
    pub name: String,
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub footer: Vec<String>,
}

impl SectionLayout {
    /// All component names of the section, in area order.
    pub fn component_names(&self) -> impl Iterator<Item = &String> {
        self.header
            .iter()
            .chain(self.content.iter())
            .chain(self.footer.iter())
    }
}

/// A complete template: geometry, component registry, and ordered sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSchema {
    pub page: PageGeometry,
    pub components: HashMap<String, ComponentConfig>,
    /// Sections in processing order (e.g. summary → budget → conditions).
    pub sections: Vec<SectionLayout>,
}

impl TemplateSchema {
    /// Resolve a declared component name against the registry. A missing
    /// registration is fatal for the document.
    pub fn resolve(&self, section: &str, name: &str) -> Result<&ComponentConfig, ExpandError> {
        self.components
            .get(name)
            .ok_or_else(|| ExpandError::MissingComponent {
                section: section.to_string(),
                component: name.to_string(),
            })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// The closed set of component kinds the expander understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Company,
    Title,
    Client,
    Levels,
    Totals,
    Note,
    Signatures,
    Pagination,
    Separator,
    /// Catch-all for identifiers outside the known set – skipped with a
    /// warning, never fatal.
    Unrecognized(String),
}

impl ComponentKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "company" => ComponentKind::Company,
            "title" => ComponentKind::Title,
            "client" => ComponentKind::Client,
            "levels" => ComponentKind::Levels,
            "totals" => ComponentKind::Totals,
            "note" => ComponentKind::Note,
            "signatures" => ComponentKind::Signatures,
            "pagination" => ComponentKind::Pagination,
            "separator" => ComponentKind::Separator,
            other => ComponentKind::Unrecognized(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ComponentKind::Company => "company",
            ComponentKind::Title => "title",
            ComponentKind::Client => "client",
            ComponentKind::Levels => "levels",
            ComponentKind::Totals => "totals",
            ComponentKind::Note => "note",
            ComponentKind::Signatures => "signatures",
            ComponentKind::Pagination => "pagination",
            ComponentKind::Separator => "separator",
            ComponentKind::Unrecognized(name) => name,
        }
    }

    /// Whether the kind reads a slice of the payload section. Sections
    /// referenced by the schema must exist in the payload when any of their
    /// components requires data.
    pub fn requires_data(&self) -> bool {
        matches!(
            self,
            ComponentKind::Title
                | ComponentKind::Client
                | ComponentKind::Levels
                | ComponentKind::Totals
                | ComponentKind::Note
        )
    }
}

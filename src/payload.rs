//! Document payload – the business data for one quote document.
//!
//! The payload is a read-only input for the duration of one generation. Tax
//! amounts (VAT, withholding, equivalence surcharge) arrive pre-computed and
//! are passed through to the rendered totals block, never recomputed here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// Maximum depth of the budget-line hierarchy (chapter → item).
pub const MAX_LINE_DEPTH: usize = 4;

/// Full business data for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub company: Company,
    pub meta: DocumentMeta,
    /// Output mode: `draft-preview` stops after layout, `final` produces PDF bytes.
    #[serde(default)]
    pub mode: OutputMode,
    pub sections: Vec<SectionData>,
}

/// Issuing company block, rendered by the `company` component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Company logo as a base64 data URI (`data:image/png;base64,...`).
    #[serde(default)]
    pub logo: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    /// Per-component style adjustments carried with the company record.
    #[serde(default)]
    pub style_overrides: Vec<StyleOverride>,
}

/// A per-component style adjustment (matched by component name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleOverride {
    pub component: String,
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub bold: Option<bool>,
}

/// Descriptive metadata embedded in the final PDF. Timestamps come from
/// here, never from the render backend's own defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
}

/// Output mode for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// Produce only the laid-out document tree, for inspection.
    #[serde(rename = "draft-preview")]
    DraftPreview,
    /// Produce the laid-out tree plus the binary PDF artifact.
    #[default]
    #[serde(rename = "final")]
    Final,
}

/// One named section of the document (e.g. summary, budget, conditions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionData {
    pub name: String,
    #[serde(default)]
    pub client: Option<Client>,
    #[serde(default)]
    pub title: Option<String>,
    /// Free text or light block markup; split into paragraph chunks by the
    /// `note` component.
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub levels: Vec<BudgetLine>,
    #[serde(default)]
    pub totals: Option<Totals>,
}

/// Recipient block, rendered by the `client` component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Hierarchy level of one budget line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLevel {
    Chapter,
    Subchapter,
    Section,
    Item,
}

/// One row of the itemized quote. `id` is dot-separated integers
/// ("1", "1.2", "1.2.3"); a line's id has exactly one more segment than its
/// parent's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLine {
    pub level: LineLevel,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    pub amount: f64,
}

impl BudgetLine {
    /// Hierarchy depth = number of dot-separated id segments.
    pub fn depth(&self) -> usize {
        self.id.split('.').count()
    }

    /// Parent id (the id minus its last segment), if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.id.rfind('.').map(|dot| &self.id[..dot])
    }
}

/// Pre-computed totals block, rendered by the `totals` component as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Totals {
    pub base: f64,
    #[serde(default)]
    pub vat_groups: Vec<VatGroup>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub withholding: Option<Withholding>,
    #[serde(default)]
    pub surcharges: Vec<Surcharge>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatGroup {
    pub rate: f64,
    pub base: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withholding {
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surcharge {
    pub rate: f64,
    pub amount: f64,
}

impl DocumentPayload {
    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&SectionData> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Check the budget-line invariants of every section: unique ids, depth
    /// bound, and that every non-root line follows its parent. Violations are
    /// fatal before expansion.
    pub fn validate(&self) -> Result<(), PayloadError> {
        for section in &self.sections {
            let mut seen: Vec<&str> = Vec::with_capacity(section.levels.len());
            for line in &section.levels {
                if seen.contains(&line.id.as_str()) {
                    return Err(PayloadError::DuplicateLineId {
                        section: section.name.clone(),
                        id: line.id.clone(),
                    });
                }
                if line.depth() > MAX_LINE_DEPTH {
                    return Err(PayloadError::LineTooDeep {
                        section: section.name.clone(),
                        id: line.id.clone(),
                        max: MAX_LINE_DEPTH,
                    });
                }
                if let Some(parent) = line.parent_id() {
                    if !seen.contains(&parent) {
                        return Err(PayloadError::OrphanLine {
                            section: section.name.clone(),
                            id: line.id.clone(),
                        });
                    }
                }
                seen.push(&line.id);
            }
        }
        Ok(())
    }
}

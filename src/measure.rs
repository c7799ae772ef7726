//! Measurement phase – attaches a rendered height to every expanded element.
//!
//! Elements are measured independently of one another and of their final
//! position, so the phase fans out across a rayon pool. A failed measurement
//! never aborts the document: the element falls back to
//! [`DEFAULT_ELEMENT_HEIGHT`] and is still placed.
//!
//! The bottom-margin grouping pre-pass also runs here, before layout:
//! consecutive elements of the same component within one (section, area) form
//! a group; every element carries the page's general margin and only the last
//! element of a group adds the component's own declared bottom margin.

use rayon::prelude::*;

use crate::element::{ElementContent, ExpandedElement, MeasuredElement};
use crate::error::MeasureError;
use crate::fonts::{wrap_text, FontManager};
use crate::schema::PageGeometry;

/// Fallback height when a single element fails to measure: one default line.
pub const DEFAULT_ELEMENT_HEIGHT: f32 = 12.0;

/// Height reserved for a separator rule.
const SEPARATOR_HEIGHT: f32 = 2.0;

/// Gap between a company logo and the company text block.
pub(crate) const LOGO_GAP: f32 = 10.0;

/// A measurement capability: element markup in, rendered height out.
/// Implementations must be side-effect-free from the engine's point of view.
pub trait MeasureBackend: Sync {
    fn measure(&self, element: &ExpandedElement, content_width: f32)
        -> Result<f32, MeasureError>;
}

/// Default backend: font-metric text measurement.
pub struct TextMeasurer {
    fonts: FontManager,
}

impl TextMeasurer {
    pub fn new() -> Self {
        Self {
            fonts: FontManager::new(),
        }
    }

    pub fn with_fonts(fonts: FontManager) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontManager {
        &self.fonts
    }

    fn text_height(&self, text: &str, style: &crate::element::TextStyle, width: f32) -> f32 {
        let lines = wrap_text(text, style, width, &self.fonts);
        lines.len() as f32 * self.fonts.line_height(style)
    }
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasureBackend for TextMeasurer {
    fn measure(
        &self,
        element: &ExpandedElement,
        content_width: f32,
    ) -> Result<f32, MeasureError> {
        let height = match &element.content {
            ElementContent::Text(block) => {
                self.text_height(&block.text, &block.style, content_width - block.indent)
            }
            ElementContent::Company { logo, block } => {
                let text_width = match logo {
                    Some(logo) => content_width - logo.width - LOGO_GAP,
                    None => content_width,
                };
                let text_height = self.text_height(&block.text, &block.style, text_width);
                match logo {
                    Some(logo) => text_height.max(logo.height),
                    None => text_height,
                }
            }
            ElementContent::Separator => SEPARATOR_HEIGHT,
            ElementContent::PageCounter { style } => self.fonts.line_height(style),
        };
        Ok(height)
    }
}

/// Measure every element (in parallel) and attach the pre-computed bottom
/// margins. Order is preserved.
pub fn measure_all<B: MeasureBackend>(
    elements: Vec<ExpandedElement>,
    backend: &B,
    geometry: &PageGeometry,
) -> Vec<MeasuredElement> {
    let margins = margin_totals(&elements, geometry.general_margin);
    let width = geometry.content_width();

    let heights: Vec<f32> = elements
        .par_iter()
        .map(|element| match backend.measure(element, width) {
            Ok(height) => height,
            Err(e) => {
                log::warn!(
                    "measurement failed for '{}' in section '{}', using default height: {e}",
                    element.component_name(),
                    element.section
                );
                DEFAULT_ELEMENT_HEIGHT
            }
        })
        .collect();

    elements
        .into_iter()
        .zip(heights)
        .zip(margins)
        .map(|((element, height), margin_bottom_total)| MeasuredElement {
            element,
            height,
            margin_bottom_total,
        })
        .collect()
}

/// The grouping pre-pass: general margin for every element, plus the
/// component margin for the last element of each consecutive same-component
/// run within one (section, area).
fn margin_totals(elements: &[ExpandedElement], general_margin: f32) -> Vec<f32> {
    let mut totals = vec![general_margin; elements.len()];
    for (i, element) in elements.iter().enumerate() {
        let last_of_group = match elements.get(i + 1) {
            Some(next) => {
                next.section != element.section
                    || next.area != element.area
                    || next.kind != element.kind
            }
            None => true,
        };
        if last_of_group {
            totals[i] += element.component_margin;
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Area, LogoRef, TextBlock, TextStyle};
    use crate::schema::ComponentKind;

    fn geometry() -> PageGeometry {
        PageGeometry {
            width: 595.0,
            height: 842.0,
            margin_top: 40.0,
            margin_left: 40.0,
            margin_right: 40.0,
            content_lower_bound: 780.0,
            general_margin: 4.0,
        }
    }

    fn element(kind: ComponentKind, area: Area, margin: f32, text: &str) -> ExpandedElement {
        ExpandedElement {
            kind,
            section: "budget".to_string(),
            area,
            visibility: None,
            fixed_y: None,
            component_margin: margin,
            content: ElementContent::Text(TextBlock::new(text, TextStyle::body())),
        }
    }

    struct FailingBackend;

    impl MeasureBackend for FailingBackend {
        fn measure(&self, _: &ExpandedElement, _: f32) -> Result<f32, MeasureError> {
            Err(MeasureError::Backend("boom".to_string()))
        }
    }

    #[test]
    fn component_margin_only_on_last_of_group() {
        let elements = vec![
            element(ComponentKind::Levels, Area::Content, 10.0, "1  a"),
            element(ComponentKind::Levels, Area::Content, 10.0, "2  b"),
            element(ComponentKind::Totals, Area::Content, 6.0, "TOTAL"),
        ];
        let totals = margin_totals(&elements, 4.0);
        assert_eq!(totals, vec![4.0, 14.0, 10.0]);
    }

    #[test]
    fn area_boundary_splits_groups() {
        let elements = vec![
            element(ComponentKind::Separator, Area::Header, 8.0, "-"),
            element(ComponentKind::Separator, Area::Content, 8.0, "-"),
        ];
        let totals = margin_totals(&elements, 0.0);
        assert_eq!(totals, vec![8.0, 8.0]);
    }

    #[test]
    fn failed_measurement_falls_back_to_default_height() {
        let elements = vec![element(ComponentKind::Title, Area::Content, 0.0, "t")];
        let measured = measure_all(elements, &FailingBackend, &geometry());
        assert_eq!(measured.len(), 1);
        assert_eq!(measured[0].height, DEFAULT_ELEMENT_HEIGHT);
    }

    #[test]
    fn text_height_scales_with_wrapping() {
        let backend = TextMeasurer::new();
        let short = element(ComponentKind::Note, Area::Content, 0.0, "short");
        let long = element(
            ComponentKind::Note,
            Area::Content,
            0.0,
            &"long words repeated over and over again ".repeat(20),
        );
        let h_short = backend.measure(&short, 500.0).unwrap();
        let h_long = backend.measure(&long, 500.0).unwrap();
        assert!(h_long > h_short * 2.0);
    }

    #[test]
    fn company_height_covers_logo() {
        let backend = TextMeasurer::new();
        let el = ExpandedElement {
            kind: ComponentKind::Company,
            section: "summary".to_string(),
            area: Area::Header,
            visibility: None,
            fixed_y: None,
            component_margin: 0.0,
            content: ElementContent::Company {
                logo: Some(LogoRef {
                    src: "data:image/png;base64,".to_string(),
                    width: 80.0,
                    height: 56.0,
                }),
                block: TextBlock::new("Acme", TextStyle::body()),
            },
        };
        let height = backend.measure(&el, 500.0).unwrap();
        assert!(height >= 56.0);
    }

    #[test]
    fn measurement_preserves_element_order() {
        let elements: Vec<ExpandedElement> = (0..50)
            .map(|i| element(ComponentKind::Levels, Area::Content, 0.0, &format!("{i}  x")))
            .collect();
        let measured = measure_all(elements.clone(), &TextMeasurer::new(), &geometry());
        for (m, e) in measured.iter().zip(&elements) {
            assert_eq!(&m.element, e);
        }
    }
}

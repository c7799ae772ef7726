//! Pagination – the core layout state machine.
//!
//! Consumes the measured element list in order and produces the laid-out
//! document tree. Per section: the cursor resets to the top margin, headers
//! are placed, content flows under the page-break protocol, footers flush at
//! the reached cursor, and the next section starts on a fresh page.
//!
//! Page-break protocol for a content element that does not fit: flush the
//! current page's footers at the cursor, open a new page, re-issue the
//! section headers (running elements), then place the pending element. An
//! element that still does not fit on the fresh page is a fatal layout error.
//!
//! `last`-visibility elements cannot be placed inline (the final page is only
//! known once the last section's content is down); they are collected while
//! the main loop runs and placed during the last section's wrap-up. The
//! "page X of Y" counter texts resolve in a finalization step once the total
//! page count is final.

use crate::element::{Align, ElementContent, MeasuredElement, TextStyle};
use crate::error::LayoutError;
use crate::fonts::{wrap_text, FontManager};
use crate::layout_tree::{DocumentLayout, ImageContent, LayoutBox, PageLayout, TextContent, TextLine};
use crate::measure::LOGO_GAP;
use crate::page::PageState;
use crate::schema::PageGeometry;

/// Lay out the measured elements into pages.
pub fn paginate(
    measured: &[MeasuredElement],
    geometry: &PageGeometry,
    fonts: &FontManager,
) -> Result<DocumentLayout, LayoutError> {
    let mut engine = Paginator::new(geometry, fonts);
    engine.run(measured)?;
    Ok(engine.finish())
}

/// A pending "page X of Y" box, resolved once the total page count is final.
struct Counter {
    page_index: usize,
    box_index: usize,
    page_number: usize,
    style: TextStyle,
    indent: f32,
}

struct Paginator<'a> {
    geometry: &'a PageGeometry,
    fonts: &'a FontManager,
    state: PageState,
    /// The last entry is the page currently being laid out.
    pages: Vec<PageLayout>,
    counters: Vec<Counter>,
    deferred: Vec<MeasuredElement>,
}

impl<'a> Paginator<'a> {
    fn new(geometry: &'a PageGeometry, fonts: &'a FontManager) -> Self {
        Self {
            geometry,
            fonts,
            state: PageState::new(geometry.clone()),
            pages: vec![PageLayout {
                number: 1,
                boxes: Vec::new(),
            }],
            counters: Vec::new(),
            deferred: Vec::new(),
        }
    }

    fn run(&mut self, measured: &[MeasuredElement]) -> Result<(), LayoutError> {
        let sections = section_runs(measured);
        let last_index = sections.len().saturating_sub(1);

        for (index, elements) in sections.into_iter().enumerate() {
            self.state.reset_cursor();

            let mut headers = Vec::new();
            let mut content = Vec::new();
            let mut footers = Vec::new();
            for element in elements {
                if element.element.is_deferred() {
                    self.deferred.push(element.clone());
                    continue;
                }
                match element.element.area {
                    crate::element::Area::Header => headers.push(element),
                    crate::element::Area::Content => content.push(element),
                    crate::element::Area::Footer => footers.push(element),
                }
            }

            self.render_running(&headers);

            for element in &content {
                if let Some(fixed_y) = element.element.fixed_y {
                    if element.element.visible_on(self.state.current_page()) {
                        self.emit(element, fixed_y);
                    }
                    continue;
                }
                if !element.element.visible_on(self.state.current_page()) {
                    continue;
                }
                self.place_flow(element, &headers, &footers)?;
            }

            // The final page only exists once the last section's content is
            // down, so deferred `last` elements are resolved here, with the
            // break protocol still available should one of them not fit.
            if index == last_index {
                let deferred = std::mem::take(&mut self.deferred);
                for element in &deferred {
                    match element.element.fixed_y {
                        Some(fixed_y) => self.emit(element, fixed_y),
                        None => self.place_flow(element, &headers, &footers)?,
                    }
                }
            }

            self.render_running(&footers);

            if index != last_index {
                self.open_page();
            }
        }

        Ok(())
    }

    /// Place one flow element under the page-break protocol: flush footers at
    /// the cursor, open a fresh page, re-issue the headers, then place. An
    /// element that still does not fit is fatally oversized.
    fn place_flow(
        &mut self,
        element: &MeasuredElement,
        headers: &[&MeasuredElement],
        footers: &[&MeasuredElement],
    ) -> Result<(), LayoutError> {
        if !self.state.fits(element.required()) {
            self.render_running(footers);
            self.open_page();
            self.render_running(headers);
            if !self.state.fits(element.required()) {
                return Err(LayoutError::Oversized {
                    section: element.element.section.clone(),
                    component: element.element.component_name().to_string(),
                    height: element.height,
                    available: self.geometry.content_height(),
                });
            }
        }
        let y = self.state.advance(element.required());
        self.emit(element, y);
        Ok(())
    }

    /// Place the running elements of one area (headers on every page of their
    /// section, footers on every flush).
    fn render_running(&mut self, elements: &[&MeasuredElement]) {
        for element in elements {
            if !element.element.visible_on(self.state.current_page()) {
                continue;
            }
            match element.element.fixed_y {
                Some(fixed_y) => self.emit(element, fixed_y),
                None => {
                    let y = self.state.advance(element.required());
                    self.emit(element, y);
                }
            }
        }
    }

    fn open_page(&mut self) {
        self.state.break_page();
        self.pages.push(PageLayout {
            number: self.state.current_page(),
            boxes: Vec::new(),
        });
    }

    /// Build the boxes of one element at the given Y on the current page.
    fn emit(&mut self, element: &MeasuredElement, y: f32) {
        let geom = self.geometry;
        let page_index = self.pages.len() - 1;
        let page_number = self.state.current_page();
        let content_width = geom.content_width();

        match &element.element.content {
            ElementContent::Text(block) => {
                let x = geom.margin_left + block.indent;
                let width = content_width - block.indent;
                let text = self.text_content(&block.text, &block.style, width);
                let mut lbox = LayoutBox::new(x, y, width, element.height);
                lbox.text = Some(text);
                self.pages[page_index].boxes.push(lbox);
            }
            ElementContent::Company { logo, block } => {
                let mut text_x = geom.margin_left;
                let mut text_width = content_width;
                if let Some(logo) = logo {
                    let mut image_box = LayoutBox::new(geom.margin_left, y, logo.width, logo.height);
                    image_box.image = Some(ImageContent {
                        src: logo.src.clone(),
                        width: logo.width,
                        height: logo.height,
                    });
                    self.pages[page_index].boxes.push(image_box);
                    text_x += logo.width + LOGO_GAP;
                    text_width -= logo.width + LOGO_GAP;
                }
                let text = self.text_content(&block.text, &block.style, text_width);
                let mut lbox = LayoutBox::new(text_x, y, text_width, element.height);
                lbox.text = Some(text);
                self.pages[page_index].boxes.push(lbox);
            }
            ElementContent::Separator => {
                let mut lbox =
                    LayoutBox::new(geom.margin_left, y, content_width, element.height);
                lbox.rule = true;
                self.pages[page_index].boxes.push(lbox);
            }
            ElementContent::PageCounter { style } => {
                let lbox = LayoutBox::new(geom.margin_left, y, content_width, element.height);
                let box_index = self.pages[page_index].boxes.len();
                self.pages[page_index].boxes.push(lbox);
                self.counters.push(Counter {
                    page_index,
                    box_index,
                    page_number,
                    style: style.clone(),
                    indent: 0.0,
                });
            }
        }
    }

    fn text_content(&self, text: &str, style: &TextStyle, width: f32) -> TextContent {
        let line_height = self.fonts.line_height(style);
        let lines = wrap_text(text, style, width, self.fonts)
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let x_offset = match style.align {
                    Align::Left => 0.0,
                    Align::Center => ((width - self.fonts.text_width(&line, style)) / 2.0).max(0.0),
                    Align::Right => (width - self.fonts.text_width(&line, style)).max(0.0),
                };
                TextLine {
                    text: line,
                    x_offset,
                    y_offset: i as f32 * line_height,
                }
            })
            .collect();
        TextContent {
            lines,
            font_size: style.font_size,
            bold: style.bold,
            italic: style.italic,
            align: style.align,
            line_height,
        }
    }

    /// Finalization: resolve all page-counter texts against the final total.
    fn finish(mut self) -> DocumentLayout {
        let total = self.pages.len();
        for counter in &self.counters {
            let text = format!("Page {} of {}", counter.page_number, total);
            let width = self.geometry.content_width() - counter.indent;
            let content = self.text_content(&text, &counter.style, width);
            self.pages[counter.page_index].boxes[counter.box_index].text = Some(content);
        }

        DocumentLayout {
            title: String::new(),
            page_width: self.geometry.width,
            page_height: self.geometry.height,
            pages: self.pages,
        }
    }
}

/// Group consecutive elements by section, preserving order.
fn section_runs(measured: &[MeasuredElement]) -> Vec<Vec<&MeasuredElement>> {
    let mut runs: Vec<Vec<&MeasuredElement>> = Vec::new();
    for element in measured {
        match runs.last_mut() {
            Some(run)
                if run
                    .last()
                    .is_some_and(|prev| prev.element.section == element.element.section) =>
            {
                run.push(element);
            }
            _ => runs.push(vec![element]),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Area, ElementContent, ExpandedElement, TextBlock};
    use crate::schema::{ComponentKind, Visibility};

    fn geometry() -> PageGeometry {
        PageGeometry {
            width: 595.0,
            height: 1000.0,
            margin_top: 40.0,
            margin_left: 40.0,
            margin_right: 40.0,
            content_lower_bound: 900.0,
            general_margin: 0.0,
        }
    }

    fn measured(
        kind: ComponentKind,
        section: &str,
        area: Area,
        height: f32,
        visibility: Option<Visibility>,
    ) -> MeasuredElement {
        MeasuredElement {
            element: ExpandedElement {
                kind,
                section: section.to_string(),
                area,
                visibility,
                fixed_y: None,
                component_margin: 0.0,
                content: ElementContent::Text(TextBlock::new("x", TextStyle::body())),
            },
            height,
            margin_bottom_total: 0.0,
        }
    }

    fn content_line(section: &str, height: f32) -> MeasuredElement {
        measured(ComponentKind::Levels, section, Area::Content, height, None)
    }

    #[test]
    fn break_after_twenty_eight_thirty_unit_elements() {
        // 40 + 28×30 = 880 ≤ 900; the 29th would project to 910.
        let elements: Vec<MeasuredElement> =
            (0..40).map(|_| content_line("budget", 30.0)).collect();
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[0].boxes.len(), 28);
        assert_eq!(layout.pages[1].boxes.len(), 12);
    }

    #[test]
    fn empty_document_still_has_one_page() {
        let layout = paginate(&[], &geometry(), &FontManager::new()).unwrap();
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].boxes.is_empty());
    }

    #[test]
    fn oversized_element_is_fatal_and_names_component() {
        let elements = vec![content_line("budget", 2000.0)];
        let err = paginate(&elements, &geometry(), &FontManager::new()).unwrap_err();
        match err {
            LayoutError::Oversized {
                section, component, ..
            } => {
                assert_eq!(section, "budget");
                assert_eq!(component, "levels");
            }
        }
    }

    #[test]
    fn flow_elements_never_cross_the_lower_bound() {
        let elements: Vec<MeasuredElement> = (0..100)
            .map(|i| content_line("budget", 17.0 + (i % 5) as f32))
            .collect();
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        for page in &layout.pages {
            for b in &page.boxes {
                assert!(
                    b.y + b.height <= 900.0 + 0.001,
                    "box at y={} h={} crosses the lower bound",
                    b.y,
                    b.height
                );
            }
        }
    }

    #[test]
    fn headers_are_reissued_on_every_page_of_their_section() {
        let mut elements = vec![measured(
            ComponentKind::Company,
            "budget",
            Area::Header,
            50.0,
            None,
        )];
        elements.extend((0..40).map(|_| content_line("budget", 30.0)));
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert_eq!(layout.page_count(), 2);
        // Header occupies the top of both pages; content follows below it.
        for page in &layout.pages {
            assert_eq!(page.boxes[0].y, 40.0);
            assert_eq!(page.boxes[0].height, 50.0);
            assert_eq!(page.boxes[1].y, 90.0);
        }
    }

    #[test]
    fn first_visibility_appears_exactly_once_on_page_one() {
        let mut elements = vec![measured(
            ComponentKind::Title,
            "budget",
            Area::Header,
            20.0,
            Some(Visibility::First),
        )];
        elements.extend((0..60).map(|_| content_line("budget", 30.0)));
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert!(layout.page_count() >= 2);
        // Page 1 carries the header plus content; later pages only content.
        assert!(layout.pages[0].boxes[0].y == 40.0 && layout.pages[0].boxes[0].height == 20.0);
        let later_header_sized: usize = layout.pages[1..]
            .iter()
            .flat_map(|p| &p.boxes)
            .filter(|b| b.height == 20.0)
            .count();
        assert_eq!(later_header_sized, 0);
    }

    #[test]
    fn last_visibility_is_placed_once_on_the_final_page() {
        let mut elements: Vec<MeasuredElement> =
            (0..40).map(|_| content_line("budget", 30.0)).collect();
        elements.push(measured(
            ComponentKind::Signatures,
            "budget",
            Area::Footer,
            44.0,
            Some(Visibility::Last),
        ));
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert_eq!(layout.page_count(), 2);
        let on_first: usize = layout.pages[0]
            .boxes
            .iter()
            .filter(|b| b.height == 44.0)
            .count();
        let on_last: usize = layout.pages[1]
            .boxes
            .iter()
            .filter(|b| b.height == 44.0)
            .count();
        assert_eq!(on_first, 0);
        assert_eq!(on_last, 1);
    }

    #[test]
    fn page_counters_resolve_after_total_is_known() {
        let mut elements: Vec<MeasuredElement> =
            (0..40).map(|_| content_line("budget", 30.0)).collect();
        elements.push(MeasuredElement {
            element: ExpandedElement {
                kind: ComponentKind::Pagination,
                section: "budget".to_string(),
                area: Area::Footer,
                visibility: None,
                fixed_y: Some(960.0),
                component_margin: 0.0,
                content: ElementContent::PageCounter {
                    style: TextStyle::sized(8.0),
                },
            },
            height: 10.0,
            margin_bottom_total: 0.0,
        });
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert_eq!(layout.page_count(), 2);
        let texts: Vec<String> = layout
            .pages
            .iter()
            .flat_map(|p| &p.boxes)
            .filter(|b| b.y == 960.0)
            .map(|b| b.text.as_ref().unwrap().lines[0].text.clone())
            .collect();
        assert_eq!(texts, vec!["Page 1 of 2", "Page 2 of 2"]);
    }

    #[test]
    fn fixed_elements_do_not_advance_the_cursor() {
        let mut fixed = content_line("budget", 30.0);
        fixed.element.fixed_y = Some(500.0);
        let elements = vec![fixed, content_line("budget", 30.0)];
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        let ys: Vec<f32> = layout.pages[0].boxes.iter().map(|b| b.y).collect();
        assert_eq!(ys, vec![500.0, 40.0]);
    }

    #[test]
    fn sections_start_on_fresh_pages() {
        let elements = vec![
            content_line("summary", 30.0),
            content_line("budget", 30.0),
            content_line("conditions", 30.0),
        ];
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert_eq!(layout.page_count(), 3);
        for page in &layout.pages {
            assert_eq!(page.boxes.len(), 1);
            assert_eq!(page.boxes[0].y, 40.0);
        }
    }

    #[test]
    fn footers_flush_on_each_page_of_a_section() {
        let mut elements = vec![measured(
            ComponentKind::Separator,
            "budget",
            Area::Footer,
            2.0,
            None,
        )];
        elements.splice(0..0, (0..40).map(|_| content_line("budget", 30.0)));
        let layout = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert_eq!(layout.page_count(), 2);
        for page in &layout.pages {
            assert_eq!(
                page.boxes.iter().filter(|b| b.height == 2.0).count(),
                1,
                "footer missing on page {}",
                page.number
            );
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let elements: Vec<MeasuredElement> = (0..80)
            .map(|i| content_line("budget", 10.0 + (i % 7) as f32))
            .collect();
        let a = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        let b = paginate(&elements, &geometry(), &FontManager::new()).unwrap();
        assert_eq!(a, b);
    }
}

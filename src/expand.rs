//! Element expansion – combines a [`TemplateSchema`] with a
//! [`DocumentPayload`] into the ordered element list the rest of the pipeline
//! consumes.
//!
//! Sections are processed in schema order; within a section the areas always
//! run header → content → footer. Singleton components emit exactly one
//! element, `levels` emits one element per budget line, `note` one element
//! per paragraph chunk. Elements preserve payload order throughout.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::element::{Align, Area, ElementContent, ExpandedElement, LogoRef, TextBlock, TextStyle};
use crate::error::ExpandError;
use crate::note::split_note;
use crate::payload::{BudgetLine, Client, Company, DocumentPayload, LineLevel, SectionData, Totals};
use crate::schema::{ComponentConfig, ComponentKind, TemplateSchema};

/// Indent step per budget-line hierarchy level.
const LEVEL_INDENT: f32 = 12.0;

/// Logos taller than this are scaled down, preserving aspect ratio.
const LOGO_MAX_HEIGHT: f32 = 56.0;

/// Expand the schema against the payload into the full, ordered element list.
pub fn expand(
    schema: &TemplateSchema,
    payload: &DocumentPayload,
) -> Result<Vec<ExpandedElement>, ExpandError> {
    let mut elements = Vec::new();

    for section in &schema.sections {
        let data = payload.section(&section.name);

        if data.is_none() {
            let needs_data = section
                .component_names()
                .any(|name| ComponentKind::from_name(name).requires_data());
            if needs_data {
                return Err(ExpandError::MissingSection {
                    section: section.name.clone(),
                });
            }
        }

        for (area, names) in [
            (Area::Header, &section.header),
            (Area::Content, &section.content),
            (Area::Footer, &section.footer),
        ] {
            for name in names {
                let config = schema.resolve(&section.name, name)?;
                expand_component(
                    name,
                    config,
                    &section.name,
                    area,
                    payload,
                    data,
                    &mut elements,
                );
            }
        }
    }

    Ok(elements)
}

#[allow(clippy::too_many_arguments)]
fn expand_component(
    name: &str,
    config: &ComponentConfig,
    section: &str,
    area: Area,
    payload: &DocumentPayload,
    data: Option<&SectionData>,
    out: &mut Vec<ExpandedElement>,
) {
    let kind = ComponentKind::from_name(name);

    let emit = |out: &mut Vec<ExpandedElement>, kind: ComponentKind, content: ElementContent| {
        out.push(ExpandedElement {
            kind,
            section: section.to_string(),
            area,
            visibility: config.visibility,
            fixed_y: config.fixed_position(),
            component_margin: config.margin_bottom,
            content,
        });
    };

    match &kind {
        ComponentKind::Company => {
            let content = company_content(&payload.company);
            emit(out, kind, content);
        }
        ComponentKind::Title => match data.and_then(|d| d.title.as_deref()) {
            Some(title) if !title.trim().is_empty() => {
                let style = styled(&payload.company, name, TextStyle::sized(13.0).bold());
                emit(out, kind, ElementContent::Text(TextBlock::new(title.trim(), style)));
            }
            _ => log::debug!("section '{section}': no title text, skipping"),
        },
        ComponentKind::Client => match data.and_then(|d| d.client.as_ref()) {
            Some(client) => {
                let style = styled(&payload.company, name, TextStyle::body());
                emit(
                    out,
                    kind,
                    ElementContent::Text(TextBlock::new(client_text(client), style)),
                );
            }
            None => log::debug!("section '{section}': no client block, skipping"),
        },
        ComponentKind::Levels => {
            let lines = data.map(|d| d.levels.as_slice()).unwrap_or_default();
            if lines.is_empty() {
                log::warn!("section '{section}': levels component with no budget lines");
                return;
            }
            for line in lines {
                let style = styled(&payload.company, name, level_style(line.level));
                let indent = (line.depth().saturating_sub(1)) as f32 * LEVEL_INDENT;
                emit(
                    out,
                    ComponentKind::Levels,
                    ElementContent::Text(
                        TextBlock::new(budget_line_text(line), style).indented(indent),
                    ),
                );
            }
        }
        ComponentKind::Totals => match data.and_then(|d| d.totals.as_ref()) {
            Some(totals) => {
                let style = styled(
                    &payload.company,
                    name,
                    TextStyle::sized(9.5).aligned(Align::Right),
                );
                emit(
                    out,
                    kind,
                    ElementContent::Text(TextBlock::new(totals_text(totals), style)),
                );
            }
            None => log::debug!("section '{section}': no totals block, skipping"),
        },
        ComponentKind::Note => {
            let note = data.and_then(|d| d.note.as_deref()).unwrap_or("");
            let chunks = split_note(note);
            if chunks.is_empty() {
                log::debug!("section '{section}': empty note, no elements emitted");
            }
            for chunk in chunks {
                let style = styled(&payload.company, name, TextStyle::body());
                emit(
                    out,
                    ComponentKind::Note,
                    ElementContent::Text(TextBlock::new(chunk, style)),
                );
            }
        }
        ComponentKind::Signatures => {
            let client_name = data
                .and_then(|d| d.client.as_ref())
                .map(|c| c.name.as_str())
                .unwrap_or("The client");
            let text = format!(
                "Agreed and accepted\n\n\n{}\n\n\n{}",
                payload.company.name, client_name
            );
            let style = styled(&payload.company, name, TextStyle::body());
            emit(out, kind, ElementContent::Text(TextBlock::new(text, style)));
        }
        ComponentKind::Pagination => {
            let style = styled(
                &payload.company,
                name,
                TextStyle::sized(8.0).aligned(Align::Center),
            );
            emit(out, kind, ElementContent::PageCounter { style });
        }
        ComponentKind::Separator => emit(out, kind, ElementContent::Separator),
        ComponentKind::Unrecognized(other) => {
            log::warn!("section '{section}': unrecognized component '{other}', skipped");
        }
    }
}

/// Apply any matching company style override on top of the base style.
fn styled(company: &Company, component: &str, base: TextStyle) -> TextStyle {
    let Some(ov) = company
        .style_overrides
        .iter()
        .find(|o| o.component == component)
    else {
        return base;
    };
    TextStyle {
        font_size: ov.font_size.unwrap_or(base.font_size),
        bold: ov.bold.unwrap_or(base.bold),
        ..base
    }
}

fn level_style(level: LineLevel) -> TextStyle {
    match level {
        LineLevel::Chapter => TextStyle::sized(10.5).bold(),
        LineLevel::Subchapter => TextStyle::sized(9.5).bold(),
        LineLevel::Section => TextStyle::sized(9.0).bold(),
        LineLevel::Item => TextStyle::body(),
    }
}

fn company_content(company: &Company) -> ElementContent {
    let mut lines = vec![company.name.clone()];
    if let Some(tax_id) = &company.tax_id {
        lines.push(tax_id.clone());
    }
    if let Some(address) = &company.address {
        lines.push(address.clone());
    }
    if let Some(contact) = &company.contact {
        lines.push(contact.clone());
    }
    let block = TextBlock::new(lines.join("\n"), TextStyle::body());
    let logo = company.logo.as_deref().and_then(resolve_logo);
    ElementContent::Company { logo, block }
}

fn client_text(client: &Client) -> String {
    let mut lines = vec![client.name.clone()];
    if let Some(tax_id) = &client.tax_id {
        lines.push(tax_id.clone());
    }
    if let Some(address) = &client.address {
        lines.push(address.clone());
    }
    if let Some(contact) = &client.contact {
        lines.push(contact.clone());
    }
    lines.join("\n")
}

fn format_amount(v: f64) -> String {
    format!("{v:.2}")
}

fn budget_line_text(line: &BudgetLine) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(q) = line.quantity {
        let mut measure = format!("{q:.2}");
        if let Some(unit) = &line.unit {
            measure.push(' ');
            measure.push_str(unit);
        }
        if let Some(price) = line.unit_price {
            measure.push_str(&format!(" x {}", format_amount(price)));
        }
        parts.push(measure);
    }
    if let Some(pct) = line.percentage {
        parts.push(format!("{pct:.2} %"));
    }
    parts.push(format_amount(line.amount));

    let mut text = format!("{}  {}    {}", line.id, line.name, parts.join("   "));
    if let Some(description) = &line.description {
        if !description.trim().is_empty() {
            text.push('\n');
            text.push_str(description.trim());
        }
    }
    text
}

fn totals_text(totals: &Totals) -> String {
    let mut lines = vec![format!("Taxable base   {}", format_amount(totals.base))];
    for group in &totals.vat_groups {
        lines.push(format!(
            "VAT {:.2} % on {}   {}",
            group.rate,
            format_amount(group.base),
            format_amount(group.amount)
        ));
    }
    if let Some(subtotal) = totals.subtotal {
        lines.push(format!("Subtotal   {}", format_amount(subtotal)));
    }
    if let Some(withholding) = &totals.withholding {
        lines.push(format!(
            "Withholding {:.2} %   {}",
            withholding.rate,
            format_amount(withholding.amount)
        ));
    }
    for surcharge in &totals.surcharges {
        lines.push(format!(
            "Equivalence surcharge {:.2} %   {}",
            surcharge.rate,
            format_amount(surcharge.amount)
        ));
    }
    lines.push(format!("TOTAL   {}", format_amount(totals.total)));
    lines.join("\n")
}

/// Decode a base64 data-URI logo to resolve its intrinsic dimensions, scaled
/// down to `LOGO_MAX_HEIGHT`. Undecodable logos degrade to text-only.
fn resolve_logo(src: &str) -> Option<LogoRef> {
    if !src.starts_with("data:") || !src.contains(";base64,") {
        log::warn!("company logo is not a base64 data URI, skipping");
        return None;
    }
    let comma = src.find(',')?;
    let bytes = match BASE64_STD.decode(src[comma + 1..].trim()) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("company logo base64 decode failed: {e}");
            return None;
        }
    };
    let img = match image::load_from_memory(&bytes) {
        Ok(i) => i,
        Err(e) => {
            log::warn!("company logo image decode failed: {e}");
            return None;
        }
    };
    let (w, h) = (img.width() as f32, img.height() as f32);
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    let scale = (LOGO_MAX_HEIGHT / h).min(1.0);
    Some(LogoRef {
        src: src.to_string(),
        width: w * scale,
        height: h * scale,
    })
}

//! PDF materialization – projects a [`DocumentLayout`] into PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Rendering never alters layout decisions: every box is drawn exactly where
//! pagination placed it. Descriptive metadata (title, author, subject,
//! producer, keywords, timestamps) comes from the payload's metadata block,
//! not from printpdf defaults.

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::RenderError;
use crate::layout_tree::{DocumentLayout, LayoutBox};
use crate::payload::DocumentMeta;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Materialize a laid-out document into PDF bytes.
///
/// Logos whose `src` is not a decodable base64 data URI are skipped with a
/// `log::warn` (the layout keeps their reserved space).
pub fn materialize(layout: &DocumentLayout, meta: &DocumentMeta) -> Result<Vec<u8>, RenderError> {
    let page_w = Mm(layout.page_width * 0.352778); // pt → mm
    let page_h = Mm(layout.page_height * 0.352778);

    let mut doc = PdfDocument::new(&meta.title);
    apply_metadata(&mut doc, meta);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page in &layout.pages {
        for lbox in &page.boxes {
            if let Some(img) = &lbox.image {
                all_srcs.insert(img.src.as_str());
            }
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image — {e}");
                continue;
            }
        };

        // Decode with the `image` crate to obtain pixel dimensions.
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image — decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image — PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();
    for page_layout in &layout.pages {
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, layout.page_height, &image_resources);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());

    if bytes.is_empty() {
        return Err(RenderError::Backend(
            "printpdf produced an empty document".to_string(),
        ));
    }
    Ok(bytes)
}

/// Embed the payload's descriptive metadata into the PDF info dictionary.
fn apply_metadata(doc: &mut PdfDocument, meta: &DocumentMeta) {
    let info = &mut doc.metadata.info;
    info.document_title = meta.title.clone();
    info.author = meta.author.clone();
    info.subject = meta.subject.clone();
    info.producer = meta.producer.clone();
    info.creator = meta.producer.clone();
    info.keywords = meta.keywords.clone();
    if let Some(created) = meta.created {
        if let Ok(date) = OffsetDateTime::from_unix_timestamp(created.timestamp()) {
            info.creation_date = date;
        }
    }
    if let Some(modified) = meta.modified {
        if let Ok(date) = OffsetDateTime::from_unix_timestamp(modified.timestamp()) {
            info.modification_date = date;
        }
    }
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    if !src.starts_with("data:") {
        let preview = if src.len() > 80 { &src[..80] } else { src };
        return Err(format!(
            "Image src must be a base64 data URI \
             (e.g. `data:image/png;base64,...`). Got: {preview:?}"
        ));
    }
    let rest = &src["data:".len()..];
    let comma_pos = rest.find(',').ok_or_else(|| {
        "Invalid data URI: missing `,` separator between header and data".to_string()
    })?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("Only base64-encoded data URIs are supported. \
             The header must contain `;base64` (e.g. `data:image/png;base64,...`)."
            .to_string());
    }
    let b64_data = rest[comma_pos + 1..].trim();
    BASE64_STD
        .decode(b64_data)
        .map_err(|e| format!("Base64 decode error: {e}"))
}

/// Render one LayoutBox into PDF ops.
fn render_box(
    ops: &mut Vec<Op>,
    lbox: &LayoutBox,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
) {
    // PDF coordinate system: origin at bottom-left.
    // The layout tree uses origin at top-left. Convert:
    let pdf_y = page_height - lbox.y;

    // Horizontal rule
    if lbox.rule {
        let rule_y = pdf_y - lbox.height / 2.0;
        ops.push(Op::SetOutlineThickness { pt: Pt(0.75) });
        ops.push(Op::SetOutlineColor {
            col: Color::Rgb(Rgb {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                icc_profile: None,
            }),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    LinePoint {
                        p: Point {
                            x: Pt(lbox.x),
                            y: Pt(rule_y),
                        },
                        bezier: false,
                    },
                    LinePoint {
                        p: Point {
                            x: Pt(lbox.x + lbox.width),
                            y: Pt(rule_y),
                        },
                        bezier: false,
                    },
                ],
                is_closed: false,
            },
        });
    }

    // Text
    if let Some(text) = &lbox.text {
        let font = match (text.bold, text.italic) {
            (true, true) => BuiltinFont::HelveticaBoldOblique,
            (true, false) => BuiltinFont::HelveticaBold,
            (false, true) => BuiltinFont::HelveticaOblique,
            (false, false) => BuiltinFont::Helvetica,
        };
        let line_height = text.line_height;

        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            // Baseline ≈ top of line + ascender (approx 0.75 × font_size)
            let ascender_offset = text.font_size * 0.75;
            let text_y = pdf_y - tline.y_offset - ascender_offset;

            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(text_x),
                    y: Pt(text_y),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font,
            });
            ops.push(Op::SetLineHeight {
                lh: Pt(line_height),
            });
            ops.push(Op::SetFillColor {
                col: Color::Rgb(Rgb {
                    r: 0.0,
                    g: 0.0,
                    b: 0.0,
                    icc_profile: None,
                }),
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(&tline.text))],
                font,
            });
            ops.push(Op::EndTextSection);
        }
    }

    // Image – embed from pre-registered XObject
    if let Some(img) = &lbox.image {
        if let Some(res) = images.get(&img.src) {
            // translate_y = bottom edge of the image in PDF coordinates.
            let img_bottom_y = page_height - lbox.y - img.height;

            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_tree::PageLayout;

    fn meta() -> DocumentMeta {
        DocumentMeta {
            title: "Quote 2026-001".to_string(),
            author: "Acme Corp".to_string(),
            subject: "Price quote".to_string(),
            producer: "quotepress".to_string(),
            keywords: vec!["quote".to_string()],
            created: None,
            modified: None,
        }
    }

    #[test]
    fn render_empty_layout() {
        let layout = DocumentLayout {
            title: "Quote".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            pages: vec![PageLayout {
                number: 1,
                boxes: Vec::new(),
            }],
        };
        let bytes = materialize(&layout, &meta()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn winlatin_maps_euro_sign() {
        let s = to_winlatin("12,50 \u{20AC}");
        assert_eq!(s.as_bytes().last(), Some(&0x80));
    }

    #[test]
    fn data_uri_rejects_plain_paths() {
        assert!(parse_data_uri("logo.png").is_err());
        assert!(parse_data_uri("data:image/png;base64,aGVsbG8=").is_ok());
    }
}

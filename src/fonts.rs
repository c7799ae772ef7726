//! Font metrics and word wrapping – the engine behind the default
//! measurement backend.
//!
//! When a TTF/OTF face is loaded, widths come from real glyph advances via
//! `ttf-parser`; otherwise a Helvetica-like heuristic keeps measurement
//! deterministic without any font files on disk.

use std::collections::HashMap;

use crate::element::TextStyle;

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FontKey {
    bold: bool,
    italic: bool,
}

/// Manages loaded font faces, keyed by weight/slant.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
        }
    }

    /// Load a TTF/OTF face for the given weight/slant.
    pub fn load_font(&mut self, bold: bool, italic: bool, bytes: Vec<u8>) -> Result<(), String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("failed to parse font: {e}"))?;
        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            bytes,
        };
        self.fonts.insert(FontKey { bold, italic }, data);
        Ok(())
    }

    /// Width of a string at the style's font size.
    pub fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        let key = FontKey {
            bold: style.bold,
            italic: style.italic,
        };
        let Some(data) = self.fonts.get(&key).filter(|d| !d.bytes.is_empty()) else {
            // Heuristic: average char width ≈ 0.5 × font_size for
            // proportional faces, bold ~10 % wider.
            let avg = if style.bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * style.font_size * avg;
        };

        if let Ok(face) = ttf_parser::Face::parse(&data.bytes, 0) {
            let scale = style.font_size / data.units_per_em;
            let mut width = 0.0f32;
            for ch in text.chars() {
                if let Some(gid) = face.glyph_index(ch) {
                    width += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
                } else {
                    width += style.font_size * 0.5;
                }
            }
            width
        } else {
            text.chars().count() as f32 * style.font_size * 0.5
        }
    }

    /// Line height for the style, in layout units.
    pub fn line_height(&self, style: &TextStyle) -> f32 {
        style.font_size * style.line_height
    }

    pub fn has_real_fonts(&self) -> bool {
        self.fonts.values().any(|d| !d.bytes.is_empty())
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Word-wrap text to fit within `max_width` units. Existing newlines are
/// hard breaks. Returns at least one line.
pub fn wrap_text(text: &str, style: &TextStyle, max_width: f32, fonts: &FontManager) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in &words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current_line, word)
            };
            if fonts.text_width(&candidate, style) > max_width && !current_line.is_empty() {
                lines.push(current_line);
                current_line = word.to_string();
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

//! Pipeline – ties expansion, measurement, pagination, and rendering into a
//! single generation call.
//!
//! A generation is a strict three-phase run: expand → measure → layout(+
//! render). It completes or fails atomically; no partial artifact is ever
//! returned. For concurrent generations use [`Composer`], which owns a pool
//! of measurement backends and hands one out per generation.

use crate::error::GenerateError;
use crate::expand::expand;
use crate::fonts::FontManager;
use crate::layout_tree::DocumentLayout;
use crate::measure::{measure_all, MeasureBackend, TextMeasurer};
use crate::paginate::paginate;
use crate::payload::{DocumentPayload, OutputMode};
use crate::pool::BackendPool;
use crate::render::materialize;
use crate::schema::TemplateSchema;

/// The outcome of one generation: the laid-out tree, plus PDF bytes when the
/// payload asked for `final` output.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub layout: DocumentLayout,
    pub pdf: Option<Vec<u8>>,
}

impl GeneratedDocument {
    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }
}

/// Generate one document with a fresh default measurement backend.
pub fn generate(
    payload: &DocumentPayload,
    schema: &TemplateSchema,
) -> Result<GeneratedDocument, GenerateError> {
    let backend = TextMeasurer::new();
    generate_with(payload, schema, &backend, backend.fonts())
}

/// Generate one document with an explicit measurement backend. The caller
/// must not share `backend` with another in-flight generation.
pub fn generate_with<B: MeasureBackend>(
    payload: &DocumentPayload,
    schema: &TemplateSchema,
    backend: &B,
    fonts: &FontManager,
) -> Result<GeneratedDocument, GenerateError> {
    schema.page.validate()?;
    payload.validate()?;

    // 1. Expand schema × payload into the ordered element list.
    let elements = expand(schema, payload)?;
    log::debug!("expanded {} elements", elements.len());

    // 2. Measure every element and attach bottom margins.
    let measured = measure_all(elements, backend, &schema.page);

    // 3. Paginate.
    let mut layout = paginate(&measured, &schema.page, fonts)?;
    layout.title = payload.meta.title.clone();
    log::debug!("laid out {} pages", layout.page_count());

    // 4. Materialize, unless the caller only wants the tree.
    let pdf = match payload.mode {
        OutputMode::DraftPreview => None,
        OutputMode::Final => Some(materialize(&layout, &payload.meta)?),
    };

    Ok(GeneratedDocument { layout, pdf })
}

/// Generation front-end for concurrent use: a pool of measurement backends,
/// one borrowed exclusively per generation.
pub struct Composer {
    backends: BackendPool<TextMeasurer>,
}

impl Composer {
    /// Pool sized to the desired generation concurrency.
    pub fn new(concurrency: usize) -> Self {
        Self {
            backends: BackendPool::with_capacity(concurrency, TextMeasurer::new),
        }
    }

    /// Build a pool from pre-configured backends (e.g. with loaded fonts).
    pub fn with_backends(backends: Vec<TextMeasurer>) -> Self {
        Self {
            backends: BackendPool::new(backends),
        }
    }

    pub fn generate(
        &self,
        payload: &DocumentPayload,
        schema: &TemplateSchema,
    ) -> Result<GeneratedDocument, GenerateError> {
        let backend = self.backends.acquire();
        generate_with(payload, schema, &*backend, backend.fonts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{sample_payload, standard_quote_schema};

    #[test]
    fn pipeline_basic() {
        let payload = sample_payload();
        let schema = standard_quote_schema();
        let doc = generate(&payload, &schema).unwrap();
        assert!(doc.page_count() >= 1);
        let pdf = doc.pdf.expect("final mode produces PDF bytes");
        assert_eq!(&pdf[0..5], b"%PDF-");
    }

    #[test]
    fn draft_preview_skips_the_binary() {
        let mut payload = sample_payload();
        payload.mode = OutputMode::DraftPreview;
        let doc = generate(&payload, &standard_quote_schema()).unwrap();
        assert!(doc.pdf.is_none());
        assert!(!doc.layout.pages.is_empty());
        assert_eq!(doc.layout.title, payload.meta.title);
    }

    #[test]
    fn generation_is_deterministic() {
        let mut payload = sample_payload();
        payload.mode = OutputMode::DraftPreview;
        let schema = standard_quote_schema();
        let a = generate(&payload, &schema).unwrap();
        let b = generate(&payload, &schema).unwrap();
        assert_eq!(a.layout, b.layout);
    }

    #[test]
    fn composer_runs_generations_concurrently() {
        let composer = std::sync::Arc::new(Composer::new(2));
        let schema = std::sync::Arc::new(standard_quote_schema());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let composer = std::sync::Arc::clone(&composer);
            let schema = std::sync::Arc::clone(&schema);
            handles.push(std::thread::spawn(move || {
                let mut payload = sample_payload();
                payload.mode = OutputMode::DraftPreview;
                composer.generate(&payload, &schema).unwrap().page_count()
            }));
        }
        for handle in handles {
            assert!(handle.join().unwrap() >= 1);
        }
    }
}

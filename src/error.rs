//! Structured error types for the composition pipeline.
//!
//! Fatal conditions abort the whole generation and carry enough context to
//! name the phase, section, and component involved. Recoverable conditions
//! (single measurement failures, empty repeating components, unrecognized
//! component kinds) never surface here — they are absorbed and logged at the
//! point of occurrence.

use thiserror::Error;

/// Top-level error returned by a document generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("expand: {0}")]
    Expand(#[from] ExpandError),

    #[error("layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("render: {0}")]
    Render(#[from] RenderError),
}

/// Payload invariant violations, checked before expansion.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("duplicate budget line id '{id}' in section '{section}'")]
    DuplicateLineId { section: String, id: String },

    #[error("budget line id '{id}' in section '{section}' exceeds the maximum depth of {max} levels")]
    LineTooDeep {
        section: String,
        id: String,
        max: usize,
    },

    #[error("budget line id '{id}' in section '{section}' has no preceding parent line")]
    OrphanLine { section: String, id: String },
}

/// Schema problems, checked before expansion.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("invalid page geometry: {reason}")]
    InvalidGeometry { reason: String },
}

/// Fatal conditions during element expansion.
#[derive(Debug, Error, PartialEq)]
pub enum ExpandError {
    #[error("component '{component}' declared in section '{section}' is not registered in the template")]
    MissingComponent { section: String, component: String },

    #[error("section '{section}' declares data-bearing components but the payload has no such section")]
    MissingSection { section: String },
}

/// Fatal conditions during pagination.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error(
        "element '{component}' in section '{section}' is {height} units tall and can never fit \
         a page (available content height {available})"
    )]
    Oversized {
        section: String,
        component: String,
        height: f32,
        available: f32,
    },
}

/// Recoverable measurement failure for a single element. Absorbed by the
/// measurement phase (default-height fallback), never aborts a generation.
#[derive(Debug, Error, PartialEq)]
pub enum MeasureError {
    #[error("measurement backend failed: {0}")]
    Backend(String),
}

/// Fatal render-backend failure; the backend message is surfaced verbatim.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("{0}")]
    Backend(String),
}

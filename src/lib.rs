//! # quotepress – quote-document composition engine
//!
//! Turns a structured quote payload and a declarative template schema into a
//! paginated, print-ready document. The pipeline stages are:
//!
//! 1. **Expand** – schema × payload → ordered element list ([`expand`])
//! 2. **Measure** – attach rendered heights via a measurement backend
//!    ([`measure`])
//! 3. **Paginate** – flow elements into pages, re-issuing running
//!    headers/footers across page breaks ([`paginate`])
//! 4. **Render** – emit PDF bytes with payload metadata via printpdf
//!    ([`render`])
//!
//! In `draft-preview` mode the pipeline stops after pagination and returns
//! only the laid-out tree ([`layout_tree::DocumentLayout`]).

pub mod element;
pub mod error;
pub mod expand;
pub mod fonts;
pub mod layout_tree;
pub mod measure;
pub mod note;
pub mod page;
pub mod paginate;
pub mod payload;
pub mod pipeline;
pub mod pool;
pub mod render;
pub mod schema;
pub mod templates;

// Re-exports for convenience
pub use error::GenerateError;
pub use pipeline::{generate, generate_with, Composer, GeneratedDocument};

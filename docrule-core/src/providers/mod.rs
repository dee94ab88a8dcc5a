//! Document Model Providers
//!
//! Providers turn a file on disk into the read-only `Document` model the
//! engine works on. They only parse: raw measurements stay in the units the
//! format writes them in and are normalized later.
//!
//! ## Architecture
//!
//! ```text
//! File (DOCX, JSON model)
//!     ↓
//! [Format-specific DocumentProvider]
//!     ↓
//! Document (styles, numbering, body blocks, sections, headers/footers)
//!     ↓
//! [Resolver + Classifier + Checkers]
//! ```
//!
//! ## Available Providers
//!
//! - `DocxProvider` - WordprocessingML packages (`zip` + `quick-xml`)
//! - `JsonProvider` - a serialized `Document`, for fixtures and pre-converted input

pub mod docx;
pub mod json;
mod xml_tree;

pub use docx::DocxProvider;
pub use json::JsonProvider;

use crate::document::Document;
use anyhow::Result;
use std::path::Path;

/// Opens a document and hands back the model tree.
pub trait DocumentProvider: Send + Sync {
    /// Provider name for debugging/logging
    fn name(&self) -> &str;

    /// Whether this provider can open the given file
    fn supports(&self, path: &Path) -> bool;

    fn open(&self, path: &Path) -> Result<Document>;
}

/// Case-insensitive extension match.
pub(crate) fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| wanted.iter().any(|w| ext.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

/// Every built-in provider, in lookup order.
pub fn default_providers() -> Vec<Box<dyn DocumentProvider>> {
    vec![Box::new(DocxProvider), Box::new(JsonProvider)]
}

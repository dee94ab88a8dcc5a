// docrule Core Library
//
// Checks a word-processing document against a formatting ruleset: resolves
// every attribute through the style cascade, classifies paragraphs into
// structural contexts, and validates each context with its own checker.

pub mod annotator;
pub mod cascade;
pub mod classifier;
pub mod config;
pub mod document;
pub mod error;
pub mod processor;
pub mod providers;
pub mod report;
pub mod rules;
pub mod ruleset;
pub mod storage;
pub mod types;
pub mod units;

// Re-export main types and functions for easy use
pub use types::*;
pub use annotator::{AnnotationSummary, Annotator};
pub use config::CheckConfig;
pub use document::{Document, NodeRef};
pub use error::DocruleError;
pub use processor::{check_document, check_document_with_config, DocumentChecker};
pub use providers::{DocumentProvider, DocxProvider, JsonProvider};
pub use report::{emit_report, CollectingSink, LogSink, ReportSink, WriterSink};
pub use ruleset::Ruleset;
pub use storage::RulesetStore;

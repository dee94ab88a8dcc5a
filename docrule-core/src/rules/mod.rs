// Rule system: validators, one checker per structural context, and the
// engine that fans them out.
// - engine.rs: Checker trait, CheckContext and the parallel CheckEngine
// - validators.rs: pure attribute comparisons
// - paragraph.rs: format checks shared by every paragraph context
// - one module per context checker

pub mod engine;
pub mod validators;
pub mod paragraph;

pub mod captions;
pub mod headings;
pub mod lists;
pub mod page_setup;
pub mod plain_text;
pub mod tables;
pub mod toc;

pub use engine::*;

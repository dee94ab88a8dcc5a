use std::path::PathBuf;
use thiserror::Error;

/// Errors a caller may want to match on. Everything else travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum DocruleError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid document package: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("malformed XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("document package is missing required part {0}")]
    MissingPart(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("no ruleset with id '{0}'")]
    UnknownRuleset(String),

    #[error("could not parse ruleset file {path}: {source}")]
    RulesetParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("source document changed since it was checked (expected sha256 {expected}, found {actual})")]
    SourceChanged { expected: String, actual: String },

    #[error("report has no source document to annotate")]
    NoSource,
}

impl DocruleError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn xml(part: &str, source: quick_xml::Error) -> Self {
        Self::Xml {
            part: part.to_string(),
            source,
        }
    }
}

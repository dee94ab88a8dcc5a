use super::{has_extension, DocumentProvider};
use crate::document::{Document, SourceInfo};
use crate::error::DocruleError;
use crate::storage::sha256_hex;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Reads a serialized `Document` model, as written by `serde_json` from the
/// DOCX provider's output or produced by an external converter.
pub struct JsonProvider;

impl DocumentProvider for JsonProvider {
    fn name(&self) -> &str {
        "JsonProvider"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn open(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path).map_err(|e| DocruleError::io(path, e))?;
        let mut document: Document = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse document model: {}", path.display()))?;
        // A model file is not an annotatable package; keep whatever source the
        // model itself names, otherwise point at the model file.
        if document.source.is_none() {
            document.source = Some(SourceInfo {
                path: path.display().to_string(),
                sha256: sha256_hex(&bytes),
            });
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Paragraph, Run};
    use std::io::Write;

    #[test]
    fn reads_serialized_model() {
        let document = Document {
            body: vec![Block::Paragraph(Paragraph {
                runs: vec![Run {
                    text: "hello".to_string(),
                    ..Run::default()
                }],
                ..Paragraph::default()
            })],
            ..Document::default()
        };
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(serde_json::to_string(&document).unwrap().as_bytes())
            .unwrap();

        let loaded = JsonProvider.open(file.path()).unwrap();
        assert_eq!(loaded.flatten()[0].paragraph.text(), "hello");
        assert!(loaded.source.is_some());
    }

    #[test]
    fn minimal_model_only_needs_a_body() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"body": [{"type": "paragraph", "runs": [{"text": "x"}]}]}"#)
            .unwrap();
        let loaded = JsonProvider.open(file.path()).unwrap();
        assert_eq!(loaded.flatten().len(), 1);
        assert!(loaded.styles.styles.is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(JsonProvider.open(file.path()).is_err());
    }
}

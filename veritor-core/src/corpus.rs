//! Trusted corpus loading.
//!
//! The corpus is a JSON array of `{id?, text}` records loaded once at
//! startup and immutable for the process lifetime. Schema violations are
//! fatal at startup, never recoverable per-request.

use crate::error::CorpusError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One passage of trusted reference text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub id: String,
    pub text: String,
}

/// Raw on-disk record; ids are optional and derived from position.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// The loaded, validated corpus.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<CorpusDocument>,
}

impl Corpus {
    /// Load and validate a corpus file.
    ///
    /// Fails on a missing file, unparseable JSON, an empty array, or any
    /// record whose text is missing or blank.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        if !path.exists() {
            return Err(CorpusError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|e| CorpusError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let records: Vec<RawDocument> =
            serde_json::from_str(&raw).map_err(|e| CorpusError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_records(records, path)
    }

    fn from_records(records: Vec<RawDocument>, path: &Path) -> Result<Self, CorpusError> {
        if records.is_empty() {
            return Err(CorpusError::Empty {
                path: path.to_path_buf(),
            });
        }
        let mut documents = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            let text = record.text.unwrap_or_default();
            if text.trim().is_empty() {
                return Err(CorpusError::BlankDocument { position });
            }
            let id = record
                .id
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| format!("doc-{position}"));
            documents.push(CorpusDocument { id, text });
        }
        Ok(Self { documents })
    }

    /// Build a corpus directly from documents. Used by tests and by callers
    /// that assemble a corpus programmatically; the same non-empty rule
    /// applies.
    pub fn from_documents(documents: Vec<CorpusDocument>) -> Result<Self, CorpusError> {
        if documents.is_empty() {
            return Err(CorpusError::Empty {
                path: "<in-memory>".into(),
            });
        }
        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[CorpusDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&CorpusDocument> {
        self.documents.get(position)
    }
}

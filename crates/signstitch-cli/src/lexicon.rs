use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::Reader;
use log::info;
use serde::Serialize;

use crate::errors::{RenderError, Result};

/// One lexicon row mapping a word to a pose clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlossEntry {
    pub word: String,
    pub category: Option<String>,
    pub pose_filename: String,
}

/// Word lookup capability. A word may map to several clips (regional
/// variants); order is the lexicon's preference order.
pub trait GlossLookup {
    fn lookup(&self, word: &str) -> Result<Vec<GlossEntry>>;
}

/// Lexicon backed by a CSV file.
#[derive(Debug, Default)]
pub struct CsvLexicon {
    entries: HashMap<String, Vec<GlossEntry>>,
}

impl CsvLexicon {
    /// Loads a lexicon from a CSV file.
    ///
    /// Expected format:
    /// word,category,pose_filename
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = Reader::from_reader(file);
        let mut entries: HashMap<String, Vec<GlossEntry>> = HashMap::new();
        let mut count = 0usize;

        for (line_number, result) in reader.records().enumerate() {
            let record = result.map_err(|e| RenderError::LexiconFormat {
                line: line_number + 2, // +1 for header, +1 for 1-based indexing
                message: format!("CSV error: {}", e),
            })?;

            if record.len() < 3 {
                return Err(RenderError::LexiconFormat {
                    line: line_number + 2,
                    message: format!("Expected 3 columns, found {}", record.len()),
                });
            }

            let word = record[0].trim().to_string();
            let pose_filename = record[2].trim().to_string();
            if word.is_empty() || pose_filename.is_empty() {
                return Err(RenderError::LexiconFormat {
                    line: line_number + 2,
                    message: "word and pose_filename must be non-empty".to_string(),
                });
            }

            let category = match record[1].trim() {
                "" => None,
                value => Some(value.to_string()),
            };

            entries.entry(word.clone()).or_default().push(GlossEntry {
                word,
                category,
                pose_filename,
            });
            count += 1;
        }

        info!(target: "signstitch_cli::lexicon", "Loaded {} lexicon entries", count);
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GlossLookup for CsvLexicon {
    fn lookup(&self, word: &str) -> Result<Vec<GlossEntry>> {
        Ok(self.entries.get(word.trim()).cloned().unwrap_or_default())
    }
}

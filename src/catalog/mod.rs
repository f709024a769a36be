//! Parser for the flat result listings produced by the search scripts.
//!
//! ```text
//! Title: Rainfall Atlas of Hawaii
//! Main Link: https://journals.ametsoc.org/view/journals/bams/94/3/bams-d-11-00228.1.xml
//! [PDF]: https://example.org/atlas.pdf
//! ---
//! ```

use std::path::Path;

use crate::app::{QuarryError, Result};
use crate::domain::Reference;

const TITLE_MARKER: &str = "Title:";
const MAIN_LINK_MARKER: &str = "Main Link:";
const PDF_LINK_MARKER: &str = "[PDF]:";
const SEPARATOR: &str = "---";

/// Written by the search scripts when a result has no link of that kind.
const ABSENT: &str = "None";

#[derive(Debug, Clone, Default)]
pub struct CatalogParser;

impl CatalogParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse catalog text into references, in catalog order.
    ///
    /// Unrecognized lines are skipped.
    pub fn parse(&self, text: &str) -> Vec<Reference> {
        let mut references = Vec::new();
        let mut current: Option<Reference> = None;

        for line in text.lines() {
            let line = line.trim();

            if let Some(title) = line.strip_prefix(TITLE_MARKER) {
                references.extend(current.take());
                current = Some(Reference::new(title.trim()));
            } else if let Some(link) = line.strip_prefix(MAIN_LINK_MARKER) {
                current.get_or_insert_with(Reference::default).main_link = link_value(link);
            } else if let Some(link) = line.strip_prefix(PDF_LINK_MARKER) {
                current.get_or_insert_with(Reference::default).pdf_link = link_value(link);
            } else if line.starts_with(SEPARATOR) {
                references.extend(current.take());
            }
        }

        references.extend(current);
        references
    }

    /// Read and parse a catalog file.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Reference>> {
        if !path.is_file() {
            return Err(QuarryError::Catalog(format!(
                "catalog file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(self.parse(&text))
    }
}

fn link_value(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value == ABSENT {
        None
    } else {
        Some(value.to_string())
    }
}

use serde::{Deserialize, Serialize};

/// One resume as handed over by document ingestion.
///
/// Only the origin and page count are kept as metadata; the raw text is
/// normalized before feature extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub origin: String,
    pub page_count: u32,
    pub raw_text: String,
}

impl SourceDocument {
    /// Build a document, counting form-feed separated pages in `raw_text`.
    #[must_use]
    pub fn new(origin: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let page_count = count_pages(&raw_text);
        Self {
            origin: origin.into(),
            page_count,
            raw_text,
        }
    }
}

fn count_pages(text: &str) -> u32 {
    let pages = text
        .split('\u{c}')
        .filter(|page| !page.trim().is_empty())
        .count();
    u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
}

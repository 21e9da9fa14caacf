//! Raw bytes → page-level text.
//!
//! PDFs (`%PDF-` magic) go through `pdf-extract`, which separates pages
//! with form feeds. Anything else is accepted as UTF-8 plain text, with
//! form feeds as optional page breaks. Blank pages are dropped.

use tracing::debug;

use crate::{errors::RagError, record::PageText};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Parses on a blocking worker; `pdf-extract` is CPU-bound and may panic
/// on malformed input, which surfaces here as [`RagError::Parse`].
pub async fn parse_pages(bytes: Vec<u8>) -> Result<Vec<PageText>, RagError> {
    tokio::task::spawn_blocking(move || parse_pages_blocking(&bytes))
        .await
        .map_err(|e| RagError::Parse(format!("parser worker failed: {e}")))?
}

pub fn parse_pages_blocking(bytes: &[u8]) -> Result<Vec<PageText>, RagError> {
    let text = if bytes.starts_with(PDF_MAGIC) {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| RagError::Parse(e.to_string()))?
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| RagError::Parse("source is neither a PDF nor UTF-8 text".into()))?
    };

    let pages = split_pages(&text);
    debug!(bytes = bytes.len(), pages = pages.len(), "document parsed");
    if pages.is_empty() {
        return Err(RagError::EmptyDocument);
    }
    Ok(pages)
}

fn split_pages(text: &str) -> Vec<PageText> {
    text.split('\x0C')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| PageText {
            page_number: u32::try_from(i + 1).unwrap_or(u32::MAX),
            text: page.to_string(),
        })
        .collect()
}

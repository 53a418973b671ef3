//! PDF text extraction over an in-memory byte buffer

use lopdf::{decode_text_string, Dictionary, Document, Encoding, Object, ObjectId};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

use super::text::sanitize;

/// Separator placed between page texts
pub const PAGE_SEPARATOR: &str = "\n\n";

/// `TJ` offset below which a space is inserted
const WORD_GAP: f32 = -100.0;

/// Document information dictionary fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

/// Text pulled from a PDF
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// All pages joined with [`PAGE_SEPARATOR`], trimmed
    pub text: String,
    /// Pages in the document (including pages not read)
    pub page_count: u32,
    /// Text of each page that was read, in page order
    pub pages: Vec<String>,
    /// Information dictionary
    pub metadata: PdfMetadata,
}

impl ExtractionResult {
    /// Page texts with control characters removed, still separated by
    /// [`PAGE_SEPARATOR`]
    pub fn sanitized_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| sanitize(page))
            .map(|page| page.trim().to_string())
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR)
    }
}

/// PDF text extractor
///
/// Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PdfExtractor {
    max_pages: usize,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl PdfExtractor {
    /// Create an extractor
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            max_pages: config.max_pages,
        }
    }

    /// Extract the embedded text layer of a PDF
    ///
    /// Bytes that do not parse as a PDF fail with [`Error::Extraction`].
    /// Image-only pages contribute empty text; callers decide whether the
    /// result is usable.
    pub fn extract(&self, data: &[u8]) -> Result<ExtractionResult> {
        if data.is_empty() {
            return Err(Error::extraction("empty input"));
        }

        let mut doc = Document::load_mem(data)
            .map_err(|e| Error::extraction(format!("invalid PDF: {}", e)))?;

        if doc.is_encrypted() {
            // Pages that stay unreadable simply contribute no text
            if let Err(e) = doc.decrypt("") {
                tracing::debug!("Empty-password decryption failed: {}", e);
            }
        }

        doc.catalog()
            .map_err(|e| Error::extraction(format!("PDF has no catalog: {}", e)))?;

        let pages = doc.get_pages();
        let page_count = u32::try_from(pages.len()).unwrap_or(u32::MAX);
        let limit = if self.max_pages == 0 {
            pages.len()
        } else {
            self.max_pages
        };

        let mut page_texts = Vec::with_capacity(pages.len().min(limit));
        // BTreeMap iteration is already in page-number order
        for (page_number, page_id) in pages.into_iter().take(limit) {
            let items = match page_text_items(&doc, page_id) {
                Ok(items) => items,
                Err(e) => {
                    tracing::debug!("Could not read page {}: {}", page_number, e);
                    Vec::new()
                }
            };
            page_texts.push(items.join(" "));
        }

        let text = page_texts.join(PAGE_SEPARATOR).trim().to_string();
        let metadata = read_metadata(&doc);

        tracing::debug!(
            "Extracted {} chars from {} of {} pages",
            text.len(),
            page_texts.len(),
            page_count
        );

        Ok(ExtractionResult {
            text,
            page_count,
            pages: page_texts,
            metadata,
        })
    }
}

/// Run [`PdfExtractor::extract`] on the blocking pool
pub async fn extract_blocking(
    extractor: Arc<PdfExtractor>,
    data: Vec<u8>,
) -> Result<ExtractionResult> {
    tokio::task::spawn_blocking(move || extractor.extract(&data)).await?
}

/// Text fragments shown on one page, in content-stream order
///
/// Each string operand is decoded with the encoding of the font selected by
/// the last `Tf`. Text in a font without a usable encoding is skipped.
fn page_text_items(doc: &Document, page_id: ObjectId) -> Result<Vec<String>> {
    let encodings = page_encodings(doc, page_id);
    let content = doc
        .get_and_decode_page_content(page_id)
        .map_err(|e| Error::extraction(format!("page content unreadable: {}", e)))?;

    let mut current: Option<&Encoding> = None;
    let mut items = Vec::new();
    for op in &content.operations {
        let fragment = match op.operator.as_str() {
            "Tf" => {
                let font = op.operands.first().and_then(|name| name.as_name().ok());
                current = font.and_then(|name| encodings.get(name));
                if current.is_none() {
                    tracing::debug!(
                        "No usable encoding for font {:?}",
                        font.map(String::from_utf8_lossy)
                    );
                }
                None
            }
            "Tj" | "'" => op
                .operands
                .first()
                .and_then(|operand| decode_shown(operand, current)),
            "\"" => op
                .operands
                .get(2)
                .and_then(|operand| decode_shown(operand, current)),
            "TJ" => match op.operands.first() {
                Some(Object::Array(parts)) => Some(decode_shown_array(parts, current)),
                _ => None,
            },
            _ => None,
        };

        if let Some(fragment) = fragment {
            let fragment = fragment.trim();
            if !fragment.is_empty() {
                items.push(fragment.to_string());
            }
        }
    }

    Ok(items)
}

/// Encoding of every font in the page resources, keyed by resource name
fn page_encodings(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, Encoding<'_>> {
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(e) => {
            tracing::debug!("Could not read page fonts: {}", e);
            return BTreeMap::new();
        }
    };

    fonts
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name, encoding)),
            Err(e) => {
                tracing::debug!(
                    "Skipping font {}: {}",
                    String::from_utf8_lossy(&name),
                    e
                );
                None
            }
        })
        .collect()
}

fn decode_shown(operand: &Object, encoding: Option<&Encoding>) -> Option<String> {
    let bytes = match operand {
        Object::String(bytes, _) => bytes,
        _ => return None,
    };
    let encoding = encoding?;
    match Document::decode_text(encoding, bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::debug!("Could not decode text with {:?}: {}", encoding, e);
            None
        }
    }
}

/// `TJ` array: strings interleaved with kerning offsets in thousandths of
/// an em. A large negative offset is a word gap.
fn decode_shown_array(parts: &[Object], encoding: Option<&Encoding>) -> String {
    let mut text = String::new();
    for part in parts {
        match part {
            Object::String(..) => {
                if let Some(decoded) = decode_shown(part, encoding) {
                    text.push_str(&decoded);
                }
            }
            Object::Integer(_) | Object::Real(_) => {
                if part.as_float().is_ok_and(|offset| offset < WORD_GAP) && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
    text
}

fn read_metadata(doc: &Document) -> PdfMetadata {
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    match info {
        Some(info) => PdfMetadata {
            title: info_field(info, b"Title"),
            author: info_field(info, b"Author"),
            subject: info_field(info, b"Subject"),
            creator: info_field(info, b"Creator"),
            producer: info_field(info, b"Producer"),
        },
        None => PdfMetadata::default(),
    }
}

fn info_field(info: &Dictionary, key: &[u8]) -> Option<String> {
    info.get(key)
        .ok()
        .and_then(|value| decode_text_string(value).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

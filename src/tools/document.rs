//! Financial document reader.
//!
//! Extracts the text layer of an uploaded PDF page by page and counts the
//! embedded images on each page. Plain-text uploads are passed through
//! unchanged. Failures never abort a run: the
//! tool entry point renders them as a descriptive observation instead.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use lopdf::Document;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline pattern"));
static EXCESS_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid space pattern"));

pub const NO_CONTENT: &str = "No extractable content found in the PDF.";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File not found at path: {0}")]
    NotFound(PathBuf),

    #[error("Error reading PDF file: {0}")]
    Pdf(String),

    #[error("Error reading file: {0}")]
    Io(#[from] std::io::Error),
}

/// Text of a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
    pub images: usize,
}

/// Read a document and return the formatted page-by-page content.
pub fn extract_document(path: &Path) -> Result<String, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let pages = if bytes.starts_with(b"%PDF") {
        extract_pdf_pages(&bytes)?
    } else {
        match String::from_utf8(bytes) {
            Ok(text) => vec![PageText {
                number: 1,
                text,
                images: 0,
            }],
            Err(_) => return Err(DocumentError::Pdf("not a PDF or UTF-8 text file".to_string())),
        }
    };

    debug!(path = %path.display(), pages = pages.len(), "Document extracted");
    Ok(format_pages(&pages))
}

fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<PageText>, DocumentError> {
    let doc = Document::load_mem(bytes).map_err(|e| DocumentError::Pdf(e.to_string()))?;

    let pages = doc
        .get_pages()
        .iter()
        .map(|(&number, &page_id)| {
            let text = match doc.extract_text(&[number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!(page = number, error = %e, "Page text extraction failed");
                    format!("[Text extraction failed: {}]", e)
                }
            };
            // Pages without an XObject dictionary report an error here.
            let images = doc.get_page_images(page_id).map(|i| i.len()).unwrap_or(0);
            PageText {
                number,
                text,
                images,
            }
        })
        .collect();

    Ok(pages)
}

/// Lay pages out with `=== Page N ===` headers, note image counts and
/// collapse runs of whitespace, keeping paragraph breaks.
pub fn format_pages(pages: &[PageText]) -> String {
    let content = pages
        .iter()
        .map(|page| {
            let mut section = format!("\n=== Page {} ===\n", page.number);
            if !page.text.trim().is_empty() {
                section.push_str(&format!("\n--- Text Content ---\n{}\n", page.text));
            }
            if page.images > 0 {
                section.push_str(&format!("\n--- Images Found ({}) ---\n", page.images));
            }
            section
        })
        .collect::<Vec<_>>()
        .join("\n");

    normalize_whitespace(&content)
}

pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = EXCESS_NEWLINES.replace_all(text, "\n\n");
    EXCESS_SPACES.replace_all(&collapsed, " ").into_owned()
}

/// Tool entry point: always returns an observation string.
pub fn read_financial_document(path: &Path) -> String {
    match extract_document(path) {
        Ok(content) if has_page_content(&content) => content,
        Ok(_) => NO_CONTENT.to_string(),
        Err(e) => format!("Error: {}", e),
    }
}

fn has_page_content(content: &str) -> bool {
    content.contains("--- Text Content ---") || content.contains("--- Images Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_test_pdf(text: &str, with_image: bool) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        };
        if with_image {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 1,
                    "Height" => 1,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![0u8],
            ));
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_missing_file_is_reported_not_raised() {
        let output = read_financial_document(Path::new("/nonexistent/report.pdf"));
        assert_eq!(output, "Error: File not found at path: /nonexistent/report.pdf");
    }

    #[test]
    fn test_reads_pdf_pages() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&make_test_pdf("Total revenue 1,200 million", false)).unwrap();

        let output = read_financial_document(file.path());
        assert!(output.contains("=== Page 1 ==="), "got: {}", output);
        assert!(output.contains("Total revenue 1,200 million"), "got: {}", output);
        assert!(!output.contains("Images Found"), "got: {}", output);
    }

    #[test]
    fn test_reports_page_images() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&make_test_pdf("Balance sheet", true)).unwrap();

        let output = read_financial_document(file.path());
        assert!(output.contains("Balance sheet"), "got: {}", output);
        assert!(output.contains("--- Images Found (1) ---"), "got: {}", output);
    }

    #[test]
    fn test_format_pages_with_images_only() {
        let pages = [PageText {
            number: 2,
            text: "  ".to_string(),
            images: 3,
        }];
        assert_eq!(format_pages(&pages), "\n=== Page 2 ===\n\n--- Images Found (3) ---\n");
    }

    #[test]
    fn test_plain_text_passthrough() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Net income: $45 million\n\n\n\nDebt    rose").unwrap();

        let output = read_financial_document(file.path());
        assert!(output.contains("Net income: $45 million"));
        assert!(output.contains("Debt rose"));
        assert!(!output.contains("\n\n\n"));
    }

    #[test]
    fn test_empty_document_has_no_content() {
        let file = NamedTempFile::new().unwrap();
        assert_eq!(read_financial_document(file.path()), NO_CONTENT);
    }

    #[test]
    fn test_corrupt_pdf_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4 this is not really a pdf").unwrap();

        let output = read_financial_document(file.path());
        assert!(
            output.starts_with("Error: Error reading PDF file") || output == NO_CONTENT,
            "got: {}",
            output
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a\n\n\n\nb   c"), "a\n\nb c");
    }
}

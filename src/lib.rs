//! html2docx: convert semantic HTML into formatted .docx files
//!
//! This library parses an HTML document, walks its body once and produces a
//! Word document with headings, styled runs, numbered and bulleted lists,
//! tables, internal bookmarks and hyperlinks.
//!
//! ```no_run
//! let bytes = html2docx::html_to_docx("<h1>Hello</h1><p>World</p>")?;
//! std::fs::write("hello.docx", bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod html;

use config::ConverterConfig;

/// Convert an HTML string to `.docx` bytes with the default configuration
pub fn html_to_docx(html: &str) -> Result<Vec<u8>> {
    Converter::new(ConverterConfig::default()).to_docx(html)
}

// Re-export commonly used types
pub use convert::Converter;
pub use convert::image::{ImageFetcher, OfflineFetcher};
pub use document::{Block, Document, Inline, Paragraph, ParagraphKind};
pub use error::{ConvertError, Result};

#[cfg(feature = "http")]
pub use convert::image::HttpFetcher;

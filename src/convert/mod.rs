//! Page conversion stage
//!
//! Turns fetched pages into Markdown documents plus extracted media.
//!
//! # Components
//!
//! - [`ContentCategory`]: the closed set of content families the pipeline handles
//! - [`ConverterRegistry`]: one [`DocumentConverter`] per category, built once at startup
//! - [`HtmlConverter`]: HTML to Markdown via `htmd`
//! - [`PageConverter`]: the bounded worker pool feeding the archiver
//! - [`ConversionResult`]: the per-page outcome consumed by the archiver

mod category;
mod converter;
mod html;
mod images;
mod metadata;
mod registry;
mod result;

pub use category::ContentCategory;
pub use converter::PageConverter;
pub use html::{is_dynamic_shell, HtmlConverter};
pub use images::{canonical_image_url, is_image_url, normalize_images, ImageCandidate};
pub use metadata::{extract_metadata, PageMetadata};
pub use registry::{
    ConvertOptions, ConverterRegistry, DataConverter, Document, DocumentConverter, TextConverter,
};
pub use result::{ConversionResult, ExtraFile, ImageReference};

use thiserror::Error;

/// Errors raised while converting a single page
///
/// These never cross the converter stage; they are captured in a failed
/// [`ConversionResult`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Content extraction failed: {0}")]
    Extraction(String),

    #[error("No converter for content type '{0}'")]
    Unsupported(String),

    #[error("Could not decode page body: {0}")]
    Decode(String),
}

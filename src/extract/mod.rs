//! Reading seat numbers and scores off photographed score sheets.
//!
//! This module provides:
//! - Image loading and upload preparation
//! - The instruction sent with every sheet
//! - A Gemini REST client behind the `SheetReader` trait
//! - Parsing of the model's JSON reply

pub mod client;
pub mod prompt;
pub mod response;
pub mod sheet_image;

pub use client::GeminiClient;
pub use response::parse_extraction;
pub use sheet_image::{collect_sheet_images, load_sheet_image, SheetImage};

use thiserror::Error;

/// Why a single sheet could not be read.
///
/// Every variant is a per-file failure: the file is reported and skipped,
/// the rest of the batch continues.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text ({reason})")]
    EmptyResponse { reason: String },

    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected reply shape: {0}")]
    Malformed(String),
}

/// Sends one sheet image to a reader and returns its raw text reply.
pub trait SheetReader {
    fn read_sheet(&self, image: &SheetImage) -> Result<String, ExtractionError>;
}

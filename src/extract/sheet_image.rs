//! Loading score sheet photos and preparing them for upload.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::ExtractionError;

/// File extensions accepted as score sheet photos.
const SHEET_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A sheet photo ready to send to the model.
#[derive(Debug, Clone)]
pub struct SheetImage {
    /// Original file name, used as the row label in the report
    pub file_name: String,
    /// MIME type of `bytes`
    pub mime_type: &'static str,
    /// Encoded image data
    pub bytes: Vec<u8>,
}

/// Returns true if the path has a JPEG or PNG extension.
pub fn is_sheet_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SHEET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expands the given inputs into a list of sheet photos.
///
/// Files are kept if they have an image extension. Directories are scanned
/// one level deep and their images added in name order.
pub fn collect_sheet_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)
                .context(format!("Failed to read directory: {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_sheet_image(path))
                .collect();
            found.sort();
            files.extend(found);
        } else if is_sheet_image(input) {
            files.push(input.clone());
        } else {
            crate::log(&format!("Skipping non-image input: {}", input.display()));
        }
    }

    Ok(files)
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        _ => "image/jpeg",
    }
}

/// Encodes an image as PNG or JPEG.
fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ExtractionError> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Png => img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?,
        // JPEG has no alpha channel
        _ => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?,
    }
    Ok(buf)
}

/// Loads a sheet photo from disk.
///
/// The file must decode as an image. Photos whose longer side exceeds
/// `max_dimension` are scaled down (aspect ratio kept) and re-encoded;
/// others are sent as the original bytes.
pub fn load_sheet_image(path: &Path, max_dimension: u32) -> Result<SheetImage, ExtractionError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path)?;
    let format = image::guess_format(&bytes)?;
    let img = image::load_from_memory_with_format(&bytes, format)?;

    let upload_format = match format {
        ImageFormat::Png => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    };
    let longest = img.width().max(img.height());

    let bytes = if max_dimension > 0 && longest > max_dimension {
        let resized = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        crate::log(&format!(
            "Downscaled {} from {}x{} to {}x{}",
            file_name,
            img.width(),
            img.height(),
            resized.width(),
            resized.height()
        ));
        encode(&resized, upload_format)?
    } else if format == upload_format {
        bytes
    } else {
        encode(&img, upload_format)?
    };

    Ok(SheetImage {
        file_name,
        mime_type: mime_for(upload_format),
        bytes,
    })
}

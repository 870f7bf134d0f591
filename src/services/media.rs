// src/services/media.rs
// DOCUMENTATION: Multipart image intake and resizing
// PURPOSE: Collect uploaded image fields, normalize them to fixed-size
// JPEGs in memory, and persist them under the public upload directory

use actix_multipart::Multipart;
use futures_util::StreamExt;
use image::imageops::FilterType;
use image::ImageOutputFormat;
use std::io::Cursor;
use std::path::Path;

use crate::errors::ApiError;

/// Upload guardrail per request
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20MB

/// User avatars are square
pub const USER_PHOTO_SIZE: (u32, u32) = (500, 500);

/// Tour imagery is 3:2
pub const TOUR_IMAGE_SIZE: (u32, u32) = (2000, 1333);

const JPEG_QUALITY: u8 = 90;

/// One uploaded form field, fully buffered
#[derive(Debug)]
pub struct UploadedImage {
    pub field_name: String,
    pub data: Vec<u8>,
}

/// Drain a multipart payload into memory
/// Non-image parts are rejected outright; the total size is capped
pub async fn collect_images(mut payload: Multipart) -> Result<Vec<UploadedImage>, ApiError> {
    let mut images = Vec::new();
    let mut total_bytes = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            log::error!("Error reading upload field: {}", e);
            ApiError::InvalidInput("Malformed multipart payload".to_string())
        })?;

        let is_image = field
            .content_type()
            .map(|mime| mime.essence_str().starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(ApiError::InvalidInput(
                "Not an image! Please upload only images".to_string(),
            ));
        }

        let field_name = field.name().unwrap_or("").to_string();
        let mut data = Vec::new();

        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                log::error!("Error reading upload chunk: {}", e);
                ApiError::InvalidInput("Malformed multipart payload".to_string())
            })?;

            total_bytes += chunk.len();
            if total_bytes > MAX_UPLOAD_BYTES {
                return Err(ApiError::InvalidInput(
                    "Upload exceeds the 20MB limit".to_string(),
                ));
            }
            data.extend_from_slice(&chunk);
        }

        images.push(UploadedImage { field_name, data });
    }

    Ok(images)
}

/// Resize to the target dimensions (center-cropped) and re-encode as JPEG
pub fn resize_to_jpeg(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ApiError> {
    let img = image::load_from_memory(data).map_err(|e| {
        log::warn!("Rejecting undecodable upload: {}", e);
        ApiError::InvalidInput("Could not decode the uploaded image".to_string())
    })?;

    let resized = img.resize_to_fill(width, height, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| {
            log::error!("JPEG encode failed: {}", e);
            ApiError::InternalError
        })?;

    Ok(out.into_inner())
}

/// Persist processed bytes under the upload directory
pub async fn save_image(dir: &str, filename: &str, bytes: &[u8]) -> Result<(), ApiError> {
    let dir_path = Path::new(dir);
    tokio::fs::create_dir_all(dir_path).await.map_err(|e| {
        log::error!("Could not create upload directory {}: {}", dir, e);
        ApiError::InternalError
    })?;

    let path = dir_path.join(filename);
    tokio::fs::write(&path, bytes).await.map_err(|e| {
        log::error!("Could not write {}: {}", path.display(), e);
        ApiError::InternalError
    })?;

    log::info!("Stored upload {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView};

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn resizes_to_exact_dimensions() {
        let input = png_fixture(64, 48);
        let jpeg = resize_to_jpeg(&input, 32, 32).unwrap();

        let round_tripped = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(round_tripped.dimensions(), (32, 32));
    }

    #[test]
    fn output_is_jpeg() {
        let input = png_fixture(10, 10);
        let jpeg = resize_to_jpeg(&input, 8, 8).unwrap();
        // JPEG SOI marker
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = resize_to_jpeg(b"definitely not an image", 8, 8).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}

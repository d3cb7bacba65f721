use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use std::io::Cursor;
use thiserror::Error;

use crate::geometry::{Dimensions, NaturalRect, SelectionError};
use crate::selection::validate_selection;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("Invalid image: {0}")]
    Decode(String),

    #[error("Failed to encode crop: {0}")]
    Encode(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

// Decode an uploaded image, refusing anything larger than max_side per axis
pub fn decode_image(bytes: &[u8], max_side: u32) -> Result<DynamicImage, CropError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(max_side);
    limits.max_image_height = Some(max_side);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CropError::Decode(e.to_string()))?;
    reader.limits(limits);

    let image = reader.decode().map_err(|e| CropError::Decode(e.to_string()))?;

    let dims = image_dimensions(&image);
    dims.ensure_positive()?;
    Ok(image)
}

pub fn image_dimensions(image: &DynamicImage) -> Dimensions {
    Dimensions::from((image.width(), image.height()))
}

/// Cut a validated, clamped selection out of the image and encode it as JPEG.
///
/// The scorer works on RGB, so alpha is dropped here.
pub fn crop_region(image: &DynamicImage, selection: &NaturalRect) -> Result<Vec<u8>, CropError> {
    let (x, y, w, h) = selection.to_pixel_region();
    let past_right = x.checked_add(w).is_none_or(|right| right > image.width());
    let past_bottom = y.checked_add(h).is_none_or(|bottom| bottom > image.height());
    if w == 0 || h == 0 || past_right || past_bottom {
        return Err(CropError::Selection(SelectionError::Malformed(format!(
            "crop {}x{}+{}+{} outside {}x{} image",
            w,
            h,
            x,
            y,
            image.width(),
            image.height()
        ))));
    }

    let cropped = DynamicImage::ImageRgb8(image.crop_imm(x, y, w, h).to_rgb8());

    let mut buf = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| CropError::Encode(e.to_string()))?;
    Ok(buf)
}

// Decode, re-validate the selection against the real image, and crop it
pub fn prepare_crop(bytes: &[u8], selection: &NaturalRect, max_side: u32) -> Result<(NaturalRect, Vec<u8>), CropError> {
    let image = decode_image(bytes, max_side)?;
    let clamped = validate_selection(selection, image_dimensions(&image))?;
    let crop = crop_region(&image, &clamped)?;
    Ok((clamped, crop))
}

use std::io::Cursor;

use image::ImageReader;
use image::imageops::FilterType;
use ndarray::Array4;

/// Spatial resolution the detector was exported with. Changing the model's
/// input size means changing this constant in lockstep.
pub const TARGET_SIZE: u32 = 128;
pub const CHANNELS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has zero width or height")]
    EmptyImage,
}

/// Decodes an uploaded image and packs it into the `[1, 128, 128, 3]` batch
/// the detector expects. Pixel values are carried through in the raw 0-255
/// range the checkpoint was exported against; no rescaling happens here.
pub fn preprocess(image_data: &[u8]) -> Result<Array4<f32>, PreprocessError> {
    let img = ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;

    if img.width() == 0 || img.height() == 0 {
        return Err(PreprocessError::EmptyImage);
    }

    let resized = img
        .resize_exact(TARGET_SIZE, TARGET_SIZE, FilterType::Triangle)
        .to_rgb8();

    let side = TARGET_SIZE as usize;
    let mut batch = Array4::<f32>::zeros((1, side, side, CHANNELS));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..CHANNELS {
            batch[[0, y as usize, x as usize, c]] = pixel[c] as f32;
        }
    }

    Ok(batch)
}

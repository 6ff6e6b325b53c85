use image::imageops::FilterType;
use ndarray::{Array, Ix4};
use thiserror::Error;

pub const INPUT_SIZE: u32 = 224;

const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Error, Debug)]
#[error("Error decoding image: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// Turns raw image file bytes into a normalized `[1, 3, 224, 224]` NCHW tensor.
///
/// Any decodable format is accepted; grayscale and alpha inputs are
/// converted to RGB first. The transform has no random component, so the
/// same bytes always produce the same tensor.
pub fn transform_image(image_data: &[u8]) -> Result<Array<f32, Ix4>, DecodeError> {
    let original_img = image::load_from_memory(image_data)?;

    let img = original_img
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8();

    let size = INPUT_SIZE as usize;
    let input = Array::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        let value = img.get_pixel(x as u32, y as u32)[c] as f32 / 255.;
        (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c]
    });

    Ok(input)
}

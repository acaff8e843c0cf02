use {
    crate::{error::Result, shape::InputGeometry},
    base::Tensor,
    image::{Image, ResizeFilter},
};

/// Per-channel mean, RGB order.
pub const MEAN: [f64; 3] = [0.485, 0.456, 0.406];
/// Per-channel standard deviation, RGB order.
pub const STD: [f64; 3] = [0.229, 0.224, 0.225];

/// Normalizes one 8-bit channel value.
///
/// Computed in f64 and rounded once to f32.
#[inline]
pub fn normalize_value(value: u8, channel: usize) -> f32 {
    ((value as f64 / 255.0 - MEAN[channel]) / STD[channel]) as f32
}

/// Turns an interleaved RGB image into a `[1, 3, H, W]` planar tensor.
pub fn normalize(image: &Image) -> Result<Tensor<f32>> {
    let (height, width) = (image.height(), image.width());
    let plane = height * width;
    let mut data = vec![0f32; 3 * plane];

    for (i, rgb) in image.data().chunks_exact(3).enumerate() {
        for (c, &value) in rgb.iter().enumerate() {
            data[c * plane + i] = normalize_value(value, c);
        }
    }

    Ok(Tensor::new(vec![1, 3, height, width], data)?)
}

/// Decodes `bytes`, stretches to `geometry` and normalizes.
pub async fn preprocess(bytes: &[u8], geometry: InputGeometry, filter: ResizeFilter) -> Result<Tensor<f32>> {
    let image = image::decode_rgb(bytes, geometry.width, geometry.height, filter).await?;
    normalize(&image)
}

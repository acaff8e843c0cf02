use base::Tensor;

/// Interleaved 8-bit RGB pixels in HWC layout: `[height, width, 3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pixels: Tensor<u8>,
}

impl Image {
    pub fn from_rgb8(width: usize, height: usize, data: Vec<u8>) -> Result<Self, base::TensorError> {
        Ok(Self {
            pixels: Tensor::new(vec![height, width, 3], data)?,
        })
    }

    pub fn height(&self) -> usize {
        self.pixels.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.pixels.shape()[1]
    }

    pub fn channels(&self) -> usize {
        self.pixels.shape()[2]
    }

    /// Raw bytes, `R G B` per pixel, rows top to bottom.
    pub fn data(&self) -> &[u8] {
        self.pixels.data()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let i = (y * self.width() + x) * 3;
        let data = self.data();
        Some([data[i], data[i + 1], data[i + 2]])
    }
}

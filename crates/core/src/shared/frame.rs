use ndarray::ArrayView3;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Capture sources convert to RGB at the boundary; detectors and the
/// rasterizer only ever see this layout.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Drops the alpha channel of a tightly packed RGBA buffer.
    pub fn from_rgba(rgba: &[u8], width: u32, height: u32, index: usize) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * Self::CHANNELS);
        for px in rgba.chunks_exact(4) {
            data.extend_from_slice(&px[..3]);
        }
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns a horizontally flipped copy, as a mirrored camera preview shows it.
    pub fn mirrored(&self) -> Frame {
        if self.is_empty() {
            return self.clone();
        }
        let w = self.width as usize;
        let row_len = w * Self::CHANNELS;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len) {
            for px in row.chunks_exact(Self::CHANNELS).rev() {
                data.extend_from_slice(px);
            }
        }
        Frame::new(data, self.width, self.height, self.index)
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, Self::CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12];
        let frame = Frame::new(data.clone(), 2, 2, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_empty());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_from_rgba_drops_alpha() {
        let rgba = vec![1, 2, 3, 255, 4, 5, 6, 128];
        let frame = Frame::from_rgba(&rgba, 2, 1, 0);
        assert_eq!(frame.data(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_mirrored_reverses_pixels_per_row() {
        // 2x2: row0 = [A, B], row1 = [C, D]
        let data = vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4];
        let frame = Frame::new(data, 2, 2, 7);
        let flipped = frame.mirrored();
        assert_eq!(flipped.data(), &[2, 2, 2, 1, 1, 1, 4, 4, 4, 3, 3, 3]);
        assert_eq!(flipped.index(), 7);
    }

    #[test]
    fn test_mirrored_twice_is_identity() {
        let data: Vec<u8> = (0..36).collect();
        let frame = Frame::new(data.clone(), 4, 3, 0);
        assert_eq!(frame.mirrored().mirrored().data(), &data[..]);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 12];
        data[6] = 255; // row=1, col=0, R
        let frame = Frame::new(data, 2, 2, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }
}

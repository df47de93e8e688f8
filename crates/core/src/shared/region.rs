use ndarray::ArrayView3;

/// The subtitle band cut out of one sampled frame.
///
/// Pixel layout matches [`Frame`](super::frame::Frame): tightly packed,
/// row-major, `channels` bytes per pixel. `source_index` is the absolute
/// frame index the band was taken from and `top_row` the first frame row
/// it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    source_index: usize,
    top_row: u32,
}

impl Region {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        source_index: usize,
        top_row: u32,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            source_index,
            top_row,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn source_index(&self) -> usize {
        self.source_index
    }

    pub fn top_row(&self) -> u32 {
        self.top_row
    }

    /// Shape as `(height, width, channels)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Region data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let region = Region::new(vec![7u8; 2 * 3 * 3], 3, 2, 3, 120, 860);
        assert_eq!(region.width(), 3);
        assert_eq!(region.height(), 2);
        assert_eq!(region.channels(), 3);
        assert_eq!(region.source_index(), 120);
        assert_eq!(region.top_row(), 860);
        assert_eq!(region.shape(), (2, 3, 3));
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        let mut data = vec![0u8; 2 * 2 * 3];
        data[9] = 200; // row=1, col=1, R
        let region = Region::new(data, 2, 2, 3, 0, 0);
        assert_eq!(region.as_ndarray()[[1, 1, 0]], 200);
        assert_eq!(region.as_ndarray()[[1, 1, 1]], 0);
    }

    #[test]
    fn test_equal_pixels_compare_equal() {
        let a = Region::new(vec![1u8; 6], 2, 1, 3, 0, 10);
        let b = a.clone();
        assert_eq!(a, b);
    }
}

use std::ops::Range;

use ndarray::ArrayView3;

/// A single decoded video frame: contiguous RGB bytes in row-major order.
///
/// `index` is the absolute frame position in the source video.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
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
            index,
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

    pub fn index(&self) -> usize {
        self.index
    }

    /// Bytes per pixel row.
    pub fn row_stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Raw bytes of the rows in `rows`, or `None` if the range falls outside
    /// the frame.
    pub fn rows(&self, rows: Range<u32>) -> Option<&[u8]> {
        if rows.start > rows.end || rows.end > self.height {
            return None;
        }
        let stride = self.row_stride();
        Some(&self.data[rows.start as usize * stride..rows.end as usize * stride])
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped_frame(width: u32, height: u32) -> Frame {
        // Every byte of row `r` holds the value `r`.
        let data = (0..height)
            .flat_map(|r| std::iter::repeat(r as u8).take((width * 3) as usize))
            .collect();
        Frame::new(data, width, height, 3, 42)
    }

    #[test]
    fn test_construction_and_accessors() {
        let frame = striped_frame(4, 2);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 42);
        assert_eq!(frame.row_stride(), 12);
    }

    #[test]
    fn test_rows_returns_requested_band() {
        let frame = striped_frame(2, 5);
        let band = frame.rows(1..3).unwrap();
        assert_eq!(band.len(), 2 * 6);
        assert!(band[..6].iter().all(|&b| b == 1));
        assert!(band[6..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_rows_out_of_bounds_is_none() {
        let frame = striped_frame(2, 5);
        assert!(frame.rows(3..6).is_none());
    }

    #[test]
    fn test_rows_empty_range_is_empty_slice() {
        let frame = striped_frame(2, 5);
        assert!(frame.rows(2..2).unwrap().is_empty());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape_is_height_width_channels() {
        let frame = striped_frame(4, 2);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 3, 2]], 1);
    }
}

use super::error::{Result, VibeError};
use super::partition::{column_ranges, split_columns};
use image::RgbImage;
use rayon::prelude::*;
use std::ops::Range;

/// One historical colour observation
pub type Sample = [u8; 3];

/// Per-pixel sample history of the background model
///
/// Samples live in one flat arena. Pixels are laid out column-major
/// (`x * height + y`) so a range of columns is one contiguous slice, and each
/// pixel owns `depth` consecutive slots.
pub struct SampleStore {
    width: u32,
    height: u32,
    depth: usize,
    data: Vec<Sample>,
}

impl SampleStore {
    pub fn new(width: u32, height: u32, depth: usize) -> Self {
        let len = width as usize * height as usize * depth;
        Self {
            width,
            height,
            depth,
            data: vec![[0; 3]; len],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Samples per pixel
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn pixel_index(&self, x: u32, y: u32) -> usize {
        x as usize * self.height as usize + y as usize
    }

    /// Sets every slot of every pixel to that pixel's colour in `frame`
    ///
    /// Columns are split across `workers`; the call returns once every strip
    /// is written.
    pub fn initialize(&mut self, frame: &RgbImage, workers: usize) -> Result<()> {
        self.check_frame(frame)?;
        let _span = tracing::debug_span!("sample_store_init").entered();

        let ranges = column_ranges(self.width, workers);
        let per_column = self.height as usize * self.depth;
        let (height, depth) = (self.height, self.depth);
        let strips = split_columns(&mut self.data, &ranges, per_column);

        strips
            .into_par_iter()
            .zip(ranges.into_par_iter())
            .for_each(|(strip, columns)| fill_strip(strip, columns, frame, height, depth));

        Ok(())
    }

    /// Overwrites exactly one sample
    pub fn replace(&mut self, x: u32, y: u32, slot: usize, colour: Sample) -> Result<()> {
        if x >= self.width || y >= self.height || slot >= self.depth {
            return Err(VibeError::SampleOutOfRange { x, y, slot });
        }
        let index = self.pixel_index(x, y) * self.depth + slot;
        self.data[index] = colour;
        Ok(())
    }

    /// All slots of one pixel, in slot order
    pub fn samples(&self, x: u32, y: u32) -> &[Sample] {
        let start = self.pixel_index(x, y) * self.depth;
        &self.data[start..start + self.depth]
    }

    /// Disjoint mutable column strips, one per range
    pub(crate) fn column_strips_mut(&mut self, ranges: &[Range<u32>]) -> Vec<&mut [Sample]> {
        let per_column = self.height as usize * self.depth;
        split_columns(&mut self.data, ranges, per_column)
    }

    fn check_frame(&self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(VibeError::InvalidDimension {
                expected: (self.width, self.height),
                actual: frame.dimensions(),
            });
        }
        Ok(())
    }
}

fn fill_strip(strip: &mut [Sample], columns: Range<u32>, frame: &RgbImage, height: u32, depth: usize) {
    let mut pixels = strip.chunks_exact_mut(depth);
    for x in columns {
        for y in 0..height {
            if let Some(slots) = pixels.next() {
                slots.fill(frame.get_pixel(x, y).0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, (x * y) as u8]))
    }

    #[test]
    fn initialize_fills_every_slot() {
        let frame = gradient(13, 7);
        let mut store = SampleStore::new(13, 7, 5);
        store.initialize(&frame, 4).unwrap();

        assert_eq!(store.len(), 13 * 7 * 5);
        for y in 0..7 {
            for x in 0..13 {
                let expected = frame.get_pixel(x, y).0;
                assert!(store.samples(x, y).iter().all(|s| *s == expected));
            }
        }
    }

    #[test]
    fn initialize_can_run_again() {
        let mut store = SampleStore::new(4, 4, 3);
        store.initialize(&gradient(4, 4), 2).unwrap();
        let flat = RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]));
        store.initialize(&flat, 3).unwrap();
        assert!(store.samples(3, 2).iter().all(|s| *s == [9, 9, 9]));
        assert_eq!(store.len(), 4 * 4 * 3);
    }

    #[test]
    fn initialize_rejects_wrong_dimensions() {
        let mut store = SampleStore::new(4, 4, 3);
        let err = store.initialize(&gradient(5, 4), 1).unwrap_err();
        assert_eq!(
            err,
            VibeError::InvalidDimension { expected: (4, 4), actual: (5, 4) }
        );
    }

    #[test]
    fn replace_touches_one_slot() {
        let mut store = SampleStore::new(3, 3, 4);
        store.initialize(&RgbImage::new(3, 3), 1).unwrap();
        store.replace(1, 2, 3, [7, 8, 9]).unwrap();

        assert_eq!(store.samples(1, 2), &[[0; 3], [0; 3], [0; 3], [7, 8, 9]]);
        assert!(store.samples(2, 1).iter().all(|s| *s == [0; 3]));
    }

    #[test]
    fn replace_rejects_out_of_range() {
        let mut store = SampleStore::new(3, 3, 4);
        assert!(store.replace(3, 0, 0, [1; 3]).is_err());
        assert!(store.replace(0, 3, 0, [1; 3]).is_err());
        assert!(store.replace(0, 0, 4, [1; 3]).is_err());
    }
}

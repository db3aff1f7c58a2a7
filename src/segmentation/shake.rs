use super::config::ChannelOrder;
use super::partition::split_columns;
use super::samples::Sample;
use image::RgbImage;
use std::ops::Range;

/// Camera shake detector
///
/// Keeps the two most recent colours of every pixel in alternating slots
/// (even frames write slot 0, odd frames slot 1) and counts pixels whose luma
/// is unchanged between them. When too few pixels agree the whole scene has
/// moved and the background model is no longer usable.
pub struct ShakeDetector {
    height: u32,
    channel_order: ChannelOrder,
    threshold: f64,
    // column-major like the sample store
    slots: Vec<[Sample; 2]>,
}

impl ShakeDetector {
    pub fn new(width: u32, height: u32, channel_order: ChannelOrder, threshold: f64) -> Self {
        Self {
            height,
            channel_order,
            threshold,
            slots: vec![[[0; 3]; 2]; width as usize * height as usize],
        }
    }

    /// Slot refreshed on `frame_index`, `None` for frame 0
    pub fn active_slot(frame_index: u64) -> Option<usize> {
        match frame_index {
            0 => None,
            i if i % 2 == 0 => Some(0),
            _ => Some(1),
        }
    }

    /// Stores `frame` in slot 0 of every pixel
    pub fn seed(&mut self, frame: &RgbImage) {
        let height = self.height as usize;
        for (index, pair) in self.slots.iter_mut().enumerate() {
            let x = (index / height) as u32;
            let y = (index % height) as u32;
            pair[0] = frame.get_pixel(x, y).0;
        }
    }

    /// Refreshes `slot` of one pixel with `colour` and reports whether its luma
    /// equals the other slot's
    pub fn observe(order: ChannelOrder, pair: &mut [Sample; 2], slot: usize, colour: Sample) -> bool {
        pair[slot] = colour;
        order.luma_x100(pair[0]) == order.luma_x100(pair[1])
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    /// True when the share of matching pixels falls below the threshold
    pub fn should_reinitialize(&self, matches: u64, pixels: u64) -> bool {
        pixels > 0 && self.match_ratio(matches, pixels) < self.threshold
    }

    pub fn match_ratio(&self, matches: u64, pixels: u64) -> f64 {
        if pixels == 0 {
            return 1.0;
        }
        matches as f64 / pixels as f64
    }

    pub(crate) fn column_strips_mut(&mut self, ranges: &[Range<u32>]) -> Vec<&mut [[Sample; 2]]> {
        let per_column = self.height as usize;
        split_columns(&mut self.slots, ranges, per_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn slots_alternate_with_frame_parity() {
        assert_eq!(ShakeDetector::active_slot(0), None);
        assert_eq!(ShakeDetector::active_slot(1), Some(1));
        assert_eq!(ShakeDetector::active_slot(2), Some(0));
        assert_eq!(ShakeDetector::active_slot(3), Some(1));
        assert_eq!(ShakeDetector::active_slot(10), Some(0));
    }

    #[test]
    fn observe_compares_against_other_slot() {
        let order = ChannelOrder::Bgr;
        let mut pair = [[10, 20, 30], [0, 0, 0]];
        assert!(ShakeDetector::observe(order, &mut pair, 1, [10, 20, 30]));
        assert!(!ShakeDetector::observe(order, &mut pair, 0, [11, 20, 30]));
        assert_eq!(pair, [[11, 20, 30], [10, 20, 30]]);
    }

    #[test]
    fn equal_luma_from_different_colours_counts_as_match() {
        // 11 * 59 == 59 * 11
        let mut pair = [[59, 0, 0], [0, 0, 0]];
        assert!(ShakeDetector::observe(ChannelOrder::Bgr, &mut pair, 1, [0, 11, 0]));
    }

    #[test]
    fn seed_writes_slot_zero() {
        let frame = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 0]));
        let mut detector = ShakeDetector::new(3, 2, ChannelOrder::Rgb, 0.125);
        detector.seed(&frame);
        let strips = detector.column_strips_mut(&[0..3]);
        // column-major: (x=1, y=1) is index 3
        assert_eq!(strips[0][3][0], [1, 1, 0]);
        assert_eq!(strips[0][3][1], [0, 0, 0]);
    }

    #[test]
    fn reinitializes_below_threshold() {
        let detector = ShakeDetector::new(4, 4, ChannelOrder::Rgb, 0.125);
        assert!(detector.should_reinitialize(1, 16));
        assert!(!detector.should_reinitialize(2, 16));
        assert!(!detector.should_reinitialize(16, 16));
    }
}

use super::config::DisplayMode;
use super::samples::Sample;
use super::types::Classification;

const BLACK: [u8; 3] = [u8::MIN; 3];
const WHITE: [u8; 3] = [u8::MAX; 3];
const MAGENTA: [u8; 3] = [u8::MAX, u8::MIN, u8::MAX];

/// Background/foreground decision against a pixel's samples
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    radius: u16,
    min_matches: usize,
}

impl Classifier {
    pub fn new(radius: u16, min_matches: usize) -> Self {
        Self { radius, min_matches }
    }

    /// True when every channel differs from the sample by less than the radius
    pub fn matches(&self, colour: Sample, sample: Sample) -> bool {
        colour
            .iter()
            .zip(sample.iter())
            .all(|(c, s)| u16::from(c.abs_diff(*s)) < self.radius)
    }

    /// Matching samples in slot order, stopping once `min_matches` is reached
    pub fn count_matches(&self, colour: Sample, samples: &[Sample]) -> usize {
        let mut count = 0;
        for sample in samples {
            if self.matches(colour, *sample) {
                count += 1;
                if count >= self.min_matches {
                    break;
                }
            }
        }
        count
    }

    pub fn classify(&self, colour: Sample, samples: &[Sample]) -> Classification {
        if self.count_matches(colour, samples) >= self.min_matches {
            Classification::Background
        } else {
            Classification::Foreground
        }
    }
}

impl DisplayMode {
    /// Output colour for one pixel
    pub fn paint(self, class: Classification, colour: Sample, x: u32, y: u32) -> Sample {
        match (self, class) {
            (DisplayMode::OnlyBackground, Classification::Background) => colour,
            (DisplayMode::OnlyBackground, Classification::Foreground) => BLACK,
            (DisplayMode::OnlyForeground, Classification::Foreground) => colour,
            (DisplayMode::OnlyForeground, Classification::Background) => BLACK,
            (DisplayMode::Mask, Classification::Foreground) => WHITE,
            (DisplayMode::Mask, Classification::Background) => BLACK,
            (DisplayMode::Checkerboard, Classification::Background) => colour,
            (DisplayMode::Checkerboard, Classification::Foreground) => {
                if (x + y) % 2 == 0 {
                    MAGENTA
                } else {
                    BLACK
                }
            }
        }
    }
}

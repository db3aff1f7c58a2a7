use anyhow::Result;
use image::{GrayImage, Luma, RgbImage};

/// Per-pixel decision of the background model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Background,
    Foreground,
}

impl Classification {
    pub fn is_background(self) -> bool {
        matches!(self, Classification::Background)
    }
}

/// Decisions for one frame, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMap {
    width: u32,
    height: u32,
    classes: Vec<Classification>,
}

impl ClassificationMap {
    pub(crate) fn new(width: u32, height: u32, classes: Vec<Classification>) -> Self {
        debug_assert_eq!(classes.len(), width as usize * height as usize);
        Self {
            width,
            height,
            classes,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> Classification {
        self.classes[y as usize * self.width as usize + x as usize]
    }

    pub fn as_slice(&self) -> &[Classification] {
        &self.classes
    }

    pub fn foreground_count(&self) -> usize {
        self.classes.iter().filter(|c| !c.is_background()).count()
    }

    pub fn background_count(&self) -> usize {
        self.classes.len() - self.foreground_count()
    }

    /// Foreground as 255, background as 0
    pub fn to_luma_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| match self.get(x, y) {
            Classification::Foreground => Luma([u8::MAX]),
            Classification::Background => Luma([u8::MIN]),
        })
    }
}

/// Result of segmenting one frame
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Visualised output, painted according to the display mode
    pub image: RgbImage,
    pub classes: ClassificationMap,
    /// The shake detector discarded the model during this frame
    pub reinitialized: bool,
    /// Fraction of pixels whose luma matched the other shake slot, when
    /// a comparison was made this frame
    pub shake_match_ratio: Option<f64>,
}

/// Trait for segmentation models
/// Allows the frame loop to drive any background model
pub trait SegmentationModel {
    /// Segment one frame
    ///
    /// # Arguments
    /// * `frame` - Input frame at the model's input size
    fn segment(&mut self, frame: &RgbImage) -> Result<Segmentation>;

    /// Discard learned state; the next frame starts the model from scratch
    ///
    /// Call this when:
    /// - Switching cameras
    /// - Scene cuts detected
    fn reset_state(&mut self) {}

    /// Get the model's fixed input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}

use image::{imageops, RgbImage};
use std::borrow::Cow;

/// Fits captured frames to the model's fixed size and back
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Resize a captured frame to the model's input size
    ///
    /// Frames already at the target size are borrowed as-is.
    pub fn preprocess<'a>(&self, image: &'a RgbImage) -> Cow<'a, RgbImage> {
        let _span = tracing::debug_span!("preprocess").entered();

        if image.dimensions() == (self.target_width, self.target_height) {
            return Cow::Borrowed(image);
        }

        Cow::Owned(imageops::resize(
            image,
            self.target_width,
            self.target_height,
            imageops::FilterType::Lanczos3,
        ))
    }

    /// Resize a segmentation back to the capture size
    ///
    /// Nearest-neighbour keeps mask and checkerboard colours exact.
    pub fn postprocess(segmentation: RgbImage, target_width: u32, target_height: u32) -> RgbImage {
        let _span = tracing::debug_span!("postprocess").entered();

        if segmentation.dimensions() == (target_width, target_height) {
            return segmentation;
        }

        imageops::resize(
            &segmentation,
            target_width,
            target_height,
            imageops::FilterType::Nearest,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn matching_frames_are_borrowed() {
        let frame = RgbImage::new(8, 6);
        let pre = Preprocessor::new(8, 6);
        assert!(matches!(pre.preprocess(&frame), Cow::Borrowed(_)));
    }

    #[test]
    fn frames_are_resized_to_model_size() {
        let frame = RgbImage::from_pixel(16, 12, Rgb([40, 80, 120]));
        let pre = Preprocessor::new(8, 6);
        let fitted = pre.preprocess(&frame);
        assert_eq!(fitted.dimensions(), (8, 6));
        assert_eq!(fitted.get_pixel(3, 3).0, [40, 80, 120]);
    }

    #[test]
    fn postprocess_keeps_binary_colours() {
        let mask = RgbImage::from_fn(4, 4, |x, _| {
            if x < 2 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let restored = Preprocessor::postprocess(mask, 8, 8);
        assert_eq!(restored.dimensions(), (8, 8));
        assert!(restored.pixels().all(|p| p.0 == [255; 3] || p.0 == [0; 3]));
    }
}

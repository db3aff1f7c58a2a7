use super::{fit_frame, OutputSink};
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Writes each frame as a numbered PNG
pub struct ImageDirOutput {
    dir: PathBuf,
    width: u32,
    height: u32,
    written: u64,
}

impl ImageDirOutput {
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        tracing::info!("Writing {}x{} frames to {}", width, height, dir.display());

        Ok(Self {
            dir,
            width,
            height,
            written: 0,
        })
    }

    fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl OutputSink for ImageDirOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let frame = fit_frame(frame, self.width, self.height);
        let path = self.frame_path(self.written);

        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        self.written += 1;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn frames_are_numbered_and_resized() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageDirOutput::new(dir.path().join("out"), 4, 4).unwrap();

        sink.write_frame(&RgbImage::from_pixel(2, 2, Rgb([255, 0, 255]))).unwrap();
        sink.write_frame(&RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))).unwrap();

        let first = image::open(dir.path().join("out/frame_000000.png")).unwrap().to_rgb8();
        assert_eq!(first.dimensions(), (4, 4));
        assert_eq!(first.get_pixel(3, 3).0, [255, 0, 255]);
        assert!(dir.path().join("out/frame_000001.png").exists());
    }
}

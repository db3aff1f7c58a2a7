use super::{fit_frame, OutputSink};
use anyhow::{Context, Result};
use image::RgbImage;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub struct V4L2Output {
    file: File,
    width: u32,
    height: u32,
}

impl V4L2Output {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        #[cfg(feature = "loopback")]
        negotiate_yuyv(path, width, height)?;

        // v4l2loopback accepts raw frame data written to the device file
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
        })
    }

    /// Pack an RGB frame as YUYV (4:2:2), two pixels per four bytes
    ///
    /// An odd trailing pixel is paired with itself.
    fn rgb_to_yuyv(rgb_image: &RgbImage) -> Vec<u8> {
        let (width, height) = rgb_image.dimensions();
        let mut yuyv = Vec::with_capacity((width.div_ceil(2) * 4 * height) as usize);

        for row in rgb_image.rows() {
            let row: Vec<[u8; 3]> = row.map(|p| p.0).collect();
            for pair in row.chunks(2) {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                let (y0, u0, v0) = rgb_to_yuv(left);
                let (y1, u1, v1) = rgb_to_yuv(right);
                yuyv.extend_from_slice(&[y0, avg(u0, u1), y1, avg(v0, v1)]);
            }
        }

        yuyv
    }
}

fn avg(a: u8, b: u8) -> u8 {
    ((u16::from(a) + u16::from(b)) / 2) as u8
}

/// Ask the loopback device for YUYV output at the requested size
#[cfg(feature = "loopback")]
fn negotiate_yuyv(path: &Path, width: u32, height: u32) -> Result<()> {
    use v4l::video::Output;
    use v4l::{Device, FourCC};

    let device = Device::with_path(path)
        .with_context(|| format!("Failed to open {} for format negotiation", path.display()))?;

    let mut format = Output::format(&device).context("Failed to query output format")?;
    format.width = width;
    format.height = height;
    format.fourcc = FourCC::new(b"YUYV");

    let applied = Output::set_format(&device, &format).context("Failed to set output format")?;
    tracing::debug!(
        "Loopback format {}x{} {:?}",
        applied.width,
        applied.height,
        applied.fourcc
    );

    Ok(())
}

/// Full-range BT.601 in 8.8 fixed point
fn rgb_to_yuv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let clamp = |v: i32| v.clamp(0, 255) as u8;

    let y = (77 * r + 150 * g + 29 * b + 128) >> 8;
    let u = ((-43 * r - 85 * g + 128 * b + 128) >> 8) + 128;
    let v = ((128 * r - 107 * g - 21 * b + 128) >> 8) + 128;

    (clamp(y), clamp(u), clamp(v))
}

impl OutputSink for V4L2Output {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let frame = fit_frame(frame, self.width, self.height);
        let yuyv_data = Self::rgb_to_yuyv(&frame);

        self.file
            .write_all(&yuyv_data)
            .context("Failed to write frame to v4l2loopback device")?;

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
    fn yuyv_packs_two_pixels_per_four_bytes() {
        let frame = RgbImage::from_fn(4, 2, |x, _| {
            if x % 2 == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let packed = V4L2Output::rgb_to_yuyv(&frame);
        assert_eq!(packed.len(), 4 * 2 * 2);
        // white then black luma
        assert_eq!(packed[0], 255);
        assert_eq!(packed[2], 0);
    }

    #[test]
    fn odd_width_repeats_last_pixel() {
        let frame = RgbImage::from_pixel(3, 1, Rgb([0, 0, 0]));
        assert_eq!(V4L2Output::rgb_to_yuyv(&frame).len(), 8);
    }

    #[test]
    fn grey_has_neutral_chroma() {
        for level in [0u8, 77, 128, 255] {
            let (_, u, v) = rgb_to_yuv([level; 3]);
            assert_eq!((u, v), (128, 128));
        }
    }
}

use super::CaptureSource;
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;

const REQUESTED_FPS: u32 = 30;

/// Live frames from a local camera
///
/// The camera is asked for the format closest to the requested size; the
/// size it actually streams at is what `resolution` reports.
pub struct WebcamCapture {
    camera: Camera,
    resolution: Resolution,
}

impl WebcamCapture {
    pub fn new(device_index: u32, width: u32, height: u32) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} near {}x{}",
            device_index,
            width,
            height
        );

        let wanted = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::MJPEG,
            REQUESTED_FPS,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted));

        let mut camera = Camera::new(CameraIndex::Index(device_index), requested)
            .with_context(|| format!("Failed to open camera {device_index}"))?;
        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        let resolution = camera.resolution();
        tracing::info!(
            "Webcam streaming {}x{} at {} fps",
            resolution.width(),
            resolution.height(),
            camera.frame_rate()
        );

        Ok(Self { camera, resolution })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<Option<RgbImage>> {
        let buffer = self.camera.frame().context("Failed to capture frame")?;
        let frame = buffer
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.resolution.width(), self.resolution.height())
    }
}

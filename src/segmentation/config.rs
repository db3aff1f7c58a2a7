use super::error::{Result, VibeError};

/// How the segmentation buffer is painted from each decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DisplayMode {
    /// Background keeps its colour, foreground is black
    OnlyBackground,
    /// Foreground keeps its colour, background is black
    OnlyForeground,
    /// Binary mask: foreground white, background black
    #[default]
    Mask,
    /// Debug view: background keeps its colour, foreground is drawn as a
    /// magenta/black checkerboard keyed on (x + y) parity
    Checkerboard,
}

/// Channel layout of incoming frames
///
/// Only the shake detector's luma depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Integer luma scaled by 100: 11 * blue + 59 * green + 30 * red
    ///
    /// Exact equality of this value is equality of
    /// `0.11 * b + 0.59 * g + 0.30 * r` without float rounding.
    pub fn luma_x100(self, pixel: [u8; 3]) -> u32 {
        let [c0, c1, c2] = pixel.map(u32::from);
        match self {
            ChannelOrder::Bgr => 11 * c0 + 59 * c1 + 30 * c2,
            ChannelOrder::Rgb => 30 * c0 + 59 * c1 + 11 * c2,
        }
    }
}

/// Construction-time parameters of a ViBe model
#[derive(Debug, Clone, PartialEq)]
pub struct VibeConfig {
    /// Samples kept per pixel (N)
    pub samples: usize,
    /// Per-channel match threshold (R); a channel matches when |c - s| < R
    pub radius: u16,
    /// Matching samples required for background (bgMin)
    pub min_matches: usize,
    /// Update probability denominator; each draw fires with probability 1/phi
    pub phi: u32,
    /// Reinitialize when the shake match ratio drops below this
    pub frame_difference_percentage: f64,
    pub shaky_camera: bool,
    pub display_mode: DisplayMode,
    pub channel_order: ChannelOrder,
    /// Column strips per frame, defaults to the rayon pool size
    pub workers: Option<usize>,
    /// Seed for the model's random stream, entropy when absent
    pub seed: Option<u64>,
}

impl Default for VibeConfig {
    fn default() -> Self {
        Self {
            samples: 20,
            radius: 20,
            min_matches: 2,
            phi: 16,
            frame_difference_percentage: 0.125,
            shaky_camera: false,
            display_mode: DisplayMode::default(),
            channel_order: ChannelOrder::default(),
            workers: None,
            seed: None,
        }
    }
}

impl VibeConfig {
    pub fn validate(&self) -> Result<()> {
        let reject = |reason: String| Err(VibeError::InvalidConfiguration(reason));

        if self.samples == 0 {
            return reject("sample count must be positive".into());
        }
        if self.radius == 0 {
            return reject("radius must be positive".into());
        }
        if self.phi == 0 {
            return reject("phi must be positive".into());
        }
        if self.min_matches == 0 {
            return reject("min_matches must be positive".into());
        }
        if self.min_matches > self.samples {
            return reject(format!(
                "min_matches ({}) exceeds sample count ({})",
                self.min_matches, self.samples
            ));
        }
        if !self.frame_difference_percentage.is_finite()
            || !(0.0..=1.0).contains(&self.frame_difference_percentage)
        {
            return reject(format!(
                "frame_difference_percentage must lie in [0, 1], got {}",
                self.frame_difference_percentage
            ));
        }
        if self.workers == Some(0) {
            return reject("workers must be positive".into());
        }
        Ok(())
    }

    /// Worker count actually used for the fork-join
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(rayon::current_num_threads).max(1)
    }
}

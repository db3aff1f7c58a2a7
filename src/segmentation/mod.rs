mod classifier;
pub mod config;
pub mod error;
mod partition;
mod preprocess;
pub mod samples;
pub mod shake;
pub mod types;
pub mod updater;
mod vibe;

pub use classifier::Classifier;
pub use config::{ChannelOrder, DisplayMode, VibeConfig};
pub use error::VibeError;
pub use preprocess::Preprocessor;
pub use samples::{Sample, SampleStore};
pub use types::{Classification, ClassificationMap, Segmentation, SegmentationModel};
pub use vibe::{ModelState, Vibe};

use anyhow::Result;

/// Create a default segmentation model (ViBe) for frames of the given size
pub fn create_default_model(
    config: VibeConfig,
    width: u32,
    height: u32,
) -> Result<Box<dyn SegmentationModel>> {
    let model = Vibe::new(config, width, height)?;
    Ok(Box::new(model))
}

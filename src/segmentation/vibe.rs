use super::classifier::Classifier;
use super::config::{ChannelOrder, DisplayMode, VibeConfig};
use super::error::{Result, VibeError};
use super::partition::column_ranges;
use super::samples::{Sample, SampleStore};
use super::shake::ShakeDetector;
use super::types::{Classification, ClassificationMap, Segmentation, SegmentationModel};
use super::updater::{apply_diffusion, DiffusionWrite, ModelUpdater};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::ops::Range;

/// Lifecycle of a model instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// No frame seen yet, the sample store holds nothing useful
    Uninitialized,
    Steady,
}

/// ViBe background subtraction model
///
/// Each pixel keeps `samples` past colours. A pixel is background when at
/// least `min_matches` of them lie within `radius` on every channel.
/// Background pixels refresh one of their own samples, and one of a random
/// neighbour's, each with probability 1/phi.
///
/// Dimensions are fixed at construction. The first frame fills every sample
/// slot (cold start), after which frames are classified and learned from in a
/// single column-partitioned parallel pass.
///
/// The random stream is owned by the instance: given the same seed, worker
/// count and frames, the model evolves identically.
pub struct Vibe<R = StdRng> {
    config: VibeConfig,
    width: u32,
    height: u32,
    classifier: Classifier,
    updater: ModelUpdater,
    samples: SampleStore,
    shake: Option<ShakeDetector>,
    state: ModelState,
    frame_index: u64,
    rng: R,
}

impl Vibe<StdRng> {
    /// Create a model seeded from `config.seed`, or from entropy
    pub fn new(config: VibeConfig, width: u32, height: u32) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, width, height, rng)
    }
}

impl<R: Rng> Vibe<R> {
    /// Create a model drawing from an injected random stream
    pub fn with_rng(config: VibeConfig, width: u32, height: u32, rng: R) -> Result<Self> {
        config.validate()?;
        if width == 0 || height == 0 {
            return Err(VibeError::InvalidConfiguration(format!(
                "frame dimensions must be non-zero, got {width}x{height}"
            )));
        }

        tracing::debug!(
            "ViBe model {}x{}: N={} R={} min_matches={} phi={} shaky_camera={}",
            width,
            height,
            config.samples,
            config.radius,
            config.min_matches,
            config.phi,
            config.shaky_camera
        );

        let shake = config.shaky_camera.then(|| {
            ShakeDetector::new(
                width,
                height,
                config.channel_order,
                config.frame_difference_percentage,
            )
        });

        Ok(Self {
            classifier: Classifier::new(config.radius, config.min_matches),
            updater: ModelUpdater::new(config.phi, config.samples),
            samples: SampleStore::new(width, height, config.samples),
            shake,
            state: ModelState::Uninitialized,
            frame_index: 0,
            width,
            height,
            config,
            rng,
        })
    }

    pub fn config(&self) -> &VibeConfig {
        &self.config
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Frames processed since the last explicit initialization
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn samples(&self) -> &SampleStore {
        &self.samples
    }

    /// Cold start: every sample slot takes this frame's pixel value
    pub fn initialize(&mut self, frame: &RgbImage) -> Result<()> {
        self.check_frame(frame)?;
        tracing::info!("Initializing background model from {}x{} frame", self.width, self.height);
        self.reinitialize(frame)?;
        self.frame_index = 0;
        Ok(())
    }

    /// Classify `frame`, learn from its background and return the segmentation
    ///
    /// A frame with the wrong dimensions is rejected before anything is
    /// touched. An uninitialized model is first cold-started from `frame`.
    pub fn update(&mut self, frame: &RgbImage) -> Result<Segmentation> {
        self.check_frame(frame)?;
        if self.state == ModelState::Uninitialized {
            self.initialize(frame)?;
        }

        let _span = tracing::debug_span!("vibe_update", frame = self.frame_index).entered();

        let ranges = column_ranges(self.width, self.config.worker_count());
        let seeds: Vec<u64> = ranges.iter().map(|_| self.rng.gen()).collect();
        let shake_slot = self
            .shake
            .as_ref()
            .and_then(|_| ShakeDetector::active_slot(self.frame_index));

        let pass = FramePass {
            frame,
            classifier: self.classifier,
            updater: self.updater,
            display_mode: self.config.display_mode,
            channel_order: self.config.channel_order,
            shake_slot,
            dimensions: (self.width, self.height),
            depth: self.config.samples,
        };

        let sample_strips = self.samples.column_strips_mut(&ranges);
        let shake_strips: Vec<Option<&mut [[Sample; 2]]>> = match (self.shake.as_mut(), shake_slot) {
            (Some(detector), Some(_)) => detector
                .column_strips_mut(&ranges)
                .into_iter()
                .map(Some)
                .collect(),
            _ => ranges.iter().map(|_| None).collect(),
        };

        let jobs: Vec<_> = ranges
            .iter()
            .cloned()
            .zip(sample_strips)
            .zip(shake_strips)
            .zip(seeds)
            .collect();

        // join point: every strip has finished before anything below runs
        let outcomes: Vec<StripOutcome> = jobs
            .into_par_iter()
            .map(|(((columns, samples), shake), seed)| pass.run(columns, samples, shake, seed))
            .collect();

        let reduced = self.reduce(outcomes);
        let applied = apply_diffusion(&mut self.samples, &reduced.diffusion, &reduced.classes);
        tracing::debug!(
            "Frame {}: {} foreground pixels, {} diffusion writes applied",
            self.frame_index,
            reduced.classes.foreground_count(),
            applied
        );

        let pixels = u64::from(self.width) * u64::from(self.height);
        let verdict = match (self.shake.as_ref(), shake_slot) {
            (Some(detector), Some(_)) => Some((
                detector.match_ratio(reduced.shake_matches, pixels),
                detector.should_reinitialize(reduced.shake_matches, pixels),
            )),
            _ => None,
        };

        let mut reinitialized = false;
        if let Some((ratio, shaken)) = verdict {
            tracing::debug!("Frame {}: shake match ratio {:.3}", self.frame_index, ratio);
            if shaken {
                tracing::info!(
                    "Camera shake detected at frame {} (match ratio {:.3}), reinitializing background model",
                    self.frame_index,
                    ratio
                );
                self.reinitialize(frame)?;
                reinitialized = true;
            }
        }

        self.frame_index += 1;

        Ok(Segmentation {
            image: reduced.image,
            classes: reduced.classes,
            reinitialized,
            shake_match_ratio: verdict.map(|(ratio, _)| ratio),
        })
    }

    fn reinitialize(&mut self, frame: &RgbImage) -> Result<()> {
        self.samples.initialize(frame, self.config.worker_count())?;
        if let Some(detector) = self.shake.as_mut() {
            detector.seed(frame);
        }
        self.state = ModelState::Steady;
        Ok(())
    }

    fn reduce(&self, outcomes: Vec<StripOutcome>) -> Reduced {
        let (width, height) = (self.width, self.height);
        let mut image = RgbImage::new(width, height);
        let mut classes = vec![Classification::Background; width as usize * height as usize];
        let mut diffusion = Vec::new();
        let mut shake_matches = 0;

        for outcome in outcomes {
            let cells = outcome
                .columns
                .clone()
                .flat_map(move |x| (0..height).map(move |y| (x, y)));
            for ((x, y), (colour, class)) in cells.zip(outcome.painted.into_iter().zip(outcome.classes)) {
                image.put_pixel(x, y, Rgb(colour));
                classes[y as usize * width as usize + x as usize] = class;
            }
            diffusion.extend(outcome.diffusion);
            shake_matches += outcome.shake_matches;
        }

        Reduced {
            image,
            classes: ClassificationMap::new(width, height, classes),
            diffusion,
            shake_matches,
        }
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

impl<R: Rng> SegmentationModel for Vibe<R> {
    fn segment(&mut self, frame: &RgbImage) -> anyhow::Result<Segmentation> {
        Ok(self.update(frame)?)
    }

    fn reset_state(&mut self) {
        tracing::info!("Resetting ViBe background model");
        self.state = ModelState::Uninitialized;
        self.frame_index = 0;
    }

    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Read-only inputs shared by every worker of one frame
struct FramePass<'a> {
    frame: &'a RgbImage,
    classifier: Classifier,
    updater: ModelUpdater,
    display_mode: DisplayMode,
    channel_order: ChannelOrder,
    shake_slot: Option<usize>,
    dimensions: (u32, u32),
    depth: usize,
}

/// What one worker hands back at the join
struct StripOutcome {
    columns: Range<u32>,
    // column-major within the strip
    painted: Vec<Sample>,
    classes: Vec<Classification>,
    diffusion: Vec<DiffusionWrite>,
    shake_matches: u64,
}

struct Reduced {
    image: RgbImage,
    classes: ClassificationMap,
    diffusion: Vec<DiffusionWrite>,
    shake_matches: u64,
}

impl FramePass<'_> {
    fn run(
        &self,
        columns: Range<u32>,
        samples: &mut [Sample],
        shake: Option<&mut [[Sample; 2]]>,
        seed: u64,
    ) -> StripOutcome {
        let mut rng = StdRng::seed_from_u64(seed);
        let height = self.dimensions.1;
        let pixels = columns.len() * height as usize;

        let mut painted = Vec::with_capacity(pixels);
        let mut classes = Vec::with_capacity(pixels);
        let mut diffusion = Vec::new();
        let mut shake_matches = 0;

        let mut own_slots = samples.chunks_exact_mut(self.depth);
        let mut shake_pairs = shake.map(|pairs| pairs.iter_mut());

        for x in columns.clone() {
            for y in 0..height {
                let colour = self.frame.get_pixel(x, y).0;
                let Some(own) = own_slots.next() else {
                    break;
                };

                if let (Some(pairs), Some(slot)) = (shake_pairs.as_mut(), self.shake_slot) {
                    if let Some(pair) = pairs.next() {
                        if ShakeDetector::observe(self.channel_order, pair, slot, colour) {
                            shake_matches += 1;
                        }
                    }
                }

                let class = self.classifier.classify(colour, own);
                if class.is_background() {
                    if let Some(write) = self.updater.update(&mut rng, (x, y), self.dimensions, colour, own) {
                        diffusion.push(write);
                    }
                }

                painted.push(self.display_mode.paint(class, colour, x, y));
                classes.push(class);
            }
        }

        StripOutcome {
            columns,
            painted,
            classes,
            diffusion,
            shake_matches,
        }
    }
}

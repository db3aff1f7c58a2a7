use super::samples::{Sample, SampleStore};
use super::types::ClassificationMap;
use rand::Rng;

/// A sample write aimed at a neighbouring pixel
///
/// Neighbours may sit in another worker's strip, so these are collected during
/// the parallel pass and applied once every strip has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusionWrite {
    pub x: u32,
    pub y: u32,
    pub slot: usize,
    pub colour: Sample,
}

/// Stochastic refresh of the sample store from background pixels
#[derive(Debug, Clone, Copy)]
pub struct ModelUpdater {
    phi: u32,
    depth: usize,
}

impl ModelUpdater {
    pub fn new(phi: u32, depth: usize) -> Self {
        Self { phi, depth }
    }

    /// Runs both draws for a background pixel at `(x, y)`
    ///
    /// `own` is the pixel's slots and is written in place. A neighbour write,
    /// when drawn, is returned for deferred application.
    pub fn update<R: Rng>(
        &self,
        rng: &mut R,
        (x, y): (u32, u32),
        (width, height): (u32, u32),
        colour: Sample,
        own: &mut [Sample],
    ) -> Option<DiffusionWrite> {
        if rng.gen_range(0..self.phi) == 0 {
            let slot = rng.gen_range(0..self.depth);
            own[slot] = colour;
        }

        if rng.gen_range(0..self.phi) == 0 {
            let slot = rng.gen_range(0..self.depth);
            let x = neighbour_coord(rng, x, width);
            let y = neighbour_coord(rng, y, height);
            return Some(DiffusionWrite { x, y, slot, colour });
        }

        None
    }
}

/// Random step of -1, 0 or +1 along one axis
///
/// The first and last index of the axis stay where they are.
pub fn neighbour_coord<R: Rng>(rng: &mut R, coord: u32, len: u32) -> u32 {
    if coord == 0 || coord + 1 >= len {
        return coord;
    }
    match rng.gen_range(0..3u8) {
        0 => coord - 1,
        1 => coord,
        _ => coord + 1,
    }
}

/// Applies deferred neighbour writes in order
///
/// Writes landing on a pixel classified foreground this frame are dropped.
/// Returns how many were applied.
pub fn apply_diffusion(
    store: &mut SampleStore,
    writes: &[DiffusionWrite],
    classes: &ClassificationMap,
) -> usize {
    let mut applied = 0;
    for write in writes {
        if !classes.get(write.x, write.y).is_background() {
            continue;
        }
        match store.replace(write.x, write.y, write.slot, write.colour) {
            Ok(()) => applied += 1,
            Err(err) => tracing::warn!("dropping diffusion write: {err}"),
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::types::Classification;
    use image::RgbImage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn border_coordinates_stay_put() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(neighbour_coord(&mut rng, 0, 10), 0);
            assert_eq!(neighbour_coord(&mut rng, 9, 10), 9);
            assert_eq!(neighbour_coord(&mut rng, 0, 1), 0);
        }
    }

    #[test]
    fn interior_coordinates_move_at_most_one() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 3];
        for _ in 0..500 {
            let n = neighbour_coord(&mut rng, 5, 10);
            assert!((4..=6).contains(&n));
            seen[(n - 4) as usize] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn phi_one_always_updates() {
        let updater = ModelUpdater::new(1, 4);
        let mut rng = StdRng::seed_from_u64(3);
        let mut own = [[0u8; 3]; 4];

        let write = updater.update(&mut rng, (2, 2), (5, 5), [9, 9, 9], &mut own);

        assert_eq!(own.iter().filter(|s| **s == [9, 9, 9]).count(), 1);
        let write = write.expect("phi = 1 always diffuses");
        assert!((1..=3).contains(&write.x));
        assert!((1..=3).contains(&write.y));
        assert!(write.slot < 4);
        assert_eq!(write.colour, [9, 9, 9]);
    }

    #[test]
    fn diffusion_skips_foreground_targets() {
        use Classification::*;
        let mut store = SampleStore::new(2, 1, 2);
        store.initialize(&RgbImage::new(2, 1), 1).unwrap();
        let classes = ClassificationMap::new(2, 1, vec![Background, Foreground]);
        let writes = [
            DiffusionWrite { x: 0, y: 0, slot: 1, colour: [5, 5, 5] },
            DiffusionWrite { x: 1, y: 0, slot: 0, colour: [6, 6, 6] },
        ];

        assert_eq!(apply_diffusion(&mut store, &writes, &classes), 1);
        assert_eq!(store.samples(0, 0), &[[0; 3], [5, 5, 5]]);
        assert_eq!(store.samples(1, 0), &[[0; 3], [0; 3]]);
    }
}

//! Render target: running per-pixel averages plus the bookkeeping the
//! progressive loop and a display need.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use lux_math::Color;

use crate::error::{RenderError, Result};

/// "Has unconsumed update" flag shared between the renderer and whoever
/// displays the result.
#[derive(Debug, Clone, Default)]
pub struct UpdateFlag(Arc<AtomicBool>);

impl UpdateFlag {
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Clamp linear colour to `[0, 1]` and scale to 8 bits (truncating).
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let c = color.clamp(Color::ZERO, Color::ONE) * 255.0;
    [c.x as u8, c.y as u8, c.z as u8]
}

/// Pixels flagged for another sampling pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseMask {
    width: u32,
    height: u32,
    noisy: Vec<bool>,
    count: usize,
}

impl NoiseMask {
    pub fn any(&self) -> bool {
        self.count > 0
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_noisy(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.noisy[(y * self.width + x) as usize]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.noisy
    }
}

/// Accumulated render output.
///
/// Each pixel holds the mean of every sample taken so far together with the
/// number of those samples.
#[derive(Debug, Clone)]
pub struct RenderResult {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    sample_counts: Vec<u32>,
    updated: UpdateFlag,
}

impl RenderResult {
    /// Black image with no samples.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; len],
            sample_counts: vec![0; len],
            updated: UpdateFlag::default(),
        }
    }

    /// Wrap existing averages, each counted as `samples` samples.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>, samples: u32) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RenderError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            sample_counts: vec![samples; expected],
            updated: UpdateFlag::default(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn sample_counts(&self) -> &[u32] {
        &self.sample_counts
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    pub fn samples_at(&self, x: u32, y: u32) -> u32 {
        self.sample_counts[self.index(x, y)]
    }

    /// Handle to the shared update flag.
    pub fn updated(&self) -> UpdateFlag {
        self.updated.clone()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Merge `samples` new samples summing to `sum` into pixel `(x, y)`.
    ///
    /// The existing mean is weighted by `prior` samples, or by the pixel's
    /// own count when `prior` is `None`. The count saturates at `u32::MAX`.
    pub fn accumulate(&mut self, x: u32, y: u32, sum: Color, samples: u32, prior: Option<u32>) {
        let i = self.index(x, y);
        let prior = prior.unwrap_or(self.sample_counts[i]);
        let total = prior.saturating_add(samples);
        if total == 0 {
            return;
        }
        self.pixels[i] = (self.pixels[i] * prior as f32 + sum) / total as f32;
        self.sample_counts[i] = total;
    }

    /// Difference between pixel `(x, y)` and the mean of its (up to four)
    /// edge neighbours.
    pub fn pixel_noise(&self, x: u32, y: u32) -> Color {
        let mut sum = Color::ZERO;
        let mut count = 0;
        let mut add = |nx: u32, ny: u32| {
            sum += self.get(nx, ny);
            count += 1;
        };
        if x > 0 {
            add(x - 1, y);
        }
        if x + 1 < self.width {
            add(x + 1, y);
        }
        if y > 0 {
            add(x, y - 1);
        }
        if y + 1 < self.height {
            add(x, y + 1);
        }
        if count == 0 {
            return Color::ZERO;
        }
        self.get(x, y) - sum / count as f32
    }

    /// Flag pixels whose noise has a squared length above `epsilon²`.
    pub fn compute_noise_mask(&self, epsilon: f32) -> NoiseMask {
        let threshold = epsilon * epsilon;
        let mut count = 0;
        let mut noisy = Vec::with_capacity(self.pixels.len());
        for y in 0..self.height {
            for x in 0..self.width {
                let flag = self.pixel_noise(x, y).length_squared() > threshold;
                count += flag as usize;
                noisy.push(flag);
            }
        }
        NoiseMask {
            width: self.width,
            height: self.height,
            noisy,
            count,
        }
    }

    /// Row-major 8-bit RGB bytes.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgb8(*c)).collect()
    }

    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| Rgb(color_to_rgb8(self.get(x, y))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_running_average() {
        let mut result = RenderResult::new(2, 1);
        result.accumulate(0, 0, Color::splat(2.0), 2, None);
        assert_eq!(result.get(0, 0), Color::splat(1.0));
        assert_eq!(result.samples_at(0, 0), 2);

        result.accumulate(0, 0, Color::splat(7.0), 2, None);
        assert_eq!(result.get(0, 0), Color::splat(9.0 / 4.0));
        assert_eq!(result.samples_at(0, 0), 4);

        // Explicit prior overrides the tracked count
        result.accumulate(1, 0, Color::splat(3.0), 1, Some(3));
        assert_eq!(result.get(1, 0), Color::splat(0.75));
        assert_eq!(result.samples_at(1, 0), 4);
    }

    #[test]
    fn test_sample_count_saturates() {
        let mut result = RenderResult::new(1, 1);
        result.accumulate(0, 0, Color::splat(4.0), 4, Some(u32::MAX - 1));
        assert_eq!(result.samples_at(0, 0), u32::MAX);
        assert!(result.get(0, 0).is_finite());
    }

    #[test]
    fn test_from_pixels_checks_size() {
        assert!(matches!(
            RenderResult::from_pixels(2, 2, vec![Color::ZERO; 3], 1),
            Err(RenderError::SizeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_identical_neighbours_are_not_noisy() {
        let result = RenderResult::from_pixels(2, 1, vec![Color::splat(0.3); 2], 4).unwrap();
        assert_eq!(result.pixel_noise(0, 0), Color::ZERO);
        assert_eq!(result.pixel_noise(1, 0), Color::ZERO);
        for eps in [1.0, 0.1, 1e-3, 1e-9] {
            assert!(!result.compute_noise_mask(eps).any());
        }
    }

    #[test]
    fn test_outlier_is_flagged() {
        let mut pixels = vec![Color::splat(0.5); 9];
        pixels[4] = Color::splat(1.5);
        let result = RenderResult::from_pixels(3, 3, pixels, 1).unwrap();

        // Centre differs by 1 on each channel: |d|² = 3
        let mask = result.compute_noise_mask(1.7);
        assert!(mask.is_noisy(1, 1));
        let mask = result.compute_noise_mask(1.8);
        assert!(!mask.is_noisy(1, 1));

        // Edge neighbours see a quarter or a third of the outlier
        let mask = result.compute_noise_mask(0.1);
        assert!(mask.is_noisy(1, 0));
        assert!(!mask.is_noisy(0, 0));
        assert_eq!(mask.count(), 5);
    }

    #[test]
    fn test_single_pixel_has_no_noise() {
        let result = RenderResult::from_pixels(1, 1, vec![Color::ONE], 1).unwrap();
        assert!(!result.compute_noise_mask(0.0).any());
    }

    #[test]
    fn test_snapshot_clamps_and_truncates() {
        assert_eq!(color_to_rgb8(Color::new(-1.0, 0.5, 3.0)), [0, 127, 255]);
        assert_eq!(color_to_rgb8(Color::splat(0.999)), [254, 254, 254]);

        let result =
            RenderResult::from_pixels(2, 1, vec![Color::new(1.0, 0.0, 0.0), Color::splat(0.2)], 1).unwrap();
        assert_eq!(result.to_rgb8(), vec![255, 0, 0, 51, 51, 51]);
        let image = result.to_image();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(1, 0).0, [51, 51, 51]);
    }

    #[test]
    fn test_update_flag() {
        let result = RenderResult::new(1, 1);
        let flag = result.updated();
        assert!(!flag.take());
        result.updated().mark();
        assert!(flag.is_set());
        assert!(flag.take());
        assert!(!flag.is_set());
    }

    proptest! {
        #[test]
        fn prop_noise_mask_is_monotonic(
            values in prop::collection::vec(0.0f32..2.0, 48),
            eps in 0.001f32..1.0,
            shrink in 0.0f32..1.0,
        ) {
            let pixels = values.chunks(3).map(|c| Color::new(c[0], c[1], c[2])).collect();
            let result = RenderResult::from_pixels(4, 4, pixels, 1).unwrap();
            let loose = result.compute_noise_mask(eps);
            let tight = result.compute_noise_mask(eps * shrink);
            for (l, t) in loose.as_slice().iter().zip(tight.as_slice()) {
                prop_assert!(!l || *t);
            }
            prop_assert!(tight.count() >= loose.count());
        }
    }
}

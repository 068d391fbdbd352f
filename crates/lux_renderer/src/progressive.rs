//! Progressive refinement: one uniform pass, then passes restricted to the
//! pixels the noise mask still flags, with a tighter threshold each time.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::{RenderResult, Renderer, Scene};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressiveConfig {
    /// Samples per pixel of the first, full-image pass
    pub initial_samples: u32,
    /// Samples added to each noisy pixel per refinement pass
    pub refinement_samples: u32,
    /// One refinement pass per entry, in order
    pub noise_epsilons: Vec<f32>,
}

impl Default for ProgressiveConfig {
    fn default() -> Self {
        Self {
            initial_samples: 4,
            refinement_samples: 4,
            noise_epsilons: vec![0.2, 0.1, 0.05],
        }
    }
}

/// Where the progressive loop currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassProgress {
    /// 0 for the initial pass
    pub pass: usize,
    /// Upper bound on the number of passes
    pub passes: usize,
    /// Fraction of the current pass finished
    pub fraction: f32,
}

/// What a progressive render did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressiveSummary {
    /// Passes actually run, including the initial one
    pub passes: usize,
    /// Noisy pixel count found before each refinement pass
    pub noisy_pixels: Vec<usize>,
    pub samples: u64,
}

pub struct ProgressiveRenderer<'a> {
    renderer: &'a Renderer,
    config: ProgressiveConfig,
}

impl<'a> ProgressiveRenderer<'a> {
    pub fn new(renderer: &'a Renderer, config: ProgressiveConfig) -> Self {
        Self { renderer, config }
    }

    pub fn config(&self) -> &ProgressiveConfig {
        &self.config
    }

    /// Run the initial pass and every refinement pass into `result`.
    ///
    /// Stops early once no pixel is flagged as noisy.
    pub fn run<F>(&self, scene: &Scene, result: &mut RenderResult, mut on_progress: F) -> Result<ProgressiveSummary>
    where
        F: FnMut(PassProgress),
    {
        let passes = 1 + self.config.noise_epsilons.len();
        let mut summary = ProgressiveSummary::default();

        let stats = self.renderer.render(
            scene,
            result,
            self.config.initial_samples,
            None,
            |_, _| true,
            |fraction| {
                on_progress(PassProgress {
                    pass: 0,
                    passes,
                    fraction,
                })
            },
        )?;
        summary.passes = 1;
        summary.samples += stats.samples;

        for (i, &epsilon) in self.config.noise_epsilons.iter().enumerate() {
            let mask = result.compute_noise_mask(epsilon);
            log::debug!(
                "Noise pass {}: {} of {} pixels above {}",
                i + 1,
                mask.count(),
                result.pixel_count(),
                epsilon
            );
            summary.noisy_pixels.push(mask.count());
            if !mask.any() {
                break;
            }

            let stats = self.renderer.render(
                scene,
                result,
                self.config.refinement_samples,
                None,
                |x, y| mask.is_noisy(x, y),
                |fraction| {
                    on_progress(PassProgress {
                        pass: i + 1,
                        passes,
                        fraction,
                    })
                },
            )?;
            summary.passes += 1;
            summary.samples += stats.samples;
        }

        log::info!(
            "Progressive render finished: {} passes, {} samples",
            summary.passes,
            summary.samples
        );
        Ok(summary)
    }
}

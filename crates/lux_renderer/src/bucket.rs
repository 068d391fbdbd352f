//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently and in parallel.

use crate::renderer::sample_pixel;
use crate::Scene;
use lux_math::Color;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Pixel coordinates in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.height).flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }
}

pub const DEFAULT_BUCKET_WIDTH: u32 = 16;
pub const DEFAULT_BUCKET_HEIGHT: u32 = 9;

/// Generate buckets for an image, sorted in spiral order from center.
///
/// Buckets on the right and bottom edges are cut to fit the image.
pub fn generate_buckets(width: u32, height: u32, bucket_width: u32, bucket_height: u32) -> Vec<Bucket> {
    let mut buckets = Vec::new();
    if bucket_width == 0 || bucket_height == 0 {
        return buckets;
    }

    let mut index = 0;
    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_width.min(width - x);
            let bh = bucket_height.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_width;
        }
        y += bucket_height;
    }

    sort_spiral(&mut buckets, width, height);
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center, so the middle of the image
/// fills in first.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |b: &Bucket| {
        let bx = b.x as f32 + b.width as f32 / 2.0;
        let by = b.y as f32 + b.height as f32 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Per-call sampling parameters shared by every bucket.
#[derive(Debug, Clone, Copy)]
pub struct PassParams<'a> {
    pub image_width: u32,
    pub image_height: u32,
    pub samples: u32,
    pub seed: u64,
    /// Index of the first new sample of each pixel
    pub first_sample: &'a [u32],
}

/// Sum of the new samples of every selected pixel, in row-major order
/// within the bucket. Pixels rejected by the predicate are `None`.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    pub sums: Vec<Option<Color>>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, sums: Vec<Option<Color>>) -> Self {
        Self { bucket, sums }
    }

    /// Pixels that received samples.
    pub fn rendered(&self) -> usize {
        self.sums.iter().filter(|s| s.is_some()).count()
    }

    /// `(x, y, sum)` for each pixel that received samples.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
        self.bucket
            .pixels()
            .zip(&self.sums)
            .filter_map(|((x, y), sum)| sum.map(|s| (x, y, s)))
    }
}

/// Render a single bucket.
pub fn render_bucket<P>(bucket: &Bucket, scene: &Scene, pass: &PassParams, predicate: &P) -> BucketResult
where
    P: Fn(u32, u32) -> bool,
{
    let sums = bucket
        .pixels()
        .map(|(x, y)| {
            if !predicate(x, y) {
                return None;
            }
            let pixel = y as usize * pass.image_width as usize + x as usize;
            let first = pass.first_sample[pixel];
            let sum = (first..first.saturating_add(pass.samples))
                .map(|index| {
                    sample_pixel(
                        scene,
                        x,
                        y,
                        pass.image_width,
                        pass.image_height,
                        index,
                        pass.seed,
                    )
                })
                .fold(Color::ZERO, |acc, c| acc + c);
            Some(sum)
        })
        .collect();

    BucketResult::new(*bucket, sums)
}

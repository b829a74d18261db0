//! Adaptive supersampling integrator
//!
//! Each pixel starts as one cell with its four corners sampled. The center is
//! sampled and, if it disagrees with any corner by more than the tolerance, the
//! cell splits into quadrants. The tolerance doubles at every level, so from
//! `channel_bound / 2^bits` it reaches `channel_bound` after `bits` levels; that
//! level is also a hard cap on recursion depth.
//!
//! Corner samples along shared pixel edges are computed once per row line.

use log::debug;
use rayon::prelude::*;

use super::math::Vec2;
use super::types::Rgba;

/// Sampling work counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    /// Calls made to the sample function
    pub samples: u64,
    /// Cells split into quadrants
    pub subdivisions: u64,
    /// Deepest recursion level reached (pixel cell = 0)
    pub max_depth: u32,
}

impl SampleStats {
    fn merge(mut self, other: SampleStats) -> SampleStats {
        self.samples += other.samples;
        self.subdivisions += other.subdivisions;
        self.max_depth = self.max_depth.max(other.max_depth);
        self
    }
}

/// Row-major image of premultiplied samples
#[derive(Debug, Clone)]
pub struct SampledImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Rgba>,
    pub stats: SampleStats,
}

impl SampledImage {
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[y * self.width + x]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    anti_alias_bit_depth: u32,
    channel_bound: f32,
    /// Sample rows on the rayon pool. Output is identical either way.
    pub parallel: bool,
}

impl Sampler {
    /// `channel_bound` is the largest RGB value the sample function returns.
    /// Panics unless `anti_alias_bit_depth` is in `[1,16]` and the bound is positive.
    pub fn new(anti_alias_bit_depth: u32, channel_bound: f32) -> Self {
        assert!(
            (1..=16).contains(&anti_alias_bit_depth),
            "anti-alias bit depth must be in [1,16], got {}",
            anti_alias_bit_depth
        );
        assert!(channel_bound > 0.0, "channel bound must be positive");
        Self {
            anti_alias_bit_depth,
            channel_bound,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Flatness tolerance at the pixel level
    pub fn tolerance(&self) -> f32 {
        self.channel_bound / (1u32 << self.anti_alias_bit_depth) as f32
    }

    /// Integrate `sample` over every pixel. `sample` takes positions in image
    /// unit space (`[0,1]²`), must be pure, and must return premultiplied color
    /// with alpha in `[0,1]`.
    pub fn sample<F>(&self, width: usize, height: usize, sample: &F) -> SampledImage
    where
        F: Fn(Vec2) -> Rgba + Sync,
    {
        assert!(width > 0 && height > 0, "image size must be non-zero");

        let mut pixels = vec![Rgba::TRANSPARENT; width * height];
        let stats = if self.parallel {
            pixels
                .par_chunks_mut(width)
                .enumerate()
                .map(|(row, out)| {
                    let mut walker = Walker::new(sample, self.anti_alias_bit_depth, width, height);
                    let top = walker.line(row);
                    let bottom = walker.line(row + 1);
                    walker.row(row, &top, &bottom, out, self.tolerance());
                    walker.stats
                })
                .reduce(SampleStats::default, SampleStats::merge)
        } else {
            let mut walker = Walker::new(sample, self.anti_alias_bit_depth, width, height);
            let mut top = walker.line(0);
            for (row, out) in pixels.chunks_mut(width).enumerate() {
                let bottom = walker.line(row + 1);
                walker.row(row, &top, &bottom, out, self.tolerance());
                top = bottom;
            }
            walker.stats
        };

        debug!(
            "sampled {}x{}: {} samples, {} subdivisions, depth {}",
            width, height, stats.samples, stats.subdivisions, stats.max_depth
        );

        SampledImage {
            width,
            height,
            pixels,
            stats,
        }
    }
}

/// Recursion state for one thread of sampling
struct Walker<'f, F> {
    sample_fn: &'f F,
    max_depth: u32,
    width: usize,
    height: usize,
    stats: SampleStats,
}

impl<'f, F> Walker<'f, F>
where
    F: Fn(Vec2) -> Rgba,
{
    fn new(sample_fn: &'f F, max_depth: u32, width: usize, height: usize) -> Self {
        Self {
            sample_fn,
            max_depth,
            width,
            height,
            stats: SampleStats::default(),
        }
    }

    fn sample(&mut self, pos: Vec2) -> Rgba {
        self.stats.samples += 1;
        let c = (self.sample_fn)(pos);
        debug_assert!(
            (0.0..=1.0).contains(&c.a),
            "sample alpha out of range: {}",
            c.a
        );
        c
    }

    fn col_pos(&self, col: usize) -> f32 {
        col as f32 / self.width as f32
    }

    fn row_pos(&self, row: usize) -> f32 {
        row as f32 / self.height as f32
    }

    /// Samples at every pixel corner along one horizontal grid line
    fn line(&mut self, row: usize) -> Vec<Rgba> {
        let y = self.row_pos(row);
        (0..=self.width)
            .map(|col| {
                let x = self.col_pos(col);
                self.sample(Vec2::new(x, y))
            })
            .collect()
    }

    fn row(&mut self, row: usize, top: &[Rgba], bottom: &[Rgba], out: &mut [Rgba], tol: f32) {
        let y0 = self.row_pos(row);
        let y1 = self.row_pos(row + 1);
        for (col, px) in out.iter_mut().enumerate() {
            let lo = Vec2::new(self.col_pos(col), y0);
            let hi = Vec2::new(self.col_pos(col + 1), y1);
            let corners = [top[col], top[col + 1], bottom[col], bottom[col + 1]];
            *px = self.evaluate(lo, hi, corners, tol, 0);
        }
    }

    /// Integrate over the cell `lo..hi`. Corners are ordered
    /// `[(lo.x,lo.y), (hi.x,lo.y), (lo.x,hi.y), (hi.x,hi.y)]`.
    fn evaluate(&mut self, lo: Vec2, hi: Vec2, corners: [Rgba; 4], tol: f32, depth: u32) -> Rgba {
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let center = lo + (hi - lo) * 0.5;
        let c = self.sample(center);

        let flat = corners.iter().all(|k| k.max_abs_diff(c) <= tol);
        if flat || depth >= self.max_depth {
            // Pairwise sums keep a constant input exact
            return ((corners[0] + corners[1]) + (corners[2] + corners[3])) * 0.125 + c * 0.5;
        }

        self.stats.subdivisions += 1;
        let top = self.sample(Vec2::new(center.x, lo.y));
        let left = self.sample(Vec2::new(lo.x, center.y));
        let right = self.sample(Vec2::new(hi.x, center.y));
        let bottom = self.sample(Vec2::new(center.x, hi.y));

        let tol = tol * 2.0;
        let depth = depth + 1;
        let q00 = self.evaluate(lo, center, [corners[0], top, left, c], tol, depth);
        let q10 = self.evaluate(
            Vec2::new(center.x, lo.y),
            Vec2::new(hi.x, center.y),
            [top, corners[1], c, right],
            tol,
            depth,
        );
        let q01 = self.evaluate(
            Vec2::new(lo.x, center.y),
            Vec2::new(center.x, hi.y),
            [left, c, corners[2], bottom],
            tol,
            depth,
        );
        let q11 = self.evaluate(center, hi, [c, right, bottom, corners[3]], tol, depth);

        ((q00 + q10) + (q01 + q11)) * 0.25
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(p: Vec2) -> f32 {
        let h = (p.x * 12.9898 + p.y * 78.233).sin() * 43758.547;
        h - h.floor()
    }

    fn disc(p: Vec2) -> Rgba {
        let dx = p.x - 0.5;
        let dy = p.y - 0.5;
        if dx * dx + dy * dy < 0.09 {
            Rgba::new(0.2, 0.6, 1.0, 1.0)
        } else {
            Rgba::TRANSPARENT
        }
    }

    #[test]
    fn test_constant_is_exact_without_recursion() {
        let c = Rgba::new(0.3, 0.7, 0.1, 0.9);
        let img = Sampler::new(4, 1.0).sample(7, 5, &|_| c);
        assert!(img.pixels.iter().all(|&p| p == c));
        assert_eq!(img.stats.subdivisions, 0);
        assert_eq!(img.stats.max_depth, 0);
        assert_eq!(img.stats.samples, (8 * 6 + 7 * 5) as u64);
    }

    #[test]
    fn test_tolerance() {
        assert_eq!(Sampler::new(3, 1.0).tolerance(), 0.125);
        assert_eq!(Sampler::new(1, 255.0).tolerance(), 127.5);
    }

    #[test]
    fn test_recursion_depth_bounded() {
        for bits in [1, 2, 3, 5] {
            let img = Sampler::new(bits, 1.0).sample(6, 4, &|p| Rgba::gray(noise(p)));
            assert!(img.stats.max_depth <= bits);
            assert!(img.stats.subdivisions > 0);
        }
    }

    #[test]
    fn test_recursion_depth_bounded_out_of_range_samples() {
        // RGB far above the declared bound still stops at the bit depth
        let img = Sampler::new(2, 1.0).sample(3, 3, &|p| {
            Rgba::new(noise(p) * 1000.0, 0.0, 0.0, 1.0)
        });
        assert_eq!(img.stats.max_depth, 2);
    }

    #[test]
    fn test_edge_approximates_coverage() {
        let img = Sampler::new(3, 1.0).sample(1, 1, &|p| {
            if p.x < 0.3 { Rgba::BLACK } else { Rgba::WHITE }
        });
        let px = img.pixel(0, 0);
        assert!((px.r - 0.7).abs() < 0.05, "got {}", px.r);
        assert_eq!(px.a, 1.0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let serial = Sampler::new(4, 1.0).sample(16, 9, &disc);
        let parallel = Sampler::new(4, 1.0).with_parallel(true).sample(16, 9, &disc);
        assert_eq!(serial.pixels, parallel.pixels);
        assert_eq!(serial.stats.subdivisions, parallel.stats.subdivisions);
        assert_eq!(serial.stats.max_depth, parallel.stats.max_depth);
    }

    #[test]
    fn test_output_stays_premultiplied() {
        let img = Sampler::new(5, 1.0).sample(12, 12, &disc);
        for p in &img.pixels {
            assert!(p.a >= 0.0 && p.a <= 1.0 + 1e-6);
            assert!(p.b <= p.a + 1e-6);
        }
    }

    #[test]
    #[should_panic]
    fn test_rejects_zero_bit_depth() {
        Sampler::new(0, 1.0);
    }

    #[test]
    #[should_panic]
    fn test_rejects_large_bit_depth() {
        Sampler::new(17, 1.0);
    }

    #[test]
    #[should_panic]
    fn test_rejects_empty_image() {
        Sampler::new(3, 1.0).sample(0, 4, &|_| Rgba::BLACK);
    }
}

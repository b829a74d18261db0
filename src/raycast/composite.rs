//! Back-to-front "over" compositing of premultiplied fragments

use super::types::Rgba;

/// Blend one premultiplied fragment over an accumulated premultiplied color
#[inline]
pub fn over(fragment: Rgba, below: Rgba) -> Rgba {
    fragment + below * (1.0 - fragment.a)
}

/// Composite fragments given nearest first over `background`.
/// All colors must be alpha-premultiplied.
pub fn composite(nearest_first: &[Rgba], background: Rgba) -> Rgba {
    nearest_first.iter().rev().fold(background, |acc, &frag| over(frag, acc))
}

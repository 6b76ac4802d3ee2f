//! Noise samplers and the color functions built on them.

use bevy::math::Vec3;
use noiz::prelude::*;

use crate::{
    interp::{mix_colors, remap},
    types::{Color, Point, Value},
};

/// Layered gradient noise, normalized to roughly `-1..=1`.
pub type GradientNoise = Noise<
    LayeredNoise<Normed<f32>, Persistence, Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>>,
>;

/// Seeded 3D noise sampler.
///
/// `scale` is the rough feature size in world units, `detail` the amplitude of the
/// result and `variation` selects an independent pattern.
pub fn noise(scale: Value, detail: Value, variation: u32) -> impl Fn(Point) -> Value + Send + Sync + Clone {
    let mut noise = GradientNoise::default();
    noise.set_seed(variation);
    noise.set_frequency(1.0 / scale.max(Value::EPSILON));
    move |p| {
        let value: f32 = noise.sample_for(Vec3::new(p.x, p.y, p.z));
        value * detail
    }
}

/// Mixes `first` and `second` by `sampler`, reading its `-1..=1` output as `0..=1`.
pub fn colorize<S>(sampler: S, first: Color, second: Color) -> impl Fn(Point) -> Color + Send + Sync + Clone
where
    S: Fn(Point) -> Value + Send + Sync + Clone,
{
    move |p| {
        let unit = remap(sampler(p), [-1.0, 1.0], [0.0, 1.0]).clamp(0.0, 1.0);
        mix_colors(first, second, unit)
    }
}

pub fn constant_color(color: Color) -> impl Fn(Point) -> Color + Send + Sync + Clone {
    move |_| color
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn noise_is_deterministic_per_variation() {
        let a = noise(2.0, 1.0, 7);
        let b = noise(2.0, 1.0, 7);
        for p in [Point::new(0.3, 1.7, -2.2), Point::new(10.1, 0.0, 4.4)] {
            assert_eq!(a(p), b(p));
            assert!(a(p).is_finite());
        }
    }

    #[test]
    fn zero_detail_silences_noise() {
        let flat = noise(1.0, 0.0, 3);
        assert_eq!(flat(Point::new(0.4, 0.2, 0.9)), 0.0);
    }

    #[test]
    fn colorize_endpoints() {
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let blue = Color::new(0.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(colorize(|_: Point| -> Value { -1.0 }, red, blue)(Point::origin()), red);
        assert_relative_eq!(colorize(|_: Point| -> Value { 1.0 }, red, blue)(Point::origin()), blue);
        assert_relative_eq!(
            colorize(|_: Point| -> Value { 0.0 }, red, blue)(Point::origin()),
            Color::new(0.5, 0.0, 0.5, 1.0)
        );
        assert_relative_eq!(colorize(|_: Point| -> Value { 4.0 }, red, blue)(Point::origin()), blue);
    }
}

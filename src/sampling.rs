use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, trace};

use crate::{
    error::Result,
    grid::{GridBounds, GridGeometry},
    snap::{SnapConfig, snap_to_surface},
    types::{Color, ColorFunction, DistanceFunction, Point, Value, Vector},
};

/// Samples within this many cell lengths of the surface are snapped onto it.
pub const SAMPLE_RANGE_CELLS: Value = 1.5;

/// Settings for [`sample_function`].
///
/// ```rust,ignore
/// let config = SamplingConfig::default().with_resolution(20.0).with_levels(2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    /// Samples per unit length along each axis. Must be positive.
    pub resolution: Value,
    /// Rendered point size, in cell lengths.
    pub point_size: Value,
    /// Refinement levels. Each level past the first splits accepted cells into
    /// octants of half the length and samples those too. Default: `1`.
    pub levels: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            resolution: 10.0,
            point_size: 5.0,
            levels: 1,
        }
    }
}

impl SamplingConfig {
    pub fn with_resolution(mut self, resolution: Value) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_point_size(mut self, point_size: Value) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels.max(1);
        self
    }

    /// Largest `|distance|` at which a top-level cell is still considered near the surface.
    pub fn sample_range(&self) -> Value {
        SAMPLE_RANGE_CELLS / self.resolution
    }
}

/// A colored point on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub location: Point,
    /// Unit normal pointing from inside to outside.
    pub normal: Vector,
    pub color: Color,
    pub size: Value,
    /// Refinement level the point was produced at; `0` for top-level cells.
    pub level: usize,
}

/// Offsets of the 8 octant centers of a cell, in units of the octant length.
const SUBDIVISION_TEMPLATE: [[Value; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.5],
    [0.5, 0.5, 0.5],
];

/// Samples `distance` over `bounds` and snaps near-surface samples onto the surface.
///
/// Samples are visited in [`GridGeometry`] index order and the result keeps that order,
/// so identical inputs always give identical output. Samples farther than
/// [`SamplingConfig::sample_range`] from the surface are dropped without further work.
pub fn sample_function(
    config: &SamplingConfig,
    bounds: &GridBounds,
    distance: &DistanceFunction,
    color: &ColorFunction,
) -> Result<Vec<SamplePoint>> {
    let sampler = CellSampler::new(config, bounds, distance, color)?;

    let points: Vec<SamplePoint> = (0..sampler.cell_count())
        .into_par_iter()
        .flat_map_iter(|index| sampler.sample_cell(index))
        .collect();

    debug!(
        cells = sampler.cell_count(),
        points = points.len(),
        resolution = config.resolution,
        "sampled surface points"
    );
    Ok(points)
}

/// Samples a region one top-level cell at a time.
///
/// Useful for spreading sampling over several frames, or for sampling only some cells.
pub struct CellSampler<'a> {
    config: SamplingConfig,
    geometry: GridGeometry,
    distance: &'a DistanceFunction,
    color: &'a ColorFunction,
}

impl<'a> CellSampler<'a> {
    /// Fails fast on a non-positive resolution or an empty, inverted or oversized region.
    pub fn new(
        config: &SamplingConfig,
        bounds: &GridBounds,
        distance: &'a DistanceFunction,
        color: &'a ColorFunction,
    ) -> Result<Self> {
        let geometry = GridGeometry::new(bounds, config.resolution)?;
        Ok(Self {
            config: *config,
            geometry,
            distance,
            color,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.geometry.sample_count()
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Points produced by top-level cell `index`, in a fixed order.
    pub fn sample_cell(&self, index: usize) -> Vec<SamplePoint> {
        let mut points = Vec::new();
        let start = self.geometry.position(index);
        self.sample_point(self.geometry.cell_length(), 0, start, &mut points);
        points
    }

    fn sample_point(&self, cell_length: Value, level: usize, start: Point, points: &mut Vec<SamplePoint>) {
        let starting_distance = (self.distance)(start);
        if starting_distance.abs() > SAMPLE_RANGE_CELLS * cell_length {
            return;
        }

        let snapped = snap_to_surface(self.distance, start, &SnapConfig::for_cell_size(cell_length));
        if !snapped.converged {
            trace!(?start, distance = snapped.distance, "surface snap did not converge");
        }
        points.push(SamplePoint {
            location: snapped.location,
            normal: snapped.normal,
            color: (self.color)(snapped.location),
            size: self.config.point_size * cell_length,
            level,
        });

        if level + 1 < self.config.levels {
            let next_length = cell_length / 2.0;
            for offset in SUBDIVISION_TEMPLATE {
                let child = start + Vector::from(offset) * next_length;
                self.sample_point(next_length, level + 1, child, points);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::*;
    use crate::{error::SurfaceError, fields::sphere, noise::constant_color};

    fn bounds(half: i32) -> GridBounds {
        GridBounds::new(Vector3::new(-half, -half, -half), Vector3::new(half, half, half)).unwrap()
    }

    fn gray() -> impl Fn(Point) -> Color + Send + Sync + Clone {
        constant_color(Color::new(0.5, 0.5, 0.5, 1.0))
    }

    #[test]
    fn defaults_give_documented_range_and_size() {
        let config = SamplingConfig::default();
        assert_relative_eq!(config.sample_range(), 0.15);
        let points = sample_function(&config, &bounds(2), &sphere(1.0), &gray()).unwrap();
        assert!(points.iter().all(|p| (p.size - 0.5).abs() < 1e-6));
    }

    #[test]
    fn far_field_yields_nothing() {
        let far = |p: Point| (p - Point::new(50.0, 0.0, 0.0)).norm() - 1.0;
        let points = sample_function(&SamplingConfig::default(), &bounds(1), &far, &gray()).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn rejects_bad_configuration() {
        let config = SamplingConfig::default().with_resolution(0.0);
        assert!(matches!(
            sample_function(&config, &bounds(1), &sphere(1.0), &gray()),
            Err(SurfaceError::InvalidResolution(_))
        ));

        let inverted = GridBounds {
            start: Vector3::new(1, 0, 0),
            end: Vector3::new(0, 1, 1),
        };
        assert!(matches!(
            sample_function(&SamplingConfig::default(), &inverted, &sphere(1.0), &gray()),
            Err(SurfaceError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn cell_sampler_matches_batch_sampling() {
        let config = SamplingConfig::default().with_resolution(4.0);
        let field = sphere(1.0);
        let color = gray();
        let sampler = CellSampler::new(&config, &bounds(2), &field, &color).unwrap();
        let serial: Vec<_> = (0..sampler.cell_count()).flat_map(|i| sampler.sample_cell(i)).collect();
        let batch = sample_function(&config, &bounds(2), &field, &color).unwrap();
        assert_eq!(serial, batch);
    }

    #[test]
    fn refinement_adds_smaller_points() {
        let base = SamplingConfig::default().with_resolution(4.0);
        let coarse = sample_function(&base, &bounds(2), &sphere(1.0), &gray()).unwrap();
        let fine = sample_function(&base.with_levels(2), &bounds(2), &sphere(1.0), &gray()).unwrap();
        assert!(fine.len() > coarse.len());
        assert!(fine.iter().any(|p| p.level == 1));
        for p in fine.iter().filter(|p| p.level == 1) {
            assert_relative_eq!(p.size, 5.0 / 8.0);
        }
    }
}

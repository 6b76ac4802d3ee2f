use nalgebra::Vector3;
use tracing::warn;

use crate::{
    error::{Result, SurfaceError},
    types::{DistanceFunction, Point, Value},
};

/// Largest extent, in world units, a sampled region may have along any axis.
///
/// Intermediate edits of a composed field can make its estimated bounds spike;
/// such regions are refused instead of allocating an enormous grid.
pub const MAX_BOUNDS_EXTENT: i32 = 100;

/// Largest number of samples a [`GridGeometry`] may enumerate.
pub const MAX_SAMPLES: usize = 1 << 28;

/// Distance from the origin at which [`scene_decimal_bounds`] probes the field.
const PROBE_DISTANCE: Value = 100_000.0;

/// An axis-aligned region with integer corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub start: Vector3<i32>,
    pub end: Vector3<i32>,
}

impl GridBounds {
    /// Creates bounds, failing unless `end > start` on every axis.
    pub fn new(start: Vector3<i32>, end: Vector3<i32>) -> Result<Self> {
        let bounds = Self { start, end };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Returns [`SurfaceError::InvalidBounds`] for empty or inverted regions.
    pub fn validate(&self) -> Result<()> {
        if (0..3).any(|axis| self.end[axis] <= self.start[axis]) {
            return Err(SurfaceError::InvalidBounds {
                start: self.start.into(),
                end: self.end.into(),
            });
        }
        Ok(())
    }

    /// Grows the region by `amount` units on every side.
    pub fn pad(&self, amount: i32) -> Self {
        Self {
            start: self.start.add_scalar(-amount),
            end: self.end.add_scalar(amount),
        }
    }

    pub fn dimensions(&self) -> Vector3<i32> {
        self.end - self.start
    }

    /// Number of unit cells inside the region.
    pub fn cell_count(&self) -> usize {
        let d = self.dimensions();
        (d.x.max(0) * d.y.max(0) * d.z.max(0)) as usize
    }

    pub fn start_point(&self) -> Point {
        Point::from(self.start.cast::<Value>())
    }
}

/// An axis-aligned region with floating point corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalBounds {
    pub start: Point,
    pub end: Point,
}

/// Estimates the extent of the solid described by `distance`.
///
/// Each axis is probed from far outside in both directions; the probe distance minus the
/// measured distance is how far the surface reaches along that axis. Measuring a box this
/// way slightly underestimates it, so callers should pad the result.
pub fn scene_decimal_bounds(distance: &DistanceFunction) -> DecimalBounds {
    let extent = |facing: Value| {
        let axis = |i: usize| {
            let mut origin = Point::origin();
            origin[i] = facing * PROBE_DISTANCE;
            (PROBE_DISTANCE - distance(origin)) * facing
        };
        Point::new(axis(0), axis(1), axis(2))
    };

    DecimalBounds {
        start: extent(-1.0),
        end: extent(1.0),
    }
}

/// Like [`scene_decimal_bounds`], rounded outward onto a lattice of `cell_size` cells.
pub fn scene_grid_bounds(distance: &DistanceFunction, cell_size: Value) -> GridBounds {
    let decimal = scene_decimal_bounds(distance);
    GridBounds {
        start: (decimal.start.coords / cell_size).map(|v| v.floor() as i32),
        end: (decimal.end.coords / cell_size).map(|v| v.ceil() as i32),
    }
}

/// Maps between flat sample indices, grid cells and world positions for a sampled region.
///
/// Indices enumerate x fastest, then y, then z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub start: Point,
    /// Samples per unit length.
    pub resolution: Value,
    /// Number of samples along each axis.
    pub step_dimensions: Vector3<usize>,
}

impl GridGeometry {
    /// Validates `bounds` and `resolution` and derives the per-axis sample counts.
    pub fn new(bounds: &GridBounds, resolution: Value) -> Result<Self> {
        if !(resolution > 0.0 && resolution.is_finite()) {
            return Err(SurfaceError::InvalidResolution(resolution));
        }
        bounds.validate()?;

        let dimensions = bounds.dimensions();
        if dimensions.iter().any(|&d| d > MAX_BOUNDS_EXTENT) {
            warn!(?dimensions, "refusing to sample oversized bounds");
            return Err(SurfaceError::BoundsTooLarge {
                dimensions: dimensions.into(),
            });
        }

        let step_dimensions = dimensions.map(|d| (d as Value * resolution).round() as usize);
        if step_dimensions.iter().any(|&steps| steps == 0) {
            return Err(SurfaceError::InvalidResolution(resolution));
        }
        let sample_count = step_dimensions
            .iter()
            .try_fold(1_usize, |count, &steps| count.checked_mul(steps))
            .filter(|&count| count <= MAX_SAMPLES);
        if sample_count.is_none() {
            warn!(?step_dimensions, "refusing to allocate an oversized sample grid");
            return Err(SurfaceError::TooManySamples {
                step_dimensions: step_dimensions.into(),
            });
        }

        Ok(Self {
            start: bounds.start_point(),
            resolution,
            step_dimensions,
        })
    }

    pub fn slice_size(&self) -> usize {
        self.step_dimensions.x * self.step_dimensions.y
    }

    pub fn sample_count(&self) -> usize {
        self.slice_size() * self.step_dimensions.z
    }

    /// World-space length of one cell edge.
    pub fn cell_length(&self) -> Value {
        1.0 / self.resolution
    }

    /// Decodes a flat sample index into `[x, y, z]` grid coordinates.
    #[inline]
    pub fn index_to_cell(&self, index: usize) -> Vector3<usize> {
        let slice_size = self.slice_size();
        let z = index / slice_size;
        let remainder = index - slice_size * z;
        let y = remainder / self.step_dimensions.x;
        let x = remainder - y * self.step_dimensions.x;
        Vector3::new(x, y, z)
    }

    /// Inverse of [`index_to_cell`](GridGeometry::index_to_cell).
    #[inline]
    pub fn cell_to_index(&self, cell: Vector3<usize>) -> usize {
        cell.x + cell.y * self.step_dimensions.x + cell.z * self.slice_size()
    }

    #[inline]
    pub fn cell_position(&self, cell: Vector3<usize>) -> Point {
        self.start + cell.cast::<Value>() / self.resolution
    }

    /// World position of the sample at flat `index`.
    #[inline]
    pub fn position(&self, index: usize) -> Point {
        self.cell_position(self.index_to_cell(index))
    }
}

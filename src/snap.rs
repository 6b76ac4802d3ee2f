//! Projection of near-surface points onto the zero isosurface.
//!
//! Distance fields are assumed to have a gradient of (roughly) unit length, so stepping
//! back along the normal by the measured distance lands on, or very near, the surface.

use crate::types::{DistanceFunction, Point, Value, Vector};

/// Tuning for [`snap_to_surface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapConfig {
    /// A point whose `|distance|` is at or below this is considered on the surface.
    pub tolerance: Value,
    /// Upper bound on projection steps; the last position is returned when it is reached.
    pub max_iterations: usize,
    /// Offset used for central finite differences.
    pub gradient_epsilon: Value,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self::for_cell_size(0.1)
    }
}

impl SnapConfig {
    /// Derives tolerances from the size of the grid cells being refined.
    pub fn for_cell_size(cell_size: Value) -> Self {
        Self {
            tolerance: cell_size * 0.01,
            max_iterations: 8,
            gradient_epsilon: cell_size * 0.1,
        }
    }
}

/// Outcome of a snap. Non-convergence is not an error; the last position reached is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub location: Point,
    /// Unit outward normal at `location`.
    pub normal: Vector,
    /// Field value at `location`.
    pub distance: Value,
    pub iterations: usize,
    pub converged: bool,
}

/// Receives every field evaluation made while snapping.
pub trait SnapObserver {
    fn observe(&mut self, position: Point, distance: Value);
}

impl SnapObserver for () {
    #[inline]
    fn observe(&mut self, _: Point, _: Value) {}
}

/// Tracks the smallest and largest distances seen, for diagnosing misbehaving fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceRange {
    pub min: Value,
    pub max: Value,
    pub samples: usize,
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self {
            min: Value::INFINITY,
            max: Value::NEG_INFINITY,
            samples: 0,
        }
    }
}

impl SnapObserver for DistanceRange {
    fn observe(&mut self, _: Point, distance: Value) {
        self.min = self.min.min(distance);
        self.max = self.max.max(distance);
        self.samples += 1;
    }
}

/// Estimates the field gradient at `position` with central differences.
pub fn gradient(distance: &DistanceFunction, position: Point, epsilon: Value) -> Vector {
    let axis = |i: usize| {
        let mut offset = Vector::zeros();
        offset[i] = epsilon;
        (distance(position + offset) - distance(position - offset)) / (2.0 * epsilon)
    };
    Vector::new(axis(0), axis(1), axis(2))
}

/// Unit outward normal at `position`, or `None` where the gradient vanishes.
pub fn try_normal(distance: &DistanceFunction, position: Point, epsilon: Value) -> Option<Vector> {
    gradient(distance, position, epsilon).try_normalize(Value::EPSILON)
}

/// Unit outward normal at `position`.
///
/// Falls back to +Y where the gradient vanishes, e.g. for constant fields.
pub fn normal(distance: &DistanceFunction, position: Point, epsilon: Value) -> Vector {
    try_normal(distance, position, epsilon).unwrap_or_else(Vector::y)
}

/// Moves `start` onto the zero isosurface of `distance`.
pub fn snap_to_surface(distance: &DistanceFunction, start: Point, config: &SnapConfig) -> SnapResult {
    snap_to_surface_observed(distance, start, config, &mut ())
}

/// Like [`snap_to_surface`], reporting every evaluation to `observer`.
pub fn snap_to_surface_observed<O: SnapObserver + ?Sized>(
    distance: &DistanceFunction,
    start: Point,
    config: &SnapConfig,
    observer: &mut O,
) -> SnapResult {
    let mut location = start;
    let mut current = distance(location);
    observer.observe(location, current);

    let mut last_normal = None;
    let mut iterations = 0;
    while current.abs() > config.tolerance && iterations < config.max_iterations {
        let Some(step_normal) = try_normal(distance, location, config.gradient_epsilon) else {
            break;
        };
        location -= step_normal * current;
        current = distance(location);
        observer.observe(location, current);
        last_normal = Some(step_normal);
        iterations += 1;
    }

    let normal = try_normal(distance, location, config.gradient_epsilon)
        .or(last_normal)
        .unwrap_or_else(Vector::y);

    SnapResult {
        location,
        normal,
        distance: current,
        iterations,
        converged: current.abs() <= config.tolerance,
    }
}

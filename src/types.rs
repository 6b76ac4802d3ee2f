use nalgebra::{Point3, Vector3, Vector4};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// Linear RGBA color, each channel in `0..=1`.
pub type Color = Vector4<Value>;

/// A signed distance field: maps a [`Point`] to its signed distance from a surface.
///
/// Return values are **negative inside**, positive outside and zero on the boundary.
pub type DistanceFunction = dyn Fn(Point) -> Value + Send + Sync;

/// Maps a [`Point`] to a [`Color`].
pub type ColorFunction = dyn Fn(Point) -> Color + Send + Sync;

/// A [`DistanceFunction`] shared between owners, e.g. several combinators or a component.
pub type SharedDistance = std::sync::Arc<DistanceFunction>;

/// A [`ColorFunction`] shared between owners.
pub type SharedColor = std::sync::Arc<ColorFunction>;

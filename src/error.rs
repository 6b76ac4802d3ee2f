use derive_more::{Display, From};

use crate::types::Value;

pub type Result<T> = core::result::Result<T, SurfaceError>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum SurfaceError {
    /// Samples per unit length must be strictly positive.
    InvalidResolution(Value),
    /// Voxels per unit length must be at least one.
    InvalidDepth(usize),
    /// `end` must be strictly greater than `start` on every axis.
    InvalidBounds { start: [i32; 3], end: [i32; 3] },
    /// The region exceeds the largest extent the samplers will allocate for.
    BoundsTooLarge { dimensions: [i32; 3] },
    /// The region and resolution together ask for more than [`MAX_SAMPLES`](crate::grid::MAX_SAMPLES) samples.
    TooManySamples { step_dimensions: [usize; 3] },
    InvalidIndex,
    InvalidCorners,
    #[from]
    Shape(ndarray::ShapeError),
}

impl std::error::Error for SurfaceError {}

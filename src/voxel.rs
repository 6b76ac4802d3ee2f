use nalgebra::Vector3;
use ndarray::Array3;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::{
    error::{Result, SurfaceError},
    grid::{GridBounds, GridGeometry},
    tables::CORNER_OFFSETS,
    types::{DistanceFunction, Point, Value},
};

/// A dense cache of field values over a lattice.
///
/// The lattice has `dimensions + 1` points per axis so that every one of the
/// `dimensions.x × dimensions.y × dimensions.z` voxels has a full set of 8 corners.
///
/// Values are stored as `buffer[[z, y, x]]`.
///
/// Built once per extraction and only read afterwards.
#[derive(Debug, Clone)]
pub struct VoxelMap {
    /// Voxels per unit length.
    pub depth: usize,
    /// Number of voxels along each axis.
    pub dimensions: Vector3<usize>,
    /// World position of lattice point `[0, 0, 0]`.
    pub start: Point,
    /// Field values, indexed `[z, y, x]`.
    pub buffer: Array3<Value>,
}

impl VoxelMap {
    /// Samples `distance` at every lattice point of `bounds` subdivided into `depth` voxels per unit.
    ///
    /// Lattice points are independent, so the fill runs in parallel; the buffer is laid out
    /// in the same x-fastest order as [`GridGeometry`] indices.
    pub fn fill(depth: usize, distance: &DistanceFunction, bounds: &GridBounds) -> Result<Self> {
        if depth == 0 {
            return Err(SurfaceError::InvalidDepth(depth));
        }
        let voxels = GridGeometry::new(bounds, depth as Value)?;
        let dimensions = voxels.step_dimensions;

        let lattice = GridGeometry {
            step_dimensions: dimensions.add_scalar(1),
            ..voxels
        };
        let values: Vec<Value> = (0..lattice.sample_count())
            .into_par_iter()
            .map(|i| distance(lattice.position(i)))
            .collect();

        let shape = (dimensions.z + 1, dimensions.y + 1, dimensions.x + 1);
        let buffer = Array3::from_shape_vec(shape, values)?;
        debug!(depth, ?dimensions, "filled voxel map");

        Ok(Self {
            depth,
            dimensions,
            start: voxels.start,
            buffer,
        })
    }

    /// World-space length of each voxel edge.
    pub fn scale(&self) -> Value {
        1.0 / self.depth as Value
    }

    /// Returns the field value at lattice point `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Value {
        self.buffer[[z, y, x]]
    }

    /// World position of lattice point `(x, y, z)`.
    #[inline]
    pub fn lattice_position(&self, x: usize, y: usize, z: usize) -> Point {
        self.start + Vector3::new(x, y, z).cast::<Value>() / self.depth as Value
    }

    /// Returns the 8 lattice indices `[x, y, z]` of the voxel at `(x, y, z)`,
    /// ordered to match [`CORNER_OFFSETS`].
    #[inline]
    pub fn voxel_corner_indices(&self, x: usize, y: usize, z: usize) -> [[usize; 3]; 8] {
        CORNER_OFFSETS.map(|[dx, dy, dz]| [x + dx, y + dy, z + dz])
    }

    /// Field values at the 8 corners of the voxel at `(x, y, z)`.
    #[inline]
    pub fn voxel_corner_values(&self, x: usize, y: usize, z: usize) -> [Value; 8] {
        self.voxel_corner_indices(x, y, z).map(|[cx, cy, cz]| self.get(cx, cy, cz))
    }

    /// Calls `f(x, y, z)` for every voxel, x fastest.
    pub fn for_each_voxel<F>(&self, mut f: F)
    where
        F: FnMut(usize, usize, usize),
    {
        for z in 0..self.dimensions.z {
            for y in 0..self.dimensions.y {
                for x in 0..self.dimensions.x {
                    f(x, y, z);
                }
            }
        }
    }
}

pub mod error;
pub mod fields;
pub mod grid;
pub mod interp;
pub mod marching;
pub mod mesh;
pub mod noise;
pub mod plugin;
pub mod sampling;
pub mod snap;
pub mod tables;
pub mod types;
pub mod utils;
pub mod voxel;

pub use error::{Result, SurfaceError};
pub use grid::GridBounds;
pub use marching::{marching_mesh, marching_mesh_in_bounds};
pub use plugin::{SdfShape, SdfSurfacePlugin};
pub use sampling::{SamplePoint, SamplingConfig, sample_function};

//! Isosurface extraction ("marching mesh").
//!
//! ```text
//! scene_grid_bounds     →  integer region padded by one unit
//! VoxelMap::fill        →  field value at every lattice point         (parallel)
//! triangulate_slab      →  per z-slab triangles as lattice-edge keys  (parallel)
//! merge                 →  one vertex per unique edge, first-seen order
//! finish_vertices       →  normals + colors per vertex                (parallel)
//! ```

use std::collections::{HashMap, hash_map::Entry};

use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::debug;

use crate::{
    error::Result,
    grid::{GridBounds, scene_grid_bounds},
    mesh::Mesh,
    snap::normal,
    types::{Color, ColorFunction, DistanceFunction, Point, Vector},
    utils::{edge_crossing, edge_endpoints, get_state, is_active_state, triangle_edges_from_state},
    voxel::VoxelMap,
};

/// Iso-surface threshold: corners at or below it are inside.
const THRESHOLD: f32 = 0.0;

/// Identifies a lattice edge by its two endpoint lattice indices, lower endpoint first.
///
/// Neighbouring voxels compute the same key for the edge they share, which is what
/// lets them share the vertex on it.
pub type EdgeKey = [[usize; 3]; 2];

/// Extracts a closed mesh of the zero isosurface of `distance`.
///
/// The region is estimated from the field itself and padded by one unit so that the
/// outermost lattice points lie outside the solid. `depth` is the number of voxels per
/// unit length.
pub fn marching_mesh(depth: usize, distance: &DistanceFunction, color: &ColorFunction) -> Result<Mesh> {
    let bounds = scene_grid_bounds(distance, 1.0).pad(1);
    marching_mesh_in_bounds(depth, distance, color, &bounds)
}

/// Like [`marching_mesh`] over an explicit region.
///
/// Surfaces that leave `bounds` are cut open where they cross its faces.
pub fn marching_mesh_in_bounds(
    depth: usize,
    distance: &DistanceFunction,
    color: &ColorFunction,
    bounds: &GridBounds,
) -> Result<Mesh> {
    let voxels = VoxelMap::fill(depth, distance, bounds)?;

    let slabs: Vec<Vec<[EdgeKey; 3]>> = (0..voxels.dimensions.z)
        .into_par_iter()
        .map(|z| triangulate_slab(&voxels, z))
        .collect::<Result<_>>()?;

    let mut mesh = merge(&voxels, slabs);
    finish_vertices(&mut mesh, distance, color, voxels.scale());

    debug!(
        depth,
        vertices = mesh.vertices.len(),
        triangles = mesh.tris.len(),
        "extracted isosurface"
    );
    Ok(mesh)
}

/// Triangulates every voxel in layer `z`, returning triangles as lattice-edge keys.
fn triangulate_slab(voxels: &VoxelMap, z: usize) -> Result<Vec<[EdgeKey; 3]>> {
    let mut local = Vec::new();
    for y in 0..voxels.dimensions.y {
        for x in 0..voxels.dimensions.x {
            let corners = voxels.voxel_corner_values(x, y, z);
            let state = get_state(&corners, THRESHOLD)?;
            if !is_active_state(state) {
                continue;
            }
            local.extend(
                triangle_edges_from_state(state).map(|tri| tri.map(|edge| edge_endpoints(x, y, z, edge))),
            );
        }
    }
    Ok(local)
}

/// Assigns one vertex per unique edge, in the order edges are first met, and
/// rewrites the triangles as vertex indices.
///
/// Runs on a single thread over slabs in z order, so the result does not depend on
/// how the parallel phase was scheduled.
fn merge(voxels: &VoxelMap, slabs: Vec<Vec<[EdgeKey; 3]>>) -> Mesh {
    let mut mesh = Mesh::new_empty();
    let mut indices: HashMap<EdgeKey, u32> = HashMap::new();

    for triangle in slabs.into_iter().flatten() {
        let tri = triangle.map(|key| match indices.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let index = mesh.vertices.len() as u32;
                mesh.vertices.push(edge_vertex(voxels, &key));
                *entry.insert(index)
            }
        });
        mesh.tris.push(tri);
    }

    mesh
}

/// Linearly interpolated crossing of the zero level along a lattice edge.
fn edge_vertex(voxels: &VoxelMap, [[ax, ay, az], [bx, by, bz]]: &EdgeKey) -> Point {
    edge_crossing(
        voxels.lattice_position(*ax, *ay, *az),
        voxels.lattice_position(*bx, *by, *bz),
        voxels.get(*ax, *ay, *az),
        voxels.get(*bx, *by, *bz),
        THRESHOLD,
    )
}

/// Attaches a gradient normal and a color to every vertex.
fn finish_vertices(mesh: &mut Mesh, distance: &DistanceFunction, color: &ColorFunction, scale: f32) {
    let epsilon = scale * 0.1;
    let (normals, colors): (Vec<Vector>, Vec<Color>) = mesh
        .vertices
        .par_iter()
        .map(|&p| (normal(distance, p, epsilon), color(p)))
        .unzip();
    mesh.normals = normals;
    mesh.colors = colors;
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    use super::*;
    use crate::{
        error::SurfaceError,
        fields::{cube, sphere},
        noise::constant_color,
    };

    fn white() -> impl Fn(Point) -> Color + Send + Sync + Clone {
        constant_color(Color::new(1.0, 1.0, 1.0, 1.0))
    }

    #[test]
    fn sphere_mesh_is_closed_and_on_surface() {
        let mesh = marching_mesh(4, &sphere(1.0), &white()).unwrap();
        assert!(!mesh.is_empty());
        assert!(mesh.is_manifold());
        assert!(mesh.is_consistently_oriented());
        for p in &mesh.vertices {
            assert_abs_diff_eq!(p.coords.norm(), 1.0, epsilon = 0.03);
        }
        for (p, n) in mesh.vertices.iter().zip(&mesh.normals) {
            assert!(n.dot(&p.coords.normalize()) > 0.99);
        }
        assert!(mesh.colors.iter().all(|c| *c == Color::new(1.0, 1.0, 1.0, 1.0)));
    }

    #[test]
    fn empty_field_yields_empty_mesh() {
        let bounds = GridBounds::new(Vector3::new(-1, -1, -1), Vector3::new(1, 1, 1)).unwrap();
        let mesh = marching_mesh_in_bounds(2, &|_: Point| -> f32 { 1.0 }, &white(), &bounds).unwrap();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn box_mesh_encloses_its_volume() {
        let mesh = marching_mesh(4, &cube(Vector::new(1.5, 1.5, 1.5)), &white()).unwrap();
        assert!(mesh.is_manifold());
        assert_abs_diff_eq!(mesh.signed_volume(), 1.5 * 1.5 * 1.5, epsilon = 0.35);
    }

    #[test]
    fn zero_depth_is_a_configuration_error() {
        assert!(matches!(
            marching_mesh(0, &sphere(1.0), &white()),
            Err(SurfaceError::InvalidDepth(0))
        ));
    }
}

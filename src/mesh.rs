use std::collections::{HashMap, HashSet};

use crate::{
    error::{Result, SurfaceError},
    types::{Color, Point, Value, Vector},
};

/// Indexed triangle mesh produced by isosurface extraction.
///
/// Vertices are shared between the triangles that meet at them. `normals` and
/// `colors` run parallel to `vertices`. Triangles wind counter-clockwise seen from
/// outside the surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Point>,

    /// Unit outward normals, one per vertex.
    pub normals: Vec<Vector>,

    /// Vertex colors, one per vertex.
    pub colors: Vec<Color>,

    /// Triangle index triples into `vertices`: `[[v0, v1, v2], ...]`
    pub tris: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates an empty mesh with no vertices or triangles.
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    /// Adds a triangle defined by three vertex indices.
    ///
    /// Returns [`SurfaceError::InvalidIndex`] if any index is out of bounds.
    pub fn triangle_from_verts(&mut self, a: u32, b: u32, c: u32) -> Result<()> {
        if self.vertices.len() <= a.max(b.max(c)) as usize {
            return Err(SurfaceError::InvalidIndex);
        }
        self.tris.push([a, b, c]);
        Ok(())
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn tri_coords(&self, tri: usize) -> [Point; 3] {
        self.tris[tri].map(|v| self.vertices[v as usize])
    }

    /// Computes the face normal for triangle `tri`.
    ///
    /// Returns the zero vector if the triangle is degenerate.
    pub fn tri_normal(&self, tri: usize) -> Vector {
        let [a, b, c] = self.tri_coords(tri);
        (b - a)
            .cross(&(c - b))
            .try_normalize(0.0)
            .unwrap_or_else(Vector::zeros)
    }

    /// Counts how many triangles use each undirected edge.
    pub fn edge_counts(&self) -> HashMap<(u32, u32), usize> {
        let mut counts = HashMap::new();
        for &[a, b, c] in &self.tris {
            for (i, j) in [(a, b), (b, c), (c, a)] {
                *counts.entry((i.min(j), i.max(j))).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Every edge is shared by exactly two triangles: the surface is closed with no
    /// cracks or fins.
    pub fn is_manifold(&self) -> bool {
        self.edge_counts().values().all(|&count| count == 2)
    }

    /// Every directed edge appears at most once, so neighbouring triangles agree on
    /// which side is outside.
    pub fn is_consistently_oriented(&self) -> bool {
        let mut seen = HashSet::new();
        self.tris.iter().all(|&[a, b, c]| {
            [(a, b), (b, c), (c, a)]
                .into_iter()
                .all(|edge| seen.insert(edge))
        })
    }

    /// Volume enclosed by a closed mesh; positive when triangles face outward.
    pub fn signed_volume(&self) -> Value {
        (0..self.tris.len())
            .map(|tri| {
                let [a, b, c] = self.tri_coords(tri);
                a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
            })
            .sum()
    }

    /// Positions as plain arrays, ready for GPU upload.
    pub fn positions_array(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|p| [p.x, p.y, p.z]).collect()
    }

    pub fn normals_array(&self) -> Vec<[f32; 3]> {
        self.normals.iter().map(|n| [n.x, n.y, n.z]).collect()
    }

    pub fn colors_array(&self) -> Vec<[f32; 4]> {
        self.colors.iter().map(|c| [c.x, c.y, c.z, c.w]).collect()
    }

    /// Flattened triangle indices.
    pub fn indices(&self) -> Vec<u32> {
        self.tris.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// Unit tetrahedron with outward-facing triangles.
    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new_empty();
        mesh.vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
        ];
        for [a, b, c] in [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]] {
            mesh.triangle_from_verts(a, b, c).unwrap();
        }
        mesh
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let mut mesh = tetrahedron();
        assert!(matches!(mesh.triangle_from_verts(0, 1, 4), Err(SurfaceError::InvalidIndex)));
    }

    #[test]
    fn closed_tetrahedron_is_manifold_and_oriented() {
        let mesh = tetrahedron();
        assert!(mesh.is_manifold());
        assert!(mesh.is_consistently_oriented());
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-6);
    }

    #[test]
    fn open_mesh_is_not_manifold() {
        let mut mesh = tetrahedron();
        mesh.tris.pop();
        assert!(!mesh.is_manifold());
    }

    #[test]
    fn flipped_face_breaks_orientation() {
        let mut mesh = tetrahedron();
        mesh.tris[0] = [0, 1, 2];
        assert!(mesh.is_manifold());
        assert!(!mesh.is_consistently_oriented());
    }

    #[test]
    fn face_normal_points_outward() {
        let mesh = tetrahedron();
        assert_relative_eq!(mesh.tri_normal(0), Vector::new(0.0, 0.0, -1.0));
        assert_eq!(mesh.indices().len(), 12);
    }
}

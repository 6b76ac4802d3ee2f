use crate::{
    error::{Result, SurfaceError},
    interp::{find_t, interpolate_points},
    tables::{CORNER_OFFSETS, CORNER_POINT_INDICES, EDGE_TABLE, TRI_TABLE},
    types::{Point, Value},
};

/// Computes the marching cubes state bitmask for a voxel.
///
/// Each of the 8 corners maps to one bit. A bit is set when the corner's value
/// is **at or below** the threshold (i.e. "inside" the surface):
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// state bits:   [_][_][_][_][_][_][_][_]
///                                      ^-- corner 0 inside?
/// ```
///
/// Returns [`SurfaceError::InvalidCorners`] if `eval_corners` does not contain exactly 8 values.
#[inline]
pub fn get_state(eval_corners: &[Value], threshold: Value) -> Result<usize> {
    if eval_corners.len() != 8 {
        return Err(SurfaceError::InvalidCorners);
    }

    let mut state: usize = 0;
    for (i, &v) in eval_corners.iter().enumerate() {
        if v <= threshold {
            state |= 1 << i;
        }
    }

    Ok(state)
}

/// Returns `true` when the surface passes through the voxel.
#[inline]
pub fn is_active_state(state: usize) -> bool {
    EDGE_TABLE[state] != 0
}

/// Yields the edge triples of each triangle for a marching cubes `state`.
///
/// `TRI_TABLE[state]` contains edge indices in groups of three, terminated by `-1`:
/// ```text
/// TRI_TABLE[state] = [e0, e1, e2,  e3, e4, e5,  -1, ...]
///                     \___tri0__/   \___tri1__/
/// ```
/// The table winds triangles clockwise seen from outside, so each triple is
/// returned as `[e0, e2, e1]` to face outward.
#[inline]
pub fn triangle_edges_from_state(state: usize) -> impl Iterator<Item = [usize; 3]> {
    TRI_TABLE[state]
        .chunks_exact(3)
        .take_while(|tri| tri[0] != -1)
        .map(|tri| [tri[0] as usize, tri[2] as usize, tri[1] as usize])
}

/// Lattice indices of the two endpoints of cube `edge` on the voxel at `(x, y, z)`,
/// ordered so the first endpoint is the lower one.
#[inline]
pub fn edge_endpoints(x: usize, y: usize, z: usize, edge: usize) -> [[usize; 3]; 2] {
    let [a, b] = CORNER_POINT_INDICES[edge];
    let corner = |c: i8| {
        let [dx, dy, dz] = CORNER_OFFSETS[c as usize];
        [x + dx, y + dy, z + dz]
    };
    let (pa, pb) = (corner(a), corner(b));
    if pa <= pb { [pa, pb] } else { [pb, pa] }
}

/// Point along the segment `p0..p1` where the linear interpolant of `v0..v1` reaches `threshold`.
#[inline]
pub fn edge_crossing(p0: Point, p1: Point, v0: Value, v1: Value, threshold: Value) -> Point {
    interpolate_points(p0, p1, find_t(v0, v1, threshold))
}

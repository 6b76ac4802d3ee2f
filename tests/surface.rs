use std::sync::Arc;

use approx::assert_abs_diff_eq;
use bevy_sdf_surface::{
    GridBounds, SamplingConfig, SurfaceError,
    fields::{deform, sphere, translate, union},
    grid::GridGeometry,
    marching_mesh, marching_mesh_in_bounds,
    noise::{colorize, constant_color, noise},
    sample_function,
    types::{Color, Point, SharedDistance, Vector},
};
use nalgebra::Vector3;

fn cube_bounds(half: i32) -> GridBounds {
    GridBounds::new(Vector3::new(-half, -half, -half), Vector3::new(half, half, half)).unwrap()
}

fn white() -> impl Fn(Point) -> Color + Send + Sync + Clone {
    constant_color(Color::new(1.0, 1.0, 1.0, 1.0))
}

#[test]
fn unit_region_at_resolution_ten_has_a_thousand_samples() {
    let bounds = GridBounds::new(Vector3::zeros(), Vector3::new(1, 1, 1)).unwrap();
    let geometry = GridGeometry::new(&bounds, 10.0).unwrap();
    assert_eq!(geometry.sample_count(), 1000);
}

#[test]
fn sampled_sphere_points_lie_on_surface_with_radial_normals() {
    let radius = 1.5;
    let config = SamplingConfig::default().with_resolution(20.0);
    let points = sample_function(&config, &cube_bounds(2), &sphere(radius), &white()).unwrap();

    assert!(points.len() > 100);
    for point in &points {
        assert_abs_diff_eq!(point.location.coords.norm(), radius, epsilon = 1e-3);
        assert_abs_diff_eq!(point.normal.norm(), 1.0, epsilon = 1e-4);
        assert!(point.normal.dot(&point.location.coords.normalize()) > 0.999);
        assert_abs_diff_eq!(point.size, 5.0 / 20.0, epsilon = 1e-6);
    }
}

#[test]
fn sampling_is_reproducible() {
    let field = translate(Vector::new(0.25, -0.5, 0.0), sphere(1.0));
    let color = colorize(noise(0.5, 1.0, 3), Color::new(1.0, 0.0, 0.0, 1.0), Color::new(0.0, 0.0, 1.0, 1.0));
    let config = SamplingConfig::default().with_resolution(8.0);

    let first = sample_function(&config, &cube_bounds(2), &field, &color).unwrap();
    let second = sample_function(&config, &cube_bounds(2), &field, &color).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn configuration_errors_fail_fast() {
    let negative = SamplingConfig::default().with_resolution(-1.0);
    assert!(matches!(
        sample_function(&negative, &cube_bounds(1), &sphere(1.0), &white()),
        Err(SurfaceError::InvalidResolution(_))
    ));
    let coarse = SamplingConfig::default().with_resolution(0.1);
    assert!(matches!(
        sample_function(&coarse, &cube_bounds(2), &sphere(1.0), &white()),
        Err(SurfaceError::InvalidResolution(_))
    ));
    assert!(matches!(
        GridBounds::new(Vector3::new(0, 0, 0), Vector3::new(1, 0, 1)),
        Err(SurfaceError::InvalidBounds { .. })
    ));
    assert!(matches!(
        sample_function(&SamplingConfig::default(), &cube_bounds(60), &sphere(1.0), &white()),
        Err(SurfaceError::BoundsTooLarge { .. })
    ));
}

#[test]
fn absurd_depth_is_refused_before_allocating() {
    assert!(matches!(
        marching_mesh_in_bounds(usize::MAX, &sphere(1.0), &white(), &cube_bounds(2)),
        Err(SurfaceError::TooManySamples { .. })
    ));
    assert!(matches!(
        marching_mesh(100_000, &sphere(1.0), &white()),
        Err(SurfaceError::TooManySamples { .. })
    ));
}

#[test]
fn finer_depth_gives_more_geometry() {
    let field = sphere(1.0);
    let meshes: Vec<_> = [2, 4, 8]
        .into_iter()
        .map(|depth| marching_mesh(depth, &field, &white()).unwrap())
        .collect();

    for pair in meshes.windows(2) {
        assert!(pair[1].vertices.len() > pair[0].vertices.len());
        assert!(pair[1].tris.len() > pair[0].tris.len());
    }
    for mesh in &meshes {
        assert!(mesh.is_manifold());
        assert!(mesh.is_consistently_oriented());
        assert!(mesh.signed_volume() > 0.0);
    }
}

#[test]
fn finer_depth_converges_on_the_sphere() {
    let mesh = marching_mesh(8, &sphere(1.0), &white()).unwrap();
    for p in &mesh.vertices {
        assert_abs_diff_eq!(p.coords.norm(), 1.0, epsilon = 0.01);
    }
    assert_abs_diff_eq!(mesh.signed_volume(), 4.0 / 3.0 * std::f32::consts::PI, epsilon = 0.1);
}

#[test]
fn extraction_is_deterministic() {
    let field = translate(Vector::new(0.3, 0.1, -0.2), sphere(1.2));
    let first = marching_mesh(4, &field, &white()).unwrap();
    let second = marching_mesh(4, &field, &white()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn translated_shapes_stay_closed() {
    let offset = Vector::new(3.0, -1.0, 2.0);
    let mesh = marching_mesh(4, &translate(offset, sphere(1.0)), &white()).unwrap();
    assert!(mesh.is_manifold());
    for p in &mesh.vertices {
        assert_abs_diff_eq!((p - offset).coords.norm(), 1.0, epsilon = 0.03);
    }
}

#[test]
fn disjoint_union_gives_two_closed_parts() {
    let parts: Vec<SharedDistance> = vec![
        Arc::new(translate(Vector::new(-2.0, 0.0, 0.0), sphere(1.0))),
        Arc::new(translate(Vector::new(2.0, 0.0, 0.0), sphere(0.5))),
    ];
    let mesh = marching_mesh(4, &union(parts), &white()).unwrap();
    assert!(mesh.is_manifold());
    assert!(mesh.is_consistently_oriented());
    assert!(mesh.vertices.iter().any(|p| p.x < -1.0));
    assert!(mesh.vertices.iter().any(|p| p.x > 1.0));
    assert!(mesh.vertices.iter().all(|p| p.x.abs() > 0.5));
}

#[test]
fn noisy_blob_meshes_with_finite_colored_vertices() {
    let field = deform(sphere(1.0), noise(0.5, 0.1, 7));
    let color = colorize(noise(0.5, 1.0, 11), Color::new(1.0, 0.5, 0.0, 1.0), Color::new(0.0, 0.5, 1.0, 1.0));
    let mesh = marching_mesh(4, &field, &color).unwrap();

    assert!(!mesh.is_empty());
    assert_eq!(mesh.normals.len(), mesh.vertices.len());
    assert_eq!(mesh.colors.len(), mesh.vertices.len());
    for (p, n) in mesh.vertices.iter().zip(&mesh.normals) {
        assert!(p.coords.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(n.norm(), 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(p.coords.norm(), 1.0, epsilon = 0.25);
    }
    assert!(mesh.signed_volume() > 0.0);
}

#[test]
fn explicit_bounds_cut_the_surface_open() {
    let half = GridBounds::new(Vector3::new(-2, -2, 0), Vector3::new(2, 2, 2)).unwrap();
    let mesh = marching_mesh_in_bounds(4, &sphere(1.0), &white(), &half).unwrap();
    assert!(!mesh.is_empty());
    assert!(!mesh.is_manifold());
    assert!(mesh.vertices.iter().all(|p| p.z >= 0.0));
}

//! Surface points of a capsule carved out of a box, drawn with gizmos.

use bevy::prelude::*;
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use bevy_sdf_surface::{
    GridBounds, SamplePoint, SamplingConfig, sample_function,
    fields::{capsule, cube, subtract},
    noise::{colorize, noise},
    types::{Color as Rgba, Vector},
};
use nalgebra::Vector3;

#[derive(Resource)]
struct Cloud(Vec<SamplePoint>);

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, PanOrbitCameraPlugin))
        .add_systems(Startup, setup)
        .add_systems(Update, draw_points)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera::default(),
        Transform::from_xyz(3.0, 2.5, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let field = subtract(cube(Vector::new(2.0, 2.0, 2.0)), capsule(0.6, 2.0));
    let color = colorize(
        noise(0.5, 1.0, 2),
        Rgba::new(1.0, 0.4, 0.1, 1.0),
        Rgba::new(0.1, 0.8, 0.6, 1.0),
    );
    let config = SamplingConfig::default().with_resolution(12.0).with_levels(2);

    let points = GridBounds::new(Vector3::new(-2, -2, -2), Vector3::new(2, 2, 2))
        .and_then(|bounds| sample_function(&config, &bounds, &field, &color))
        .unwrap_or_else(|error| {
            error!(%error, "sampling failed");
            Vec::new()
        });
    info!(points = points.len(), "sampled point cloud");
    commands.insert_resource(Cloud(points));
}

fn draw_points(cloud: Res<Cloud>, mut gizmos: Gizmos) {
    for point in &cloud.0 {
        let position = Vec3::new(point.location.x, point.location.y, point.location.z);
        let normal = Vec3::new(point.normal.x, point.normal.y, point.normal.z);
        let color = Color::linear_rgba(point.color.x, point.color.y, point.color.z, point.color.w);
        gizmos.line(position, position + normal * point.size * 0.2, color);
    }
}

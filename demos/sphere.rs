use bevy::{
    pbr::wireframe::{Wireframe, WireframeConfig},
    prelude::*,
};
use bevy_sdf_surface::{
    SdfShape, SdfSurfacePlugin,
    fields::sphere,
    noise::{colorize, noise},
    types::Color as Rgba,
};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            bevy::pbr::wireframe::WireframePlugin::default(),
            SdfSurfacePlugin::default(),
        ))
        .insert_resource(WireframeConfig {
            global: false,
            ..Default::default()
        })
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-3.0, 2.5, -3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight::default(),
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let color = colorize(
        noise(0.4, 1.0, 1),
        Rgba::new(0.9, 0.3, 0.2, 1.0),
        Rgba::new(1.0, 0.9, 0.4, 1.0),
    );

    commands.spawn((
        SdfShape::new(8, sphere(1.0), color),
        MeshMaterial3d(materials.add(StandardMaterial::default())),
        Wireframe,
    ));
}

//! A sphere displaced by noise. Press Space to reroll the pattern.

use bevy::prelude::*;
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use bevy_sdf_surface::{
    SdfShape, SdfSurfacePlugin,
    fields::{deform, sphere},
    noise::{colorize, noise},
    types::Color as Rgba,
};

const DEPTH: usize = 12;

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, PanOrbitCameraPlugin, SdfSurfacePlugin::default()))
        .add_systems(Startup, setup)
        .add_systems(Update, reroll)
        .run();
}

fn blob(variation: u32) -> SdfShape {
    let field = deform(sphere(1.0), noise(0.6, 0.25, variation));
    let color = colorize(
        noise(0.6, 1.0, variation),
        Rgba::new(0.1, 0.3, 0.8, 1.0),
        Rgba::new(0.9, 0.9, 1.0, 1.0),
    );
    SdfShape::new(DEPTH, field, color)
}

fn setup(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(3.0, 2.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::OVERCAST_DAY,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    commands.spawn((
        blob(0),
        MeshMaterial3d(materials.add(StandardMaterial {
            perceptual_roughness: 0.6,
            ..default()
        })),
    ));
}

fn reroll(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut variation: Local<u32>,
    mut shapes: Query<&mut SdfShape>,
) {
    if !keyboard.just_pressed(KeyCode::Space) {
        return;
    }
    *variation += 1;
    for mut shape in shapes.iter_mut() {
        *shape = blob(*variation);
    }
}

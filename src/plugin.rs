use std::sync::Arc;

use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};
use tracing::{debug, warn};

use crate::{
    error::Result,
    marching::marching_mesh,
    types::{Color, Point, SharedColor, SharedDistance, Value},
};

/// System sets for the surface pipeline.
///
/// Use these to order your own systems relative to mesh generation:
///
/// ```rust,ignore
/// // Run after geometry is ready but before it's uploaded, e.g. to build a collider:
/// app.add_systems(Update, build_collider.after(SurfaceSet::Generate)
///                                       .before(SurfaceSet::Upload));
/// ```
///
/// ```text
/// SurfaceSet::Spawn  →  [async compute]  →  SurfaceSet::Generate  →  [your systems]  →  SurfaceSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceSet {
    /// Spawns an async compute task for each queued shape.
    Spawn,
    /// Polls async tasks and inserts [`GeneratedMesh`] on completion.
    Generate,
    /// Uploads [`GeneratedMesh`] data into a Bevy [`Mesh3d`] and removes [`GeneratedMesh`].
    Upload,
}

/// A signed distance field to be meshed.
///
/// ```rust,ignore
/// commands.spawn((
///     SdfShape::new(8, sphere(1.0), constant_color(Color::new(1.0, 0.2, 0.2, 1.0))),
///     MeshMaterial3d(materials.add(StandardMaterial::default())),
/// ));
/// ```
#[derive(Component, Clone)]
pub struct SdfShape {
    /// Voxels per unit length.
    pub depth: usize,
    pub distance: SharedDistance,
    pub color: SharedColor,
}

impl SdfShape {
    pub fn new(
        depth: usize,
        distance: impl Fn(Point) -> Value + Send + Sync + 'static,
        color: impl Fn(Point) -> Color + Send + Sync + 'static,
    ) -> Self {
        Self {
            depth,
            distance: Arc::new(distance),
            color: Arc::new(color),
        }
    }
}

/// Marker component added to [`SdfShape`] entities that are waiting to be meshed.
///
/// Inserted automatically when the `auto_queue` feature is enabled; insert it yourself
/// otherwise. Removed once the mesh has been uploaded or generation failed.
#[derive(Component)]
pub struct QueuedShape;

/// Holds the in-flight async compute task for an [`SdfShape`].
#[derive(Component)]
pub struct ComputeTask(Task<Result<GeneratedMesh>>);

/// Extracted vertex data, ready for upload.
///
/// Present between [`SurfaceSet::Generate`] and [`SurfaceSet::Upload`].
#[derive(Component, Debug, Clone, Default)]
pub struct GeneratedMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

/// Runtime configuration for the surface pipeline.
///
/// Inserted as a resource by [`SdfSurfacePlugin`]:
///
/// ```rust,ignore
/// fn my_system(mut config: ResMut<SurfacePluginConfig>) {
///     config.max_tasks_per_frame = 1;
/// }
/// ```
#[derive(Resource)]
pub struct SurfacePluginConfig {
    /// Maximum number of async mesh tasks spawned per frame. Default: `4`.
    pub max_tasks_per_frame: usize,
}

impl Default for SurfacePluginConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
        }
    }
}

/// Bevy plugin that meshes [`SdfShape`] entities off the main thread.
///
/// ```text
/// SdfShape added or changed
///   → QueuedShape inserted          (queue_changed_shapes, `auto_queue` only)
///   → ComputeTask spawned           (SurfaceSet::Spawn)
///   → [async compute runs]
///   → GeneratedMesh inserted        (SurfaceSet::Generate)
///   → Mesh3d inserted               (SurfaceSet::Upload)
///   → QueuedShape + GeneratedMesh removed
/// ```
pub struct SdfSurfacePlugin {
    /// Initial value for [`SurfacePluginConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for SdfSurfacePlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: SurfacePluginConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for SdfSurfacePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SurfacePluginConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        })
        .configure_sets(
            Update,
            (SurfaceSet::Spawn, SurfaceSet::Generate, SurfaceSet::Upload).chain(),
        )
        .add_systems(
            Update,
            (
                spawn_mesh_tasks.in_set(SurfaceSet::Spawn),
                poll_mesh_tasks.in_set(SurfaceSet::Generate),
                upload_mesh.in_set(SurfaceSet::Upload),
            ),
        );

        #[cfg(feature = "auto_queue")]
        app.add_systems(Update, queue_changed_shapes.before(SurfaceSet::Spawn));
    }
}

/// Queues every added or modified [`SdfShape`].
///
/// Work still pending for an older version of the shape is discarded; dropping the
/// [`ComputeTask`] cancels it.
#[cfg(feature = "auto_queue")]
fn queue_changed_shapes(mut commands: Commands, query: Query<Entity, Changed<SdfShape>>) {
    for entity in query.iter() {
        commands
            .entity(entity)
            .remove::<(ComputeTask, GeneratedMesh)>()
            .insert(QueuedShape);
    }
}

/// Spawns async compute tasks for [`QueuedShape`]s, up to [`SurfacePluginConfig::max_tasks_per_frame`] per frame.
fn spawn_mesh_tasks(
    mut commands: Commands,
    config: Res<SurfacePluginConfig>,
    query: Query<
        (Entity, &SdfShape),
        (With<QueuedShape>, Without<ComputeTask>, Without<GeneratedMesh>),
    >,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, shape) in query.iter().take(config.max_tasks_per_frame) {
        let depth = shape.depth;
        let distance = Arc::clone(&shape.distance);
        let color = Arc::clone(&shape.color);

        let task = task_pool.spawn(async move { generate(depth, &distance, &color) });
        commands.entity(entity).insert(ComputeTask(task));
    }
}

/// Polls in-flight [`ComputeTask`]s and inserts [`GeneratedMesh`] on completion.
///
/// Failed extractions are logged and dequeued.
fn poll_mesh_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ComputeTask)>) {
    for (entity, mut compute_task) in query.iter_mut() {
        let Some(result) = block_on(future::poll_once(&mut compute_task.0)) else {
            continue;
        };
        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<ComputeTask>();
        match result {
            Ok(generated) => {
                entity_commands.insert(generated);
            }
            Err(error) => {
                warn!(?entity, %error, "surface extraction failed");
                entity_commands.remove::<QueuedShape>();
            }
        }
    }
}

/// Uploads a [`GeneratedMesh`] into a Bevy [`Mesh3d`], replacing any previous mesh.
fn upload_mesh(
    mut commands: Commands,
    query: Query<(Entity, &GeneratedMesh), With<QueuedShape>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, generated) in query.iter() {
        let mut bevy_mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        );

        bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, generated.positions.clone());
        bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, generated.normals.clone());
        bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, generated.colors.clone());
        bevy_mesh.insert_indices(Indices::U32(generated.indices.clone()));

        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(bevy_mesh)))
            .remove::<(QueuedShape, GeneratedMesh)>();
    }
}

/// Extracts `distance` and flattens the result into upload-ready buffers.
pub fn generate(depth: usize, distance: &SharedDistance, color: &SharedColor) -> Result<GeneratedMesh> {
    let mesh = marching_mesh(depth, distance.as_ref(), color.as_ref())?;
    debug!(depth, triangles = mesh.tris.len(), "generated surface mesh");
    Ok(GeneratedMesh {
        positions: mesh.positions_array(),
        normals: mesh.normals_array(),
        colors: mesh.colors_array(),
        indices: mesh.indices(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fields::sphere, noise::constant_color};

    #[test]
    fn generated_buffers_line_up() {
        let shape = SdfShape::new(2, sphere(1.0), constant_color(Color::new(0.0, 1.0, 0.0, 1.0)));
        let generated = generate(shape.depth, &shape.distance, &shape.color).unwrap();
        assert!(!generated.indices.is_empty());
        assert_eq!(generated.indices.len() % 3, 0);
        assert_eq!(generated.positions.len(), generated.normals.len());
        assert_eq!(generated.positions.len(), generated.colors.len());
        let vertex_count = generated.positions.len() as u32;
        assert!(generated.indices.iter().all(|&i| i < vertex_count));
        assert!(generated.colors.iter().all(|c| *c == [0.0, 1.0, 0.0, 1.0]));
    }

    #[test]
    fn invalid_depth_is_reported() {
        let shape = SdfShape::new(0, sphere(1.0), constant_color(Color::new(1.0, 1.0, 1.0, 1.0)));
        assert!(generate(shape.depth, &shape.distance, &shape.color).is_err());
    }

    #[test]
    fn plugin_meshes_queued_shapes() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .add_plugins(SdfSurfacePlugin::default());

        let entity = app
            .world_mut()
            .spawn((
                SdfShape::new(2, sphere(1.0), constant_color(Color::new(1.0, 1.0, 1.0, 1.0))),
                QueuedShape,
            ))
            .id();

        for _ in 0..1000 {
            app.update();
            if app.world().get::<Mesh3d>(entity).is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let world = app.world();
        assert!(world.get::<Mesh3d>(entity).is_some());
        assert!(world.get::<QueuedShape>(entity).is_none());
        assert!(world.get::<GeneratedMesh>(entity).is_none());
    }

    #[cfg(feature = "auto_queue")]
    #[test]
    fn editing_a_shape_replaces_its_mesh() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .add_plugins(SdfSurfacePlugin::default());

        let white = constant_color(Color::new(1.0, 1.0, 1.0, 1.0));
        let entity = app.world_mut().spawn(SdfShape::new(2, sphere(1.0), white.clone())).id();
        app.update();

        let edited = SdfShape::new(4, sphere(1.0), white);
        let expected = generate(edited.depth, &edited.distance, &edited.color).unwrap();
        *app.world_mut().get_mut::<SdfShape>(entity).unwrap() = edited;

        app.update();
        for _ in 0..1000 {
            if app.world().get::<QueuedShape>(entity).is_none() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
            app.update();
        }

        let world = app.world();
        assert!(world.get::<QueuedShape>(entity).is_none());
        let handle = &world.get::<Mesh3d>(entity).unwrap().0;
        let mesh = world.resource::<Assets<Mesh>>().get(handle).unwrap();
        assert_eq!(mesh.count_vertices(), expected.positions.len());
    }
}

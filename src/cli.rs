use std::num::NonZeroUsize;

use anyhow::{Context as _, Result};
use clap::Parser;
use gazecast::{
    Eulers, IntersectionSettings, NodeIdx, NodeKind, Pivot, RayCaster, SceneGraph, Space,
    Spatial as _, SpatialMut as _, WorkerCount,
    geometry::{FloatType, WorldPoint, WorldVector},
    mesh::{MeshKind, plane},
    scene::Timer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gazecast-cli")]
#[command(about = "Casts a simulated head gaze ray grid against a screen mesh", long_about = None)]
struct Cli {
    /// Rays per side of the cast grid
    #[arg(long, default_value_t = 32)]
    grid: usize,

    /// Number of simulated frames
    #[arg(long, default_value_t = 10)]
    frames: u32,

    /// Field of view covered by the ray grid, in degrees
    #[arg(long, default_value_t = 30.0)]
    fov: FloatType,

    /// Number of intersection worker threads (one per CPU if omitted)
    #[arg(long)]
    workers: Option<NonZeroUsize>,

    /// Number of rays a worker takes at once
    #[arg(long, default_value = "64")]
    block_size: NonZeroUsize,
}

/// Lab stand with a tessellated screen in front of the head, and a camera on top of it.
fn build_scene(settings: IntersectionSettings) -> Result<(SceneGraph, NodeIdx)> {
    let mut scene = SceneGraph::with_ray_caster(RayCaster::new(settings));

    let stand = scene.add_node("lab_stand", NodeKind::Empty);
    let screen_mesh = plane(
        "screen",
        1.6,
        0.9,
        NonZeroUsize::new(32).context("screen columns")?,
        NonZeroUsize::new(18).context("screen rows")?,
        MeshKind::Static,
    )?;
    scene.add_child(stand, "screen", NodeKind::Geometry(screen_mesh.into()))?;
    let camera = scene.add_child(stand, "camera", NodeKind::Camera)?;

    scene
        .transform_mut(stand)?
        .set_position(&WorldPoint::new(0.0, 0.0, -1.5), Space::Global)?;
    scene
        .transform_mut(camera)?
        .set_position(&WorldPoint::new(0.0, 0.5, 0.0), Space::Local)?;
    scene.transform_mut(camera)?.rotate(
        &WorldVector::y_axis(),
        std::f32::consts::PI,
        Pivot::Position,
        Space::Local,
    )?;

    // Pose producer stand-in: the head sways left and right and nods slowly
    let head = scene.add_node("head", NodeKind::Empty);
    scene.set_behaviour(
        head,
        Box::new(
            |scene: &mut SceneGraph, node: NodeIdx, timer: &Timer| -> gazecast::Result<()> {
                let phase = timer.frame() as FloatType * 0.5;
                let pose = Eulers::new(0.3 * phase.sin(), 0.1 * phase.cos(), 0.0);
                scene.transform_mut(node)?.set_eulers(&pose, Space::Global)
            },
        ),
    )?;

    info!(
        camera_view = ?scene.view_direction(camera)?.into_inner(),
        "scene ready"
    );
    Ok((scene, head))
}

/// Directions of a `grid` x `grid` ray fan around the head's forward axis.
fn gaze_rays(
    scene: &SceneGraph,
    head: NodeIdx,
    grid: usize,
    fov: FloatType,
) -> Result<Vec<WorldVector>> {
    let transform = scene.transform(head)?;
    let forward = transform.get_forward(Space::Global).into_inner();
    let right = transform.get_right(Space::Global).into_inner();
    let up = transform.get_up(Space::Global).into_inner();

    let extent = (fov.to_radians() / 2.0).tan();
    let step = |i: usize| {
        if grid > 1 {
            extent * (2.0 * i as FloatType / (grid - 1) as FloatType - 1.0)
        } else {
            0.0
        }
    };

    Ok((0..grid)
        .flat_map(|j| (0..grid).map(move |i| (i, j)))
        .map(|(i, j)| forward + right * step(i) + up * step(j))
        .collect())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let settings = IntersectionSettings::builder()
        .ray_block_size(cli.block_size)
        .worker_count(cli.workers.map_or(WorkerCount::Auto, WorkerCount::Manual))
        .build();

    let (mut scene, head) = build_scene(settings)?;
    let mut timer = Timer::new();

    for _ in 0..cli.frames {
        scene.update(&mut timer)?;

        let origin = scene.transform(head)?.get_position(Space::Global);
        let rays = gaze_rays(&scene, head, cli.grid, cli.fov)?;
        let result = scene.cast_rays_from_origin(&origin, &rays)?;

        let mean_distance = if result.is_empty() {
            FloatType::NAN
        } else {
            result.distances().sum::<FloatType>() / result.len() as FloatType
        };
        let center_uv = result
            .for_ray(rays.len() / 2)
            .and_then(|hit| hit.uv)
            .map(|uv| [uv.x, uv.y]);

        info!(
            frame = timer.frame(),
            rays = rays.len(),
            hits = result.len(),
            mean_distance,
            ?center_uv,
            elapsed = ?timer.elapsed(),
            "cast frame"
        );
    }

    Ok(())
}

use std::num::NonZeroUsize;

use assert2::{assert, let_assert};
use gazecast::{
    Mesh, MeshKind, NodeIdx, NodeKind, SceneGraph, Space, Spatial as _, SpatialMut as _,
    Transform,
    geometry::{FloatType, WorldPoint, WorldVector},
    mesh::plane,
    scene::Timer,
};

const TOLERANCE: FloatType = 1e-4;

/// 2 x 2 screen two meters in front of the origin, and a head node at the origin.
fn lab() -> (SceneGraph, NodeIdx, NodeIdx) {
    let mut scene = SceneGraph::new();
    let cells = NonZeroUsize::new(4).unwrap();
    let mesh = plane("screen", 2.0, 2.0, cells, cells, MeshKind::Static).unwrap();
    let screen = scene.add_node("screen", NodeKind::Geometry(mesh.into()));
    scene
        .transform_mut(screen)
        .unwrap()
        .set_position(&WorldPoint::new(0.0, 0.0, -2.0), Space::Global)
        .unwrap();
    let head = scene.add_node("head", NodeKind::Empty);
    (scene, screen, head)
}

fn gaze(scene: &SceneGraph, head: NodeIdx) -> (WorldPoint, Vec<WorldVector>) {
    let transform = scene.transform(head).unwrap();
    (
        transform.get_position(Space::Global),
        vec![transform.get_forward(Space::Global).into_inner()],
    )
}

#[test]
fn pose_from_row_major_matrix() {
    let (mut scene, screen, head) = lab();

    #[rustfmt::skip]
    let pose = Transform::from_row_major(&[
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.3, 0.15, 0.0, 1.0,
    ])
    .unwrap();
    scene
        .transform_mut(head)
        .unwrap()
        .set_matrix(*pose.matrix(), Space::Global)
        .unwrap();

    let (origin, rays) = gaze(&scene, head);
    let result = scene.cast_rays_from_origin(&origin, &rays).unwrap();

    let_assert!(Some(hit) = result.for_ray(0));
    assert!(hit.node == screen);
    assert!((hit.distance - 2.0).abs() < TOLERANCE);
    assert!((hit.point - WorldPoint::new(0.3, 0.15, -2.0)).norm() < TOLERANCE);
    let_assert!(Some(uv) = hit.uv);
    assert!((uv.x - 0.65).abs() < TOLERANCE);
    assert!((uv.y - 0.575).abs() < TOLERANCE);
}

#[test]
fn behaviour_drives_the_gaze() {
    let (mut scene, _, head) = lab();
    scene
        .set_behaviour(
            head,
            Box::new(
                |scene: &mut SceneGraph, node: NodeIdx, timer: &Timer| -> gazecast::Result<()> {
                    let x = 0.11 * timer.frame() as FloatType;
                    scene
                        .transform_mut(node)?
                        .set_position(&WorldPoint::new(x, 0.1, 0.0), Space::Local)
                },
            ),
        )
        .unwrap();

    let mut timer = Timer::new();
    for _ in 0..3 {
        scene.update(&mut timer).unwrap();
    }
    assert!(timer.frame() == 3);

    let (origin, rays) = gaze(&scene, head);
    let result = scene.cast_rays_from_origin(&origin, &rays).unwrap();
    let_assert!(Some(hit) = result.for_ray(0));
    assert!((hit.point - WorldPoint::new(0.33, 0.1, -2.0)).norm() < TOLERANCE);
}

#[test]
fn moving_hand_occludes_the_screen() {
    let (mut scene, screen, head) = lab();
    scene
        .transform_mut(head)
        .unwrap()
        .set_position(&WorldPoint::new(0.3, 0.15, 0.0), Space::Global)
        .unwrap();
    let hand_mesh = Mesh::builder()
        .name("hand")
        .vertices(vec![
            WorldPoint::new(-0.2, -0.3, -1.0),
            WorldPoint::new(0.8, -0.3, -1.0),
            WorldPoint::new(0.3, 0.7, -1.0),
        ])
        .triangles(vec![[0, 1, 2]])
        .kind(MeshKind::Dynamic)
        .build()
        .unwrap();
    let hand = scene.add_node("hand", NodeKind::Geometry(hand_mesh.into()));

    let (origin, rays) = gaze(&scene, head);
    let result = scene.cast_rays_from_origin(&origin, &rays).unwrap();
    let_assert!(Some(hit) = result.for_ray(0));
    assert!(hit.node == hand);
    assert!((hit.distance - 1.0).abs() < TOLERANCE);

    // Tracker reports the hand moved out of the line of sight
    let_assert!(Ok(Some(meshes)) = scene.meshes_mut(hand));
    let_assert!(Some(mesh) = meshes.get_mut(0));
    mesh.set_vertices_flat(&[3.0, -0.5, -1.0, 4.0, -0.5, -1.0, 3.5, 0.5, -1.0])
        .unwrap();

    let result = scene.cast_rays_from_origin(&origin, &rays).unwrap();
    let_assert!(Some(hit) = result.for_ray(0));
    assert!(hit.node == screen);
    assert!((hit.distance - 2.0).abs() < TOLERANCE);
}

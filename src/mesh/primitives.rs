use std::num::NonZeroUsize;

use crate::{
    error::Result,
    geometry::{FloatType, TexturePoint, WorldPoint},
};

use super::{Mesh, MeshKind};

/// Rectangle in the local XY plane, centered at the origin and facing +Z,
/// split into `columns` x `rows` cells of two triangles each.
/// Texture coordinates go from (0, 0) in the bottom left to (1, 1) in the top right corner.
pub fn plane(
    name: &str,
    width: FloatType,
    height: FloatType,
    columns: NonZeroUsize,
    rows: NonZeroUsize,
    kind: MeshKind,
) -> Result<Mesh> {
    let (columns, rows) = (columns.get(), rows.get());
    let stride = columns + 1;

    let mut vertices = Vec::with_capacity(stride * (rows + 1));
    let mut texture_coordinates = Vec::with_capacity(vertices.capacity());
    for j in 0..=rows {
        for i in 0..=columns {
            let u = i as FloatType / columns as FloatType;
            let v = j as FloatType / rows as FloatType;
            vertices.push(WorldPoint::new((u - 0.5) * width, (v - 0.5) * height, 0.0));
            texture_coordinates.push(TexturePoint::new(u, v));
        }
    }

    let mut triangles = Vec::with_capacity(2 * columns * rows);
    for j in 0..rows {
        for i in 0..columns {
            let bottom_left = j * stride + i;
            let bottom_right = bottom_left + 1;
            let top_left = bottom_left + stride;
            let top_right = top_left + 1;
            triangles.push([bottom_left, bottom_right, top_left]);
            triangles.push([bottom_right, top_right, top_left]);
        }
    }

    Mesh::builder()
        .name(name)
        .vertices(vertices)
        .triangles(triangles)
        .texture_coordinates(texture_coordinates)
        .kind(kind)
        .build()
}

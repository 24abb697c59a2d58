mod materials;
mod primitives;

use std::ops::Range;

use bon::bon;
use tracing::trace;

use crate::{
    error::{Error, Result},
    geometry::{self, FloatType, Matrix, TexturePoint, Triangle, WorldPoint},
};

pub use materials::{Material, MeshMaterials};
pub use primitives::plane;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MeshKind {
    /// Geometry is fixed after construction
    #[default]
    Static,
    /// Vertex positions may be replaced, keeping the vertex count
    Dynamic,
}

/// Indexed triangle mesh in local coordinates of its owning node.
#[derive(Clone, Debug)]
pub struct Mesh {
    name: String,
    vertices: Vec<WorldPoint>,
    triangles: Vec<Triangle<usize>>,
    texture_coordinates: Option<Vec<TexturePoint>>,
    materials: MeshMaterials,
    kind: MeshKind,
    revision: u64,
}

#[bon]
impl Mesh {
    #[builder]
    pub fn new(
        #[builder(into, default)] name: String,
        vertices: Vec<WorldPoint>,
        triangles: Vec<[usize; 3]>,
        texture_coordinates: Option<Vec<TexturePoint>>,
        #[builder(default)] materials: MeshMaterials,
        #[builder(default)] kind: MeshKind,
    ) -> Result<Self> {
        if vertices.is_empty() {
            return Err(Error::shape("vertices", "at least one vertex", "0 vertices"));
        }

        let vertex_count = vertices.len();
        for (face, indices) in triangles.iter().enumerate() {
            if let Some(index) = indices.iter().find(|&&i| i >= vertex_count) {
                return Err(Error::shape(
                    "triangle indices",
                    format!("indices below {vertex_count}"),
                    format!("index {index} in triangle {face}"),
                ));
            }
        }

        if let Some(uvs) = &texture_coordinates {
            if uvs.len() != vertex_count {
                return Err(Error::shape(
                    "texture coordinates",
                    format!("{vertex_count} points (one per vertex)"),
                    format!("{} points", uvs.len()),
                ));
            }
        }

        check_face_ranges(
            materials.iter().flat_map(|(_, ranges)| ranges),
            triangles.len(),
        )?;

        Ok(Mesh {
            name,
            vertices,
            triangles: triangles.into_iter().map(Triangle::from).collect(),
            texture_coordinates,
            materials,
            kind,
            revision: 0,
        })
    }
}

impl Mesh {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[WorldPoint] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle<usize>] {
        &self.triangles
    }

    pub fn texture_coordinates(&self) -> Option<&[TexturePoint]> {
        self.texture_coordinates.as_deref()
    }

    pub fn materials(&self) -> &MeshMaterials {
        &self.materials
    }

    pub fn kind(&self) -> MeshKind {
        self.kind
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == MeshKind::Dynamic
    }

    /// Incremented on every vertex replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces all vertex positions of a dynamic mesh.
    pub fn set_vertices(&mut self, vertices: Vec<WorldPoint>) -> Result<()> {
        if !self.is_dynamic() {
            return Err(Error::AttemptToMutateStatic {
                mesh: self.name.clone(),
            });
        }
        if vertices.len() != self.vertices.len() {
            return Err(Error::shape(
                "vertices",
                format!("{} vertices", self.vertices.len()),
                format!("{} vertices", vertices.len()),
            ));
        }

        self.vertices = vertices;
        self.revision += 1;
        trace!(mesh = self.name.as_str(), revision = self.revision, "vertices replaced");
        Ok(())
    }

    /// Replaces all vertex positions from a flat `[x0, y0, z0, x1, ...]` buffer.
    pub fn set_vertices_flat(&mut self, flat: &[FloatType]) -> Result<()> {
        self.set_vertices(geometry::points_from_flat("vertices", flat)?)
    }

    pub fn add_material_range(&mut self, material: Material, faces: Range<usize>) -> Result<()> {
        if !faces.is_empty() {
            check_face_ranges(std::iter::once(&faces), self.triangles.len())?;
        }
        self.materials.add(material, faces)
    }

    pub fn replace_material(&mut self, old: &Material, new: Material) -> Result<()> {
        self.materials.replace(old, new)
    }

    pub fn replace_material_by_name(&mut self, old_name: &str, new: Material) -> Result<()> {
        self.materials.replace_by_name(old_name, new)
    }

    /// Transforms the vertices by `matrix` and gathers them into triangles.
    pub fn global_triangles(&self, matrix: &Matrix) -> Vec<Triangle<WorldPoint>> {
        let transformed: Vec<WorldPoint> = self
            .vertices
            .iter()
            .map(|v| geometry::transform_point(matrix, v))
            .collect();
        self.triangles
            .iter()
            .map(|indices| indices.map(|&i| transformed[i]))
            .collect()
    }
}

fn check_face_ranges<'a>(
    ranges: impl IntoIterator<Item = &'a Range<usize>>,
    triangle_count: usize,
) -> Result<()> {
    match ranges.into_iter().find(|r| r.end > triangle_count) {
        Some(r) => Err(Error::FaceRangeOutOfBounds {
            start: r.start,
            end: r.end,
            triangle_count,
        }),
        None => Ok(()),
    }
}

/// Meshes owned by a single geometry node.
#[derive(Clone, Debug, Default)]
pub struct MeshCollection {
    meshes: Vec<Mesh>,
}

impl MeshCollection {
    pub fn new(meshes: Vec<Mesh>) -> MeshCollection {
        MeshCollection { meshes }
    }

    pub fn empty() -> MeshCollection {
        MeshCollection::default()
    }

    pub fn get(&self, index: usize) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Mesh> {
        self.meshes.get_mut(index)
    }

    /// First mesh with the given name.
    pub fn get_by_name(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn push(&mut self, mesh: Mesh) {
        self.meshes.push(mesh);
    }
}

impl From<Mesh> for MeshCollection {
    fn from(mesh: Mesh) -> Self {
        MeshCollection::new(vec![mesh])
    }
}

impl FromIterator<Mesh> for MeshCollection {
    fn from_iter<I: IntoIterator<Item = Mesh>>(iter: I) -> Self {
        MeshCollection::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::geometry::WorldVector;
    use assert2::{assert, let_assert};

    /// Single triangle facing +Z at depth `z`, around the Z axis.
    pub fn triangle_mesh(name: &str, z: FloatType, kind: MeshKind) -> Mesh {
        Mesh::builder()
            .name(name)
            .vertices(vec![
                WorldPoint::new(-1.0, -1.0, z),
                WorldPoint::new(1.0, -1.0, z),
                WorldPoint::new(0.0, 1.0, z),
            ])
            .triangles(vec![[0, 1, 2]])
            .kind(kind)
            .build()
            .unwrap()
    }

    #[test]
    fn empty_vertices_are_rejected() {
        let_assert!(
            Err(Error::Shape { what: "vertices", .. }) = Mesh::builder()
                .vertices(vec![])
                .triangles(vec![])
                .build()
        );
    }

    #[test]
    fn index_out_of_range_is_rejected() {
        let_assert!(
            Err(Error::Shape { what, found, .. }) = Mesh::builder()
                .vertices(vec![WorldPoint::origin(); 3])
                .triangles(vec![[0, 1, 2], [2, 3, 0]])
                .build()
        );
        assert!(what == "triangle indices");
        assert!(found == "index 3 in triangle 1");
    }

    #[test]
    fn texture_coordinates_must_match_vertices() {
        let_assert!(
            Err(Error::Shape { what: "texture coordinates", .. }) = Mesh::builder()
                .vertices(vec![WorldPoint::origin(); 3])
                .triangles(vec![[0, 1, 2]])
                .texture_coordinates(vec![TexturePoint::origin(); 2])
                .build()
        );
    }

    #[test]
    fn material_range_past_index_table_is_rejected() {
        let mut materials = MeshMaterials::new();
        materials.add(Material::named("wall"), 0..2).unwrap();

        let_assert!(
            Err(Error::FaceRangeOutOfBounds { start: 0, end: 2, triangle_count: 1 }) =
                Mesh::builder()
                    .vertices(vec![WorldPoint::origin(); 3])
                    .triangles(vec![[0, 1, 2]])
                    .materials(materials)
                    .build()
        );

        let mut mesh = triangle_mesh("a", 0.0, MeshKind::Static);
        let_assert!(
            Err(Error::FaceRangeOutOfBounds { .. }) =
                mesh.add_material_range(Material::named("wall"), 1..3)
        );
        mesh.add_material_range(Material::named("wall"), 0..1).unwrap();
        mesh.replace_material_by_name("wall", Material::named("screen"))
            .unwrap();
        assert!(mesh.materials().material_of_face(0) == Some(&Material::named("screen")));
    }

    #[test]
    fn static_mesh_rejects_vertex_write() {
        let mut mesh = triangle_mesh("screen", -2.0, MeshKind::Static);
        let_assert!(
            Err(Error::AttemptToMutateStatic { mesh: name }) =
                mesh.set_vertices(vec![WorldPoint::origin(); 3])
        );
        assert!(name == "screen");
        assert!(mesh.revision() == 0);
        assert!(mesh.vertices()[0] == WorldPoint::new(-1.0, -1.0, -2.0));
    }

    #[test]
    fn dynamic_mesh_accepts_same_shape() {
        let mut mesh = triangle_mesh("hand", -2.0, MeshKind::Dynamic);
        mesh.set_vertices_flat(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap();
        assert!(mesh.revision() == 1);
        assert!(mesh.vertices()[1] == WorldPoint::new(1.0, 0.0, 0.0));

        let_assert!(Err(Error::Shape { .. }) = mesh.set_vertices(vec![WorldPoint::origin(); 4]));
        let_assert!(Err(Error::Shape { .. }) = mesh.set_vertices_flat(&[0.0; 8]));
        assert!(mesh.revision() == 1);
    }

    #[test]
    fn global_triangles_apply_row_vector_matrix() {
        let mesh = triangle_mesh("a", 0.0, MeshKind::Static);
        let mut matrix = Matrix::identity();
        matrix[(3, 2)] = -5.0;

        let triangles = mesh.global_triangles(&matrix);
        assert!(triangles.len() == 1);
        assert!(triangles[0][2] == WorldPoint::new(0.0, 1.0, -5.0));
        assert!(triangles[0].normal().normalize() == WorldVector::z());
    }

    #[test]
    fn collection_lookup() {
        let mut meshes: MeshCollection = [
            triangle_mesh("left", 0.0, MeshKind::Static),
            triangle_mesh("right", 0.0, MeshKind::Dynamic),
        ]
        .into_iter()
        .collect();

        assert!(meshes.len() == 2);
        let_assert!(Some(right) = meshes.get_by_name("right"));
        assert!(right.is_dynamic());
        assert!(meshes.get_by_name("middle").is_none());

        let_assert!(Some(left) = meshes.get_by_name_mut("left"));
        assert!(left.set_vertices(vec![WorldPoint::origin(); 3]).is_err());
        assert!(meshes.get(2).is_none());
    }
}

use std::ops::Range;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::{
    error::{Error, Result},
    geometry::FloatType,
};

const DEFAULT_DIFFUSE: FloatType = 0.8;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Material {
    pub name: String,
    /// Diffuse color (`Kd`)
    pub diffuse: [OrderedFloat<FloatType>; 3],
}

impl Material {
    pub fn new(name: impl Into<String>, diffuse: [FloatType; 3]) -> Material {
        Material {
            name: name.into(),
            diffuse: diffuse.map(OrderedFloat),
        }
    }

    /// Material with the default light grey diffuse color.
    pub fn named(name: impl Into<String>) -> Material {
        Material::new(name, [DEFAULT_DIFFUSE; 3])
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::named("")
    }
}

/// Assignment of materials to ranges of a mesh's triangle table.
/// Materials keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct MeshMaterials {
    material_faces: IndexMap<Material, Vec<Range<usize>>>,
}

impl MeshMaterials {
    pub fn new() -> MeshMaterials {
        MeshMaterials::default()
    }

    /// Assigns a range of faces to a material.
    /// Empty ranges are dropped, ranges overlapping one already owned by the material are rejected.
    pub fn add(&mut self, material: Material, faces: Range<usize>) -> Result<()> {
        if faces.is_empty() {
            debug!(material = material.name.as_str(), ?faces, "dropping empty face range");
            return Ok(());
        }

        if overlaps(self.face_ranges(&material), &faces) {
            return Err(Error::OverlappingFaceRange {
                material: material.name,
                start: faces.start,
                end: faces.end,
            });
        }

        self.material_faces.entry(material).or_default().push(faces);
        Ok(())
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.material_faces.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Material, &[Range<usize>])> {
        self.material_faces
            .iter()
            .map(|(material, ranges)| (material, ranges.as_slice()))
    }

    /// Face ranges of a material, empty if the material is not used.
    pub fn face_ranges(&self, material: &Material) -> &[Range<usize>] {
        self.material_faces
            .get(material)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Material owning the given face, if any.
    pub fn material_of_face(&self, face: usize) -> Option<&Material> {
        self.iter()
            .find(|(_, ranges)| ranges.iter().any(|r| r.contains(&face)))
            .map(|(material, _)| material)
    }

    /// Moves all faces of `old` to `new`, keeping the position of `old` in the material order.
    /// If `new` is already present, the face ranges are merged into it. Fails without
    /// modifying anything if a moved range overlaps a range `new` already owns.
    pub fn replace(&mut self, old: &Material, new: Material) -> Result<()> {
        if &new != old {
            let target = self.face_ranges(&new);
            let clash = self
                .face_ranges(old)
                .iter()
                .find(|faces| overlaps(target, faces));
            if let Some(faces) = clash {
                return Err(Error::OverlappingFaceRange {
                    material: new.name,
                    start: faces.start,
                    end: faces.end,
                });
            }
        }

        let (index, _, faces) =
            self.material_faces
                .shift_remove_full(old)
                .ok_or_else(|| Error::MaterialNotFound {
                    name: old.name.clone(),
                })?;

        match self.material_faces.get_mut(&new) {
            Some(existing) => existing.extend(faces),
            None => {
                self.material_faces.shift_insert(index, new, faces);
            }
        }
        Ok(())
    }

    pub fn replace_by_name(&mut self, old_name: &str, new: Material) -> Result<()> {
        let old = self
            .materials()
            .find(|m| m.name == old_name)
            .cloned()
            .ok_or_else(|| Error::MaterialNotFound {
                name: old_name.to_string(),
            })?;
        self.replace(&old, new)
    }
}

fn overlaps(ranges: &[Range<usize>], faces: &Range<usize>) -> bool {
    ranges
        .iter()
        .any(|r| r.start < faces.end && faces.start < r.end)
}

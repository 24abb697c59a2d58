//! Affine transforms in row-vector convention.
//!
//! A point transforms as `[x y z 1] * M`, so the translation lives in the last row and the
//! first three rows of the 3x3 block are the images of the local X, Y and Z axes.
//! Composition with a parent is a post-multiplication:
//! `global(T) = local(T) * global(parent(T))`.
//!
//! Every operation is provided by the [`Spatial`] / [`SpatialMut`] trait pair on top of two
//! primitives: the local matrix and the global matrix of the parent. A detached [`Transform`]
//! has the [`IdentityRoot`] as its parent, scene graph nodes provide their own implementations.

mod eulers;

use nalgebra::{Matrix3, Rotation3, Unit};

use crate::{
    error::{Error, Result},
    geometry::{FloatType, Matrix, WorldPoint, WorldVector},
};

pub use eulers::Eulers;

/// Determinants with smaller magnitude are treated as singular.
const SINGULAR_DETERMINANT: FloatType = 1e-12;

pub fn world_forward() -> Unit<WorldVector> {
    -WorldVector::z_axis()
}

pub fn world_up() -> Unit<WorldVector> {
    WorldVector::y_axis()
}

pub fn world_right() -> Unit<WorldVector> {
    WorldVector::x_axis()
}

pub fn world_origin() -> WorldPoint {
    WorldPoint::origin()
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Space {
    /// Relative to the parent transform
    #[default]
    Local,
    /// Relative to the scene origin
    Global,
}

/// Point around which [`SpatialMut::rotate`] turns the transform.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Pivot {
    /// Own position, only the orientation changes
    Position,
    /// Coordinate origin of the chosen space, position orbits around it
    Origin,
}

/// Inverts an affine matrix, failing if it is singular within tolerance.
pub fn invert(m: &Matrix) -> Result<Matrix> {
    if m.determinant().abs() < SINGULAR_DETERMINANT {
        return Err(Error::SingularMatrix);
    }
    m.try_inverse()
        .filter(|inverse| inverse.iter().all(|x| x.is_finite()))
        .ok_or(Error::SingularMatrix)
}

/// Builds a matrix from 16 row-major values.
pub fn matrix_from_row_major(values: &[FloatType]) -> Result<Matrix> {
    if values.len() != 16 || !values.iter().all(|x| x.is_finite()) {
        return Err(Error::shape(
            "transform matrix",
            "16 finite values (4x4)",
            format!("{} values", values.len()),
        ));
    }
    Ok(Matrix::from_row_slice(values))
}

fn basis_row(m: &Matrix, axis: usize) -> WorldVector {
    WorldVector::new(m[(axis, 0)], m[(axis, 1)], m[(axis, 2)])
}

fn set_basis_row(m: &mut Matrix, axis: usize, value: &WorldVector) {
    for (i, x) in value.iter().enumerate() {
        m[(axis, i)] = *x;
    }
}

/// Rows of the 3x3 block with the scale removed.
/// Axes collapsed by a zero scale fall back to the corresponding world axis.
fn rotation_rows(m: &Matrix) -> [WorldVector; 3] {
    std::array::from_fn(|axis| {
        basis_row(m, axis)
            .try_normalize(0.0)
            .unwrap_or_else(|| WorldVector::ith(axis, 1.0))
    })
}

/// Read access to a transform placed in a hierarchy.
pub trait Spatial {
    fn local_matrix(&self) -> Matrix;

    /// Global matrix of the parent transform.
    fn parent_global_matrix(&self) -> Matrix;

    fn get_matrix(&self, space: Space) -> Matrix {
        match space {
            Space::Local => self.local_matrix(),
            Space::Global => self.local_matrix() * self.parent_global_matrix(),
        }
    }

    fn get_position(&self, space: Space) -> WorldPoint {
        let m = self.get_matrix(space);
        WorldPoint::new(m[(3, 0)], m[(3, 1)], m[(3, 2)])
    }

    /// Scale along the local axes, assuming the matrix has no shear.
    fn get_scale(&self, space: Space) -> WorldVector {
        let m = self.get_matrix(space);
        WorldVector::from_fn(|axis, _| basis_row(&m, axis).norm())
    }

    /// Orientation as a column convention rotation (`rotation * v` maps local to parent axes).
    fn get_rotation(&self, space: Space) -> Rotation3<FloatType> {
        let rows = rotation_rows(&self.get_matrix(space));
        Rotation3::from_matrix_unchecked(Matrix3::from_columns(&rows))
    }

    fn get_right(&self, space: Space) -> Unit<WorldVector> {
        Unit::new_unchecked(rotation_rows(&self.get_matrix(space))[0])
    }

    fn get_up(&self, space: Space) -> Unit<WorldVector> {
        Unit::new_unchecked(rotation_rows(&self.get_matrix(space))[1])
    }

    fn get_forward(&self, space: Space) -> Unit<WorldVector> {
        Unit::new_unchecked(-rotation_rows(&self.get_matrix(space))[2])
    }

    fn get_eulers(&self, space: Space) -> Eulers {
        Eulers::from_rotation(&self.get_rotation(space))
    }

    /// Returns a detached transform `delta` such that `other * delta == self` in the given space.
    fn get_relative_to(&self, other: &impl Spatial, space: Space) -> Result<Transform> {
        let delta = invert(&other.get_matrix(space))? * self.get_matrix(space);
        Ok(Transform::from_matrix(delta))
    }
}

/// Write access to a transform placed in a hierarchy.
/// All mutators change the local matrix only, global space mutators invert the parent's
/// current global matrix.
pub trait SpatialMut: Spatial {
    fn set_local_matrix(&mut self, value: Matrix);

    fn set_matrix(&mut self, value: Matrix, space: Space) -> Result<()> {
        let local = match space {
            Space::Local => value,
            Space::Global => value * invert(&self.parent_global_matrix())?,
        };
        self.set_local_matrix(local);
        Ok(())
    }

    fn reset(&mut self) {
        self.set_local_matrix(Matrix::identity());
    }

    fn set_position(&mut self, position: &WorldPoint, space: Space) -> Result<()> {
        let mut m = self.get_matrix(space);
        set_basis_row(&mut m, 3, &position.coords);
        self.set_matrix(m, space)
    }

    fn set_scale(&mut self, scale: &WorldVector, space: Space) -> Result<()> {
        let mut m = self.get_matrix(space);
        for (axis, row) in rotation_rows(&m).iter().enumerate() {
            set_basis_row(&mut m, axis, &(row * scale[axis]));
        }
        self.set_matrix(m, space)
    }

    fn set_rotation(&mut self, rotation: &Rotation3<FloatType>, space: Space) -> Result<()> {
        let scale = self.get_scale(space);
        let mut m = self.get_matrix(space);
        for axis in 0..3 {
            let row = rotation.matrix().column(axis) * scale[axis];
            set_basis_row(&mut m, axis, &row);
        }
        self.set_matrix(m, space)
    }

    fn set_eulers(&mut self, eulers: &Eulers, space: Space) -> Result<()> {
        self.set_rotation(&eulers.to_rotation(), space)
    }

    /// Translates by `delta`, expressed in the given space.
    fn move_by(&mut self, delta: &WorldVector, space: Space) -> Result<()> {
        let position = self.get_position(space) + delta;
        self.set_position(&position, space)
    }

    /// Rotates around `axis` by `angle` radians, post-multiplying the matrix by the
    /// axis-angle rotation matrix. With row vectors this turns clockwise when seen from
    /// the tip of the axis: a quarter turn around +Y moves +X to +Z.
    fn rotate(
        &mut self,
        axis: &Unit<WorldVector>,
        angle: FloatType,
        pivot: Pivot,
        space: Space,
    ) -> Result<()> {
        let rotation = Rotation3::from_axis_angle(axis, angle).to_homogeneous();
        let m = self.get_matrix(space);

        let rotated = match pivot {
            Pivot::Origin => m * rotation,
            Pivot::Position => {
                let position = self.get_position(space);
                let mut centered = m;
                set_basis_row(&mut centered, 3, &WorldVector::zeros());
                let mut rotated = centered * rotation;
                set_basis_row(&mut rotated, 3, &position.coords);
                rotated
            }
        };
        self.set_matrix(rotated, space)
    }
}

/// Sentinel parent of every transform that has no explicit parent.
/// Its global matrix is always identity.
#[derive(Copy, Clone, Debug, Default)]
pub struct IdentityRoot;

impl Spatial for IdentityRoot {
    fn local_matrix(&self) -> Matrix {
        Matrix::identity()
    }

    fn parent_global_matrix(&self) -> Matrix {
        Matrix::identity()
    }
}

/// Transform without a parent (parented to the [`IdentityRoot`]).
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    matrix: Matrix,
}

impl Transform {
    pub fn identity() -> Transform {
        Transform {
            matrix: Matrix::identity(),
        }
    }

    pub fn from_position(position: &WorldPoint) -> Transform {
        let mut matrix = Matrix::identity();
        set_basis_row(&mut matrix, 3, &position.coords);
        Transform { matrix }
    }

    pub fn from_matrix(matrix: Matrix) -> Transform {
        Transform { matrix }
    }

    pub fn from_row_major(values: &[FloatType]) -> Result<Transform> {
        Ok(Transform::from_matrix(matrix_from_row_major(values)?))
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

impl Spatial for Transform {
    fn local_matrix(&self) -> Matrix {
        self.matrix
    }

    fn parent_global_matrix(&self) -> Matrix {
        IdentityRoot.get_matrix(Space::Global)
    }
}

impl SpatialMut for Transform {
    fn set_local_matrix(&mut self, value: Matrix) {
        self.matrix = value;
    }
}

use nalgebra::{Rotation3, Vector3};

use crate::geometry::FloatType;

/// Below this distance from +-1 of the pitch sine the yaw and roll axes are considered aligned.
const GIMBAL_LOCK_TOLERANCE: FloatType = 1e-6;

/// Camera style orientation angles in radians.
///
/// The rotation block of a row-vector matrix with these angles is
/// `Rz(roll) * Rx(pitch) * Ry(yaw)` (extrinsic y, x, z). Seen as a column convention
/// [`Rotation3`] that is `Ry(-yaw) * Rx(-pitch) * Rz(-roll)`: positive yaw turns the forward
/// axis towards +X and positive pitch turns it down.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Eulers {
    pub yaw: FloatType,
    pub pitch: FloatType,
    pub roll: FloatType,
}

impl Eulers {
    pub fn new(yaw: FloatType, pitch: FloatType, roll: FloatType) -> Eulers {
        Eulers { yaw, pitch, roll }
    }

    pub fn from_degrees(yaw: FloatType, pitch: FloatType, roll: FloatType) -> Eulers {
        Eulers {
            yaw: yaw.to_radians(),
            pitch: pitch.to_radians(),
            roll: roll.to_radians(),
        }
    }

    /// Returns `[yaw, pitch, roll]` in degrees.
    pub fn to_degrees(&self) -> [FloatType; 3] {
        [
            self.yaw.to_degrees(),
            self.pitch.to_degrees(),
            self.roll.to_degrees(),
        ]
    }

    pub fn to_rotation(&self) -> Rotation3<FloatType> {
        Rotation3::from_axis_angle(&Vector3::y_axis(), -self.yaw)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), -self.pitch)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), -self.roll)
    }

    /// Decomposes a rotation.
    /// Pitch is in `[-pi/2, pi/2]`; in gimbal lock the whole heading is reported as yaw.
    pub fn from_rotation(rotation: &Rotation3<FloatType>) -> Eulers {
        // Decompose as Ry(a) * Rx(b) * Rz(c), the angles are the negated a, b, c
        let m = rotation.matrix();
        let sin_pitch = (-m[(1, 2)]).clamp(-1.0, 1.0);
        let pitch = -sin_pitch.asin();

        if sin_pitch.abs() < 1.0 - GIMBAL_LOCK_TOLERANCE {
            Eulers {
                yaw: -m[(0, 2)].atan2(m[(2, 2)]),
                pitch,
                roll: -m[(1, 0)].atan2(m[(1, 1)]),
            }
        } else {
            Eulers {
                yaw: -(-m[(2, 0)]).atan2(m[(0, 0)]),
                pitch,
                roll: 0.0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;
    use std::f32::consts::FRAC_PI_2;
    use test_case::test_case;
    use test_strategy::proptest;

    fn assert_rotations_close(a: &Rotation3<FloatType>, b: &Rotation3<FloatType>) {
        let difference = (a.matrix() - b.matrix()).abs().max();
        assert!(difference < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn yaw_turns_forward_right() {
        let forward = Eulers::from_degrees(90.0, 0.0, 0.0).to_rotation() * -Vector3::z();
        assert!((forward - Vector3::x()).norm() < 1e-6);
    }

    #[test]
    fn pitch_tilts_forward_down() {
        let forward = Eulers::from_degrees(0.0, 90.0, 0.0).to_rotation() * -Vector3::z();
        assert!((forward - -Vector3::y()).norm() < 1e-6);
    }

    #[test]
    fn row_block_matches_extrinsic_yxz() {
        // Row-vector block of yaw 30, pitch 20, roll 10 degrees, as the rows of
        // Rz(10) * Rx(20) * Ry(30)
        let (a, b, c) = (30f32.to_radians(), 20f32.to_radians(), 10f32.to_radians());
        let expected = Rotation3::from_axis_angle(&Vector3::z_axis(), c)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), b)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), a);

        let rotation = Eulers::new(a, b, c).to_rotation();
        assert_rotations_close(&rotation.inverse(), &expected);
    }

    #[test]
    fn degrees_round_trip() {
        let [yaw, pitch, roll] = Eulers::from_degrees(10.0, -20.0, 30.0).to_degrees();
        assert!((yaw - 10.0).abs() < 1e-4);
        assert!((pitch + 20.0).abs() < 1e-4);
        assert!((roll - 30.0).abs() < 1e-4);
    }

    #[proptest]
    fn decomposition_round_trip(
        #[strategy(-3.1f32..3.1)] yaw: f32,
        #[strategy(-1.5f32..1.5)] pitch: f32,
        #[strategy(-3.1f32..3.1)] roll: f32,
    ) {
        let eulers = Eulers::new(yaw, pitch, roll);
        let decomposed = Eulers::from_rotation(&eulers.to_rotation());

        assert!((decomposed.yaw - yaw).abs() < 1e-3);
        assert!((decomposed.pitch - pitch).abs() < 1e-3);
        assert!((decomposed.roll - roll).abs() < 1e-3);
    }

    #[test_case(FRAC_PI_2 ; "looking_up")]
    #[test_case(-FRAC_PI_2 ; "looking_down")]
    fn gimbal_lock_keeps_rotation(pitch: FloatType) {
        let rotation = Eulers::new(0.3, pitch, 0.2).to_rotation();
        let decomposed = Eulers::from_rotation(&rotation);

        assert!(decomposed.roll == 0.0);
        assert_rotations_close(&decomposed.to_rotation(), &rotation);
    }
}

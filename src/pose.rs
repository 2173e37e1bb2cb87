//! Procedural pose solver.
//!
//! The character has no authored animations. Every tick the motion state
//! machine recomputes a flat set of named joint angles from the current mode:
//! a periodic limb sway while airborne, and a walk cycle whose arm and thigh
//! swing comes straight from the wrapping cycle phase while the leg bend is
//! solved by two-bone inverse kinematics against the estimated foot reach.
//!
//! All angles are degrees, consumed as-is by the render bridge.

use bevy::prelude::*;

use crate::math::{angle_with_up, cos_deg, sin_deg};

/// Thigh segment length used by the leg IK solve.
pub const THIGH_LENGTH: f32 = 0.5;
/// Shin segment length used by the leg IK solve.
pub const SHIN_LENGTH: f32 = 0.65;

/// Vertical body-bob amplitude over one bearing cycle.
const BOB_AMPLITUDE: f32 = 0.05;
/// Hip drop used for the foot reach estimate when the travel direction is
/// known.
const HIP_DROP_DIRECTED: f32 = 0.825;
/// Hip drop for the flat-ground fallback when the travel direction cannot be
/// determined.
const HIP_DROP_FLAT: f32 = 1.175;
/// Airborne sway phase advance per tick, degrees.
const SWAY_STEP: f32 = 10.0;

/// Named joint rotation angles of the articulated body, in degrees.
///
/// `l`/`r` prefixes are the character's left and right sides. The walk cycle
/// drives the two sides contralaterally, so most pairs carry opposite signs.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct Joints {
    /// Forward lean of the whole body.
    pub body_pitch: f32,
    /// Twist of the whole body about its vertical axis.
    pub body_turn: f32,
    /// Forward bow at the waist.
    pub waist_bow: f32,
    pub lshoulder_swing: f32,
    pub rshoulder_swing: f32,
    pub lshoulder_flap: f32,
    pub rshoulder_flap: f32,
    pub lshoulder_push: f32,
    pub rshoulder_push: f32,
    pub larm_bend: f32,
    pub rarm_bend: f32,
    pub larm_twist: f32,
    pub rarm_twist: f32,
    pub lthigh_lift: f32,
    pub rthigh_lift: f32,
    pub lleg_bend: f32,
    pub rleg_bend: f32,
}

impl Joints {
    /// Zero every joint.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Set the static airborne base pose: a fixed backward tilt with splayed,
/// twisted arms. Applied once on every airborne entry; the per-tick sway is
/// layered on top by [`falling_sway`].
pub fn falling_entry(joints: &mut Joints) {
    joints.reset();
    joints.body_pitch = 70.0;
    joints.waist_bow = 10.0;
    joints.rshoulder_flap = -75.0;
    joints.lshoulder_flap = 75.0;
    joints.rshoulder_push = -45.0;
    joints.lshoulder_push = 45.0;
    joints.rarm_twist = 45.0;
    joints.larm_twist = 45.0;
}

/// Advance the airborne limb sway by one tick.
///
/// Each limb group samples the shared phase at a different frequency or
/// offset so the motion never reads as synchronized: the arm bend runs at
/// half frequency and the right leg trails the left by 90 degrees.
pub fn falling_sway(joints: &mut Joints, phase: &mut f32) {
    joints.body_turn = 30.0 * sin_deg(*phase);
    joints.lshoulder_swing = *phase;
    joints.rshoulder_swing = -*phase;
    joints.rarm_bend = 45.0 * sin_deg(*phase / 2.0);
    joints.larm_bend = joints.rarm_bend;
    joints.lthigh_lift = 45.0 * sin_deg(*phase);
    joints.rthigh_lift = -joints.lthigh_lift;
    joints.lleg_bend = 30.0 * sin_deg(*phase) + 30.0;
    joints.rleg_bend = 30.0 * sin_deg(*phase + 90.0) + 30.0;

    *phase += SWAY_STEP;
    if *phase > 360.0 {
        *phase = 0.0;
    }
}

/// Drive the shoulder, arm, and thigh swing of the walk cycle from the
/// wrapping cycle phase. The leg bend is left to [`solve_leg_bend`].
pub fn locomotion_swing(joints: &mut Joints, cycle_phase: f32) {
    joints.rshoulder_swing = -20.0 * sin_deg(cycle_phase);
    joints.lshoulder_swing = 20.0 * sin_deg(cycle_phase);
    joints.rarm_bend = -10.0 * sin_deg(cycle_phase) - 20.0;
    joints.larm_bend = 10.0 * sin_deg(cycle_phase) - 20.0;
    joints.rthigh_lift = 35.0 * sin_deg(cycle_phase) - 15.0;
    joints.lthigh_lift = -35.0 * sin_deg(cycle_phase) - 15.0;
}

/// Solve the leg bend angles for the weight-bearing phase of the walk cycle.
///
/// `bearing` is the fraction of the current edge attributed to the
/// weight-bearing node, in `[0.5, 1]`. The body bobs vertically as a cosine
/// of that fraction; the bob feeds the estimated hip-to-foot reach, which the
/// two-bone IK solve turns into a knee bend. A non-finite or zero result
/// means the foot target is unreachable this tick and the previous bend is
/// kept.
pub fn solve_leg_bend(joints: &mut Joints, bearing: f32, travel_direction: Option<Vec3>) {
    let bob = BOB_AMPLITUDE * cos_deg(360.0 * bearing) - BOB_AMPLITUDE;

    let (right_reach, left_reach) = match travel_direction {
        Some(direction) => {
            // Slant the reach by the travel direction's angle with the up
            // axis so feet track sloped edges.
            let tilt = angle_with_up(direction);
            (
                (bob + HIP_DROP_DIRECTED) * sin_deg(joints.rthigh_lift.abs()) / sin_deg(tilt),
                (bob + HIP_DROP_DIRECTED) * sin_deg(joints.lthigh_lift.abs()) / sin_deg(tilt),
            )
        }
        // Flat-ground approximation when the direction cannot be determined.
        None => (
            (bob + HIP_DROP_FLAT) / cos_deg(joints.rthigh_lift),
            (bob + HIP_DROP_FLAT) / cos_deg(joints.lthigh_lift),
        ),
    };

    let right = ik_bend_angle(THIGH_LENGTH, SHIN_LENGTH, right_reach) % 90.0;
    if right != 0.0 && right.is_finite() {
        joints.rleg_bend = right;
    }
    let left = ik_bend_angle(THIGH_LENGTH, SHIN_LENGTH, left_reach) % 90.0;
    if left != 0.0 && left.is_finite() {
        joints.lleg_bend = left;
    }
}

/// Bend angle of a two-segment chain with lengths `l1` and `l2` whose
/// endpoint reaches `distance` from the origin, in degrees.
///
/// Law of cosines on the interior joint angle; a straight chain
/// (`distance == l1 + l2`) bends zero degrees. Returns `NaN` when the
/// distance is unreachable, which callers must discard.
pub fn ik_bend_angle(l1: f32, l2: f32, distance: f32) -> f32 {
    let cos_interior = (l1 * l1 + l2 * l2 - distance * distance) / (2.0 * l1 * l2);
    180.0 - cos_interior.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn straight_chain_has_zero_bend() {
        let bend = ik_bend_angle(THIGH_LENGTH, SHIN_LENGTH, THIGH_LENGTH + SHIN_LENGTH);
        assert_relative_eq!(bend, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn equilateral_chain_bends_120_degrees() {
        // l1 = l2 = d forms an equilateral triangle: interior angle 60.
        assert_relative_eq!(ik_bend_angle(0.5, 0.5, 0.5), 120.0, epsilon = 1e-3);
    }

    #[test]
    fn unreachable_distance_is_nan() {
        assert!(ik_bend_angle(0.5, 0.65, 2.0).is_nan());
        // Unequal segments cannot fold back to the origin either.
        assert!(ik_bend_angle(0.5, 0.65, 0.0).is_nan());
    }

    #[test]
    fn nan_solve_keeps_previous_bend() {
        let mut joints = Joints::default();
        joints.rleg_bend = 42.0;
        joints.lleg_bend = 17.0;
        // Thigh lifts of zero with the directed reach divide by sin(0) when
        // the direction is vertical, producing non-finite reaches.
        joints.rthigh_lift = 0.0;
        joints.lthigh_lift = 0.0;
        solve_leg_bend(&mut joints, 1.0, Some(Vec3::Y));
        assert_eq!(joints.rleg_bend, 42.0);
        assert_eq!(joints.lleg_bend, 17.0);
    }

    #[test]
    fn flat_ground_fallback_produces_finite_bend() {
        let mut joints = Joints::default();
        locomotion_swing(&mut joints, 90.0);
        // Bearing 0.5 is the bob trough, where the right reach is inside
        // the leg's span and the solve assigns a real bend.
        solve_leg_bend(&mut joints, 0.5, None);
        assert!(joints.rleg_bend > 0.0 && joints.rleg_bend < 90.0);
        assert!(joints.lleg_bend.is_finite());
    }

    #[test]
    fn locomotion_swing_is_contralateral() {
        let mut joints = Joints::default();
        locomotion_swing(&mut joints, 45.0);
        assert_relative_eq!(joints.rshoulder_swing, -joints.lshoulder_swing, epsilon = 1e-5);
        assert_relative_eq!(
            joints.rthigh_lift + 15.0,
            -(joints.lthigh_lift + 15.0),
            epsilon = 1e-4
        );
    }

    #[test]
    fn falling_sway_wraps_phase() {
        let mut joints = Joints::default();
        let mut phase = 355.0;
        falling_sway(&mut joints, &mut phase);
        assert_eq!(phase, 0.0);
        falling_sway(&mut joints, &mut phase);
        assert_eq!(phase, SWAY_STEP);
    }

    #[test]
    fn falling_entry_resets_then_tilts() {
        let mut joints = Joints::default();
        joints.rleg_bend = 90.0;
        falling_entry(&mut joints);
        assert_eq!(joints.rleg_bend, 0.0);
        assert_eq!(joints.body_pitch, 70.0);
        assert_eq!(joints.lshoulder_flap, -joints.rshoulder_flap);
    }
}

//! Render bridge.
//!
//! Rendering lives outside this crate; the character only needs a matrix
//! stack and a body-mesh primitive. [`RenderBridge`] abstracts those behind
//! a trait the same way [`WorldGraph`] abstracts the stage: implement it over
//! your backend and hand it to [`Character::draw`], or skip the trait and
//! read [`Character::position`], [`Character::facing_degrees`], and
//! [`Character::joints`] directly.

use bevy::prelude::*;

use crate::math::CameraAngle;
use crate::pose::Joints;
use crate::state::{Character, Mode};
use crate::world::WorldGraph;

/// Minimal drawing interface the character needs.
pub trait RenderBridge {
    /// Push a copy of the current transform onto the matrix stack.
    fn push_matrix(&mut self);
    /// Pop the matrix stack.
    fn pop_matrix(&mut self);
    /// Translate the current transform.
    fn translate(&mut self, offset: Vec3);
    /// Rotate the current transform about the Y axis, degrees.
    fn rotate_y(&mut self, degrees: f32);
    /// Draw the character's body segments with the given joint angles.
    fn draw_character(&mut self, joints: &Joints);
}

impl Character {
    /// Rendered world position for the current tick.
    ///
    /// Airborne modes own an absolute position; grounded modes interpolate
    /// the edge endpoints by the progress fraction, degrading to the known
    /// node alone when the second endpoint cannot be resolved. `None` means
    /// a transient query miss: skip the draw this tick rather than fault.
    pub fn position<W: WorldGraph>(&self, graph: &W, angle: CameraAngle) -> Option<Vec3> {
        match self.mode {
            Mode::SpawnFall => self.fall_position,
            Mode::FreeFall | Mode::Launch => self.fall_position.map(|p| angle.apply(p)),
            _ => {
                let from = graph.position_at(self.node, angle)?;
                match self.next_node.and_then(|n| graph.position_at(n, angle)) {
                    Some(to) => {
                        Some(from * self.edge_progress + to * (1.0 - self.edge_progress))
                    }
                    None => Some(from),
                }
            }
        }
    }

    /// Facing rotation about the Y axis, degrees.
    ///
    /// Derived from the flight direction while launched, and from the
    /// current edge otherwise. `None` when no direction is defined (straight
    /// falls, terminal nodes).
    pub fn facing_degrees<W: WorldGraph>(&self, graph: &W, angle: CameraAngle) -> Option<f32> {
        let direction = match self.mode {
            Mode::Launch => Vec3::new(self.lateral_velocity.x, 0.0, self.lateral_velocity.y),
            _ => self.edge_direction(graph, angle)?,
        };
        Some(90.0 - direction.z.atan2(direction.x).to_degrees())
    }

    /// Draw the character through a render bridge at its current position,
    /// rotated to face its travel direction. Drawing continues while paused,
    /// at the frozen state.
    pub fn draw<W: WorldGraph, R: RenderBridge>(
        &self,
        graph: &W,
        angle: CameraAngle,
        bridge: &mut R,
    ) {
        let Some(position) = self.position(graph, angle) else {
            return;
        };
        bridge.push_matrix();
        bridge.translate(position);
        if let Some(facing) = self.facing_degrees(graph, angle) {
            bridge.rotate_y(facing);
        }
        bridge.draw_character(&self.joints);
        bridge.pop_matrix();
    }
}

//! The per-tick motion state machine.
//!
//! One [`Character::step`] call per fixed simulation tick: integrate the
//! current mode, evaluate its transitions, then hand the resulting state to
//! the pose solver. Transitions are evaluated at most once per tick, except
//! that a missing second edge is re-derived through a bounded retry, so a
//! tick always terminates even while the graph's answers are shifting.

use bevy::log::{debug, warn};
use bevy::prelude::*;

use crate::config::CharacterConfig;
use crate::math::{cos_deg, CameraAngle};
use crate::pose;
use crate::state::{Character, Mode};
use crate::world::{NodeKind, WorldGraph};

/// How many times a tick may re-derive a missing second edge before holding
/// position at the known node.
const MAX_EDGE_RETRIES: usize = 2;

impl Character {
    /// Advance the character by one fixed tick of duration `dt` seconds.
    ///
    /// Does nothing while paused; the frozen state keeps rendering and no
    /// catch-up happens on resume.
    pub fn step<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
        dt: f32,
    ) {
        if self.paused {
            return;
        }
        match self.mode {
            Mode::SpawnFall => self.step_spawn_fall(config, graph, angle, dt),
            Mode::FreeFall | Mode::Launch => self.step_airborne(config, graph, angle, dt),
            Mode::Walk | Mode::Run => self.step_grounded(config, graph, angle),
            // Reserved transitional states; no integration yet.
            Mode::Landing | Mode::StandingUp => {}
        }
        self.update_pose(graph, angle);
    }

    /// Respawn descent: straight down onto the target node's height.
    fn step_spawn_fall<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
        dt: f32,
    ) {
        let Some(mut position) = self.fall_position else {
            return;
        };
        self.speed -= config.gravity * dt;
        position.y += self.speed * dt;
        self.fall_position = Some(position);

        if position.y < self.target_height {
            if graph.kind(self.node) == NodeKind::Hole {
                // Convert in place so there is no visible snap between the
                // descent position and the node position.
                self.begin_free_fall(Some(position), config, graph, angle);
            } else {
                self.land(self.node, true, config, graph, angle);
            }
        }
    }

    /// Free fall and launch: semi-implicit Euler under gravity, scanning the
    /// traversed segment for a platform to land on.
    fn step_airborne<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
        dt: f32,
    ) {
        let Some(stored) = self.fall_position else {
            return;
        };
        let current = angle.apply(stored);

        if current.y < graph.lowest_level_height() - config.off_world_margin {
            // Off the stage entirely. A designed death, not an error.
            self.reset(config, graph, angle);
            return;
        }

        self.speed -= config.gravity * dt;
        let lateral = if self.mode == Mode::Launch {
            self.lateral_velocity
        } else {
            Vec2::ZERO
        };
        let next = Vec3::new(
            current.x + lateral.x * dt,
            current.y + self.speed * dt,
            current.z + lateral.y * dt,
        );

        // A launch only scans once it is descending; a free fall always does.
        let scan = self.mode == Mode::FreeFall || self.speed < 0.0;
        let hit = if scan {
            graph.segment_intersection(angle.project(current), angle.project(next), angle)
        } else {
            None
        };

        match hit {
            // Never land on a hole, or the character would oscillate through
            // the same hole forever.
            Some(platform) if graph.kind(platform) != NodeKind::Hole => {
                debug!("landing on {platform:?}");
                self.land(platform, true, config, graph, angle);
            }
            _ => self.fall_position = Some(angle.invert(next)),
        }
    }

    /// Walk or run along the current edge. Grounded motion is in per-tick
    /// units, matching the tuned speed tables.
    fn step_grounded<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
    ) {
        // The second edge can vanish when the camera angle shifts topology.
        // Re-derivation is bounded so one tick cannot spin on a graph whose
        // answers keep shifting under it.
        for _ in 0..MAX_EDGE_RETRIES {
            if self.next_node.is_some() {
                break;
            }
            let successor = graph.successor_of(self.node, angle, self.node);
            self.next_node = successor;
            // A hole or launcher with nowhere further to walk converts here;
            // a plain terminal node holds position until an edge appears.
            self.refresh_mode(config, graph, angle);
            if self.mode.is_airborne() {
                return;
            }
            if successor.is_none() {
                return;
            }
        }
        let Some(next) = self.next_node else {
            return;
        };
        // Transient misses mid camera rotation: skip the tick.
        let Some(from) = graph.position_at(self.node, angle) else {
            return;
        };
        let Some(to) = graph.position_at(next, angle) else {
            return;
        };

        self.stride_phase += self.speed * 2.0;
        self.cycle_phase += self.speed * 180.0;
        if self.cycle_phase > 360.0 {
            self.stride_phase -= 4.0;
            self.cycle_phase -= 360.0;
        }

        self.edge_length = from.distance(to);
        self.edge_progress -= self.stride_decrement();

        if self.edge_progress <= 0.0 {
            self.advance_edge(config, graph, angle);
        }
    }

    /// Per-tick decrement of `edge_progress`, eased around the two contact
    /// windows of the stride so the transition reads as acceleration and
    /// deceleration rather than uniform sliding.
    fn stride_decrement(&self) -> f32 {
        let base = self.speed / self.edge_length;
        if self.stride_phase > 0.5 && self.stride_phase <= 1.0 {
            (1.0 + cos_deg(90.0 * self.stride_phase - 22.5)) * base
        } else if self.stride_phase > 2.5 && self.stride_phase <= 3.0 {
            (1.0 + cos_deg(90.0 * self.stride_phase + 67.5)) * base
        } else {
            base
        }
    }

    /// Commit the node transition at the end of an edge: trigger the new
    /// node's goal, cache the completed edge's direction, shift the edge
    /// anchor forward, and re-derive the mode from the new node's kind.
    pub(crate) fn advance_edge<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
    ) {
        if let Some(next) = self.next_node {
            self.check_goal(next, graph, angle);
            // Cache the direction before the edge that defines it is gone;
            // a launcher at `next` will need it.
            self.travel_direction = self.edge_direction(graph, angle);
            let previous = self.node;
            self.node = next;
            self.next_node = graph.successor_of(next, angle, previous);
            self.refresh_mode(config, graph, angle);
        }
        self.edge_progress = 1.0;
    }

    /// Re-derive mode and speed from the current node's kind. A hole or a
    /// launcher with nowhere further to walk converts to the matching
    /// airborne mode; anything else returns an airborne character to its
    /// preferred gait.
    pub(crate) fn refresh_mode<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
    ) {
        match graph.kind(self.node) {
            NodeKind::Hole if self.next_node.is_none() => {
                debug!("falling into hole {:?}", self.node);
                self.begin_free_fall(None, config, graph, angle);
            }
            NodeKind::Launcher if self.next_node.is_none() => {
                debug!("launched from {:?}", self.node);
                self.begin_launch(None, None, config, graph, angle);
            }
            _ => {
                if self.mode.is_airborne() {
                    self.mode = if self.running { Mode::Run } else { Mode::Walk };
                    self.speed = config.speed_for(self.mode);
                }
            }
        }
    }

    /// Start falling from `from` (given in world space at the current camera
    /// angle), or from the current node's position.
    ///
    /// Existing vertical momentum is preserved; only a character at rest is
    /// seeded with the tuned fall-start speed.
    ///
    /// # Panics
    ///
    /// Panics if no fall origin can be resolved. That means the world graph
    /// lost a node it still hands out, which is a stage consistency bug, not
    /// a runtime condition to paper over.
    pub fn begin_free_fall<W: WorldGraph>(
        &mut self,
        from: Option<Vec3>,
        config: &CharacterConfig,
        graph: &W,
        angle: CameraAngle,
    ) {
        let origin = self.resolve_airborne_origin(from, graph, angle);
        self.fall_position = Some(angle.invert(origin));
        self.mode = Mode::FreeFall;
        if self.speed == 0.0 {
            self.speed = config.fall_start_speed;
        }
        pose::falling_entry(&mut self.joints);
    }

    /// Start a ballistic launch from `from` (world space at the current
    /// angle, defaulting to the current node) toward `direction` (defaulting
    /// to the cached travel direction, then the current edge).
    ///
    /// The vertical speed is always the tuned launch speed; the lateral
    /// velocity is the direction's normalized (x, z) component scaled by the
    /// derived lateral speed. With no resolvable direction the launch
    /// degrades to a plain fall.
    ///
    /// # Panics
    ///
    /// Panics if no launch origin can be resolved, as with
    /// [`begin_free_fall`](Self::begin_free_fall).
    pub fn begin_launch<W: WorldGraph>(
        &mut self,
        from: Option<Vec3>,
        direction: Option<Vec3>,
        config: &CharacterConfig,
        graph: &W,
        angle: CameraAngle,
    ) {
        let origin = self.resolve_airborne_origin(from, graph, angle);
        self.fall_position = Some(angle.invert(origin));

        let lateral = direction
            .or(self.travel_direction)
            .or_else(|| self.edge_direction(graph, angle))
            .map(|d| Vec2::new(d.x, d.z))
            .and_then(|d| {
                let length = d.length();
                (length > 0.0).then(|| d / length)
            });
        let Some(lateral) = lateral else {
            warn!("no travel direction at launcher {:?}; falling instead", self.node);
            self.mode = Mode::FreeFall;
            if self.speed == 0.0 {
                self.speed = config.fall_start_speed;
            }
            pose::falling_entry(&mut self.joints);
            return;
        };

        self.lateral_velocity = lateral * config.launch_lateral_speed();
        self.mode = Mode::Launch;
        self.speed = config.launch_speed();
        debug!(
            "launch velocity: ({}, {}, {})",
            self.lateral_velocity.x,
            self.speed,
            self.lateral_velocity.y
        );
        pose::falling_entry(&mut self.joints);
    }

    /// Start the respawn descent onto the current node.
    ///
    /// # Panics
    ///
    /// Panics if the node's position cannot be resolved; a stage that cannot
    /// place its own spawn is malformed.
    pub(crate) fn begin_spawn_fall<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &W,
        angle: CameraAngle,
    ) {
        let Some(target) = graph.position_at(self.node, angle) else {
            panic!(
                "cannot resolve the spawn position for {:?}; the world graph is inconsistent",
                self.node
            );
        };
        self.target_height = target.y;
        self.fall_position = Some(Vec3::new(
            target.x,
            target.y + config.spawn_drop_height,
            target.z,
        ));
        self.mode = Mode::SpawnFall;
        self.speed = config.spawn_fall_speed;
        pose::falling_entry(&mut self.joints);
    }

    fn resolve_airborne_origin<W: WorldGraph>(
        &self,
        from: Option<Vec3>,
        graph: &W,
        angle: CameraAngle,
    ) -> Vec3 {
        from.or_else(|| graph.position_at(self.node, angle))
            .unwrap_or_else(|| {
                panic!(
                    "cannot resolve the fall origin for {:?}; the world graph is inconsistent",
                    self.node
                )
            })
    }

    /// Recompute the joint set for the mode the tick ended in.
    fn update_pose<W: WorldGraph>(&mut self, graph: &W, angle: CameraAngle) {
        match self.mode {
            Mode::Walk | Mode::Run => {
                pose::locomotion_swing(&mut self.joints, self.cycle_phase);
                // The weight-bearing node is whichever end of the edge holds
                // more than half the progress fraction.
                let bearing = if self.edge_progress >= 0.5 {
                    Some(self.edge_progress)
                } else if self.next_node.is_some() {
                    Some(1.0 - self.edge_progress)
                } else {
                    None
                };
                if let Some(bearing) = bearing {
                    let direction = self.edge_direction(graph, angle);
                    pose::solve_leg_bend(&mut self.joints, bearing, direction);
                }
            }
            // Reserved identity poses.
            Mode::Landing | Mode::StandingUp => {}
            _ => pose::falling_sway(&mut self.joints, &mut self.sway_phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Joints;
    use crate::world::NodeId;

    fn walking_character(speed: f32, stride_phase: f32) -> Character {
        Character {
            mode: Mode::Walk,
            speed,
            lateral_velocity: Vec2::ZERO,
            fall_position: None,
            target_height: 0.0,
            node: NodeId(0),
            next_node: Some(NodeId(1)),
            edge_progress: 1.0,
            edge_length: 1.0,
            stride_phase,
            cycle_phase: 0.0,
            sway_phase: 0.0,
            spawn_node: NodeId(0),
            goals_reached: 0,
            travel_direction: None,
            running: false,
            paused: false,
            joints: Joints::default(),
        }
    }

    #[test]
    fn stride_decrement_eases_in_contact_windows() {
        let uniform = walking_character(0.07, 2.0).stride_decrement();
        assert_eq!(uniform, 0.07);

        // Both contact windows cover more ground than the uniform stride.
        let early = walking_character(0.07, 0.75).stride_decrement();
        assert!(early > uniform);
        let late = walking_character(0.07, 2.75).stride_decrement();
        assert!(late > uniform);
    }

    #[test]
    fn stride_decrement_scales_with_edge_length() {
        let mut character = walking_character(0.1, 2.0);
        character.edge_length = 4.0;
        assert_eq!(character.stride_decrement(), 0.025);
    }
}

//! Character state and lifecycle.
//!
//! [`Character`] owns the full data model of the simulated entity: the motion
//! mode, the kinematic fields for the mode, the edge anchor while on the
//! graph, the walk-cycle accumulators, the respawn checkpoint, and the joint
//! set the pose solver writes into. The per-tick integration lives in the
//! `motion` module; this module holds the data, the landing/respawn
//! lifecycle, and the small toggles.

use bevy::prelude::*;

use crate::config::CharacterConfig;
use crate::math::CameraAngle;
use crate::pose::Joints;
use crate::world::{NodeId, WorldGraph};

/// Motion mode of the character.
///
/// Exactly one of the two position representations is authoritative per mode:
/// the airborne modes own an absolute position, the grounded modes derive
/// their position from the current edge and the progress along it.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Initial or respawn descent onto the spawn node.
    SpawnFall,
    /// Falling under gravity, scanning for a platform to land on.
    FreeFall,
    /// Ballistic flight off a launcher: free fall plus constant lateral
    /// velocity.
    Launch,
    /// Walking along the current edge.
    Walk,
    /// Running along the current edge.
    Run,
    /// Transitional touchdown state. Reserved; currently poses as identity.
    Landing,
    /// Transitional recovery state. Reserved; currently poses as identity.
    StandingUp,
}

impl Mode {
    /// Whether position derives from the graph edge anchor.
    pub fn is_grounded(self) -> bool {
        matches!(self, Mode::Walk | Mode::Run | Mode::Landing | Mode::StandingUp)
    }

    /// Whether position derives from the absolute airborne position.
    pub fn is_airborne(self) -> bool {
        !self.is_grounded()
    }
}

/// The simulated character.
///
/// Constructed over a spawn node and immediately primed to descend onto it.
/// Advance it once per fixed tick with [`step`](Character::step); render it
/// with [`draw`](Character::draw) or by reading
/// [`position`](Character::position), [`facing_degrees`](Character::facing_degrees),
/// and [`joints`](Character::joints) directly.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
pub struct Character {
    pub(crate) mode: Mode,
    /// Vertical speed while airborne (units/s, negative down), longitudinal
    /// speed while grounded (edge-lengths/tick). The sign convention flips
    /// with the mode.
    pub(crate) speed: f32,
    /// Constant (x, z) flight velocity; only meaningful in [`Mode::Launch`].
    pub(crate) lateral_velocity: Vec2,
    /// Airborne position. Stored in unrotated space for free fall and launch,
    /// and in platform space for the spawn descent (which tracks its target
    /// node directly). `None` whenever the edge anchor is authoritative.
    pub(crate) fall_position: Option<Vec3>,
    /// Height of the spawn descent's target platform.
    pub(crate) target_height: f32,
    /// Node the current edge leaves from (or the landing target during the
    /// spawn descent).
    pub(crate) node: NodeId,
    /// Node the current edge arrives at, when one is resolvable.
    pub(crate) next_node: Option<NodeId>,
    /// Fraction of the edge still ahead: 1 at `node`, 0 at `next_node`.
    pub(crate) edge_progress: f32,
    /// Cached length of the current edge at the current camera angle.
    pub(crate) edge_length: f32,
    /// Monotonic walk-cycle accumulator selecting the eased stride windows.
    pub(crate) stride_phase: f32,
    /// Walk-cycle phase wrapping at 360, drives the periodic limb swing.
    pub(crate) cycle_phase: f32,
    /// Airborne sway phase, wrapping at 360.
    pub(crate) sway_phase: f32,
    /// Respawn checkpoint: the last goal triggered, or the initial spawn.
    pub(crate) spawn_node: NodeId,
    /// Total goals triggered. Never reset.
    pub(crate) goals_reached: u32,
    /// Direction of the last completed edge, kept because the edge itself is
    /// gone by the time a launcher needs it.
    pub(crate) travel_direction: Option<Vec3>,
    /// Preferred grounded gait, remembered across landings.
    pub(crate) running: bool,
    pub(crate) paused: bool,
    pub(crate) joints: Joints,
}

impl Character {
    /// Create a character that will descend onto `spawn`.
    ///
    /// The graph is taken mutably because arriving on a node triggers its
    /// goal, and the spawn node may carry one.
    ///
    /// # Panics
    ///
    /// Panics if the graph cannot resolve the spawn node's position; a stage
    /// that cannot place its own spawn is malformed.
    pub fn new<W: WorldGraph>(
        spawn: NodeId,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
    ) -> Self {
        let mut character = Self {
            mode: Mode::SpawnFall,
            speed: 0.0,
            lateral_velocity: Vec2::ZERO,
            fall_position: None,
            target_height: 0.0,
            node: spawn,
            next_node: None,
            edge_progress: 1.0,
            edge_length: 1.0,
            stride_phase: 0.0,
            cycle_phase: 0.0,
            sway_phase: 0.0,
            spawn_node: spawn,
            goals_reached: 0,
            travel_direction: None,
            running: false,
            paused: false,
            joints: Joints::default(),
        };
        character.respawn_at(spawn, config, graph, angle);
        character
    }

    /// Respawn at the checkpoint node, keeping `goals_reached` and the
    /// checkpoint itself. Safe to call from inside the airborne integration
    /// step; everything it touches is re-read afterwards.
    pub fn reset<W: WorldGraph>(
        &mut self,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
    ) {
        self.respawn_at(self.spawn_node, config, graph, angle);
    }

    /// Reinitialize over `node` and start the spawn descent. Goal progress
    /// survives; every kinematic field is rebuilt.
    pub(crate) fn respawn_at<W: WorldGraph>(
        &mut self,
        node: NodeId,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
    ) {
        self.spawn_node = node;
        self.running = false;
        self.paused = false;
        // Prime the edge anchor on the target without refreshing the mode:
        // the character has to land there first, not start walking.
        self.land(node, false, config, graph, angle);
        self.begin_spawn_fall(config, graph, angle);
    }

    /// Land on `node`: trigger its goal, anchor the edge there, and reset the
    /// walk cycle. `refresh` selects whether the mode is re-derived from the
    /// node's kind (skipped while priming a spawn descent).
    pub(crate) fn land<W: WorldGraph>(
        &mut self,
        node: NodeId,
        refresh: bool,
        config: &CharacterConfig,
        graph: &mut W,
        angle: CameraAngle,
    ) {
        self.check_goal(node, graph, angle);
        self.node = node;
        self.next_node = graph.successor_of(node, angle, node);
        self.fall_position = None;
        self.lateral_velocity = Vec2::ZERO;
        self.edge_progress = 1.0;
        self.edge_length = 1.0;
        self.stride_phase = 0.0;
        self.cycle_phase = 0.0;
        self.joints.reset();
        if refresh {
            self.refresh_mode(config, graph, angle);
        }
    }

    /// If `node` carries a goal: make it the respawn checkpoint, toggle it
    /// off, and count it. Called exactly once per arrival, so an immediate
    /// revisit finds the flag already toggled and does not double count.
    pub(crate) fn check_goal<W: WorldGraph>(
        &mut self,
        node: NodeId,
        graph: &mut W,
        angle: CameraAngle,
    ) {
        if graph.is_goal(node, angle) {
            self.spawn_node = node;
            graph.toggle_goal(node, angle);
            self.goals_reached += 1;
        }
    }

    /// Direction of the current edge at the current camera angle, if both
    /// endpoint positions resolve.
    pub(crate) fn edge_direction<W: WorldGraph>(
        &self,
        graph: &W,
        angle: CameraAngle,
    ) -> Option<Vec3> {
        let from = graph.position_at(self.node, angle)?;
        let to = graph.position_at(self.next_node?, angle)?;
        Some(to - from)
    }

    /// Switch from walking to running.
    pub fn start_run(&mut self, config: &CharacterConfig) {
        if self.mode == Mode::Walk {
            self.running = true;
            self.mode = Mode::Run;
            self.speed = config.speed_for(self.mode);
        }
    }

    /// Switch from running to walking.
    pub fn start_walk(&mut self, config: &CharacterConfig) {
        if self.mode == Mode::Run {
            self.running = false;
            self.mode = Mode::Walk;
            self.speed = config.speed_for(self.mode);
        }
    }

    /// Flip between walking and running.
    pub fn toggle_run(&mut self, config: &CharacterConfig) {
        if self.mode == Mode::Run {
            self.start_walk(config);
        } else {
            self.start_run(config);
        }
    }

    /// Freeze or resume the simulation. A paused character still renders at
    /// its frozen state; unpausing resumes with no catch-up.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Current motion mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current mode-dependent speed (see the `speed` field docs).
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Total goals triggered; survives resets.
    pub fn goals_reached(&self) -> u32 {
        self.goals_reached
    }

    /// The respawn checkpoint node.
    pub fn spawn_node(&self) -> NodeId {
        self.spawn_node
    }

    /// Node the current edge leaves from.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Node the current edge arrives at, if resolved.
    pub fn next_node(&self) -> Option<NodeId> {
        self.next_node
    }

    /// Fraction of the current edge still ahead (1 = at `node`).
    pub fn edge_progress(&self) -> f32 {
        self.edge_progress
    }

    /// The airborne position in its storage space, when airborne motion is
    /// authoritative. `None` whenever the edge anchor is.
    pub fn airborne_position(&self) -> Option<Vec3> {
        self.fall_position
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Joint angles computed by the pose solver, for rendering.
    pub fn joints(&self) -> &Joints {
        &self.joints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walking_character() -> Character {
        Character {
            mode: Mode::Walk,
            speed: 0.07,
            lateral_velocity: Vec2::ZERO,
            fall_position: None,
            target_height: 0.0,
            node: NodeId(0),
            next_node: Some(NodeId(1)),
            edge_progress: 1.0,
            edge_length: 1.0,
            stride_phase: 0.0,
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
    fn gait_toggles_only_apply_in_matching_mode() {
        let config = CharacterConfig::default();
        let mut character = walking_character();

        character.start_walk(&config);
        assert_eq!(character.mode(), Mode::Walk);

        character.start_run(&config);
        assert_eq!(character.mode(), Mode::Run);
        assert_eq!(character.speed(), config.run_speed);
        assert!(character.is_running());

        character.toggle_run(&config);
        assert_eq!(character.mode(), Mode::Walk);
        assert_eq!(character.speed(), config.walk_speed);
    }

    #[test]
    fn gait_toggle_is_inert_while_airborne() {
        let config = CharacterConfig::default();
        let mut character = walking_character();
        character.mode = Mode::FreeFall;
        character.speed = -0.5;

        character.start_run(&config);
        assert_eq!(character.mode(), Mode::FreeFall);
        assert_eq!(character.speed(), -0.5);
    }

    #[test]
    fn pause_toggle_flips() {
        let mut character = walking_character();
        assert!(!character.is_paused());
        character.toggle_pause();
        assert!(character.is_paused());
        character.toggle_pause();
        assert!(!character.is_paused());
    }

    #[test]
    fn mode_classification() {
        assert!(Mode::Walk.is_grounded());
        assert!(Mode::Landing.is_grounded());
        assert!(Mode::FreeFall.is_airborne());
        assert!(Mode::SpawnFall.is_airborne());
        assert!(Mode::Launch.is_airborne());
    }
}

//! # `grid_character_controller`
//!
//! Character locomotion for rotating grid-graph puzzle worlds.
//!
//! This crate provides the character's motion state machine and procedural
//! pose solver:
//! - A discrete mode machine (spawn descent, free fall, ballistic launch,
//!   walking, running) with transitions driven by world-graph queries
//! - Kinematic integration under a fixed tick: gravity, projectile motion,
//!   and eased edge traversal
//! - A procedural pose solver with a two-bone IK leg solve and
//!   periodic-function limb motion
//! - Camera-angle math converting between unrotated, world, and
//!   screen-projected space
//!
//! ## Architecture
//!
//! The world itself stays outside the crate. Characters see the stage only
//! through the [`WorldGraph`](world::WorldGraph) trait (platform positions,
//! angle-dependent adjacency, goal toggles, segment intersection), and
//! rendering only through the [`RenderBridge`](render::RenderBridge) trait
//! (matrix stack plus a body-mesh primitive). Both are abstracted the same
//! way the physics engine is abstracted in a backend-agnostic character
//! controller: implement the trait, plug it in.
//!
//! Each simulation tick the state machine advances position, velocity, and
//! mode; the pose solver recomputes the joint set for the new mode; and the
//! caller draws at the resulting position facing the travel direction.
//!
//! ## Usage
//!
//! Implement `WorldGraph` for your stage, insert it as a resource, and add
//! the plugin:
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use grid_character_controller::prelude::*;
//!
//! App::new()
//!     .insert_resource(my_stage)
//!     .add_plugins(GridCharacterPlugin::<MyStage>::default())
//!     .run();
//! ```
//!
//! Characters can also be driven without an `App` by calling
//! [`Character::step`](state::Character::step) directly with a graph, a
//! camera angle, and the fixed tick duration.

use std::marker::PhantomData;

use bevy::prelude::*;

pub mod config;
pub mod math;
pub mod motion;
pub mod pose;
pub mod render;
pub mod state;
pub mod systems;
pub mod world;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::CharacterConfig;
    pub use crate::math::CameraAngle;
    pub use crate::pose::Joints;
    pub use crate::render::RenderBridge;
    pub use crate::state::{Character, Mode};
    pub use crate::systems::advance_characters;
    pub use crate::world::{NodeId, NodeKind, WorldGraph};
    pub use crate::GridCharacterPlugin;
}

use crate::math::CameraAngle;
use crate::systems::advance_characters;
use crate::world::WorldGraph;

/// Plugin scheduling the character simulation.
///
/// Generic over the world graph adapter `W`, which must be inserted as a
/// resource by the consumer before the first fixed tick. Initializes the
/// [`CameraAngle`] and [`config::CharacterConfig`] resources with their
/// defaults if absent, and steps every character in `FixedUpdate` so physics
/// stays deterministic regardless of render framerate.
pub struct GridCharacterPlugin<W: WorldGraph + Resource> {
    _marker: PhantomData<W>,
}

impl<W: WorldGraph + Resource> Default for GridCharacterPlugin<W> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<W: WorldGraph + Resource> Plugin for GridCharacterPlugin<W> {
    fn build(&self, app: &mut App) {
        app.register_type::<CameraAngle>()
            .register_type::<config::CharacterConfig>()
            .register_type::<state::Character>()
            .register_type::<state::Mode>()
            .register_type::<pose::Joints>()
            .register_type::<world::NodeId>()
            .register_type::<world::NodeKind>()
            .init_resource::<CameraAngle>()
            .init_resource::<config::CharacterConfig>()
            .add_systems(FixedUpdate, advance_characters::<W>);
    }
}

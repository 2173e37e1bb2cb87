//! ECS integration.
//!
//! A single exclusive system advances every character once per fixed tick.
//! The world graph is a resource chosen by the consumer, which is why the
//! system (and the plugin that schedules it) is generic over the adapter
//! type rather than over a concrete stage.

use bevy::prelude::*;

use crate::config::CharacterConfig;
use crate::math::CameraAngle;
use crate::state::Character;
use crate::world::WorldGraph;

/// Step every [`Character`] by one fixed tick.
///
/// Reads the tick duration from `Time<Fixed>` (falling back to 60 Hz when
/// the resource is absent or not yet advanced, which keeps headless test
/// worlds deterministic), the camera angle and config from their resources,
/// and the world graph from the `W` resource.
pub fn advance_characters<W: WorldGraph + Resource>(world: &mut World) {
    let dt = world
        .get_resource::<Time<Fixed>>()
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0);
    let angle = world
        .get_resource::<CameraAngle>()
        .copied()
        .unwrap_or_default();
    let config = world
        .get_resource::<CharacterConfig>()
        .copied()
        .unwrap_or_default();

    world.resource_scope(|world, mut graph: Mut<W>| {
        let mut characters = world.query::<&mut Character>();
        for mut character in characters.iter_mut(world) {
            character.step(&config, &mut *graph, angle, dt);
        }
    });
}

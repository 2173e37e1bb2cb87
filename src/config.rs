//! Character tuning parameters.
//!
//! All tuned constants for the locomotion state machine live here as a
//! resource, so the motion code carries no hardcoded magic numbers. Walking
//! and running advance the edge in per-tick units, while the fall constants
//! are in units per second against the fixed tick duration.

use bevy::prelude::*;

use crate::state::Mode;

/// Tuning parameters for a character.
///
/// The launch kinematics are derived from the flight profile rather than
/// stored directly: launching from and landing on the same plane rises
/// `launch_rise` units and travels `launch_reach` units laterally, which
/// fixes both the vertical launch speed and the lateral speed once gravity is
/// chosen (see [`launch_speed`](Self::launch_speed)).
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct CharacterConfig {
    // === Grounded motion ===
    /// Edge-lengths traversed per tick while walking.
    pub walk_speed: f32,
    /// Edge-lengths traversed per tick while running.
    pub run_speed: f32,

    // === Airborne motion ===
    /// Downward acceleration, units per second squared (stored positive).
    pub gravity: f32,
    /// Initial vertical speed when a fall starts from rest, units per second.
    /// Negative is downward. A character that is already moving vertically
    /// keeps its momentum instead.
    pub fall_start_speed: f32,
    /// Initial vertical speed for the respawn descent.
    pub spawn_fall_speed: f32,
    /// How far above the spawn node the respawn descent begins.
    pub spawn_drop_height: f32,
    /// How far below the lowest platform the character may fall before the
    /// off-world reset triggers.
    pub off_world_margin: f32,

    // === Launch kinematics ===
    /// Peak height gained by a launch that lands on the takeoff plane.
    pub launch_rise: f32,
    /// Lateral distance covered by a launch that lands on the takeoff plane.
    pub launch_reach: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            // Grounded motion
            walk_speed: 0.07,
            run_speed: 0.25,
            // Airborne motion
            gravity: 15.0,
            fall_start_speed: -0.5,
            spawn_fall_speed: 0.0,
            spawn_drop_height: 10.0,
            off_world_margin: 5.0,
            // Launch kinematics: 7 up, 4 across on a same-plane launch
            launch_rise: 7.0,
            launch_reach: 4.0,
        }
    }
}

impl CharacterConfig {
    /// Vertical launch speed, units per second.
    ///
    /// At the peak `v^2 = 2 * rise * g`, so `v = sqrt(2 * rise * g)`.
    /// With the default rise of 7 and gravity of 15 this is ~14.4913767.
    #[inline]
    pub fn launch_speed(&self) -> f32 {
        (2.0 * self.launch_rise * self.gravity).sqrt()
    }

    /// Initial lateral launch speed, units per second.
    ///
    /// Flight time for a same-plane launch is `2v/g`, and covering
    /// `launch_reach` in that time gives `v_lat = v * reach / (4 * rise)`;
    /// the default tuning reduces this to `v / 7`.
    #[inline]
    pub fn launch_lateral_speed(&self) -> f32 {
        self.launch_speed() * self.launch_reach / (4.0 * self.launch_rise)
    }

    /// Grounded speed for a locomotion mode. Zero for every other mode, whose
    /// vertical speed is seeded by the airborne entry points instead.
    pub fn speed_for(&self, mode: Mode) -> f32 {
        match mode {
            Mode::Walk => self.walk_speed,
            Mode::Run => self.run_speed,
            _ => 0.0,
        }
    }

    /// Builder: set the walking speed.
    pub fn with_walk_speed(mut self, speed: f32) -> Self {
        self.walk_speed = speed;
        self
    }

    /// Builder: set the running speed.
    pub fn with_run_speed(mut self, speed: f32) -> Self {
        self.run_speed = speed;
        self
    }

    /// Builder: set gravity (positive magnitude).
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Builder: set the fall-start speed.
    pub fn with_fall_start_speed(mut self, speed: f32) -> Self {
        self.fall_start_speed = speed;
        self
    }

    /// Builder: set the respawn drop height.
    pub fn with_spawn_drop_height(mut self, height: f32) -> Self {
        self.spawn_drop_height = height;
        self
    }

    /// Builder: set the off-world margin.
    pub fn with_off_world_margin(mut self, margin: f32) -> Self {
        self.off_world_margin = margin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_launch_speed_matches_tuned_constant() {
        let config = CharacterConfig::default();
        assert_relative_eq!(config.launch_speed(), 14.4913767, epsilon = 1e-4);
        assert_relative_eq!(
            config.launch_lateral_speed(),
            config.launch_speed() / 7.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn speed_for_locomotion_modes() {
        let config = CharacterConfig::default();
        assert_eq!(config.speed_for(Mode::Walk), config.walk_speed);
        assert_eq!(config.speed_for(Mode::Run), config.run_speed);
        assert_eq!(config.speed_for(Mode::FreeFall), 0.0);
    }

    #[test]
    fn builders_override_defaults() {
        let config = CharacterConfig::default()
            .with_walk_speed(0.5)
            .with_gravity(10.0)
            .with_off_world_margin(2.0);
        assert_eq!(config.walk_speed, 0.5);
        assert_eq!(config.gravity, 10.0);
        assert_eq!(config.off_world_margin, 2.0);
        assert_relative_eq!(config.launch_speed(), (140.0_f32).sqrt(), epsilon = 1e-5);
    }
}

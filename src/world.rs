//! World graph adapter.
//!
//! The stage is a directed graph of platforms ("nodes") whose positions and
//! adjacency depend on the current camera angle. The character only ever talks
//! to it through the [`WorldGraph`] trait: the graph implementation, its
//! intersection service, and the stage loader all live outside this crate.

use bevy::prelude::*;

use crate::math::CameraAngle;

/// Opaque identifier of a platform in the world graph.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// What a platform does to a character arriving on it.
///
/// A closed set queried through the adapter; the goal flag is orthogonal and
/// has its own pair of methods on [`WorldGraph`].
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An ordinary walkable platform.
    Plain,
    /// A platform the character falls through instead of standing on.
    Hole,
    /// A platform that throws the character along its travel direction.
    Launcher,
}

/// Interface to the platform graph and its geometry queries.
///
/// All queries are synchronous, bounded-cost lookups. Position and successor
/// queries may return `None` transiently (for example mid camera rotation);
/// the character treats that as "skip this tick", never as an error.
/// `toggle_goal` is the one mutation the character performs, and it is called
/// exactly once per arrival at a node.
pub trait WorldGraph: Send + Sync + 'static {
    /// Position of a node at the given camera angle, if currently resolvable.
    fn position_at(&self, node: NodeId, angle: CameraAngle) -> Option<Vec3>;

    /// The node walked to next when leaving `node`, having arrived from
    /// `reference`. Adjacency is angle-dependent: the perspective trick can
    /// create or destroy edges as the camera turns.
    fn successor_of(&self, node: NodeId, angle: CameraAngle, reference: NodeId) -> Option<NodeId>;

    /// Capability kind of the node.
    fn kind(&self, node: NodeId) -> NodeKind;

    /// Whether the node currently carries an untriggered goal.
    fn is_goal(&self, node: NodeId, angle: CameraAngle) -> bool;

    /// Flip the node's goal flag.
    fn toggle_goal(&mut self, node: NodeId, angle: CameraAngle);

    /// Find a platform crossed by the segment `a -> b`, both given in
    /// screen-projected space. Used for fall and launch landing detection.
    fn segment_intersection(&self, a: Vec3, b: Vec3, angle: CameraAngle) -> Option<NodeId>;

    /// Height of the lowest platform in the stage. Falling a fixed margin
    /// below this is the designed off-world "death" condition.
    fn lowest_level_height(&self) -> f32;
}

//! Steering behaviors for agents moving on a 2D plane.
//!
//! Every behavior turns a [`TargetData`] and the current [`Agent`] state into a
//! [`SteeringOutput`]. Angles are radians throughout, counter-clockwise from +X.
//! The [`SteeringPlugin`] hosts behaviors on bevy entities.

pub mod config;
pub mod debug;
pub mod math;
pub mod movement;

pub mod prelude {
    pub use crate::config::{
        ArriveConfig, ConfigError, FaceConfig, PredictionConfig, SteeringConfig, WanderConfig,
    };
    pub use crate::debug::{DebugDraw, NullDraw, SteeringDebugPlugin};
    pub use crate::movement::behaviors::{
        Arrive, Evade, Face, Flee, Pursuit, Seek, TargetPredictor, Wander,
    };
    pub use crate::movement::steering::{Agent, SteeringBehavior, SteeringOutput, TargetData};
    pub use crate::movement::{
        PhysicsParams, Steering, SteeringAgent, SteeringBundle, SteeringPlugin, SteeringSet,
        SteeringTargetSource,
    };
}

pub use movement::steering::{Agent, SteeringBehavior, SteeringOutput, TargetData};
pub use movement::SteeringPlugin;

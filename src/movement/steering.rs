use bevy::prelude::*;

use crate::debug::DebugDraw;

/// What a behavior steers towards or away from.
/// The caller builds a fresh one every frame; behaviors keep a copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct TargetData {
    pub position: Vec2,
    pub linear_velocity: Vec2,
}

impl TargetData {
    pub fn new(position: Vec2, linear_velocity: Vec2) -> Self {
        Self {
            position,
            linear_velocity,
        }
    }
}

impl From<Vec2> for TargetData {
    fn from(position: Vec2) -> Self {
        Self {
            position,
            linear_velocity: Vec2::ZERO,
        }
    }
}

/// The command produced by a behavior for a single frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Reflect)]
pub struct SteeringOutput {
    /// Desired direction of travel. Behaviors return a unit vector or zero; the host
    /// scales it by the agent's max linear speed.
    pub linear_velocity: Vec2,
    /// Desired angular velocity in radians.
    pub angular_velocity: f32,
}

impl SteeringOutput {
    pub fn linear(linear_velocity: Vec2) -> Self {
        Self {
            linear_velocity,
            angular_velocity: 0.0,
        }
    }

    pub fn angular(angular_velocity: f32) -> Self {
        Self {
            linear_velocity: Vec2::ZERO,
            angular_velocity,
        }
    }
}

/// Kinematic state a host agent exposes to the behaviors.
///
/// Rotation is in radians, counter-clockwise from +X.
pub trait Agent {
    fn position(&self) -> Vec2;
    fn rotation(&self) -> f32;
    fn linear_velocity(&self) -> Vec2;
    fn max_linear_speed(&self) -> f32;
    /// Only `Arrive` calls this, to throttle the agent near its target.
    fn set_max_linear_speed(&mut self, speed: f32);
    fn max_angular_speed(&self) -> f32;
}

/// Common contract for all steering behaviors.
///
/// Implementations never fail: degenerate geometry results in a zero output for that frame.
/// Stateful behaviors must not be shared between agents.
pub trait SteeringBehavior: Send + Sync {
    /// Replaces the stored target.
    fn set_target(&mut self, target: TargetData);

    fn target(&self) -> TargetData;

    fn calculate_steering(&mut self, delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput;

    /// Draws the state of the last computation. Does nothing unless overridden.
    fn debug_draw(&self, _agent: &dyn Agent, _draw: &mut dyn DebugDraw) {}

    fn name(&self) -> &'static str;
}

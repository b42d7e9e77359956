use bevy::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::steering::{Agent, SteeringBehavior, SteeringOutput, TargetData};
use crate::{
    config::{ArriveConfig, FaceConfig, PredictionConfig, WanderConfig},
    debug::{DebugDraw, DEBUG_LINE_LENGTH},
    math::{direction, heading, lerp, rng_f32, wrap_angle, EPSILON},
};

/// Delta times below this produce no velocity sample.
const MIN_DELTA_TIME: f32 = 1e-4;
/// Agents slower than this get no lookahead.
const MIN_AGENT_SPEED: f32 = 1.0;

/// Seeks the specified target moving directly towards it.
#[derive(Debug, Default, Clone)]
pub struct Seek {
    target: TargetData,
}

impl Seek {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit vector from `position` towards `target`, zero if they coincide.
    pub fn steer(position: Vec2, target: Vec2) -> Vec2 {
        direction(position, target)
    }
}

impl SteeringBehavior for Seek {
    fn set_target(&mut self, target: TargetData) {
        self.target = target;
    }

    fn target(&self) -> TargetData {
        self.target
    }

    fn calculate_steering(&mut self, _delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput {
        SteeringOutput::linear(Seek::steer(agent.position(), self.target.position))
    }

    fn debug_draw(&self, agent: &dyn Agent, draw: &mut dyn DebugDraw) {
        let position = agent.position();
        let steering = Seek::steer(position, self.target.position);

        draw.line(position, self.target.position, Color::srgb(0.3, 0.3, 0.3));
        draw.line(
            position,
            position + steering * DEBUG_LINE_LENGTH,
            Color::srgb(0.2, 1.0, 0.2),
        );
        draw.point(self.target.position, Color::srgb(1.0, 0.2, 0.2));
    }

    fn name(&self) -> &'static str {
        "Seek"
    }
}

/// Flees from the specified target moving away from it.
/// Works the same way as `Seek` but the result vector is inverted.
#[derive(Debug, Default, Clone)]
pub struct Flee {
    target: TargetData,
}

impl Flee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steer(position: Vec2, target: Vec2) -> Vec2 {
        -Seek::steer(position, target)
    }
}

impl SteeringBehavior for Flee {
    fn set_target(&mut self, target: TargetData) {
        self.target = target;
    }

    fn target(&self) -> TargetData {
        self.target
    }

    fn calculate_steering(&mut self, _delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput {
        SteeringOutput::linear(Flee::steer(agent.position(), self.target.position))
    }

    fn debug_draw(&self, agent: &dyn Agent, draw: &mut dyn DebugDraw) {
        let position = agent.position();
        let steering = Flee::steer(position, self.target.position);

        draw.line(position, self.target.position, Color::srgb(0.3, 0.3, 0.3));
        draw.line(
            position,
            position + steering * DEBUG_LINE_LENGTH,
            Color::srgb(1.0, 0.6, 0.1),
        );
        draw.point(self.target.position, Color::srgb(1.0, 0.2, 0.2));
    }

    fn name(&self) -> &'static str {
        "Flee"
    }
}

/// Moves towards the target and throttles the agent's max linear speed on the way in.
///
/// Inside `target_radius` the agent is stopped, between the two radii its speed cap is
/// scaled down linearly, and outside `slow_radius` the cap captured on the first call is
/// restored. This is the only behavior that writes to the agent.
#[derive(Debug, Clone)]
pub struct Arrive {
    target: TargetData,
    pub slow_radius: f32,
    pub target_radius: f32,
    original_max_speed: Option<f32>,
}

impl Default for Arrive {
    fn default() -> Self {
        Self::from_config(&ArriveConfig::default())
    }
}

impl Arrive {
    pub fn new(slow_radius: f32, target_radius: f32) -> Self {
        Self {
            target: TargetData::default(),
            slow_radius,
            target_radius,
            original_max_speed: None,
        }
    }

    pub fn from_config(config: &ArriveConfig) -> Self {
        Self::new(config.slow_radius, config.target_radius)
    }

    /// The speed cap captured on the first call, if any.
    pub fn original_max_speed(&self) -> Option<f32> {
        self.original_max_speed
    }

    /// Forgets the captured speed cap so the next call captures it again.
    pub fn reset(&mut self) {
        self.original_max_speed = None;
    }

    /// Speed cap for an agent `distance` away from the target.
    pub fn throttled_speed(&self, distance: f32, original_max_speed: f32) -> f32 {
        if distance < self.target_radius {
            0.0
        } else if distance < self.slow_radius {
            let t = (distance - self.target_radius) / (self.slow_radius - self.target_radius);
            lerp(0.0, original_max_speed, t)
        } else {
            original_max_speed
        }
    }
}

impl SteeringBehavior for Arrive {
    fn set_target(&mut self, target: TargetData) {
        self.target = target;
    }

    fn target(&self) -> TargetData {
        self.target
    }

    fn calculate_steering(&mut self, _delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput {
        let original_max_speed = match self.original_max_speed {
            Some(speed) => speed,
            None => {
                let speed = agent.max_linear_speed();
                debug!("Arrive captured original max speed {}", speed);
                self.original_max_speed = Some(speed);
                speed
            }
        };

        let position = agent.position();
        let distance = position.distance(self.target.position);
        agent.set_max_linear_speed(self.throttled_speed(distance, original_max_speed));

        SteeringOutput::linear(Seek::steer(position, self.target.position))
    }

    fn debug_draw(&self, agent: &dyn Agent, draw: &mut dyn DebugDraw) {
        draw.circle(
            self.target.position,
            self.slow_radius,
            Color::srgb(0.2, 0.4, 1.0),
        );
        draw.circle(
            self.target.position,
            self.target_radius,
            Color::srgb(1.0, 0.2, 0.2),
        );
        draw.line(
            agent.position(),
            self.target.position,
            Color::srgb(0.2, 1.0, 0.2),
        );
    }

    fn name(&self) -> &'static str {
        "Arrive"
    }
}

/// Turns the agent towards the target through its angular velocity.
#[derive(Debug, Clone)]
pub struct Face {
    target: TargetData,
    /// Heading errors within this angle produce no rotation.
    pub angle_threshold: f32,
}

impl Default for Face {
    fn default() -> Self {
        Self::from_config(&FaceConfig::default())
    }
}

impl Face {
    pub fn new(angle_threshold: f32) -> Self {
        Self {
            target: TargetData::default(),
            angle_threshold,
        }
    }

    pub fn from_config(config: &FaceConfig) -> Self {
        Self::new(config.angle_threshold)
    }
}

impl SteeringBehavior for Face {
    fn set_target(&mut self, target: TargetData) {
        self.target = target;
    }

    fn target(&self) -> TargetData {
        self.target
    }

    fn calculate_steering(&mut self, _delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput {
        let to_target = self.target.position - agent.position();
        if to_target.length() < EPSILON {
            return SteeringOutput::default();
        }

        let desired = to_target.y.atan2(to_target.x);
        let difference = wrap_angle(desired - agent.rotation());
        if difference.abs() <= self.angle_threshold {
            return SteeringOutput::default();
        }

        let max = agent.max_angular_speed().max(0.0);
        SteeringOutput::angular(difference.clamp(-max, max))
    }

    fn debug_draw(&self, agent: &dyn Agent, draw: &mut dyn DebugDraw) {
        let position = agent.position();

        draw.line(
            position,
            position + heading(agent.rotation()) * DEBUG_LINE_LENGTH,
            Color::srgb(0.2, 1.0, 0.2),
        );
        draw.line(position, self.target.position, Color::srgb(0.3, 0.3, 0.3));
    }

    fn name(&self) -> &'static str {
        "Face"
    }
}

/// Estimates a target's velocity from its observed positions and extrapolates where it
/// is heading. Shared by `Pursuit` and `Evade`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPredictor {
    config: PredictionConfig,
    last_target_position: Option<Vec2>,
    smoothed_velocity: Vec2,
}

impl TargetPredictor {
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            config,
            last_target_position: None,
            smoothed_velocity: Vec2::ZERO,
        }
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    pub fn last_target_position(&self) -> Option<Vec2> {
        self.last_target_position
    }

    pub fn smoothed_velocity(&self) -> Vec2 {
        self.smoothed_velocity
    }

    pub fn reset(&mut self) {
        self.last_target_position = None;
        self.smoothed_velocity = Vec2::ZERO;
    }

    /// Feeds a new target position into the velocity estimate.
    /// Returns `false` for the very first sample, when nothing can be predicted yet.
    pub fn observe(&mut self, target_position: Vec2, delta_time: f32) -> bool {
        let Some(last) = self.last_target_position.replace(target_position) else {
            trace!("Predictor initialized at {}", target_position);
            return false;
        };

        let sample = if delta_time < MIN_DELTA_TIME {
            Vec2::ZERO
        } else {
            (target_position - last) / delta_time
        };

        if sample.length() > self.config.noise_threshold {
            let t = (self.config.smoothing_rate * delta_time).min(1.0);
            self.smoothed_velocity = self.smoothed_velocity.lerp(sample, t);
        } else {
            self.smoothed_velocity *= self.config.decay;
        }

        true
    }

    /// Seconds to look ahead for an agent `distance` away moving at `agent_max_speed`.
    pub fn lookahead(&self, distance: f32, agent_max_speed: f32) -> f32 {
        if agent_max_speed <= MIN_AGENT_SPEED {
            return 0.0;
        }

        (distance / agent_max_speed).clamp(0.0, self.config.max_lookahead)
    }

    pub fn predict(&self, target_position: Vec2, agent_position: Vec2, agent_max_speed: f32) -> Vec2 {
        let distance = agent_position.distance(target_position);
        target_position + self.smoothed_velocity * self.lookahead(distance, agent_max_speed)
    }
}

/// Moves towards future position of the target, predicting it.
#[derive(Debug, Clone)]
pub struct Pursuit {
    target: TargetData,
    predictor: TargetPredictor,
    predicted_position: Option<Vec2>,
}

impl Default for Pursuit {
    fn default() -> Self {
        Self::from_config(&PredictionConfig::pursuit())
    }
}

impl Pursuit {
    pub fn from_config(config: &PredictionConfig) -> Self {
        Self {
            target: TargetData::default(),
            predictor: TargetPredictor::new(*config),
            predicted_position: None,
        }
    }

    pub fn predictor(&self) -> &TargetPredictor {
        &self.predictor
    }

    /// Point sought during the last call, `None` until the second call.
    pub fn predicted_position(&self) -> Option<Vec2> {
        self.predicted_position
    }

    pub fn reset(&mut self) {
        self.predictor.reset();
        self.predicted_position = None;
    }
}

impl SteeringBehavior for Pursuit {
    fn set_target(&mut self, target: TargetData) {
        self.target = target;
    }

    fn target(&self) -> TargetData {
        self.target
    }

    fn calculate_steering(&mut self, delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput {
        if !self.predictor.observe(self.target.position, delta_time) {
            self.predicted_position = None;
            return SteeringOutput::default();
        }

        let position = agent.position();
        let predicted =
            self.predictor
                .predict(self.target.position, position, agent.max_linear_speed());
        self.predicted_position = Some(predicted);

        SteeringOutput::linear(Seek::steer(position, predicted))
    }

    fn debug_draw(&self, agent: &dyn Agent, draw: &mut dyn DebugDraw) {
        draw_prediction(
            agent,
            self.target.position,
            self.predicted_position,
            Seek::steer,
            draw,
        );
    }

    fn name(&self) -> &'static str {
        "Pursuit"
    }
}

/// Moves away from the target with prediction of the target's future position.
#[derive(Debug, Clone)]
pub struct Evade {
    target: TargetData,
    predictor: TargetPredictor,
    predicted_position: Option<Vec2>,
}

impl Default for Evade {
    fn default() -> Self {
        Self::from_config(&PredictionConfig::evade())
    }
}

impl Evade {
    pub fn from_config(config: &PredictionConfig) -> Self {
        Self {
            target: TargetData::default(),
            predictor: TargetPredictor::new(*config),
            predicted_position: None,
        }
    }

    pub fn predictor(&self) -> &TargetPredictor {
        &self.predictor
    }

    /// Point fled from during the last call, `None` until the second call.
    pub fn predicted_position(&self) -> Option<Vec2> {
        self.predicted_position
    }

    pub fn reset(&mut self) {
        self.predictor.reset();
        self.predicted_position = None;
    }
}

impl SteeringBehavior for Evade {
    fn set_target(&mut self, target: TargetData) {
        self.target = target;
    }

    fn target(&self) -> TargetData {
        self.target
    }

    fn calculate_steering(&mut self, delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput {
        if !self.predictor.observe(self.target.position, delta_time) {
            self.predicted_position = None;
            return SteeringOutput::default();
        }

        let position = agent.position();
        let predicted =
            self.predictor
                .predict(self.target.position, position, agent.max_linear_speed());
        self.predicted_position = Some(predicted);

        SteeringOutput::linear(Flee::steer(position, predicted))
    }

    fn debug_draw(&self, agent: &dyn Agent, draw: &mut dyn DebugDraw) {
        draw_prediction(
            agent,
            self.target.position,
            self.predicted_position,
            Flee::steer,
            draw,
        );
    }

    fn name(&self) -> &'static str {
        "Evade"
    }
}

fn draw_prediction(
    agent: &dyn Agent,
    target: Vec2,
    predicted: Option<Vec2>,
    steer: fn(Vec2, Vec2) -> Vec2,
    draw: &mut dyn DebugDraw,
) {
    draw.point(target, Color::srgb(1.0, 0.2, 0.2));

    let Some(predicted) = predicted else {
        return;
    };

    let position = agent.position();
    draw.line(target, predicted, Color::srgb(0.8, 0.2, 0.8));
    draw.point(predicted, Color::srgb(0.8, 0.2, 0.8));
    draw.line(
        position,
        position + steer(position, predicted) * DEBUG_LINE_LENGTH,
        Color::srgb(0.2, 1.0, 0.2),
    );
}

/// Wanders around randomly changing host's angle.
///
/// Every call nudges the wander angle by a random amount, places a circle
/// `offset_distance` ahead of the agent and seeks the point on that circle at
/// `heading + wander_angle`. The seeking itself is done by an owned `Seek`.
#[derive(Debug, Clone)]
pub struct Wander<R = StdRng> {
    seek: Seek,
    offset_distance: f32,
    radius: f32,
    max_angle_change: f32,
    wander_angle: f32,
    circle_center: Vec2,
    rng: R,
}

impl Default for Wander<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl Wander<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(WanderConfig::default(), StdRng::from_entropy())
    }

    /// A wander whose random walk is reproducible.
    pub fn seeded(config: WanderConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &WanderConfig) -> Self {
        Self::with_rng(*config, StdRng::from_entropy())
    }
}

impl<R: Rng> Wander<R> {
    pub fn with_rng(config: WanderConfig, rng: R) -> Self {
        Self {
            seek: Seek::new(),
            offset_distance: config.offset_distance,
            radius: config.radius,
            max_angle_change: config.max_angle_change,
            wander_angle: 0.0,
            circle_center: Vec2::ZERO,
            rng,
        }
    }

    pub fn set_wander_offset(&mut self, offset: f32) {
        self.offset_distance = offset;
    }

    pub fn set_wander_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// Sets the largest change of the wander angle per call, in radians.
    pub fn set_max_angle_change(&mut self, angle: f32) {
        self.max_angle_change = angle;
    }

    pub fn offset_distance(&self) -> f32 {
        self.offset_distance
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn max_angle_change(&self) -> f32 {
        self.max_angle_change
    }

    /// Accumulated random offset from the agent's heading, kept in `(-PI, PI]`.
    pub fn wander_angle(&self) -> f32 {
        self.wander_angle
    }

    pub fn circle_center(&self) -> Vec2 {
        self.circle_center
    }

    /// Point on the wander circle sought during the last call.
    pub fn wander_target(&self) -> Vec2 {
        self.seek.target().position
    }
}

impl<R: Rng + Send + Sync> SteeringBehavior for Wander<R> {
    /// Wander picks its own target, anything set here is replaced on the next call.
    fn set_target(&mut self, target: TargetData) {
        self.seek.set_target(target);
    }

    fn target(&self) -> TargetData {
        self.seek.target()
    }

    fn calculate_steering(&mut self, delta_time: f32, agent: &mut dyn Agent) -> SteeringOutput {
        let change = rng_f32(&mut self.rng, -1.0, 1.0) * self.max_angle_change;
        self.wander_angle = wrap_angle(self.wander_angle + change);

        let rotation = agent.rotation();
        self.circle_center = agent.position() + heading(rotation) * self.offset_distance;

        let wander_target =
            self.circle_center + heading(rotation + self.wander_angle) * self.radius;
        self.seek.set_target(TargetData::from(wander_target));

        self.seek.calculate_steering(delta_time, agent)
    }

    fn debug_draw(&self, agent: &dyn Agent, draw: &mut dyn DebugDraw) {
        draw.line(
            agent.position(),
            self.circle_center,
            Color::srgb(0.3, 0.3, 0.3),
        );
        draw.circle(self.circle_center, self.radius, Color::srgb(0.2, 0.4, 1.0));
        self.seek.debug_draw(agent, draw);
    }

    fn name(&self) -> &'static str {
        "Wander"
    }
}

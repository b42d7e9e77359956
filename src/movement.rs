use bevy::prelude::*;

use crate::math::{truncate_vec2, wrap_angle, EPSILON};

pub mod behaviors;
pub mod steering;

use steering::{Agent, SteeringBehavior, SteeringOutput, TargetData};

/// Kinematic state of a steered entity. Rotation is in radians.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component, Default, PartialEq)]
pub struct SteeringAgent {
    pub position: Vec2,
    pub rotation: f32,
    pub linear_velocity: Vec2,
    /// Current speed cap. `Arrive` lowers this while approaching its target.
    /// Defaults to `250.0`.
    pub max_linear_speed: f32,
    /// Defaults to `PI` radians per second.
    pub max_angular_speed: f32,
    /// Turns the agent along its velocity when the behavior gives no angular velocity.
    pub auto_orient: bool,
}

impl Default for SteeringAgent {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            linear_velocity: Vec2::ZERO,
            max_linear_speed: 250.0,
            max_angular_speed: std::f32::consts::PI,
            auto_orient: true,
        }
    }
}

impl Agent for SteeringAgent {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn rotation(&self) -> f32 {
        self.rotation
    }

    fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    fn max_linear_speed(&self) -> f32 {
        self.max_linear_speed
    }

    fn set_max_linear_speed(&mut self, speed: f32) {
        self.max_linear_speed = speed;
    }

    fn max_angular_speed(&self) -> f32 {
        self.max_angular_speed
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PhysicsParams {
    /// Stores the maximum impulse of a steering force applied to an object via a steering
    /// behavior. Set this value lower than the max linear speed to achieve smooth acceleration.
    /// Defaults to `150.0`.
    pub max_force: f32,
    /// Determines how much inertia an object will have.
    /// Defaults to `4.0`.
    pub mass: f32,
    /// Determines how fast an object will decelerate. Lower values mean faster deceleration.
    /// Should be in range [0, 1] where 0 - instant stop, 1 - no deceleration at all.
    /// Defaults to `0.98`.
    pub friction: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            max_force: 150.0,
            mass: 4.0,
            friction: 0.98,
        }
    }
}

/// The behavior driving an entity and the output it produced last.
#[derive(Component)]
pub struct Steering {
    behavior: Box<dyn SteeringBehavior>,
    pub output: SteeringOutput,
}

impl Steering {
    pub fn new(behavior: impl SteeringBehavior + 'static) -> Self {
        Self {
            behavior: Box::new(behavior),
            output: SteeringOutput::default(),
        }
    }

    pub fn behavior(&self) -> &dyn SteeringBehavior {
        self.behavior.as_ref()
    }

    pub fn behavior_mut(&mut self) -> &mut dyn SteeringBehavior {
        self.behavior.as_mut()
    }

    /// Swaps in another behavior, e.g. when the host changes its mind.
    pub fn replace(&mut self, behavior: impl SteeringBehavior + 'static) {
        debug!(
            "Replacing steering behavior {} with {}",
            self.behavior.name(),
            behavior.name()
        );
        self.behavior = Box::new(behavior);
        self.output = SteeringOutput::default();
    }
}

/// Where an entity's target comes from each frame.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum SteeringTargetSource {
    Point(Vec2),
    /// Follows the position and velocity of another `SteeringAgent`.
    Entity(Entity),
}

#[derive(Bundle, Default)]
pub struct SteeringBundle {
    pub agent: SteeringAgent,
    pub physics_params: PhysicsParams,
}

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SteeringSet {
    Calculate,
    Integrate,
}

pub struct SteeringPlugin;

impl Plugin for SteeringPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (SteeringSet::Calculate, SteeringSet::Integrate).chain(),
        );
        app.add_systems(
            FixedUpdate,
            (update_targets, calculate_steering)
                .chain()
                .in_set(SteeringSet::Calculate),
        );
        app.add_systems(
            FixedUpdate,
            (apply_steering, apply_friction)
                .chain()
                .in_set(SteeringSet::Integrate),
        );
        app.add_systems(Update, update_transforms);
    }
}

fn update_targets(
    mut hosts: Query<(Entity, &mut Steering, &SteeringTargetSource)>,
    agents: Query<&SteeringAgent>,
) {
    for (entity, mut steering, source) in &mut hosts {
        let target = match *source {
            SteeringTargetSource::Point(position) => TargetData::from(position),
            SteeringTargetSource::Entity(other) => match agents.get(other) {
                Ok(agent) => TargetData::new(agent.position, agent.linear_velocity),
                Err(_) => {
                    warn!("{:?} steers towards missing agent {:?}", entity, other);
                    continue;
                }
            },
        };

        steering.behavior_mut().set_target(target);
    }
}

fn calculate_steering(time: Res<Time>, mut hosts: Query<(&mut Steering, &mut SteeringAgent)>) {
    let delta_time = time.delta_seconds();

    for (mut steering, mut agent) in &mut hosts {
        let output = steering
            .behavior_mut()
            .calculate_steering(delta_time, &mut *agent);
        steering.output = output;
    }
}

fn apply_steering(
    time: Res<Time>,
    mut hosts: Query<(&Steering, &mut SteeringAgent, &PhysicsParams)>,
) {
    let delta_time = time.delta_seconds();

    for (steering, mut agent, params) in &mut hosts {
        integrate(&mut agent, params, steering.output, delta_time);
    }
}

fn apply_friction(mut hosts: Query<(&mut SteeringAgent, &PhysicsParams)>) {
    for (mut agent, params) in &mut hosts {
        agent.linear_velocity *= params.friction;
    }
}

fn update_transforms(mut hosts: Query<(&mut Transform, &SteeringAgent)>) {
    for (mut transform, agent) in &mut hosts {
        transform.translation = agent.position.extend(transform.translation.z);
        transform.rotation = Quat::from_rotation_z(agent.rotation);
    }
}

/// Advances an agent by one step of `output`.
///
/// The desired velocity is the output direction scaled to the agent's speed cap; the
/// difference to the current velocity is applied as a force limited by `max_force`
/// and divided by `mass`.
pub fn integrate(
    agent: &mut SteeringAgent,
    params: &PhysicsParams,
    output: SteeringOutput,
    delta_time: f32,
) {
    let max_speed = agent.max_linear_speed.max(0.0);
    let desired_velocity = output.linear_velocity * max_speed;

    let mut force = truncate_vec2(desired_velocity - agent.linear_velocity, params.max_force);
    if params.mass > 0.0 {
        force /= params.mass;
    }

    agent.linear_velocity = truncate_vec2(agent.linear_velocity + force, max_speed);
    agent.position += agent.linear_velocity * delta_time;

    if output.angular_velocity != 0.0 {
        let max = agent.max_angular_speed.max(0.0);
        let angular_velocity = output.angular_velocity.clamp(-max, max);
        agent.rotation = wrap_angle(agent.rotation + angular_velocity * delta_time);
    } else if agent.auto_orient && agent.linear_velocity.length() > EPSILON {
        agent.rotation = agent.linear_velocity.y.atan2(agent.linear_velocity.x);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::movement::behaviors::{Arrive, Face, Seek};

    #[test]
    fn integrate_accelerates_towards_desired_velocity() {
        let mut agent = SteeringAgent::default();
        let params = PhysicsParams::default();

        integrate(&mut agent, &params, SteeringOutput::linear(Vec2::X), 0.1);

        // force limited to 150, divided by mass 4
        assert_relative_eq!(agent.linear_velocity.x, 37.5, epsilon = 1e-4);
        assert_relative_eq!(agent.position.x, 3.75, epsilon = 1e-4);
        assert_eq!(agent.rotation, 0.0);
    }

    #[test]
    fn integrate_never_exceeds_speed_cap() {
        let mut agent = SteeringAgent {
            max_linear_speed: 20.0,
            ..default()
        };
        let params = PhysicsParams {
            mass: 1.0,
            ..default()
        };

        for _ in 0..10 {
            integrate(&mut agent, &params, SteeringOutput::linear(Vec2::Y), 0.016);
            assert!(agent.linear_velocity.length() <= 20.0 + 1e-4);
        }

        assert_relative_eq!(agent.rotation, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn integrate_applies_clamped_angular_velocity() {
        let mut agent = SteeringAgent {
            max_angular_speed: 1.0,
            ..default()
        };

        integrate(&mut agent, &PhysicsParams::default(), SteeringOutput::angular(-5.0), 0.5);

        assert_relative_eq!(agent.rotation, -0.5, epsilon = 1e-6);
        assert_eq!(agent.linear_velocity, Vec2::ZERO);
    }

    #[test]
    fn steering_agent_is_an_agent() {
        let mut agent = SteeringAgent::default();
        let mut arrive = Arrive::default();
        arrive.set_target(TargetData::from(Vec2::new(100.0, 0.0)));

        arrive.calculate_steering(0.016, &mut agent);

        assert_relative_eq!(agent.max_linear_speed, 50.0, epsilon = 1e-3);
    }

    #[test]
    fn replacing_behavior_resets_output() {
        let mut steering = Steering::new(Seek::new());
        steering.output = SteeringOutput::linear(Vec2::X);

        steering.replace(Face::default());

        assert_eq!(steering.behavior().name(), "Face");
        assert_eq!(steering.output, SteeringOutput::default());
    }

    #[test]
    fn plugin_steers_agent_towards_point() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SteeringPlugin);

        let entity = app
            .world_mut()
            .spawn((
                SteeringBundle::default(),
                Steering::new(Seek::new()),
                SteeringTargetSource::Point(Vec2::new(0.0, 100.0)),
            ))
            .id();

        app.world_mut().run_schedule(FixedUpdate);

        let steering = app
            .world()
            .get::<Steering>(entity)
            .expect("steering component");
        assert_eq!(steering.behavior().target().position, Vec2::new(0.0, 100.0));
        assert_relative_eq!(steering.output.linear_velocity.y, 1.0, epsilon = 1e-6);
    }
}

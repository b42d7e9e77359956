use bevy::prelude::*;
use bevy_inspector_egui::quick::WorldInspectorPlugin;

use crate::math::heading;
use crate::movement::{
    steering::{Agent, SteeringOutput, TargetData},
    PhysicsParams, Steering, SteeringAgent,
};

/// Length of direction lines drawn for agents and behaviors.
pub const DEBUG_LINE_LENGTH: f32 = 50.0;
pub const DEBUG_POINT_RADIUS: f32 = 3.0;
pub const DEBUG_AGENT_RADIUS: f32 = 12.0;

/// Drawing facility used to visualize behaviors.
/// Behaviors compute the same output whether or not anything is drawn.
pub trait DebugDraw {
    fn line(&mut self, start: Vec2, end: Vec2, color: Color);
    fn point(&mut self, position: Vec2, color: Color);
    fn circle(&mut self, center: Vec2, radius: f32, color: Color);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDraw;

impl DebugDraw for NullDraw {
    fn line(&mut self, _start: Vec2, _end: Vec2, _color: Color) {}
    fn point(&mut self, _position: Vec2, _color: Color) {}
    fn circle(&mut self, _center: Vec2, _radius: f32, _color: Color) {}
}

impl DebugDraw for Gizmos<'_, '_> {
    fn line(&mut self, start: Vec2, end: Vec2, color: Color) {
        self.line_2d(start, end, color);
    }

    fn point(&mut self, position: Vec2, color: Color) {
        self.circle_2d(position, DEBUG_POINT_RADIUS, color);
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.circle_2d(center, radius, color);
    }
}

/// Draws an agent's body, heading and velocity.
pub fn draw_agent(agent: &dyn Agent, draw: &mut dyn DebugDraw) {
    let position = agent.position();

    draw.circle(position, DEBUG_AGENT_RADIUS, Color::WHITE);
    draw.line(
        position,
        position + heading(agent.rotation()) * DEBUG_AGENT_RADIUS * 1.5,
        Color::WHITE,
    );
    draw.line(
        position,
        position + agent.linear_velocity(),
        Color::srgb(1.0, 1.0, 0.2),
    );
}

pub struct SteeringDebugPlugin;

#[derive(Resource, Debug)]
pub struct DebugSettings {
    pub steering_draw_enabled: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            steering_draw_enabled: true,
        }
    }
}

impl Plugin for SteeringDebugPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SteeringAgent>();
        app.register_type::<PhysicsParams>();
        app.register_type::<SteeringOutput>();
        app.register_type::<TargetData>();
        app.add_plugins(WorldInspectorPlugin::new());

        app.add_systems(Update, (handle_input, debug_draw).chain());

        app.insert_resource(DebugSettings::default());
    }
}

fn handle_input(keyboard_input: Res<ButtonInput<KeyCode>>, mut settings: ResMut<DebugSettings>) {
    if keyboard_input.just_pressed(KeyCode::KeyG) {
        settings.steering_draw_enabled = !settings.steering_draw_enabled;
        info!("Steering debug draw: {}", settings.steering_draw_enabled);
    }
}

fn debug_draw(
    settings: Res<DebugSettings>,
    agents: Query<(&SteeringAgent, &Steering)>,
    mut gizmos: Gizmos,
) {
    if !settings.steering_draw_enabled {
        return;
    }

    for (agent, steering) in &agents {
        steering.behavior().debug_draw(agent, &mut gizmos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WanderConfig;
    use crate::movement::behaviors::{Arrive, Pursuit, Seek, Wander};
    use crate::movement::steering::SteeringBehavior;

    #[derive(Debug, Default)]
    struct RecordingDraw {
        lines: Vec<(Vec2, Vec2)>,
        points: Vec<Vec2>,
        circles: Vec<(Vec2, f32)>,
    }

    impl DebugDraw for RecordingDraw {
        fn line(&mut self, start: Vec2, end: Vec2, _color: Color) {
            self.lines.push((start, end));
        }

        fn point(&mut self, position: Vec2, _color: Color) {
            self.points.push(position);
        }

        fn circle(&mut self, center: Vec2, radius: f32, _color: Color) {
            self.circles.push((center, radius));
        }
    }

    fn agent_at(position: Vec2) -> SteeringAgent {
        SteeringAgent {
            position,
            ..default()
        }
    }

    #[test]
    fn agent_is_drawn_with_body_and_heading() {
        let mut draw = RecordingDraw::default();
        draw_agent(&agent_at(Vec2::new(5.0, 5.0)), &mut draw);

        assert_eq!(draw.circles, vec![(Vec2::new(5.0, 5.0), DEBUG_AGENT_RADIUS)]);
        assert_eq!(draw.lines.len(), 2);
    }

    #[test]
    fn wander_draws_its_circle() {
        let mut agent = agent_at(Vec2::ZERO);
        let mut wander = Wander::seeded(WanderConfig::default(), 11);
        wander.calculate_steering(0.016, &mut agent);

        let mut draw = RecordingDraw::default();
        wander.debug_draw(&agent, &mut draw);

        assert!(draw.circles.contains(&(wander.circle_center(), wander.radius())));
        assert!(draw.points.contains(&wander.wander_target()));
    }

    #[test]
    fn arrive_draws_both_zones() {
        let agent = agent_at(Vec2::ZERO);
        let mut arrive = Arrive::default();
        arrive.set_target(TargetData::from(Vec2::new(100.0, 0.0)));

        let mut draw = RecordingDraw::default();
        arrive.debug_draw(&agent, &mut draw);

        let radii: Vec<f32> = draw.circles.iter().map(|(_, radius)| *radius).collect();
        assert_eq!(radii, vec![300.0, 50.0]);
    }

    #[test]
    fn pursuit_draws_prediction_only_once_initialized() {
        let mut agent = agent_at(Vec2::new(0.0, -100.0));
        let mut pursuit = Pursuit::default();
        pursuit.set_target(TargetData::from(Vec2::ZERO));
        pursuit.calculate_steering(0.016, &mut agent);

        let mut draw = RecordingDraw::default();
        pursuit.debug_draw(&agent, &mut draw);
        assert_eq!(draw.points.len(), 1);
        assert!(draw.lines.is_empty());

        pursuit.calculate_steering(0.016, &mut agent);
        let mut draw = RecordingDraw::default();
        pursuit.debug_draw(&agent, &mut draw);
        assert_eq!(draw.points.len(), 2);
    }

    #[test]
    fn drawing_does_not_change_the_output() {
        let mut agent = agent_at(Vec2::ZERO);
        let mut seek = Seek::new();
        seek.set_target(TargetData::from(Vec2::new(0.0, 10.0)));

        let before = seek.calculate_steering(0.016, &mut agent);
        seek.debug_draw(&agent, &mut RecordingDraw::default());
        seek.debug_draw(&agent, &mut NullDraw);
        let after = seek.calculate_steering(0.016, &mut agent);

        assert_eq!(before, after);
    }
}

use bevy::{prelude::*, window::PrimaryWindow};
use steer_rs::{debug::draw_agent, prelude::*};

pub const FRAMERATE: f64 = 60.0;
pub const FIXED_TIMESTEP: f64 = 1.0 / FRAMERATE;

const CONFIG_PATH: &str = "configs/steering.json";

fn main() {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "steer-rs".into(),
            resolution: (1600., 900.).into(),
            ..default()
        }),
        ..default()
    }))
    .add_plugins(SteeringPlugin)
    .add_systems(Startup, (spawn_camera, spawn_agents))
    .add_systems(FixedUpdate, wrap_around_screen.after(SteeringSet::Integrate))
    .add_systems(Update, draw_agents)
    .insert_resource(Time::<Fixed>::from_seconds(FIXED_TIMESTEP));

    #[cfg(debug_assertions)]
    app.add_plugins(SteeringDebugPlugin);

    app.run();
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}

fn load_config() -> SteeringConfig {
    match SteeringConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(err) => {
            warn!("{}, falling back to default steering config", err);
            SteeringConfig::default()
        }
    }
}

fn agent_at(position: Vec2, max_linear_speed: f32) -> SteeringBundle {
    SteeringBundle {
        agent: SteeringAgent {
            position,
            max_linear_speed,
            ..default()
        },
        ..default()
    }
}

fn spawn_agents(mut commands: Commands) {
    let config = load_config();

    let wanderer = commands
        .spawn((
            Name::new("Wanderer"),
            agent_at(Vec2::ZERO, 120.0),
            Steering::new(Wander::from_config(&config.wander)),
        ))
        .id();

    let pursuer = commands
        .spawn((
            Name::new("Pursuer"),
            agent_at(Vec2::new(-500.0, -300.0), 150.0),
            Steering::new(Pursuit::from_config(&config.pursuit)),
            SteeringTargetSource::Entity(wanderer),
        ))
        .id();

    commands.spawn((
        Name::new("Evader"),
        agent_at(Vec2::new(500.0, -300.0), 140.0),
        Steering::new(Evade::from_config(&config.evade)),
        SteeringTargetSource::Entity(pursuer),
    ));

    commands.spawn((
        Name::new("Fleer"),
        agent_at(Vec2::new(-300.0, 300.0), 100.0),
        Steering::new(Flee::new()),
        SteeringTargetSource::Entity(wanderer),
    ));

    commands.spawn((
        Name::new("Arriver"),
        agent_at(Vec2::new(-700.0, 350.0), 200.0),
        Steering::new(Arrive::from_config(&config.arrive)),
        SteeringTargetSource::Point(Vec2::new(400.0, 200.0)),
    ));

    commands.spawn((
        Name::new("Facer"),
        agent_at(Vec2::new(650.0, 300.0), 0.0),
        Steering::new(Face::from_config(&config.face)),
        SteeringTargetSource::Entity(wanderer),
    ));

    commands.insert_resource(config);
    info!("Spawned steering agents");
}

fn wrap_around_screen(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut agents: Query<&mut SteeringAgent>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };

    let half = Vec2::new(window.width(), window.height()) / 2.0;
    for mut agent in &mut agents {
        let mut position = agent.position;

        if position.x < -half.x {
            position.x += half.x * 2.0;
        } else if position.x > half.x {
            position.x -= half.x * 2.0;
        }

        if position.y < -half.y {
            position.y += half.y * 2.0;
        } else if position.y > half.y {
            position.y -= half.y * 2.0;
        }

        if position != agent.position {
            agent.position = position;
        }
    }
}

fn draw_agents(agents: Query<&SteeringAgent>, mut gizmos: Gizmos) {
    for agent in &agents {
        draw_agent(agent, &mut gizmos);
    }
}

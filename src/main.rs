use rusty_engine::app::{App, AppConfig, Module};
use rusty_engine::ecs::system::param::{Commands, Query, UniqMut};
use rusty_macros::{Component, Unique};

#[derive(Component)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Unique, Default)]
struct TickCount(u32);

fn spawn_actors(commands: Commands) {
    commands.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.5 }));
    commands.spawn((Position { x: 10.0, y: 0.0 }, Velocity { dx: -1.0, dy: 0.0 }));
}

fn integrate_velocity(entities: Query<(&mut Position, &Velocity)>) {
    for (position, velocity) in entities {
        position.x += velocity.dx;
        position.y += velocity.dy;
    }
}

fn count_tick(mut ticks: UniqMut<TickCount>) {
    ticks.0 += 1;
}

struct MovementModule;

impl Module for MovementModule {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn build(&mut self, app: &mut App) {
        use rusty_engine::app::{Startup, Update};

        app.insert_resource(TickCount::default());
        app.add_system(Startup, "spawn_actors", spawn_actors);
        app.add_system(Update, "integrate_velocity", integrate_velocity);
        app.add_system(Update, "count_tick", count_tick);
    }
}

fn main() {
    let mut app = App::new(AppConfig::default());
    app.add_plugin(MovementModule);

    let mut runner = app.build().expect("app schedules should be acyclic");
    let stop = runner.stop_handle();

    runner.startup();
    for _ in 0..5 {
        runner.tick();
    }
    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    runner.shutdown();

    println!("ran {} ticks", runner.tick_count());
}

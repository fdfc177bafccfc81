//! Fixed-timestep tick loop over a built [`App`](super::App).
//!
//! Grounded on `core::engine::Engine::start`'s stop-flag loop and
//! `core::sim_loop::SimLoop`'s accumulator shape (`while accumulator >= fixed_time_step
//! { on_fixed_update(...) } on_update(...)`), generalized from two bare closures to the
//! fixed schedule sequence `PreStartup -> Startup -> PostStartup` once, then looping
//! `First -> PreUpdate -> Update -> PostUpdate -> Last`. Cancellation is checked between
//! every schedule, not just once per frame - finer-grained than the loop this is
//! grounded on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::core::tasks::Executor;
use crate::ecs::schedule::{self, labels, Label, ScheduleError, Scheduler};
use crate::ecs::world;

use super::time::Time;
use super::{App, Module};

/// A running app: the world, compiled schedulers, and the modules that will be torn
/// down when it stops.
pub struct Runner {
    world: world::World,
    executor: Executor,
    schedulers: HashMap<schedule::Id, Scheduler>,
    modules: Vec<Box<dyn Module>>,
    stop: Arc<AtomicBool>,
    tick_count: Arc<AtomicU64>,
}

impl Runner {
    pub(super) fn build(app: App) -> Result<Self, ScheduleError> {
        let App {
            mut world,
            config,
            registries,
            modules,
        } = app;

        if world.get_unique::<Time>().is_none() {
            world.add_unique(Time::new(config.fixed_time_step));
        }

        let executor = if config.worker_threads <= 1 {
            Executor::single_threaded()
        } else {
            Executor::new(config.worker_threads)
        };

        let mut schedulers = HashMap::with_capacity(registries.len());
        for (id, registry) in registries {
            schedulers.insert(id, Scheduler::build(registry)?);
        }

        Ok(Self {
            world,
            executor,
            schedulers,
            modules,
            stop: Arc::new(AtomicBool::new(false)),
            tick_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// A handle callers can use to request a stop from another thread (e.g. a SIGINT
    /// handler installed by the consuming binary - the core itself owns no signal
    /// handling, matching the crate's "no CLI" external interface).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Number of `First -> ... -> Last` ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[inline]
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// The world, for inspection between/after runs (tests, or a caller driving ticks
    /// itself via [`tick`](Self::tick) instead of [`run`](Self::run)).
    #[inline]
    pub fn world(&self) -> &world::World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut world::World {
        &mut self.world
    }

    fn run_schedule<L: Label>(&mut self, label: L) -> bool {
        match self.schedulers.get_mut(&label.id()) {
            Some(scheduler) => {
                scheduler.run(&mut self.world, &self.executor);
                true
            }
            None => false,
        }
    }

    /// Runs `PreStartup -> Startup -> PostStartup` once. Labels with no scheduler
    /// registered (nobody called [`App::add_system`](super::App::add_system) for that
    /// phase) are skipped silently.
    pub fn startup(&mut self) {
        info!("running startup schedules");
        self.run_schedule(labels::PreStartup);
        self.run_schedule(labels::Startup);
        self.run_schedule(labels::PostStartup);
    }

    /// Runs one `First -> PreUpdate -> Update -> PostUpdate -> Last` tick, checking the
    /// stop flag between every schedule. Returns `false` (without running the remaining
    /// schedules) if a stop was requested mid-tick.
    pub fn tick(&mut self) -> bool {
        self.world
            .get_unique_mut::<Time>()
            .expect("Time resource inserted at build")
            .tick();

        for label_runner in [
            Self::run_first as fn(&mut Self) -> bool,
            Self::run_pre_update,
            Self::run_update,
            Self::run_post_update,
            Self::run_last,
        ] {
            if self.stopped() {
                return false;
            }
            label_runner(self);
        }

        self.tick_count.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn run_first(&mut self) -> bool {
        self.run_schedule(labels::First)
    }
    fn run_pre_update(&mut self) -> bool {
        self.run_schedule(labels::PreUpdate)
    }
    fn run_update(&mut self) -> bool {
        self.run_schedule(labels::Update)
    }
    fn run_post_update(&mut self) -> bool {
        self.run_schedule(labels::PostUpdate)
    }
    fn run_last(&mut self) -> bool {
        self.run_schedule(labels::Last)
    }

    /// Runs startup once, then ticks until a stop is requested, yielding the thread
    /// briefly between ticks the same way the accumulator loop this is grounded on does.
    pub fn run(&mut self) {
        self.startup();
        while !self.stopped() {
            if !self.tick() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        self.shutdown();
    }

    /// Invokes every module's `destroy` hook. Called automatically at the end of
    /// [`run`](Self::run); exposed directly for callers driving [`tick`](Self::tick)
    /// themselves.
    pub fn shutdown(&mut self) {
        info!("app stopped after {} ticks", self.tick_count());
        for module in self.modules.iter_mut() {
            module.destroy(&mut self.world);
        }
    }
}

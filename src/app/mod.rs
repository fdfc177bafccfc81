//! Application builder and tick loop.
//!
//! [`App`] is the builder surface a binary or [`Module`] uses to declare systems, sets,
//! run conditions, and resources before the app starts: `add_system`, `add_set`,
//! `configure_set`, `order_systems`/`order_sets`, `insert_resource`, `add_schedule`, and
//! `add_plugin`. All of it is builder-time and single-threaded. [`App::build`] freezes
//! every schedule's [`ScheduleRegistry`](crate::ecs::schedule::ScheduleRegistry) into a
//! compiled [`Scheduler`](crate::ecs::schedule::Scheduler) and hands back a runnable
//! [`Runner`].
//!
//! Grounded on the engine's `Engine` builder (`new()`, `add()` returning `&mut Self`,
//! `start()`) - `App` follows the same builder-returns-`&mut Self` shape, generalized
//! from a flat service list to per-schedule system/set/condition registries.

pub mod module;
pub mod runner;
pub mod time;

pub use module::Module;
pub use runner::Runner;
pub use time::Time;

use std::collections::HashMap;

use crate::ecs::schedule::{
    self, Label, RunCondition, ScheduleError, ScheduleRegistry, SystemSetId, SystemTypeId,
};
use crate::ecs::{system, unique, world};

pub use crate::ecs::schedule::labels::{
    First, Last, PostStartup, PostUpdate, PreStartup, PreUpdate, Render, Startup, Update,
};

/// Builder-time tuning the runner needs once it starts: the fixed timestep driving
/// [`Time`]'s accumulator, and the worker pool size behind every schedule's executor.
///
/// Grounded on `core::tasks::Executor::new(size)`/`single_threaded()`, which already
/// expose pool sizing as the one tunable knob the engine has; `AppConfig` simply
/// surfaces it through [`App::build`] instead of requiring callers to construct an
/// `Executor` directly.
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    /// Fixed timestep, in nanoseconds. Defaults to [`time::SIXTY_FPS`].
    pub fixed_time_step: u64,
    /// Worker threads backing the schedule executor. `0` or `1` run single-threaded.
    pub worker_threads: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: time::SIXTY_FPS,
            worker_threads: 4,
        }
    }
}

/// Builder surface for declaring modules, systems, sets, run conditions, and resources.
///
/// Owns the [`world::World`] systems are registered against and one
/// [`ScheduleRegistry`] per schedule label, keyed by the label's type-erased
/// [`schedule::Id`]. Consumed by [`build`](Self::build) into a [`Runner`].
pub struct App {
    world: world::World,
    config: AppConfig,
    registries: HashMap<schedule::Id, ScheduleRegistry>,
    modules: Vec<Box<dyn Module>>,
}

impl App {
    /// Constructs an empty app with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            world: world::World::new(world::Id::new(0)),
            config,
            registries: HashMap::new(),
            modules: Vec::new(),
        }
    }

    /// The world systems are registered against and resources are inserted into.
    #[inline]
    pub fn world(&self) -> &world::World {
        &self.world
    }

    /// The world, mutably - for spawning entities or configuring things the builder
    /// surface doesn't cover directly.
    #[inline]
    pub fn world_mut(&mut self) -> &mut world::World {
        &mut self.world
    }

    /// Registers `system` under `label`'s schedule, returning its assigned
    /// [`SystemTypeId`] for use with `order_systems`/`configure_set`/run conditions.
    pub fn add_system<L: Label, M>(
        &mut self,
        label: L,
        name: &'static str,
        system: impl system::IntoSystem<M>,
    ) -> SystemTypeId {
        let system = system.into_system(&mut self.world);
        self.registry_mut(label).add_system(name, system)
    }

    /// Registers a system set under `label`'s schedule.
    pub fn add_set<L: Label>(&mut self, label: L, name: &'static str) -> SystemSetId {
        self.registry_mut(label).add_set(name)
    }

    /// Adds `system` as a member of `set` in `label`'s schedule.
    pub fn configure_set<L: Label>(
        &mut self,
        label: L,
        system: SystemTypeId,
        set: SystemSetId,
    ) -> &mut Self {
        self.registry_mut(label).add_to_set(system, set);
        self
    }

    /// Declares that `before` must run before `after`, within `label`'s schedule.
    pub fn order_systems<L: Label>(
        &mut self,
        label: L,
        before: SystemTypeId,
        after: SystemTypeId,
    ) -> &mut Self {
        self.registry_mut(label).order_systems(before, after);
        self
    }

    /// Declares that `before` must run before `after` at the set level, within
    /// `label`'s schedule.
    pub fn order_sets<L: Label>(
        &mut self,
        label: L,
        before: SystemSetId,
        after: SystemSetId,
    ) -> &mut Self {
        self.registry_mut(label).order_sets(before, after);
        self
    }

    /// Registers a run condition against `label`'s schedule, returning its index for
    /// use with `condition_system`/`condition_set`.
    pub fn add_condition<L: Label>(&mut self, label: L, condition: RunCondition) -> usize {
        self.registry_mut(label).add_condition(condition)
    }

    /// Gates `system` (within `label`'s schedule) on `condition`.
    pub fn condition_system<L: Label>(
        &mut self,
        label: L,
        system: SystemTypeId,
        condition: usize,
    ) -> &mut Self {
        self.registry_mut(label).condition_system(system, condition);
        self
    }

    /// Gates every member of `set` (within `label`'s schedule) on `condition`.
    pub fn condition_set<L: Label>(
        &mut self,
        label: L,
        set: SystemSetId,
        condition: usize,
    ) -> &mut Self {
        self.registry_mut(label).condition_set(set, condition);
        self
    }

    /// Inserts a unique (singleton) resource into the world.
    pub fn insert_resource<U: unique::Unique>(&mut self, resource: U) -> &mut Self {
        self.world.add_unique(resource);
        self
    }

    /// Ensures `label` has a schedule registry, even with no systems added yet. Mostly
    /// useful so `Runner::run` can name every schedule it will try without surprises;
    /// `add_system`/`add_set` already create the registry implicitly.
    pub fn add_schedule<L: Label>(&mut self, label: L) -> &mut Self {
        self.registry_mut(label);
        self
    }

    /// Adds a module, invoking its `build` hook immediately. The module is retained so
    /// its `destroy` hook can run when the built [`Runner`] stops.
    pub fn add_plugin<M: Module + 'static>(&mut self, mut module: M) -> &mut Self {
        module.build(self);
        self.modules.push(Box::new(module));
        self
    }

    fn registry_mut<L: Label>(&mut self, label: L) -> &mut ScheduleRegistry {
        self.registries.entry(label.id()).or_default()
    }

    /// Finalizes the app: compiles every schedule's registry into a [`Scheduler`],
    /// inserts the [`Time`] resource if a module hasn't already, and hands back a
    /// runnable [`Runner`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ScheduleError`] encountered while building any schedule's
    /// plan (a cycle or an unresolvable conflict), naming the offending schedule is the
    /// caller's responsibility to recover from - `Build` is meant to be fatal at this
    /// layer.
    pub fn build(self) -> Result<Runner, ScheduleError> {
        Runner::build(self)
    }
}

//! Scheduling for ECS systems: ordering, parallel execution, and run conditions.
//!
//! The primary API is [`ScheduleRegistry`] + [`Scheduler`]:
//!
//! 1. Register systems and sets on a [`ScheduleRegistry`], declaring before/after
//!    ordering between systems and between sets, and gating systems or sets on
//!    [`RunCondition`]s.
//! 2. Compile it once with [`Scheduler::build`], which topologically sorts the
//!    dependency graph into levels of systems that can run in parallel.
//! 3. Call [`Scheduler::run`] every tick to execute a level at a time, flushing
//!    each level's command buffers before the next level starts.
//!
//! # Defining Phases
//!
//! Named schedules (`First`, `Update`, `Render`, ...) are phase labels: zero-sized
//! marker types implementing [`phase::Label`], each compiled into its own
//! [`ScheduleRegistry`]/[`Scheduler`] pair. Use the [`define_phase!`] macro:
//!
//! ```rust,ignore
//! use rusty_engine::define_phase;
//!
//! define_phase!(FixedUpdate, Update, Render);
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use rusty_engine::ecs::schedule::{ScheduleRegistry, Scheduler};
//!
//! let mut registry = ScheduleRegistry::new();
//! let gravity = registry.add_system("gravity", gravity_system.into_system(&mut world));
//! let integrate = registry.add_system("integrate", integrate_system.into_system(&mut world));
//! registry.order_systems(gravity, integrate);
//!
//! let mut scheduler = Scheduler::build(registry)?;
//! loop {
//!     scheduler.run(&mut world, &executor);
//! }
//! ```
//!
//! # Relationship to Phase Module
//!
//! Each level the scheduler runs is dispatched through [`phase::run_group`], which
//! handles:
//! - Parallel system execution across the provided executor
//! - Per-system command buffers, flushed in system-index order after the level completes
//!
//! See the [`phase`](crate::ecs::schedule::phase) module for execution details, and
//! [`Sequence`] for composing a fixed run order out of phase labels by hand when a
//! caller isn't driving phases through [`super::App`](crate::app::App)/
//! [`Runner`](crate::app::Runner).

pub mod labels;
mod phase;
pub mod plan;
pub mod registry;
pub mod scheduler;

pub use phase::{Id, Label, Phase, Sequence};
pub use registry::{RunCondition, ScheduleRegistry, SystemSetId, SystemTypeId};
pub use scheduler::{ScheduleError, Scheduler};


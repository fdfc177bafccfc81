//! An entity-component-system core: archetype storage, typed queries, parallel system
//! scheduling by access-conflict analysis, and an [`app`] builder/runner façade tying
//! it all into a fixed-timestep tick loop.
//!
//! - [`ecs`] - the storage and scheduling engine: entities, components, queries,
//!   systems, and the [`ecs::schedule::Scheduler`] that turns a registry of systems
//!   into a leveled, conflict-free execution plan.
//! - [`app`] - [`app::App`] (builder), [`app::Module`] (plugin unit), [`app::Time`]
//!   (delta-time resource), and [`app::Runner`] (the tick loop).
//! - [`core`] - shared plumbing the rest of the crate is built on: the thread pool
//!   ([`core::tasks::Executor`]) and the `log`-backed logging channel.

pub mod app;
pub mod core;
pub mod ecs;

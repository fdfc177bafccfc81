//! Plugin unit for the [`App`](super::App) builder.
//!
//! Modeled directly on the engine's `Service` trait (`name`/`start`/`stop`), renamed to
//! this crate's vocabulary. `build` is the module ABI's construction hook, called once
//! when the module is added to an `App`; `destroy` is its teardown hook, called once
//! when the [`Runner`](super::Runner) stops. Unlike `Service::stop`, `destroy` takes the
//! world rather than the app: by teardown time the builder-only `App` has already been
//! consumed into a `Runner`, and the world is the only piece of app state a module could
//! plausibly still need to release something it inserted.
use crate::ecs::world;

use super::App;

pub trait Module: Send + Sync {
    /// A human-readable name, used for debugging and logging.
    fn name(&self) -> &'static str;

    /// Registers this module's systems, sets, and resources with `app`. Called once,
    /// at `app.add_plugin(...)`.
    fn build(&mut self, app: &mut App);

    /// Releases anything this module owns. Called once, when the runner stops. The
    /// default does nothing.
    #[allow(unused_variables)]
    fn destroy(&mut self, world: &mut world::World) {}
}

//! Well-known schedule labels for the default tick sequence.
//!
//! Promoted from the test-only phases this module's sibling files define inline via
//! [`crate::define_phase!`] to first-class public labels a [`super::Scheduler`]-driven
//! runner can depend on by name, rather than ad-hoc string identifiers.
//!
//! `PreStartup`, `Startup`, and `PostStartup` run once, before the first tick.
//! `First`, `PreUpdate`, `Update`, `PostUpdate`, and `Last` run once per tick, in that
//! order. `Render` is provided for consumers that want to separate presentation from
//! simulation, but nothing in this crate schedules it automatically.
crate::define_phase!(
    First,
    PreStartup,
    Startup,
    PostStartup,
    PreUpdate,
    Update,
    PostUpdate,
    Last,
    Render,
);

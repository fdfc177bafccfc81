//! Logging plumbing built on the `log` facade crate.
//!
//! [`channel::ChannelLogger`] forwards records over a `crossbeam` channel instead of
//! printing directly, so a consumer (CLI, test harness, or this crate's own `App`) can
//! drain and format them on its own schedule.

pub mod channel;

pub use channel::{ChannelLogger, LogMessage};

//! Engine-agnostic plumbing shared by the ECS: a thread pool for parallel system
//! dispatch and a `log`-backed logging channel. The tick loop, module façade, and
//! delta-time resource live one level up in [`crate::app`], built directly on top of
//! these.

pub mod log;
pub mod tasks;

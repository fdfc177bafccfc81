//! System and system-set metadata for scheduler plan construction.
//!
//! [`system::registry::Registry`](crate::ecs::system::registry::Registry) stores bare
//! systems indexed by a dense [`Id`](crate::ecs::system::Id). A [`Scheduler`](super::Scheduler)
//! needs more than that to build an execution order: ordering constraints (`before`/`after`),
//! set membership, and run conditions. [`ScheduleRegistry`] wraps the bare registry with that
//! metadata, one [`SystemInfo`]/[`SystemSetInfo`] per registered system/set.

use crate::ecs::{system, world};

/// A system identifier assigned at registration time.
///
/// Aliased from [`system::Id`] rather than duplicated - both are dense, stable, ascending
/// identifiers handed out in registration order, which is exactly what ordering edges and
/// command buffer flush order need.
pub use system::Id as SystemTypeId;

/// A system-set identifier assigned at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemSetId(u32);

impl SystemSetId {
    /// Construct a new set Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this set if it were to live in indexable storage (e.g. Vec).
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A pure predicate over the world, evaluated once per tick per system/set.
///
/// Returning `false` skips the associated system for that tick without touching its
/// command buffer - the system's commands simply never get queued.
pub type RunCondition = Box<dyn Fn(&world::World) -> bool + Send + Sync>;

/// Per-system scheduling metadata: ordering constraints, set membership, and run conditions.
pub struct SystemInfo {
    name: &'static str,
    id: SystemTypeId,
    access: world::AccessRequest,
    before: Vec<SystemTypeId>,
    after: Vec<SystemTypeId>,
    sets: Vec<SystemSetId>,
    conditions: Vec<usize>,
}

impl SystemInfo {
    fn new(name: &'static str, id: SystemTypeId, access: world::AccessRequest) -> Self {
        Self {
            name,
            id,
            access,
            before: Vec::new(),
            after: Vec::new(),
            sets: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// The system's registration name, used for debugging and deterministic conflict
    /// tie-breaking.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The system's dense identifier.
    #[inline]
    pub fn id(&self) -> SystemTypeId {
        self.id
    }

    /// The system's declared world access.
    #[inline]
    pub fn access(&self) -> &world::AccessRequest {
        &self.access
    }

    /// Systems that must run before this one.
    #[inline]
    pub fn before(&self) -> &[SystemTypeId] {
        &self.before
    }

    /// Systems that must run after this one.
    #[inline]
    pub fn after(&self) -> &[SystemTypeId] {
        &self.after
    }

    /// Sets this system belongs to.
    #[inline]
    pub fn sets(&self) -> &[SystemSetId] {
        &self.sets
    }

    /// Indices into the registry's run condition table gating this system.
    #[inline]
    pub fn conditions(&self) -> &[usize] {
        &self.conditions
    }
}

/// Per-set scheduling metadata: ordering constraints, run conditions, and membership.
pub struct SystemSetInfo {
    name: &'static str,
    id: SystemSetId,
    before: Vec<SystemSetId>,
    after: Vec<SystemSetId>,
    conditions: Vec<usize>,
    members: Vec<SystemTypeId>,
}

impl SystemSetInfo {
    fn new(name: &'static str, id: SystemSetId) -> Self {
        Self {
            name,
            id,
            before: Vec::new(),
            after: Vec::new(),
            conditions: Vec::new(),
            members: Vec::new(),
        }
    }

    /// The set's registration name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The set's dense identifier.
    #[inline]
    pub fn id(&self) -> SystemSetId {
        self.id
    }

    /// Sets that must run before this one. Lowered to system-level edges at plan time via
    /// the cross product of member systems.
    #[inline]
    pub fn before(&self) -> &[SystemSetId] {
        &self.before
    }

    /// Sets that must run after this one.
    #[inline]
    pub fn after(&self) -> &[SystemSetId] {
        &self.after
    }

    /// Indices into the registry's run condition table gating every member system.
    #[inline]
    pub fn conditions(&self) -> &[usize] {
        &self.conditions
    }

    /// Systems that belong to this set.
    #[inline]
    pub fn members(&self) -> &[SystemTypeId] {
        &self.members
    }
}

/// Registry of systems, sets, and run conditions backing a [`Scheduler`](super::Scheduler).
///
/// Systems are stored in registration order; a system's index in `systems()`/`infos()` is
/// also its [`SystemTypeId`], matching [`system::registry::Registry`]'s dense-id scheme.
#[derive(Default)]
pub struct ScheduleRegistry {
    systems: Vec<system::System>,
    infos: Vec<SystemInfo>,
    sets: Vec<SystemSetInfo>,
    conditions: Vec<RunCondition>,
}

impl ScheduleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system, returning its assigned [`SystemTypeId`].
    pub fn add_system(&mut self, name: &'static str, system: system::System) -> SystemTypeId {
        let id = SystemTypeId::new(self.systems.len() as u32);
        let access = system.required_access().clone();
        self.systems.push(system);
        self.infos.push(SystemInfo::new(name, id, access));
        id
    }

    /// Registers a system set, returning its assigned [`SystemSetId`].
    pub fn add_set(&mut self, name: &'static str) -> SystemSetId {
        let id = SystemSetId::new(self.sets.len() as u32);
        self.sets.push(SystemSetInfo::new(name, id));
        id
    }

    /// Adds `system` as a member of `set`.
    pub fn add_to_set(&mut self, system: SystemTypeId, set: SystemSetId) {
        self.infos[system.index()].sets.push(set);
        self.sets[set.index()].members.push(system);
    }

    /// Declares that `before` must run before `after`.
    pub fn order_systems(&mut self, before: SystemTypeId, after: SystemTypeId) {
        self.infos[before.index()].before.push(after);
        self.infos[after.index()].after.push(before);
    }

    /// Declares that `before` must run before `after` at the set level. Lowered to
    /// system-level edges (cross product of member systems) when the scheduler builds
    /// its plan.
    pub fn order_sets(&mut self, before: SystemSetId, after: SystemSetId) {
        self.sets[before.index()].before.push(after);
        self.sets[after.index()].after.push(before);
    }

    /// Registers a run condition, returning its index in the condition table.
    pub fn add_condition(&mut self, condition: RunCondition) -> usize {
        self.conditions.push(condition);
        self.conditions.len() - 1
    }

    /// Gates `system` on `condition`, in addition to any conditions already attached.
    pub fn condition_system(&mut self, system: SystemTypeId, condition: usize) {
        self.infos[system.index()].conditions.push(condition);
    }

    /// Gates every member of `set` on `condition`.
    pub fn condition_set(&mut self, set: SystemSetId, condition: usize) {
        self.sets[set.index()].conditions.push(condition);
    }

    /// All registered systems, indexed by [`SystemTypeId`].
    #[inline]
    pub fn systems(&self) -> &[system::System] {
        &self.systems
    }

    /// All registered systems, indexed by [`SystemTypeId`] (mutable).
    #[inline]
    pub fn systems_mut(&mut self) -> &mut [system::System] {
        &mut self.systems
    }

    /// All per-system metadata, indexed by [`SystemTypeId`].
    #[inline]
    pub fn infos(&self) -> &[SystemInfo] {
        &self.infos
    }

    /// All per-set metadata, indexed by [`SystemSetId`].
    #[inline]
    pub fn sets(&self) -> &[SystemSetInfo] {
        &self.sets
    }

    /// Evaluates whether `system` should run this tick: all of its own conditions and all
    /// conditions attached to any set it belongs to must pass. A system with no conditions
    /// (directly or via its sets) always runs.
    pub fn evaluate(&self, system: SystemTypeId, world: &world::World) -> bool {
        let info = &self.infos[system.index()];
        if !info.conditions.iter().all(|&idx| (self.conditions[idx])(world)) {
            return false;
        }
        info.sets.iter().all(|&set_id| {
            self.sets[set_id.index()]
                .conditions
                .iter()
                .all(|&idx| (self.conditions[idx])(world))
        })
    }
}

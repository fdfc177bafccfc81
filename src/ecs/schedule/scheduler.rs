//! Scheduler: builds a level-by-level execution order from a [`ScheduleRegistry`] and
//! runs it against a world.
//!
//! Where [`plan::GraphColorPlanner`](super::plan::GraphColorPlanner) answers "which systems
//! can run in the same instant", the scheduler answers the question it doesn't: "which
//! systems must run before which others". It builds a DAG from explicit `before`/`after`
//! edges (including set-membership edges, lowered to their member systems) plus a
//! deterministic tie-break edge between every pair of systems whose access conflicts but
//! whose order the DAG doesn't already fix, levels the DAG with Kahn's algorithm, and then
//! hands each level's systems to the existing coloring planner to split into parallel groups.
//!
//! Exclusive systems (`world_mut() == true`) conflict with everything, including each other
//! (see [`world::AccessRequest::conflicts_with`]), so the tie-break step alone guarantees
//! they land alone in their own level - no separate barrier-insertion pass is needed.

use std::collections::VecDeque;
use std::fmt;

use crate::{
    core::tasks,
    ecs::{
        schedule::{
            phase,
            plan::{GraphColorPlanner, Planner, Task},
            registry::{ScheduleRegistry, SystemTypeId},
        },
        system::CommandBuffer,
        world,
    },
};

/// Errors that can occur while building or running a schedule.
///
/// See spec's error taxonomy: `Configuration` is fatal at build time; the others are raised
/// during a tick rather than during [`Scheduler::build`].
#[derive(Debug)]
pub enum ScheduleError {
    /// The system ordering graph has a cycle, or contains a conflicting pair of systems
    /// that cannot be ordered relative to each other. Fatal - the schedule cannot run.
    Configuration(String),

    /// A system accessed world state beyond what its declared [`world::AccessPolicy`]
    /// grants. Fatal in debug builds; undefined behavior in release.
    AccessViolation(String),

    /// An operation referenced an entity that no longer exists. Recovered locally by the
    /// accessor that detects it (returns `None`/no-op); this variant exists for completeness
    /// of the taxonomy and is not expected to propagate out of the scheduler itself.
    EntityStale(String),

    /// A system or condition accessed a resource that was never installed. Fatal.
    ResourceMissing(String),

    /// Applying a buffered command failed (e.g. a despawn targeting an already-dead
    /// entity during flush). Logged via `log::warn!` and skipped, never fatal - this
    /// variant exists for completeness and is not raised by [`Scheduler`] directly, since
    /// [`CommandBuffer::flush`] handles the disposition inline.
    CommandApply(String),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScheduleError::Configuration(msg) => write!(f, "schedule configuration error: {msg}"),
            ScheduleError::AccessViolation(msg) => write!(f, "access violation: {msg}"),
            ScheduleError::EntityStale(msg) => write!(f, "stale entity: {msg}"),
            ScheduleError::ResourceMissing(msg) => write!(f, "missing resource: {msg}"),
            ScheduleError::CommandApply(msg) => write!(f, "command apply error: {msg}"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// A level-by-level, scheduler-owned execution order for one schedule.
///
/// Built once via [`Scheduler::build`] from a [`ScheduleRegistry`]; rebuilding is required
/// after registering new systems, sets, or orderings (no incremental update is attempted -
/// matching `plan.rs`'s own all-at-once `Planner::plan` contract).
pub struct Scheduler {
    registry: ScheduleRegistry,
    levels: Vec<Vec<usize>>,
    planner: Box<dyn Planner>,
}

impl Scheduler {
    /// Builds a scheduler from a registry, performing edge lowering, cycle detection,
    /// conflict tie-breaking, and Kahn leveling.
    ///
    /// Returns [`ScheduleError::Configuration`] if the ordering graph has a cycle, naming
    /// every system in it.
    pub fn build(registry: ScheduleRegistry) -> Result<Self, ScheduleError> {
        let n = registry.infos().len();
        let mut edges = lower_edges(&registry);

        if let Some(cycle) = detect_cycle(n, &edges) {
            let names: Vec<&str> = cycle.iter().map(|&i| registry.infos()[i].name()).collect();
            return Err(ScheduleError::Configuration(format!(
                "cycle in system ordering: {}",
                names.join(" -> ")
            )));
        }

        add_conflict_edges(&registry, &mut edges);

        // A conflict tie-break edge could in principle create a cycle if the conflicting
        // pair was already ordered transitively the other way; `add_conflict_edges` only
        // adds an edge when neither direction is already reachable, so this is unreachable
        // by construction, but check again since it's cheap and this is the last place a
        // cycle could be silently introduced.
        if let Some(cycle) = detect_cycle(n, &edges) {
            let names: Vec<&str> = cycle.iter().map(|&i| registry.infos()[i].name()).collect();
            return Err(ScheduleError::Configuration(format!(
                "cycle introduced by conflict tie-break: {}",
                names.join(" -> ")
            )));
        }

        let levels = kahn_levels(n, &edges);

        Ok(Self {
            registry,
            levels,
            planner: Box::new(GraphColorPlanner::WELSH_POWELL),
        })
    }

    /// Overrides the planner used to subdivide each level into parallel groups. Defaults
    /// to [`GraphColorPlanner::WELSH_POWELL`](super::plan::GraphColorPlanner).
    pub fn with_planner(mut self, planner: Box<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    /// The levels this scheduler will execute, as lists of [`SystemTypeId`] indices.
    /// Exposed mainly for tests and debugging.
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// A reference to the underlying registry.
    pub fn registry(&self) -> &ScheduleRegistry {
        &self.registry
    }

    /// Runs every level in order against `world`.
    ///
    /// For each level: run conditions are evaluated first, skipping failing systems
    /// without touching their command buffer; survivors dispatch through the configured
    /// planner (reusing [`phase::run_group`] for the actual parallel execution); the
    /// level's command buffers are then flushed in ascending [`SystemTypeId`] order before
    /// the next level starts.
    pub fn run(&mut self, world: &mut world::World, executor: &tasks::Executor) {
        let buffers: Vec<CommandBuffer> = (0..self.registry.systems().len())
            .map(|_| CommandBuffer::new())
            .collect();

        for level in &self.levels {
            let active: Vec<usize> = level
                .iter()
                .copied()
                .filter(|&idx| self.registry.evaluate(SystemTypeId::new(idx as u32), world))
                .collect();

            if active.is_empty() {
                continue;
            }

            if active.len() == 1 && !self.registry.systems()[active[0]].is_parallel() {
                // SAFETY: exclusive systems are isolated to a singleton level by the
                // conflict tie-break step, so no other system is executing concurrently.
                unsafe {
                    self.registry.systems_mut()[active[0]].run_exclusive(world);
                }
                continue;
            }

            let tasks: Vec<Task> = active
                .iter()
                .map(|&idx| Task::new(idx, self.registry.systems()[idx].required_access().clone()))
                .collect();
            let groups = self.planner.plan(&tasks);

            for group in &groups {
                phase::run_group(self.registry.systems_mut(), world, group, &buffers, executor);
            }

            for &idx in &active {
                buffers[idx].flush(world);
            }
        }
    }
}

/// Expands every ordering constraint into system-index edges `(before, after)`.
///
/// Set-level edges are lowered via the cross product of both sets' member systems, per
/// spec's edge-lowering step.
fn lower_edges(registry: &ScheduleRegistry) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();

    for info in registry.infos() {
        for &after in info.before() {
            edges.push((info.id().index(), after.index()));
        }
    }

    for set in registry.sets() {
        for &after_set in set.before() {
            let after_members = registry.sets()[after_set.index()].members();
            for &before_sys in set.members() {
                for &after_sys in after_members {
                    edges.push((before_sys.index(), after_sys.index()));
                }
            }
        }
    }

    edges
}

/// Depth-first cycle detection over `n` nodes and the given edges. Returns the cycle's
/// node indices (in traversal order) if one exists.
fn detect_cycle(n: usize, edges: &[(usize, usize)]) -> Option<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); n];
    for &(from, to) in edges {
        adjacency[from].push(to);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InStack,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; n];
    let mut stack = Vec::new();

    fn visit(
        node: usize,
        adjacency: &[Vec<usize>],
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        match marks[node] {
            Mark::Done => return None,
            Mark::InStack => {
                let start = stack.iter().position(|&n| n == node).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(node);
                return Some(cycle);
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::InStack;
        stack.push(node);
        for &next in &adjacency[node] {
            if let Some(cycle) = visit(next, adjacency, marks, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        marks[node] = Mark::Done;
        None
    }

    for node in 0..n {
        if marks[node] == Mark::Unvisited {
            if let Some(cycle) = visit(node, &adjacency, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }

    None
}

/// Breadth-first reachability: is `to` reachable from `from` via the given edges?
fn reachable(n: usize, edges: &[(usize, usize)], from: usize, to: usize) -> bool {
    let mut adjacency = vec![Vec::new(); n];
    for &(a, b) in edges {
        adjacency[a].push(b);
    }

    let mut visited = vec![false; n];
    let mut queue = VecDeque::from([from]);
    visited[from] = true;

    while let Some(node) = queue.pop_front() {
        if node == to {
            return true;
        }
        for &next in &adjacency[node] {
            if !visited[next] {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }

    false
}

/// Adds a deterministic ordering edge for every unordered conflicting pair of systems.
///
/// A pair is "unordered" if neither system is transitively reachable from the other in
/// the edges built so far. The edge direction is decided by `(name, id)` lexicographic
/// order, so the same registry always produces the same schedule.
fn add_conflict_edges(registry: &ScheduleRegistry, edges: &mut Vec<(usize, usize)>) {
    let infos = registry.infos();
    let n = infos.len();

    for i in 0..n {
        for j in (i + 1)..n {
            if !infos[i].access().conflicts_with(infos[j].access()) {
                continue;
            }
            if reachable(n, edges, i, j) || reachable(n, edges, j, i) {
                continue;
            }

            let (before, after) = if (infos[i].name(), infos[i].id()) <= (infos[j].name(), infos[j].id())
            {
                (i, j)
            } else {
                (j, i)
            };
            edges.push((before, after));
        }
    }
}

/// Kahn's algorithm with longest-path level assignment: `level[v] = max(level[v], level[u] + 1)`
/// for every edge `u -> v` processed. Guarantees `level(before) < level(after)` for every edge.
fn kahn_levels(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let mut adjacency = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for &(from, to) in edges {
        adjacency[from].push(to);
        in_degree[to] += 1;
    }

    let mut level = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut remaining = in_degree.clone();
    let mut visited = 0;

    while let Some(node) = queue.pop_front() {
        visited += 1;
        for &next in &adjacency[node] {
            level[next] = level[next].max(level[node] + 1);
            remaining[next] -= 1;
            if remaining[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    debug_assert_eq!(visited, n, "kahn_levels called on a graph with a cycle");

    let max_level = level.iter().copied().max().unwrap_or(0);
    let mut levels = vec![Vec::new(); max_level + 1];
    for (idx, &lvl) in level.iter().enumerate() {
        levels[lvl].push(idx);
    }
    levels
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    };

    use rusty_macros::{Component, Unique};

    use super::*;
    use crate::ecs::system::{Commands, IntoSystem, param::Query};

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[test]
    fn independent_systems_share_a_level() {
        let mut world = world::World::new(world::Id::new(0));
        let mut registry = ScheduleRegistry::new();
        registry.add_system("a", (|| {}).into_system(&mut world));
        registry.add_system("b", (|| {}).into_system(&mut world));

        let scheduler = Scheduler::build(registry).unwrap();
        assert_eq!(scheduler.levels().len(), 1);
        assert_eq!(scheduler.levels()[0].len(), 2);
    }

    #[test]
    fn explicit_order_forces_separate_levels() {
        let mut world = world::World::new(world::Id::new(0));
        let mut registry = ScheduleRegistry::new();
        let a = registry.add_system("a", (|| {}).into_system(&mut world));
        let b = registry.add_system("b", (|| {}).into_system(&mut world));
        registry.order_systems(a, b);

        let scheduler = Scheduler::build(registry).unwrap();
        assert_eq!(scheduler.levels().len(), 2);
        assert_eq!(scheduler.levels()[0], vec![a.index()]);
        assert_eq!(scheduler.levels()[1], vec![b.index()]);
    }

    #[test]
    fn conflicting_systems_without_explicit_order_still_separate() {
        let mut world = world::World::new(world::Id::new(0));
        world.spawn(Position { x: 0.0, y: 0.0 });

        let mut registry = ScheduleRegistry::new();
        let writer =
            registry.add_system("writer", (|_q: Query<&mut Position>| {}).into_system(&mut world));
        let reader =
            registry.add_system("reader", (|_q: Query<&Position>| {}).into_system(&mut world));

        let scheduler = Scheduler::build(registry).unwrap();
        assert_eq!(scheduler.levels().len(), 2, "conflicting systems must land in different levels");
    }

    #[test]
    fn cycle_is_rejected_at_build() {
        let mut world = world::World::new(world::Id::new(0));
        let mut registry = ScheduleRegistry::new();
        let a = registry.add_system("a", (|| {}).into_system(&mut world));
        let b = registry.add_system("b", (|| {}).into_system(&mut world));
        registry.order_systems(a, b);
        registry.order_systems(b, a);

        let result = Scheduler::build(registry);
        assert!(matches!(result, Err(ScheduleError::Configuration(_))));
    }

    #[test]
    fn exclusive_system_lands_in_singleton_level() {
        let mut world = world::World::new(world::Id::new(0));
        let mut registry = ScheduleRegistry::new();
        registry.add_system("parallel_a", (|| {}).into_system(&mut world));
        registry.add_system(
            "exclusive",
            (|_w: &mut world::World| {}).into_system(&mut world),
        );
        registry.add_system("parallel_b", (|| {}).into_system(&mut world));

        let scheduler = Scheduler::build(registry).unwrap();
        let exclusive_level = scheduler
            .levels()
            .iter()
            .find(|lvl| lvl.len() == 1 && !scheduler.registry().systems()[lvl[0]].is_parallel());
        assert!(exclusive_level.is_some(), "exclusive system should be alone in its level");
    }

    #[test]
    fn set_ordering_lowers_to_member_system_edges() {
        let mut world = world::World::new(world::Id::new(0));
        let mut registry = ScheduleRegistry::new();
        let a = registry.add_system("a", (|| {}).into_system(&mut world));
        let b = registry.add_system("b", (|| {}).into_system(&mut world));

        let early = registry.add_set("early");
        let late = registry.add_set("late");
        registry.add_to_set(a, early);
        registry.add_to_set(b, late);
        registry.order_sets(early, late);

        let scheduler = Scheduler::build(registry).unwrap();
        assert_eq!(scheduler.levels().len(), 2);
        assert_eq!(scheduler.levels()[0], vec![a.index()]);
        assert_eq!(scheduler.levels()[1], vec![b.index()]);
    }

    #[test]
    fn run_executes_all_levels() {
        let mut world = world::World::new(world::Id::new(0));
        let mut registry = ScheduleRegistry::new();

        let order = Arc::new(Mutex::new(Vec::new()));
        let order1 = Arc::clone(&order);
        let order2 = Arc::clone(&order);

        let first = registry.add_system(
            "first",
            (move || order1.lock().unwrap().push("first")).into_system(&mut world),
        );
        let second = registry.add_system(
            "second",
            (move || order2.lock().unwrap().push("second")).into_system(&mut world),
        );
        registry.order_systems(first, second);

        let mut scheduler = Scheduler::build(registry).unwrap();
        let executor = tasks::Executor::new(2);
        scheduler.run(&mut world, &executor);

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn run_condition_skips_system_without_touching_its_buffer() {
        let mut world = world::World::new(world::Id::new(0));

        #[derive(Unique)]
        struct Enabled(bool);
        world.add_unique(Enabled(false));

        let mut registry = ScheduleRegistry::new();
        let spawner = registry.add_system(
            "spawner",
            (|commands: Commands| {
                commands.spawn(Position { x: 0.0, y: 0.0 });
            })
            .into_system(&mut world),
        );
        let gate = registry.add_condition(Box::new(|w: &world::World| {
            w.get_unique::<Enabled>().unwrap().0
        }));
        registry.condition_system(spawner, gate);

        let mut scheduler = Scheduler::build(registry).unwrap();
        let executor = tasks::Executor::new(1);

        scheduler.run(&mut world, &executor);
        assert_eq!(world.storage().entities().len(), 0, "gated system must not run");

        world.get_unique_mut::<Enabled>().unwrap().0 = true;
        scheduler.run(&mut world, &executor);
        assert_eq!(world.storage().entities().len(), 1, "system runs once ungated");
    }

    #[test]
    fn run_counts_skipped_executions_via_external_counter() {
        let mut world = world::World::new(world::Id::new(0));
        let counter = Arc::new(AtomicU64::new(0));
        let counter_clone = Arc::clone(&counter);

        let mut registry = ScheduleRegistry::new();
        registry.add_system(
            "counted",
            (move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            })
            .into_system(&mut world),
        );

        let mut scheduler = Scheduler::build(registry).unwrap();
        let executor = tasks::Executor::new(1);
        scheduler.run(&mut world, &executor);
        scheduler.run(&mut world, &executor);

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn velocity_integration_pipeline_is_deterministic_across_ticks() {
        let mut world = world::World::new(world::Id::new(0));
        world.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 2.0 }));

        let mut registry = ScheduleRegistry::new();
        registry.add_system(
            "integrate",
            (|q: Query<(&mut Position, &Velocity)>| {
                for (pos, vel) in q {
                    pos.x += vel.dx;
                    pos.y += vel.dy;
                }
            })
            .into_system(&mut world),
        );

        let mut scheduler = Scheduler::build(registry).unwrap();
        let executor = tasks::Executor::new(2);
        scheduler.run(&mut world, &executor);
        scheduler.run(&mut world, &executor);

        let positions: Vec<Position> = world.query::<&Position>().cloned().collect();
        assert_eq!(positions, vec![Position { x: 2.0, y: 4.0 }]);
    }
}

/// End-to-end scenarios exercising the scheduler against a real world rather than just
/// inspecting the levels it builds.
#[cfg(test)]
mod end_to_end_scenarios {
    use rusty_macros::{Component, Unique};

    use super::*;
    use crate::ecs::system::{
        Commands, IntoSystem,
        param::{Query, UniqMut},
    };

    #[derive(Component)]
    struct Pos {
        #[allow(dead_code)]
        x: f32,
    }

    #[test]
    fn ordering_pipeline_yields_expected_value() {
        #[derive(Unique)]
        struct R(i32);

        let mut world = world::World::new(world::Id::new(0));
        world.add_unique(R(0));

        let mut registry = ScheduleRegistry::new();
        let a = registry.add_system(
            "A",
            (|mut r: UniqMut<R>| r.0 = 1).into_system(&mut world),
        );
        let b = registry.add_system(
            "B",
            (|mut r: UniqMut<R>| r.0 += 2).into_system(&mut world),
        );
        let c = registry.add_system(
            "C",
            (|mut r: UniqMut<R>| r.0 *= 10).into_system(&mut world),
        );
        registry.order_systems(a, b);
        registry.order_systems(b, c);

        let mut scheduler = Scheduler::build(registry).unwrap();
        scheduler.run(&mut world, &tasks::Executor::new(2));

        assert_eq!(world.get_unique::<R>().unwrap().0, 30);
    }

    #[test]
    fn conflicting_readers_share_a_level_writer_is_isolated_after() {
        let mut world = world::World::new(world::Id::new(0));
        world.spawn(Pos { x: 0.0 });

        let mut registry = ScheduleRegistry::new();
        let read1 =
            registry.add_system("Read1", (|_q: Query<&Pos>| {}).into_system(&mut world));
        let read2 =
            registry.add_system("Read2", (|_q: Query<&Pos>| {}).into_system(&mut world));
        let write_pos = registry
            .add_system("WritePos", (|_q: Query<&mut Pos>| {}).into_system(&mut world));

        let scheduler = Scheduler::build(registry).unwrap();
        assert_eq!(scheduler.levels().len(), 2);
        assert_eq!(
            scheduler.levels()[0].iter().copied().collect::<std::collections::HashSet<_>>(),
            std::collections::HashSet::from([read1.index(), read2.index()]),
        );
        assert_eq!(scheduler.levels()[1], vec![write_pos.index()]);
    }

    #[test]
    fn command_buffer_flush_makes_spawned_entity_visible_to_a_later_system() {
        #[derive(Component)]
        struct Tag;

        #[derive(Unique)]
        struct TagCount(usize);

        let mut world = world::World::new(world::Id::new(0));
        world.add_unique(TagCount(0));

        let mut registry = ScheduleRegistry::new();
        let spawner = registry.add_system(
            "Spawner",
            (|commands: Commands| {
                commands.spawn(Tag);
            })
            .into_system(&mut world),
        );
        let counter = registry.add_system(
            "Counter",
            (|q: Query<&Tag>, mut count: UniqMut<TagCount>| {
                count.0 = q.count();
            })
            .into_system(&mut world),
        );
        registry.order_systems(spawner, counter);

        let mut scheduler = Scheduler::build(registry).unwrap();
        scheduler.run(&mut world, &tasks::Executor::new(2));

        assert_eq!(world.get_unique::<TagCount>().unwrap().0, 1);
    }

    #[test]
    fn run_condition_gated_system_fires_twice_in_twenty_five_ticks() {
        #[derive(Unique)]
        struct Clock {
            elapsed: f64,
        }

        #[derive(Unique)]
        struct ExecCount(u32);

        let mut world = world::World::new(world::Id::new(0));
        world.add_unique(Clock { elapsed: 0.0 });
        world.add_unique(ExecCount(0));

        let mut registry = ScheduleRegistry::new();
        let tick = registry.add_system(
            "OncePerSecond",
            (|mut clock: UniqMut<Clock>, mut count: UniqMut<ExecCount>| {
                clock.elapsed -= 1.0;
                count.0 += 1;
            })
            .into_system(&mut world),
        );
        let elapsed_at_least_one_second =
            registry.add_condition(Box::new(|w: &world::World| {
                w.get_unique::<Clock>().unwrap().elapsed >= 1.0
            }));
        registry.condition_system(tick, elapsed_at_least_one_second);

        let mut scheduler = Scheduler::build(registry).unwrap();
        let executor = tasks::Executor::new(1);

        for _ in 0..25 {
            world.get_unique_mut::<Clock>().unwrap().elapsed += 0.1;
            scheduler.run(&mut world, &executor);
        }

        assert_eq!(world.get_unique::<ExecCount>().unwrap().0, 2);
    }

    #[test]
    fn despawned_entity_is_absent_but_not_fatal_on_next_tick() {
        let mut world = world::World::new(world::Id::new(0));
        let stale = world.spawn(Pos { x: 1.0 });
        world.spawn(Pos { x: 9.0 });

        let mut despawn_tick = ScheduleRegistry::new();
        despawn_tick.add_system(
            "despawn_it",
            (move |commands: Commands| {
                commands.despawn(stale);
            })
            .into_system(&mut world),
        );
        Scheduler::build(despawn_tick)
            .unwrap()
            .run(&mut world, &tasks::Executor::new(1));

        #[derive(Unique)]
        struct StaleLookup(bool);
        world.add_unique(StaleLookup(true));

        let mut next_tick = ScheduleRegistry::new();
        next_tick.add_system(
            "get_stale",
            (move |w: &mut world::World| {
                let found = w.entity(stale).is_some();
                w.get_unique_mut::<StaleLookup>().unwrap().0 = found;
            })
            .into_system(&mut world),
        );
        Scheduler::build(next_tick)
            .unwrap()
            .run(&mut world, &tasks::Executor::new(1));

        assert!(!world.get_unique::<StaleLookup>().unwrap().0, "stale entity must read as absent");
        assert_eq!(world.query::<&Pos>().count(), 1, "world is otherwise unmodified");
    }

    #[test]
    fn exclusive_system_is_isolated_from_every_other_update_system() {
        let mut world = world::World::new(world::Id::new(0));

        let mut registry = ScheduleRegistry::new();
        let before =
            registry.add_system("before_reset", (|| {}).into_system(&mut world));
        let reset = registry.add_system(
            "Reset",
            (|_w: &mut world::World| {}).into_system(&mut world),
        );
        let after = registry.add_system("after_reset", (|| {}).into_system(&mut world));

        let scheduler = Scheduler::build(registry).unwrap();
        let reset_level = scheduler
            .levels()
            .iter()
            .position(|lvl| lvl == &vec![reset.index()])
            .expect("Reset must occupy a singleton level");

        let other_level = |sys: SystemTypeId| {
            scheduler
                .levels()
                .iter()
                .position(|lvl| lvl.contains(&sys.index()))
                .expect("system must appear in some level")
        };
        assert_ne!(other_level(before), reset_level, "before_reset must not share Reset's level");
        assert_ne!(other_level(after), reset_level, "after_reset must not share Reset's level");
    }
}

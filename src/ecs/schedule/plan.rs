use std::marker::PhantomData;

use crate::ecs::world;

/// Trait for planning the execution of systems in an ECS schedule phase.
///
/// The input to the planner is a list of systems with their world resource access requirements.
///
/// The output is an optimized execution plan that defines the order and grouping of systems
pub trait Planner {
    fn plan(&self, tasks: &[Task]) -> Vec<Group>;
}

/// A task represents a single system to be scheduled for execution.
///
/// Each task consists of a system index (within its phase) and its world resource access requirements.
/// The planner uses these requirements to determine which tasks can run in parallel
/// without violating Rust's aliasing rules.
#[derive(Debug, Clone)]
pub struct Task {
    /// The system id for this task.
    system_index: usize,

    /// The required access to run this system.
    required_access: world::AccessRequest,
}

impl Task {
    /// Create a new Task with the given system index and required access.
    pub fn new(system_index: usize, required_access: world::AccessRequest) -> Self {
        Self {
            system_index,
            required_access,
        }
    }
}

/// A unit of work in the execution plan containing one or more tasks with identical resource requirements.
///
/// # Purpose
///
/// Units bundle tasks that require exactly the same world resource access. This optimization provides:
/// - **Reduced synchronization overhead**: Resources are acquired once for the entire unit
/// - **Improved cache locality**: Sequential execution keeps data hot in CPU caches
/// - **Fewer borrow operations**: Single borrow covers all tasks in the unit
///
/// # Execution Model
///
/// Tasks within a unit execute **sequentially** with shared resource access. The executor will:
/// 1. Acquire the required resources from the world once
/// 2. Execute each task in order with the same resources
/// 3. Release resources after all tasks complete
///
/// # Example
///
/// ```rust,ignore
/// // Three physics systems all need (read Position, write Velocity)
/// // They get bundled into one unit:
/// let unit = Unit {
///     system_ids: vec![apply_gravity, apply_wind, apply_friction],
///     required_access: AccessRequest::to_components(pos_read, vel_write)
/// };
///
/// // At runtime, this unit acquires resources once:
/// let (pos, vel) = world.borrow_resources(&unit.required_access);
/// for system_id in unit.system_ids {
///     execute_system(system_id, pos, vel);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Unit {
    /// The system index for this unit.
    system_indexes: Vec<usize>,

    /// The required access to run all systems in this unit.
    required_access: world::AccessRequest,
}

impl Unit {
    /// Create a new Unit with the given system ids and required access.
    #[inline]
    pub const fn new(system_indexes: Vec<usize>, required_access: world::AccessRequest) -> Self {
        Self {
            system_indexes,
            required_access,
        }
    }

    /// Create a unit that is a single task.
    #[inline]
    pub fn single(task: Task) -> Self {
        Self::new(vec![task.system_index], task.required_access)
    }

    /// Add a task to this unit.
    ///
    /// # Note
    ///
    /// The caller must ensure the task has identical resource requirements to existing tasks.
    #[inline]
    pub fn add_task(&mut self, task: Task) {
        self.system_indexes.push(task.system_index);
    }

    /// Returns `true` if this unit requires mutable world access.
    ///
    /// Units requiring mutable world access cannot run in parallel with any other units
    /// and are typically prioritized to run first in the schedule.
    #[inline]
    pub fn is_world_mut(&self) -> bool {
        self.required_access.world_mut()
    }

    /// Get the system ids in this unit.
    #[inline]
    pub fn system_indexes(&self) -> &[usize] {
        self.system_indexes.as_slice()
    }

    /// Get the required access for this unit.
    #[inline]
    pub fn required_access(&self) -> &world::AccessRequest {
        &self.required_access
    }
}

/// Converts a list of tasks into units by bundling tasks with identical resource requirements.
///
/// This is the first phase of the scheduling algorithm. Tasks that require exactly the same
/// world resource access are grouped into units, allowing them to share a single resource
/// acquisition and maintain cache locality during execution.
///
/// # Algorithm
///
/// 1. Create a unit for the first task
/// 2. For each remaining task:
///    - If a unit with matching access exists, add task to that unit
///    - Otherwise, create a new unit for the task
///
/// # Performance
///
/// Time: O(n × u) where n = tasks, u = unique access patterns
/// Space: O(n)
///
/// In typical ECS workloads, u << n (many systems share access patterns), making this
/// effectively O(n) in practice.
///
/// # Example
///
/// ```rust,ignore
/// let tasks = vec![
///     Task::new(sys1, read_position),      // Group A
///     Task::new(sys2, read_position),      // Group A (same access)
///     Task::new(sys3, write_velocity),     // Group B (different access)
/// ];
///
/// let units = unitize(&tasks);
/// assert_eq!(units.len(), 2);  // Two distinct access patterns
/// assert_eq!(units[0].system_ids.len(), 2);  // First unit has 2 tasks
/// ```
pub fn unitize(tasks: &[Task]) -> Vec<Unit> {
    if tasks.is_empty() {
        return Vec::new();
    }

    let mut units = Vec::new();
    // Create initial unit from first task
    units.push(Unit::single(tasks[0].clone()));

    // Bundle remaining tasks with matching units
    for task in tasks.iter().skip(1) {
        // Ensure no exclusive tasks get into the parallel units execution plan.
        debug_assert!(
            !task.required_access.world_mut(),
            "World mutable tasks should not be bundled into units."
        );

        let mut found_unit = false;
        for unit in units.iter_mut() {
            // If we have the exact same requirements, we can add to this unit
            if unit.required_access == task.required_access {
                unit.add_task(task.clone());
                found_unit = true;
                break;
            }
        }

        if !found_unit {
            // Create a new unit for this task
            units.push(Unit::single(task.clone()))
        }
    }

    units
}

/// Prioritizes units based on their world access requirements and scheduling difficulty.
///
/// This ordering heuristic improves the greedy graph coloring algorithm by processing
/// "harder to schedule" units first, typically resulting in fewer parallel groups.
///
/// # Priority Order (highest to lowest)
///
/// 1. **Mutable world access** - Cannot run with anything else, highest priority
/// 2. **Immutable world access** - Conflicts with any mutable access
/// 3. **Component access by difficulty**:
///    - Mutable component access scores higher (conflicts with both reads and writes)
///    - More components = higher score (more potential conflicts)
///    - Scoring: mutable_count × 2 + immutable_count
///
/// # Rationale
///
/// Scheduling constrained units first gives the greedy algorithm more options for placing
/// less-constrained units later. Units requiring exclusive world access will naturally
/// form their own groups and execute first.
///
/// # Example
///
/// ```rust,ignore
/// let mut units = vec![
///     Unit::new([sys1], AccessRequest::NONE),                    // Priority: 0
///     Unit::new([sys2], read_position),                          // Priority: 1  
///     Unit::new([sys3], write_velocity),                         // Priority: 2
///     Unit::new([sys4], read_pos_write_vel),                     // Priority: 3
///     Unit::new([sys5], AccessRequest::to_world(false)),         // Priority: MAX-1
/// ];
///
/// prioritize(&mut units);
/// // Result: [sys6, sys5, sys4, sys3, sys2, sys1]
/// ```
pub fn prioritize(units: &mut [Unit]) {
    fn difficulty(unit: &Unit) -> u32 {
        // Immutable world access conflicts with all mutable component access
        if unit.required_access.world() {
            return u32::MAX;
        }

        // Component-level access: score by potential conflicts
        // Mutable access conflicts with both reads and writes, so weight it higher
        let mut score = 0;
        score += unit.required_access.resources_len() as u32; // Immutable: 1 point each
        score += unit.required_access.resources_mut_len() as u32 * 2; // Mutable: 2 points each
        score
    }

    // Sort in descending order (highest difficulty first)
    units.sort_by_key(|u| std::cmp::Reverse(difficulty(u)));
}

/// A group of units that can execute in parallel without resource conflicts.
///
/// # Execution Model
///
/// Groups represent a "wave" of parallelism in the schedule. All units within a group:
/// - Have **no resource conflicts** with each other (verified by conflict detection)
/// - Can execute **simultaneously** on different threads
/// - Must **complete** before the next group begins
///
/// # Structure
///
/// - **Within a unit**:
///     - Tasks with mutable access execute sequentially with shared resource access
///     - Tasks with immutable access can potentially execute in parallel within the unit
/// - **Within a group**: Units execute in parallel (on separate threads)
/// - **Across groups**: Groups execute sequentially (barriers between groups)
///
/// # Example Execution
///
/// ```text
/// Group 1 (parallel):                Group 2 (parallel):
///   ┌─────────────┐                    ┌─────────────┐
///   │ Unit A      │                    │ Unit D      │
///   │  - System 1 │ ──┐                │  - System 7 │
///   │  - System 2 │   │                └─────────────┘
///   └─────────────┘   │ Barrier
///   ┌─────────────┐   │                ┌─────────────┐
///   │ Unit B      │   │                │ Unit E      │
///   │  - System 3 │ ──┘                │  - System 8 │
///   └─────────────┘                    │  - System 9 │
///   ┌─────────────┐                    └─────────────┘
///   │ Unit C      │
///   │  - System 4 │
///   │  - System 5 │
///   │  - System 6 │
///   └─────────────┘
/// ```
///
/// # Relationship to Units
///
/// Groups contain units (not individual tasks) because:
/// - Units handle sequential execution with resource sharing
/// - Groups handle parallel execution with conflict-free resources
/// - This two-level structure optimizes both cache locality (units) and parallelism (groups)
///
/// # Special Cases
///
/// - **Empty group**: Not allowed (should not be created by planner)
/// - **Single-unit group**: Valid - represents sequential bottleneck
/// - **Units with `AccessRequest::NONE`**: Can be placed in any group (no conflicts)
#[derive(Debug, Clone)]
pub struct Group {
    units: Vec<Unit>,
}

impl Group {
    /// Create a new Group with the given units.
    #[inline]
    pub const fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    /// Create a group that is a single unit.
    #[inline]
    pub fn single(unit: Unit) -> Self {
        Self::new(vec![unit])
    }

    /// Push a unit to this group.
    #[inline]
    pub fn push(&mut self, unit: Unit) {
        self.units.push(unit);
    }

    /// Get the units in this group.
    pub fn units(&self) -> &[Unit] {
        &self.units
    }
}

/// A simple sequential planner that creates one group per unit.
///
/// This planner provides no parallelism but still benefits from unit bundling:
/// - Tasks with identical access are bundled into units
/// - Each unit becomes its own sequential group
/// - Resource acquisition overhead is reduced via bundling
///
/// # Use Cases
///
/// - Single-threaded platforms
/// - Debugging (deterministic execution order)
/// - Baseline for benchmarking parallel schedulers
/// - Systems that cannot be parallelized safely
///
/// # Performance
///
/// While this planner doesn't enable parallel execution, unit bundling still provides:
/// - Reduced borrow/release cycles
/// - Better cache locality within units
/// - Simpler execution model
pub struct SequentialPlanner;

impl Planner for SequentialPlanner {
    fn plan(&self, tasks: &[Task]) -> Vec<Group> {
        // Step 1: Bundle tasks with identical access into units
        let mut units = unitize(tasks);

        // Step 2: Prioritize units (exclusive world access first)
        prioritize(&mut units);

        // Step 3: Create one group per unit (no parallelism)
        units.into_iter().map(Group::single).collect()
    }
}

/// A graph coloring planner that uses greedy algorithms to maximize parallelism.
///
/// This planner treats scheduling as a graph coloring problem:
/// - **Nodes**: Units (bundles of tasks with identical access)
/// - **Edges**: Resource conflicts between units
/// - **Colors**: Groups (parallel execution waves)
/// - **Goal**: Minimize number of colors (maximize parallelism)
///
/// The generic parameter `Algo` selects the coloring algorithm heuristic.
pub struct GraphColorPlanner<Algo>(PhantomData<Algo>);

/// Welsh-Powell algorithm: prioritizes units by difficulty, then greedily assigns to groups.
///
/// This is a simple, fast greedy algorithm that typically produces near-optimal results.
/// It works well for ECS scheduling where conflict patterns tend to be localized.
pub struct WelshPowell;

/// DSATUR (Degree of Saturation) algorithm: dynamically selects the most constrained unit next.
///
/// This algorithm typically produces 10-30% fewer groups than Welsh-Powell but has higher
/// overhead. Not yet implemented.
#[allow(dead_code)]
struct Dsatur;

impl GraphColorPlanner<WelshPowell> {
    /// Constant instance of the Welsh-Powell planner.
    pub const WELSH_POWELL: GraphColorPlanner<WelshPowell> = GraphColorPlanner(PhantomData);
}

/// Implementation of the greedy graph coloring planner using the Welsh-Powell algorithm.
///
/// # Algorithm
///
/// 1. **Unitize**: Bundle tasks with identical access
/// 2. **Prioritize**: Sort units by difficulty (constrained units first)
/// 3. **Greedy coloring**: For each unit, place in first compatible group
///
/// # Complexity
///
/// - Time: O(n log n + u² × g) where n=tasks, u=units, g=groups
/// - Space: O(n + g)
///
/// In practice, u << n (bundling) and g is small (parallelism limited by hardware),
/// making this very efficient.
///
/// # Parallelism Quality
///
/// Welsh-Powell typically achieves 70-90% of optimal parallelism with O(n²) complexity,
/// which is excellent for typical ECS workloads (10-100 systems).
impl Planner for GraphColorPlanner<WelshPowell> {
    fn plan(&self, tasks: &[Task]) -> Vec<Group> {
        // Step 1: Bundle tasks with identical access into units
        let mut units = unitize(tasks);

        // Step 2: Prioritize units (constrained units first improves greedy algorithm)
        prioritize(&mut units);

        // Step 3: Greedy graph coloring - assign each unit to first compatible group
        let mut groups: Vec<Group> = Vec::new();
        for unit in units.into_iter() {
            // Find the first group where this unit doesn't conflict with any existing unit
            let group = groups.iter_mut().find(|group| {
                // Unit can join if it doesn't conflict with ANY unit already in the group
                !group
                    .units
                    .iter()
                    .any(|other| unit.required_access.conflicts_with(&other.required_access))
            });

            match group {
                Some(group) => {
                    // Compatible group found - add unit to it
                    group.units.push(unit);
                }
                None => {
                    // No compatible group - create new group for this unit
                    groups.push(Group::single(unit));
                }
            }
        }

        groups
    }
}

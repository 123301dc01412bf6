//! Resource carrier.
//!
//! A courier looks for resource cells, walks next to one, gathers until its
//! cargo is full or the cell is empty, carries the load back to the base and
//! delivers it. Sightings and depletions go on the bulletin so other
//! couriers can skip exploration.
//!
//! | State | Does |
//! |-------|------|
//! | `Idle` | Picks the next job: deliver, approach a known resource, or explore. |
//! | `Explore` | Walks to random waypoints until a resource is sensed. |
//! | `Approach` | Walks next to the target resource cell. |
//! | `Gather` | Collects from the target cell. |
//! | `Return` | Walks next to the base. |
//! | `Unload` | Delivers the cargo into the base. |

use std::collections::BTreeSet;
use std::sync::Arc;

use gridwalk_core::bulletin::Fact;
use gridwalk_core::tick::{Agent, TurnEnv, TurnError, TurnReport};
use gridwalk_core::{AgentState, Bulletin, Executor, Handler, HandlerTable, Transition, Turn};
use gridwalk_types::{AgentId, Direction, FollowSide, Position};
use gridwalk_world::{Cell, GridMap, closest_cell};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::{AgentTuning, CourierTuning};
use crate::walk::{self, Progress, StallGuard};

/// Courier states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierState {
    /// Choosing the next job.
    Idle,
    /// Wandering in search of resource.
    Explore,
    /// Walking to a resource cell.
    Approach,
    /// Collecting from a resource cell.
    Gather,
    /// Walking back to the base.
    Return,
    /// Delivering cargo.
    Unload,
}

impl AgentState for CourierState {
    const ALL: &'static [Self] = &[
        Self::Idle,
        Self::Explore,
        Self::Approach,
        Self::Gather,
        Self::Return,
        Self::Unload,
    ];
}

/// What a courier remembers between turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourierMemory {
    /// The base the courier was spawned for.
    pub home: Position,
    /// Current obstacle-following side.
    pub side: FollowSide,
    /// Units carried.
    pub cargo: u32,
    /// Resource cell being worked.
    pub target: Option<Position>,
    /// Exploration waypoint.
    pub waypoint: Option<Position>,
    /// Resource cell already announced on the bulletin.
    pub reported: Option<Position>,
    /// Resource cells given up on.
    pub avoid: BTreeSet<Position>,
    /// Units delivered over the courier's life.
    pub delivered: u64,
    stall: StallGuard,
}

impl CourierMemory {
    /// Fresh memory for a courier serving `home`.
    pub const fn new(home: Position, side: FollowSide, stall_turns: u32) -> Self {
        Self {
            home,
            side,
            cargo: 0,
            target: None,
            waypoint: None,
            reported: None,
            avoid: BTreeSet::new(),
            delivered: 0,
            stall: StallGuard::new(stall_turns),
        }
    }
}

/// Per-tick view handed to courier handlers.
#[derive(Debug)]
pub struct CourierCtx<'w> {
    id: AgentId,
    position: Position,
    turn: u64,
    world: &'w mut GridMap,
    bulletin: &'w mut Bulletin,
    memory: &'w mut CourierMemory,
    tuning: &'w CourierTuning,
    rng: &'w mut StdRng,
}

impl CourierCtx<'_> {
    fn can_walk(&self, direction: Direction) -> bool {
        walk::may_step(&*self.world, &*self.bulletin, self.id, direction)
    }

    /// The closest resource cell in sensing range that is not avoided.
    fn sense(&self) -> Option<Position> {
        let avoid = &self.memory.avoid;
        closest_cell(&*self.world, self.position, self.tuning.sense_radius_sq, |at, cell| {
            cell.has_resource() && !avoid.contains(&at)
        })
    }

    fn base(&self) -> Position {
        self.bulletin.base().unwrap_or(self.memory.home)
    }

    fn adopt_target(&mut self, target: Position) {
        self.memory.target = Some(target);
        self.memory.stall.reset();
    }

    fn publish(&mut self, fact: Fact) {
        self.bulletin.publish(self.turn, self.id, fact);
    }

    fn random_waypoint(&mut self) -> Position {
        let width = i32::try_from(self.world.width()).unwrap_or(i32::MAX).max(1);
        let height = i32::try_from(self.world.height()).unwrap_or(i32::MAX).max(1);
        Position::new(self.rng.random_range(0..width), self.rng.random_range(0..height))
    }
}

type CourierTurn<'t, 'w> = Turn<'t, CourierCtx<'w>>;

/// Take one navigation step toward `goal` and carry it out.
fn travel(turn: &mut CourierTurn<'_, '_>, goal: Position) -> Progress {
    let (side, position) = (turn.ctx().memory.side, turn.ctx().position);
    let step = turn.navigate(goal, side, true, position, CourierCtx::can_walk);
    let ctx = turn.ctx_mut();
    walk::follow(&mut *ctx.world, ctx.id, step)
}

fn idle(turn: &mut CourierTurn<'_, '_>) -> Transition<CourierState> {
    let ctx = turn.ctx_mut();
    if ctx.bulletin.base().is_none() {
        let home = ctx.memory.home;
        ctx.publish(Fact::BaseLocated { at: home });
    }
    if ctx.memory.cargo >= ctx.tuning.capacity {
        ctx.memory.stall.reset();
        return Transition::free(CourierState::Return);
    }
    let known = ctx
        .sense()
        .or_else(|| ctx.bulletin.nearest_sighting(ctx.position, &ctx.memory.avoid));
    if let Some(target) = known {
        debug!(agent = %ctx.id, %target, "resource target chosen");
        ctx.adopt_target(target);
        return Transition::free(CourierState::Approach);
    }
    if ctx.memory.cargo > 0 {
        ctx.memory.stall.reset();
        return Transition::free(CourierState::Return);
    }
    Transition::free(CourierState::Explore)
}

fn explore(turn: &mut CourierTurn<'_, '_>) -> Transition<CourierState> {
    let ctx = turn.ctx_mut();
    if let Some(target) = ctx.sense() {
        ctx.memory.waypoint = None;
        ctx.adopt_target(target);
        return Transition::free(CourierState::Approach);
    }
    let waypoint = match ctx.memory.waypoint {
        Some(waypoint) => waypoint,
        None => {
            let waypoint = ctx.random_waypoint();
            ctx.memory.waypoint = Some(waypoint);
            waypoint
        }
    };
    if ctx.memory.stall.tick(waypoint) {
        ctx.memory.waypoint = None;
        return Transition::acted(CourierState::Explore);
    }
    if travel(turn, waypoint) == Progress::Arrived {
        turn.ctx_mut().memory.waypoint = None;
    }
    Transition::acted(CourierState::Explore)
}

fn approach(turn: &mut CourierTurn<'_, '_>) -> Transition<CourierState> {
    let ctx = turn.ctx_mut();
    let Some(target) = ctx.memory.target else {
        return Transition::free(CourierState::Idle);
    };
    let in_view = ctx.position.distance_squared(target) <= ctx.tuning.sense_radius_sq;
    if in_view && !ctx.world.cell(target).is_some_and(Cell::has_resource) {
        debug!(agent = %ctx.id, %target, "target already empty");
        ctx.memory.target = None;
        ctx.publish(Fact::ResourceDepleted { at: target });
        return Transition::acted(CourierState::Idle);
    }
    if ctx.memory.stall.tick(target) {
        warn!(agent = %ctx.id, %target, "giving up on unreachable resource");
        ctx.memory.avoid.insert(target);
        ctx.memory.target = None;
        return Transition::acted(CourierState::Idle);
    }
    match travel(turn, target) {
        Progress::Arrived => Transition::free(CourierState::Gather),
        Progress::Moved(_) | Progress::Blocked => Transition::acted(CourierState::Approach),
    }
}

fn gather(turn: &mut CourierTurn<'_, '_>) -> Transition<CourierState> {
    let ctx = turn.ctx_mut();
    let Some(target) = ctx.memory.target else {
        return Transition::free(CourierState::Idle);
    };
    if ctx.position != target && !ctx.position.is_adjacent_to(target) {
        return Transition::free(CourierState::Approach);
    }
    let room = ctx.tuning.capacity.saturating_sub(ctx.memory.cargo);
    if room == 0 {
        ctx.memory.stall.reset();
        return Transition::free(CourierState::Return);
    }

    let direction = ctx.position.direction_to(target);
    let amount = ctx.tuning.gather_per_turn.min(room).max(1);
    match ctx.world.collect(ctx.id, direction, amount) {
        Ok(taken) => {
            ctx.memory.cargo = ctx.memory.cargo.saturating_add(taken);
            let left = ctx.world.cell(target).map_or(0, |cell| cell.resource);
            if left == 0 {
                ctx.memory.target = None;
                ctx.publish(Fact::ResourceDepleted { at: target });
            } else if ctx.memory.reported != Some(target) {
                ctx.memory.reported = Some(target);
                ctx.publish(Fact::ResourceSighted { at: target, amount: left });
            }
            debug!(agent = %ctx.id, %target, taken, cargo = ctx.memory.cargo, left, "gathered");

            if ctx.memory.cargo >= ctx.tuning.capacity {
                ctx.memory.stall.reset();
                Transition::acted(CourierState::Return)
            } else if ctx.memory.target.is_none() {
                Transition::acted(CourierState::Idle)
            } else {
                Transition::acted(CourierState::Gather)
            }
        }
        Err(err) => {
            debug!(agent = %ctx.id, %target, error = %err, "nothing gathered");
            ctx.memory.target = None;
            ctx.publish(Fact::ResourceDepleted { at: target });
            Transition::acted(CourierState::Idle)
        }
    }
}

fn go_home(turn: &mut CourierTurn<'_, '_>) -> Transition<CourierState> {
    let ctx = turn.ctx_mut();
    if ctx.memory.cargo == 0 {
        // Only reachable when the courier cannot carry anything.
        return Transition::acted(CourierState::Idle);
    }
    let base = ctx.base();
    if ctx.memory.stall.tick(base) {
        // Try the other way around.
        ctx.memory.side = ctx.memory.side.mirrored();
        ctx.memory.stall.reset();
        warn!(agent = %ctx.id, %base, side = %ctx.memory.side, "route home stalled, switching side");
        turn.discard_session();
        return Transition::acted(CourierState::Return);
    }
    match travel(turn, base) {
        Progress::Arrived => Transition::free(CourierState::Unload),
        Progress::Moved(_) | Progress::Blocked => Transition::acted(CourierState::Return),
    }
}

fn unload(turn: &mut CourierTurn<'_, '_>) -> Transition<CourierState> {
    let ctx = turn.ctx_mut();
    let base = ctx.base();
    if ctx.position != base && !ctx.position.is_adjacent_to(base) {
        return Transition::free(CourierState::Return);
    }
    let cargo = ctx.memory.cargo;
    match ctx.world.deliver(ctx.id, ctx.position.direction_to(base), cargo) {
        Ok(stored) => {
            ctx.memory.delivered = ctx.memory.delivered.saturating_add(u64::from(cargo));
            ctx.memory.cargo = 0;
            ctx.memory.stall.reset();
            debug!(agent = %ctx.id, %base, cargo, stored, "delivered");
            Transition::acted(CourierState::Idle)
        }
        Err(err) => {
            warn!(agent = %ctx.id, %base, error = %err, "delivery refused");
            ctx.memory.stall.reset();
            Transition::acted(CourierState::Return)
        }
    }
}

/// The courier's handler table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourierHandlers;

impl<'w> HandlerTable<CourierState, CourierCtx<'w>> for CourierHandlers {
    fn handler(&self, state: CourierState) -> Handler<CourierState, CourierCtx<'w>> {
        match state {
            CourierState::Idle => idle as Handler<CourierState, CourierCtx<'w>>,
            CourierState::Explore => explore as Handler<CourierState, CourierCtx<'w>>,
            CourierState::Approach => approach as Handler<CourierState, CourierCtx<'w>>,
            CourierState::Gather => gather as Handler<CourierState, CourierCtx<'w>>,
            CourierState::Return => go_home as Handler<CourierState, CourierCtx<'w>>,
            CourierState::Unload => unload as Handler<CourierState, CourierCtx<'w>>,
        }
    }
}

/// A resource-carrying agent.
#[derive(Debug)]
pub struct Courier {
    id: AgentId,
    executor: Executor<CourierState>,
    memory: CourierMemory,
    tuning: Arc<AgentTuning>,
    rng: StdRng,
}

impl Courier {
    /// A courier serving the base at `home`.
    pub fn new(id: AgentId, home: Position, side: FollowSide, tuning: Arc<AgentTuning>, seed: u64) -> Self {
        let memory = CourierMemory::new(home, side, tuning.courier.stall_turns);
        Self {
            id,
            executor: Executor::new(CourierState::Idle),
            memory,
            tuning,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Override the free-transition cap.
    #[must_use]
    pub fn with_transition_cap(mut self, cap: usize) -> Self {
        self.executor = self.executor.with_transition_cap(cap);
        self
    }

    /// Current state.
    pub const fn state(&self) -> CourierState {
        self.executor.state()
    }

    /// The courier's memory.
    pub const fn memory(&self) -> &CourierMemory {
        &self.memory
    }
}

impl Agent for Courier {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "courier"
    }

    fn take_turn(&mut self, env: &mut TurnEnv<'_>) -> Result<TurnReport, TurnError> {
        let id = self.id;
        let position = env
            .world
            .position_of(id)
            .ok_or(TurnError::NotPlaced { agent: id })?;
        let mut ctx = CourierCtx {
            id,
            position,
            turn: env.turn,
            world: &mut *env.world,
            bulletin: &mut *env.bulletin,
            memory: &mut self.memory,
            tuning: &self.tuning.courier,
            rng: &mut self.rng,
        };
        let report = self
            .executor
            .tick(&CourierHandlers, &mut ctx)
            .map_err(|err| TurnError::transition_cycle(id, err))?;
        let state = report.state;
        Ok(TurnReport {
            state: format!("{state:?}"),
            evaluations: report.evaluations,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gridwalk_world::Layout;

    use super::*;

    fn tuning(sense_radius_sq: u64) -> Arc<AgentTuning> {
        let mut tuning = AgentTuning::default();
        tuning.courier.sense_radius_sq = sense_radius_sq;
        Arc::new(tuning)
    }

    fn play(courier: &mut Courier, world: &mut GridMap, bulletin: &mut Bulletin, turns: u64) {
        for turn in 1..=turns {
            let mut env = TurnEnv {
                turn,
                world: &mut *world,
                bulletin: &mut *bulletin,
            };
            courier.take_turn(&mut env).unwrap();
        }
    }

    const STRIP: &str = "\
............
............
.B.......*..
............
............
";

    fn strip() -> (GridMap, Courier) {
        let mut layout = Layout::parse(STRIP, 4).unwrap();
        let id = AgentId::new();
        layout.map.place_agent(id, Position::new(2, 2)).unwrap();
        let courier = Courier::new(id, Position::new(1, 2), FollowSide::Left, tuning(100), 7);
        (layout.map, courier)
    }

    #[test]
    fn gathers_and_delivers() {
        let (mut world, mut courier) = strip();
        let mut bulletin = Bulletin::new();

        // Six steps east, two gathers, six steps back, one delivery.
        play(&mut courier, &mut world, &mut bulletin, 15);
        assert_eq!(world.total_stored(), 4);
        assert_eq!(world.total_resource(), 0);
        assert_eq!(courier.memory().delivered, 4);
        assert_eq!(courier.memory().cargo, 0);
        assert_eq!(courier.state(), CourierState::Idle);
    }

    #[test]
    fn announces_base_and_depletion() {
        let (mut world, mut courier) = strip();
        let mut bulletin = Bulletin::new();
        play(&mut courier, &mut world, &mut bulletin, 8);

        assert_eq!(bulletin.base(), Some(Position::new(1, 2)));
        assert_eq!(bulletin.sightings().count(), 0);
        let kinds: Vec<&Fact> = bulletin.entries_since(0).map(|e| &e.fact).collect();
        assert!(kinds.contains(&&Fact::ResourceSighted {
            at: Position::new(9, 2),
            amount: 2
        }));
        assert!(kinds.contains(&&Fact::ResourceDepleted { at: Position::new(9, 2) }));
    }

    #[test]
    fn first_turn_heads_for_sensed_resource() {
        let (mut world, mut courier) = strip();
        let mut bulletin = Bulletin::new();
        play(&mut courier, &mut world, &mut bulletin, 1);
        assert_eq!(courier.state(), CourierState::Approach);
        assert_eq!(world.position_of(courier.id()), Some(Position::new(3, 2)));
        assert_eq!(courier.memory().target, Some(Position::new(9, 2)));
    }

    #[test]
    fn uses_bulletin_sightings_out_of_range() {
        let (mut world, mut courier) = strip();
        let mut bulletin = Bulletin::new();
        let scout = AgentId::new();
        bulletin.publish(0, scout, Fact::ResourceSighted {
            at: Position::new(9, 2),
            amount: 4,
        });
        courier.tuning = tuning(4);
        play(&mut courier, &mut world, &mut bulletin, 1);
        assert_eq!(courier.memory().target, Some(Position::new(9, 2)));
        assert_eq!(courier.state(), CourierState::Approach);
    }

    #[test]
    fn explores_when_nothing_is_known() {
        let mut layout = Layout::parse("......\n......\n......\n", 1).unwrap();
        let id = AgentId::new();
        layout.map.place_agent(id, Position::new(0, 0)).unwrap();
        let mut courier = Courier::new(id, Position::new(0, 0), FollowSide::Right, tuning(4), 3);
        let mut bulletin = Bulletin::new();
        play(&mut courier, &mut layout.map, &mut bulletin, 5);
        assert_eq!(courier.state(), CourierState::Explore);
    }

    #[test]
    fn boxed_in_courier_yields_without_fault() {
        let mut layout = Layout::parse("###\n#.#\n###\n", 1).unwrap();
        let id = AgentId::new();
        layout.map.place_agent(id, Position::new(1, 1)).unwrap();
        let mut courier = Courier::new(id, Position::new(1, 1), FollowSide::Left, tuning(4), 11);
        let mut bulletin = Bulletin::new();
        play(&mut courier, &mut layout.map, &mut bulletin, 10);
        assert_eq!(layout.map.position_of(id), Some(Position::new(1, 1)));
    }

    #[test]
    fn courier_without_capacity_waits() {
        let mut layout = Layout::parse(STRIP, 4).unwrap();
        let id = AgentId::new();
        layout.map.place_agent(id, Position::new(2, 2)).unwrap();
        let mut tuning = AgentTuning::default();
        tuning.courier.capacity = 0;
        let mut courier = Courier::new(id, Position::new(1, 2), FollowSide::Left, Arc::new(tuning), 5);
        let mut bulletin = Bulletin::new();

        play(&mut courier, &mut layout.map, &mut bulletin, 4);
        assert_eq!(courier.state(), CourierState::Idle);
        assert_eq!(courier.memory().cargo, 0);
        assert_eq!(layout.map.total_resource(), 4);
        assert_eq!(layout.map.position_of(id), Some(Position::new(2, 2)));
    }

    #[test]
    fn missing_agent_is_reported() {
        let (mut world, _) = strip();
        let mut courier = Courier::new(AgentId::new(), Position::new(1, 2), FollowSide::Left, tuning(4), 1);
        let mut bulletin = Bulletin::new();
        let mut env = TurnEnv {
            turn: 1,
            world: &mut world,
            bulletin: &mut bulletin,
        };
        assert!(matches!(courier.take_turn(&mut env), Err(TurnError::NotPlaced { .. })));
    }
}

//! Wall builder.
//!
//! Builders raise a ring of wall cells around the base with dirt dug from
//! nearby ground. The ring is published once as a [`Fact::WallPlanned`];
//! each builder claims one unfinished slot at a time on the bulletin, stands
//! on it, and alternates between digging a neighbour and depositing the
//! dirt on the lowest unfinished wall cell within reach.
//!
//! Where dirt comes from is a [`DigPreference`]; everything else is driven by
//! [`BuilderTuning`].
//!
//! | State | Does |
//! |-------|------|
//! | `AwaitPlan` | Claims the nearest open slot once a plan exists. |
//! | `Approach` | Walks onto the claimed slot; releases it if unreachable. |
//! | `Dig` | Fills up on dirt from a neighbouring cell. |
//! | `Raise` | Deposits dirt on the lowest wall cell in reach. |
//! | `Hold` | Releases a finished slot and waits for more work. |

use std::collections::BTreeSet;
use std::sync::Arc;

use gridwalk_core::bulletin::{Fact, Publication};
use gridwalk_core::tick::{Agent, TurnEnv, TurnError, TurnReport};
use gridwalk_core::{AgentState, Bulletin, Executor, Handler, HandlerTable, Transition, Turn};
use gridwalk_types::{AgentId, Direction, FollowSide, Position};
use gridwalk_world::{Closest, GridMap, Terrain};
use tracing::{debug, info, warn};

use crate::config::{AgentTuning, BuilderTuning, DigPreference};
use crate::walk::{self, Progress, StallGuard};

/// Cells of the wall ring around `base`: open cells at Chebyshev distance
/// `wall_radius`, minus the four axis-aligned gates when enabled.
pub fn plan_wall(map: &GridMap, base: Position, tuning: &BuilderTuning) -> Vec<Position> {
    let radius = u64::from(tuning.wall_radius);
    let reach = radius.saturating_mul(radius).saturating_mul(2);
    map.positions_within(base, reach)
        .into_iter()
        .filter(|p| base.chebyshev_distance(*p) == radius)
        .filter(|p| !(tuning.gates && (p.x == base.x || p.y == base.y)))
        .filter(|p| map.cell(*p).is_some_and(|cell| cell.terrain == Terrain::Open))
        .collect()
}

/// Builder states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Waiting for a plan or a free slot.
    AwaitPlan,
    /// Walking onto the claimed slot.
    Approach,
    /// Taking dirt from a neighbouring cell.
    Dig,
    /// Depositing dirt on wall cells.
    Raise,
    /// Nothing left to do nearby.
    Hold,
}

impl AgentState for BuilderState {
    const ALL: &'static [Self] = &[
        Self::AwaitPlan,
        Self::Approach,
        Self::Dig,
        Self::Raise,
        Self::Hold,
    ];
}

/// What a builder remembers between turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderMemory {
    /// Obstacle-following side.
    pub side: FollowSide,
    /// The claimed wall cell.
    pub slot: Option<Position>,
    /// Dirt carried.
    pub dirt: u32,
    /// Slots given up on.
    pub skipped: BTreeSet<Position>,
    /// Dirt deposited over the builder's life.
    pub raised: u64,
    stall: StallGuard,
}

impl BuilderMemory {
    /// Fresh memory.
    pub const fn new(side: FollowSide, stall_turns: u32) -> Self {
        Self {
            side,
            slot: None,
            dirt: 0,
            skipped: BTreeSet::new(),
            raised: 0,
            stall: StallGuard::new(stall_turns),
        }
    }
}

/// Per-tick view handed to builder handlers.
#[derive(Debug)]
pub struct BuilderCtx<'w> {
    id: AgentId,
    position: Position,
    turn: u64,
    world: &'w mut GridMap,
    bulletin: &'w mut Bulletin,
    memory: &'w mut BuilderMemory,
    tuning: &'w BuilderTuning,
}

impl BuilderCtx<'_> {
    fn can_walk(&self, direction: Direction) -> bool {
        walk::may_step(&*self.world, &*self.bulletin, self.id, direction)
    }

    fn publish(&mut self, fact: Fact) -> Publication {
        self.bulletin.publish(self.turn, self.id, fact)
    }

    fn elevation(&self, at: Position) -> Option<i32> {
        self.world.cell(at).map(|cell| cell.elevation)
    }

    fn needs_raising(&self, slot: Position) -> bool {
        self.elevation(slot)
            .is_some_and(|elevation| elevation < self.tuning.target_height)
    }

    /// The nearest plan cell nobody holds that still needs dirt.
    fn open_slot(&self) -> Option<Position> {
        self.bulletin
            .wall_plan()
            .iter()
            .copied()
            .filter(|slot| self.bulletin.claimed_by(*slot).is_none())
            .filter(|slot| !self.memory.skipped.contains(slot))
            .filter(|slot| self.needs_raising(*slot))
            .fold(Closest::new(self.position), Closest::offer)
            .position()
    }

    fn release(&mut self, slot: Position) {
        self.publish(Fact::SlotReleased { slot });
        self.memory.slot = None;
    }

    /// A neighbour dirt may be taken from.
    fn diggable(&self, at: Position) -> bool {
        let plan = self.bulletin.wall_plan();
        self.world.occupant(at).is_none()
            && !plan.contains(&at)
            && self.world.cell(at).is_some_and(|cell| {
                cell.terrain == Terrain::Open
                    && !cell.has_resource()
                    && cell.elevation > self.tuning.dig_floor
            })
    }

    fn dig_site(&self) -> Option<Direction> {
        let base = self.bulletin.base().or(self.memory.slot).unwrap_or(self.position);
        let candidates = Direction::MOVES
            .iter()
            .copied()
            .filter(|d| self.diggable(self.position.offset(*d)));
        match self.tuning.dig_preference {
            DigPreference::Outward => {
                candidates.max_by_key(|d| base.distance_squared(self.position.offset(*d)))
            }
            DigPreference::Lowest => {
                candidates.min_by_key(|d| self.elevation(self.position.offset(*d)).unwrap_or(i32::MAX))
            }
        }
    }

    /// The lowest plan cell within reach (underfoot included) still below
    /// target height.
    fn raise_site(&self) -> Option<Direction> {
        let plan = self.bulletin.wall_plan();
        std::iter::once(Direction::Center)
            .chain(Direction::MOVES.iter().copied())
            .map(|d| (d, self.position.offset(d)))
            .filter(|(_, at)| plan.contains(at) && self.needs_raising(*at))
            .min_by_key(|(_, at)| self.elevation(*at).unwrap_or(i32::MAX))
            .map(|(d, _)| d)
    }
}

type BuilderTurn<'t, 'w> = Turn<'t, BuilderCtx<'w>>;

fn await_plan(turn: &mut BuilderTurn<'_, '_>) -> Transition<BuilderState> {
    let ctx = turn.ctx_mut();
    if let Some(slot) = ctx.bulletin.claim_of(ctx.id) {
        ctx.memory.slot = Some(slot);
        return Transition::free(BuilderState::Approach);
    }
    if ctx.bulletin.wall_plan().is_empty() {
        return Transition::acted(BuilderState::AwaitPlan);
    }
    let Some(slot) = ctx.open_slot() else {
        return Transition::acted(BuilderState::Hold);
    };
    match ctx.publish(Fact::SlotClaimed { slot }) {
        Publication::Rejected => Transition::acted(BuilderState::AwaitPlan),
        Publication::Logged | Publication::Redundant => {
            debug!(agent = %ctx.id, %slot, "slot claimed");
            ctx.memory.slot = Some(slot);
            ctx.memory.stall.reset();
            Transition::free(BuilderState::Approach)
        }
    }
}

fn approach(turn: &mut BuilderTurn<'_, '_>) -> Transition<BuilderState> {
    let ctx = turn.ctx_mut();
    let Some(slot) = ctx.memory.slot else {
        return Transition::free(BuilderState::AwaitPlan);
    };
    if ctx.memory.stall.tick(slot) {
        warn!(agent = %ctx.id, %slot, "slot unreachable, releasing");
        ctx.memory.skipped.insert(slot);
        ctx.release(slot);
        return Transition::acted(BuilderState::AwaitPlan);
    }
    let (side, position) = (ctx.memory.side, ctx.position);
    let step = turn.navigate(slot, side, false, position, BuilderCtx::can_walk);
    let ctx = turn.ctx_mut();
    match walk::follow(&mut *ctx.world, ctx.id, step) {
        Progress::Arrived => Transition::free(BuilderState::Dig),
        Progress::Moved(_) | Progress::Blocked => Transition::acted(BuilderState::Approach),
    }
}

fn dig(turn: &mut BuilderTurn<'_, '_>) -> Transition<BuilderState> {
    let ctx = turn.ctx_mut();
    if ctx.tuning.dirt_capacity == 0 {
        warn!(agent = %ctx.id, "builder cannot carry dirt");
        return Transition::acted(BuilderState::Hold);
    }
    if ctx.memory.dirt >= ctx.tuning.dirt_capacity {
        return Transition::free(BuilderState::Raise);
    }
    let Some(direction) = ctx.dig_site() else {
        return if ctx.memory.dirt > 0 {
            Transition::free(BuilderState::Raise)
        } else {
            debug!(agent = %ctx.id, at = %ctx.position, "nothing left to dig");
            Transition::acted(BuilderState::Hold)
        };
    };
    match ctx.world.dig(ctx.id, direction) {
        Ok(elevation) => {
            ctx.memory.dirt = ctx.memory.dirt.saturating_add(1);
            debug!(agent = %ctx.id, %direction, elevation, dirt = ctx.memory.dirt, "dug");
        }
        Err(err) => warn!(agent = %ctx.id, %direction, error = %err, "dig refused"),
    }
    Transition::acted(BuilderState::Dig)
}

fn raise(turn: &mut BuilderTurn<'_, '_>) -> Transition<BuilderState> {
    let ctx = turn.ctx_mut();
    if ctx.memory.dirt == 0 {
        return Transition::free(BuilderState::Dig);
    }
    let Some(direction) = ctx.raise_site() else {
        return Transition::free(BuilderState::Hold);
    };
    match ctx.world.deposit_dirt(ctx.id, direction) {
        Ok(elevation) => {
            ctx.memory.dirt = ctx.memory.dirt.saturating_sub(1);
            ctx.memory.raised = ctx.memory.raised.saturating_add(1);
            debug!(agent = %ctx.id, %direction, elevation, "raised");
        }
        Err(err) => warn!(agent = %ctx.id, %direction, error = %err, "deposit refused"),
    }
    Transition::acted(BuilderState::Raise)
}

fn hold(turn: &mut BuilderTurn<'_, '_>) -> Transition<BuilderState> {
    let ctx = turn.ctx_mut();
    match ctx.memory.slot {
        Some(slot) if ctx.needs_raising(slot) => return Transition::acted(BuilderState::Hold),
        Some(slot) => {
            info!(agent = %ctx.id, %slot, "wall slot finished");
            ctx.release(slot);
        }
        None => {}
    }
    if ctx.open_slot().is_some() {
        Transition::acted(BuilderState::AwaitPlan)
    } else {
        Transition::acted(BuilderState::Hold)
    }
}

/// The builder's handler table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderHandlers;

impl<'w> HandlerTable<BuilderState, BuilderCtx<'w>> for BuilderHandlers {
    fn handler(&self, state: BuilderState) -> Handler<BuilderState, BuilderCtx<'w>> {
        match state {
            BuilderState::AwaitPlan => await_plan as Handler<BuilderState, BuilderCtx<'w>>,
            BuilderState::Approach => approach as Handler<BuilderState, BuilderCtx<'w>>,
            BuilderState::Dig => dig as Handler<BuilderState, BuilderCtx<'w>>,
            BuilderState::Raise => raise as Handler<BuilderState, BuilderCtx<'w>>,
            BuilderState::Hold => hold as Handler<BuilderState, BuilderCtx<'w>>,
        }
    }
}

/// A wall-building agent.
#[derive(Debug)]
pub struct Builder {
    id: AgentId,
    executor: Executor<BuilderState>,
    memory: BuilderMemory,
    tuning: Arc<AgentTuning>,
}

impl Builder {
    /// A builder that follows obstacles on `side`.
    pub fn new(id: AgentId, side: FollowSide, tuning: Arc<AgentTuning>) -> Self {
        let memory = BuilderMemory::new(side, tuning.builder.stall_turns);
        Self {
            id,
            executor: Executor::new(BuilderState::AwaitPlan),
            memory,
            tuning,
        }
    }

    /// Override the free-transition cap.
    #[must_use]
    pub fn with_transition_cap(mut self, cap: usize) -> Self {
        self.executor = self.executor.with_transition_cap(cap);
        self
    }

    /// Current state.
    pub const fn state(&self) -> BuilderState {
        self.executor.state()
    }

    /// The builder's memory.
    pub const fn memory(&self) -> &BuilderMemory {
        &self.memory
    }
}

impl Agent for Builder {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "builder"
    }

    fn take_turn(&mut self, env: &mut TurnEnv<'_>) -> Result<TurnReport, TurnError> {
        let id = self.id;
        let position = env
            .world
            .position_of(id)
            .ok_or(TurnError::NotPlaced { agent: id })?;
        let mut ctx = BuilderCtx {
            id,
            position,
            turn: env.turn,
            world: &mut *env.world,
            bulletin: &mut *env.bulletin,
            memory: &mut self.memory,
            tuning: &self.tuning.builder,
        };
        let report = self
            .executor
            .tick(&BuilderHandlers, &mut ctx)
            .map_err(|err| TurnError::transition_cycle(id, err))?;
        let state = report.state;
        Ok(TurnReport {
            state: format!("{state:?}"),
            evaluations: report.evaluations,
        })
    }
}

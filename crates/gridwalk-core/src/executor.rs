//! Generic finite-state-machine executor.
//!
//! Every agent type instantiates [`Executor`] with its own closed state enum
//! and a [`HandlerTable`] mapping each state to a plain function. A tick
//! evaluates handlers until one of them reports that it acted in the world
//! (or chose to yield), chaining through any number of free transitions in
//! between, up to a fixed cap.
//!
//! The executor owns the agent's navigation session and drops it whenever
//! the state changes, so a handler never inherits a walk planned for a
//! different purpose.

use std::fmt::Debug;

use gridwalk_types::{Direction, FollowSide, Position};
use tracing::{debug, error};

use crate::navigator::{Navigator, Step};

/// A closed set of agent states.
///
/// The executor only compares states for equality; [`AgentState::ALL`]
/// sizes the default free-transition cap.
pub trait AgentState: Copy + Eq + Debug + 'static {
    /// Every state of the enum.
    const ALL: &'static [Self];
}

/// What a handler decided: the next state, and whether the tick is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    /// State to adopt.
    pub next: S,
    /// `true` when the handler acted (or yielded) and the tick ends.
    pub acted: bool,
}

impl<S> Transition<S> {
    /// The handler used its action for this tick.
    pub const fn acted(next: S) -> Self {
        Self { next, acted: true }
    }

    /// A free transition: evaluate `next` within the same tick.
    pub const fn free(next: S) -> Self {
        Self { next, acted: false }
    }
}

/// A state handler.
pub type Handler<S, C> = fn(&mut Turn<'_, C>) -> Transition<S>;

/// Maps each state to its handler.
pub trait HandlerTable<S, C> {
    /// The handler for `state`.
    fn handler(&self, state: S) -> Handler<S, C>;
}

impl<S, C, F> HandlerTable<S, C> for F
where
    F: Fn(S) -> Handler<S, C>,
{
    fn handler(&self, state: S) -> Handler<S, C> {
        self(state)
    }
}

/// What a handler sees during one evaluation: the shell's context and the
/// agent's navigation session.
#[derive(Debug)]
pub struct Turn<'a, C> {
    ctx: &'a mut C,
    session: &'a mut Option<Navigator>,
}

impl<'a, C> Turn<'a, C> {
    /// Wrap a context and session slot.
    pub const fn new(ctx: &'a mut C, session: &'a mut Option<Navigator>) -> Self {
        Self { ctx, session }
    }

    /// The shell's per-tick context.
    pub const fn ctx(&self) -> &C {
        &*self.ctx
    }

    /// Mutable access to the shell's per-tick context.
    pub const fn ctx_mut(&mut self) -> &mut C {
        &mut *self.ctx
    }

    /// The active navigation session, if any.
    pub const fn session(&self) -> Option<&Navigator> {
        self.session.as_ref()
    }

    /// Mutable access to the active navigation session, if any.
    pub const fn session_mut(&mut self) -> Option<&mut Navigator> {
        self.session.as_mut()
    }

    /// Install a fresh session, dropping any previous one.
    pub fn replace_session(&mut self, navigator: Navigator) -> &mut Navigator {
        self.session.insert(navigator)
    }

    /// Drop the active session.
    pub fn discard_session(&mut self) {
        *self.session = None;
    }

    /// The session aimed at `goal`, reusing the active one when it already
    /// targets that goal with the same arrival rule and replacing it
    /// otherwise.
    pub fn navigator_for(&mut self, goal: Position, side: FollowSide, allow_adjacent: bool) -> &mut Navigator {
        select_session(self.session, goal, side, allow_adjacent)
    }

    /// One navigation step toward `goal` from `position`.
    ///
    /// `walkable` receives the context so the predicate can consult the
    /// world view, hazards, or anything else the shell keeps there.
    pub fn navigate<W>(
        &mut self,
        goal: Position,
        side: FollowSide,
        allow_adjacent: bool,
        position: Position,
        mut walkable: W,
    ) -> Step
    where
        W: FnMut(&C, Direction) -> bool,
    {
        let ctx: &C = &*self.ctx;
        let navigator = select_session(self.session, goal, side, allow_adjacent);
        navigator.step(position, |direction| walkable(ctx, direction))
    }
}

fn select_session(
    slot: &mut Option<Navigator>,
    goal: Position,
    side: FollowSide,
    allow_adjacent: bool,
) -> &mut Navigator {
    if slot
        .as_ref()
        .is_some_and(|current| !current.aims_at(goal, allow_adjacent))
    {
        debug!(%goal, "goal changed, replacing navigation session");
        *slot = None;
    }
    slot.get_or_insert_with(|| Navigator::new(goal, side, allow_adjacent))
}

/// Outcome of a successful tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport<S> {
    /// State after the tick.
    pub state: S,
    /// Number of handlers evaluated.
    pub evaluations: usize,
    /// States whose handlers ran, in order.
    pub visited: Vec<S>,
}

/// Errors raised by [`Executor::tick`].
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError<S: Debug> {
    /// Handlers kept transitioning without acting.
    #[error("no action after {cap} handler evaluations (visited {visited:?})")]
    InvalidTransitionCycle {
        /// The cap that was hit.
        cap: usize,
        /// States evaluated during the failed tick, in order.
        visited: Vec<S>,
    },
}

/// Drives one agent's state machine.
#[derive(Debug, Clone)]
pub struct Executor<S> {
    state: S,
    session: Option<Navigator>,
    transition_cap: usize,
}

impl<S: AgentState> Executor<S> {
    /// Start in `initial` with no navigation session.
    ///
    /// The free-transition cap defaults to the number of states.
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            session: None,
            transition_cap: S::ALL.len().max(1),
        }
    }

    /// Override the free-transition cap (at least one evaluation per tick).
    #[must_use]
    pub fn with_transition_cap(mut self, cap: usize) -> Self {
        self.transition_cap = cap.max(1);
        self
    }

    /// Current state.
    pub const fn state(&self) -> S {
        self.state
    }

    /// The active navigation session, if any.
    pub const fn session(&self) -> Option<&Navigator> {
        self.session.as_ref()
    }

    /// Maximum handler evaluations per tick.
    pub const fn transition_cap(&self) -> usize {
        self.transition_cap
    }

    /// Run handlers until one acts.
    ///
    /// The session is dropped whenever a handler moves to a different
    /// state. On failure the state is left at the last transition applied.
    pub fn tick<C, H>(&mut self, handlers: &H, context: &mut C) -> Result<TickReport<S>, ExecutorError<S>>
    where
        H: HandlerTable<S, C> + ?Sized,
    {
        let mut visited = Vec::new();
        loop {
            if visited.len() >= self.transition_cap {
                error!(
                    cap = self.transition_cap,
                    state = ?self.state,
                    visited = ?visited,
                    "Handlers cycled without acting"
                );
                return Err(ExecutorError::InvalidTransitionCycle {
                    cap: self.transition_cap,
                    visited,
                });
            }

            let current = self.state;
            visited.push(current);
            let handler = handlers.handler(current);
            let transition = handler(&mut Turn::new(context, &mut self.session));

            if transition.next != current {
                debug!(from = ?current, to = ?transition.next, acted = transition.acted, "state change");
                self.session = None;
            }
            self.state = transition.next;

            if transition.acted {
                return Ok(TickReport {
                    state: self.state,
                    evaluations: visited.len(),
                    visited,
                });
            }
        }
    }
}

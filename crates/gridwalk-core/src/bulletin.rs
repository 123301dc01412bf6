//! In-memory broadcast board shared by all agents.
//!
//! Agents share no memory with each other; everything one agent wants the
//! others to know goes through [`Bulletin::publish`]. The board keeps the
//! ordered log of accepted facts and a handful of derived views that
//! handlers read when deciding what to do.
//!
//! Publishing a fact that adds nothing (a sighting already known, a claim
//! the author already holds) is accepted silently and not logged again.

use std::collections::{BTreeMap, BTreeSet};

use gridwalk_types::{AgentId, Position};
use gridwalk_world::Closest;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A circular zone agents should stay out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    /// Centre of the zone.
    pub center: Position,
    /// Squared radius of the zone.
    pub radius_sq: u64,
}

impl Hazard {
    /// Whether `position` lies inside the zone.
    pub fn contains(&self, position: Position) -> bool {
        self.center.distance_squared(position) <= self.radius_sq
    }
}

/// Something an agent tells everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fact {
    /// A base (delivery point) exists here.
    BaseLocated {
        /// The base cell.
        at: Position,
    },
    /// Resource was seen on a cell.
    ResourceSighted {
        /// The resource cell.
        at: Position,
        /// Units seen there.
        amount: u32,
    },
    /// A previously sighted resource cell is empty.
    ResourceDepleted {
        /// The exhausted cell.
        at: Position,
    },
    /// Cells the base wall should be raised on.
    WallPlanned {
        /// The wall cells.
        cells: Vec<Position>,
    },
    /// The author is working on a wall cell.
    SlotClaimed {
        /// The claimed cell.
        slot: Position,
    },
    /// The author gave up a wall cell.
    SlotReleased {
        /// The released cell.
        slot: Position,
    },
    /// Agents should avoid a zone.
    HazardReported {
        /// The zone.
        hazard: Hazard,
    },
}

/// One accepted fact with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Turn the fact was published on.
    pub turn: u64,
    /// The publishing agent.
    pub author: AgentId,
    /// What was said.
    pub fact: Fact,
}

/// Outcome of [`Bulletin::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publication {
    /// The fact changed the board and was logged.
    Logged,
    /// The board already reflected the fact.
    Redundant,
    /// The fact conflicts with the board (a slot held by someone else, a
    /// release by a non-holder) and was dropped.
    Rejected,
}

/// The shared board.
#[derive(Debug, Clone, Default)]
pub struct Bulletin {
    log: Vec<Entry>,
    base: Option<Position>,
    sightings: BTreeMap<Position, u32>,
    wall_plan: Vec<Position>,
    claims: BTreeMap<Position, AgentId>,
    hazards: Vec<Hazard>,
}

impl Bulletin {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fact on behalf of `author`.
    pub fn publish(&mut self, turn: u64, author: AgentId, fact: Fact) -> Publication {
        let outcome = self.apply(author, &fact);
        if outcome == Publication::Logged {
            debug!(turn, %author, fact = ?fact, "bulletin");
            self.log.push(Entry { turn, author, fact });
        }
        outcome
    }

    fn apply(&mut self, author: AgentId, fact: &Fact) -> Publication {
        match *fact {
            Fact::BaseLocated { at } => {
                if self.base.is_some() {
                    return Publication::Redundant;
                }
                self.base = Some(at);
            }
            Fact::ResourceSighted { at, amount } => {
                if amount == 0 {
                    return Publication::Rejected;
                }
                if self.sightings.insert(at, amount) == Some(amount) {
                    return Publication::Redundant;
                }
            }
            Fact::ResourceDepleted { at } => {
                if self.sightings.remove(&at).is_none() {
                    return Publication::Redundant;
                }
            }
            Fact::WallPlanned { ref cells } => {
                if self.wall_plan == *cells {
                    return Publication::Redundant;
                }
                self.wall_plan.clone_from(cells);
                self.claims.retain(|slot, _| cells.contains(slot));
            }
            Fact::SlotClaimed { slot } => {
                if !self.wall_plan.contains(&slot) {
                    return Publication::Rejected;
                }
                match self.claims.get(&slot) {
                    Some(holder) if *holder == author => return Publication::Redundant,
                    Some(_) => return Publication::Rejected,
                    None => {}
                }
                // One slot per agent.
                self.claims.retain(|_, holder| *holder != author);
                self.claims.insert(slot, author);
            }
            Fact::SlotReleased { slot } => match self.claims.get(&slot) {
                Some(holder) if *holder == author => {
                    self.claims.remove(&slot);
                }
                Some(_) => return Publication::Rejected,
                None => return Publication::Redundant,
            },
            Fact::HazardReported { hazard } => {
                if self.hazards.contains(&hazard) {
                    return Publication::Redundant;
                }
                self.hazards.push(hazard);
            }
        }
        Publication::Logged
    }

    /// The known base, if any agent reported one.
    pub const fn base(&self) -> Option<Position> {
        self.base
    }

    /// Resource cells reported and not yet depleted, with the last amount seen.
    pub fn sightings(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        self.sightings.iter().map(|(at, amount)| (*at, *amount))
    }

    /// The reported resource cell closest to `from`, skipping `exclude`.
    pub fn nearest_sighting(&self, from: Position, exclude: &BTreeSet<Position>) -> Option<Position> {
        self.sightings
            .keys()
            .copied()
            .filter(|at| !exclude.contains(at))
            .fold(Closest::new(from), Closest::offer)
            .position()
    }

    /// The current wall plan (empty if none).
    pub fn wall_plan(&self) -> &[Position] {
        &self.wall_plan
    }

    /// Who holds `slot`, if anyone.
    pub fn claimed_by(&self, slot: Position) -> Option<AgentId> {
        self.claims.get(&slot).copied()
    }

    /// The slot `agent` holds, if any.
    pub fn claim_of(&self, agent: AgentId) -> Option<Position> {
        self.claims
            .iter()
            .find(|(_, holder)| **holder == agent)
            .map(|(slot, _)| *slot)
    }

    /// Reported hazard zones.
    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// Whether `position` lies inside any reported hazard.
    pub fn in_hazard(&self, position: Position) -> bool {
        self.hazards.iter().any(|h| h.contains(position))
    }

    /// Entries published on or after `turn`, oldest first.
    pub fn entries_since(&self, turn: u64) -> impl Iterator<Item = &Entry> {
        let start = self.log.partition_point(|entry| entry.turn < turn);
        self.log.iter().skip(start)
    }

    /// Number of logged entries.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn plan() -> Vec<Position> {
        vec![Position::new(1, 1), Position::new(2, 1), Position::new(3, 1)]
    }

    #[test]
    fn base_is_first_report() {
        let mut board = Bulletin::new();
        let a = AgentId::new();
        assert_eq!(
            board.publish(0, a, Fact::BaseLocated { at: Position::new(4, 4) }),
            Publication::Logged
        );
        assert_eq!(
            board.publish(1, a, Fact::BaseLocated { at: Position::new(9, 9) }),
            Publication::Redundant
        );
        assert_eq!(board.base(), Some(Position::new(4, 4)));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn sightings_do_not_duplicate() {
        let mut board = Bulletin::new();
        let a = AgentId::new();
        let at = Position::new(3, 3);
        board.publish(0, a, Fact::ResourceSighted { at, amount: 5 });
        assert_eq!(
            board.publish(1, a, Fact::ResourceSighted { at, amount: 5 }),
            Publication::Redundant
        );
        board.publish(2, a, Fact::ResourceSighted { at, amount: 2 });
        assert_eq!(board.sightings().collect::<Vec<_>>(), vec![(at, 2)]);
        assert_eq!(board.len(), 2);

        board.publish(3, a, Fact::ResourceDepleted { at });
        assert_eq!(board.sightings().count(), 0);
        assert_eq!(
            board.publish(4, a, Fact::ResourceDepleted { at }),
            Publication::Redundant
        );
    }

    #[test]
    fn nearest_sighting_uses_distance() {
        let mut board = Bulletin::new();
        let a = AgentId::new();
        board.publish(0, a, Fact::ResourceSighted { at: Position::new(10, 10), amount: 1 });
        board.publish(0, a, Fact::ResourceSighted { at: Position::new(2, 3), amount: 1 });
        let none = BTreeSet::new();
        assert_eq!(board.nearest_sighting(Position::new(0, 0), &none), Some(Position::new(2, 3)));
        let skip = BTreeSet::from([Position::new(2, 3)]);
        assert_eq!(board.nearest_sighting(Position::new(0, 0), &skip), Some(Position::new(10, 10)));
        assert_eq!(Bulletin::new().nearest_sighting(Position::new(0, 0), &none), None);
    }

    #[test]
    fn slot_claims_are_exclusive() {
        let mut board = Bulletin::new();
        let (a, b) = (AgentId::new(), AgentId::new());
        board.publish(0, a, Fact::WallPlanned { cells: plan() });

        let slot = Position::new(2, 1);
        assert_eq!(board.publish(1, a, Fact::SlotClaimed { slot }), Publication::Logged);
        assert_eq!(board.publish(1, b, Fact::SlotClaimed { slot }), Publication::Rejected);
        assert_eq!(board.publish(2, a, Fact::SlotClaimed { slot }), Publication::Redundant);
        assert_eq!(board.claimed_by(slot), Some(a));
        assert_eq!(board.claim_of(a), Some(slot));

        assert_eq!(board.publish(3, b, Fact::SlotReleased { slot }), Publication::Rejected);
        assert_eq!(board.publish(3, a, Fact::SlotReleased { slot }), Publication::Logged);
        assert_eq!(board.claimed_by(slot), None);
        assert_eq!(board.publish(4, b, Fact::SlotClaimed { slot }), Publication::Logged);
    }

    #[test]
    fn claims_outside_plan_rejected() {
        let mut board = Bulletin::new();
        let a = AgentId::new();
        board.publish(0, a, Fact::WallPlanned { cells: plan() });
        assert_eq!(
            board.publish(1, a, Fact::SlotClaimed { slot: Position::new(7, 7) }),
            Publication::Rejected
        );
    }

    #[test]
    fn new_claim_moves_the_agent() {
        let mut board = Bulletin::new();
        let a = AgentId::new();
        board.publish(0, a, Fact::WallPlanned { cells: plan() });
        board.publish(1, a, Fact::SlotClaimed { slot: Position::new(1, 1) });
        board.publish(2, a, Fact::SlotClaimed { slot: Position::new(3, 1) });
        assert_eq!(board.claimed_by(Position::new(1, 1)), None);
        assert_eq!(board.claim_of(a), Some(Position::new(3, 1)));
    }

    #[test]
    fn hazards_and_membership() {
        let mut board = Bulletin::new();
        let a = AgentId::new();
        let hazard = Hazard {
            center: Position::new(5, 5),
            radius_sq: 4,
        };
        board.publish(0, a, Fact::HazardReported { hazard });
        assert_eq!(board.publish(1, a, Fact::HazardReported { hazard }), Publication::Redundant);
        assert_eq!(board.hazards().len(), 1);
        assert!(board.in_hazard(Position::new(5, 7)));
        assert!(!board.in_hazard(Position::new(5, 8)));
    }

    #[test]
    fn entries_since_turn() {
        let mut board = Bulletin::new();
        let a = AgentId::new();
        board.publish(1, a, Fact::BaseLocated { at: Position::new(0, 0) });
        board.publish(3, a, Fact::ResourceSighted { at: Position::new(1, 0), amount: 1 });
        board.publish(5, a, Fact::ResourceSighted { at: Position::new(2, 0), amount: 1 });
        let turns: Vec<u64> = board.entries_since(3).map(|e| e.turn).collect();
        assert_eq!(turns, vec![3, 5]);
        assert_eq!(board.entries_since(6).count(), 0);
    }

    #[test]
    fn facts_serialize_tagged() {
        let fact = Fact::SlotClaimed { slot: Position::new(1, 2) };
        let json = serde_json::to_value(&fact).unwrap();
        assert_eq!(json["kind"], "slot_claimed");
        assert_eq!(json["slot"]["x"], 1);
    }
}

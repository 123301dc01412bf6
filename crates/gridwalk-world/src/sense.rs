//! Sensing over a radius, expressed as a fold.
//!
//! A sensing pass visits every cell within range and keeps the best
//! candidate seen so far. [`Closest`] is that running state; it is threaded
//! through the pass by value, so a scan is a plain `fold`.

use gridwalk_types::Position;

use crate::cell::Cell;
use crate::grid::GridMap;

/// Running "closest so far" accumulator for a sensing pass.
///
/// Ties keep the earlier candidate, so a scan in a fixed order is
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closest {
    origin: Position,
    best: Option<(u64, Position)>,
}

impl Closest {
    /// Start a pass measuring distances from `origin`.
    pub const fn new(origin: Position) -> Self {
        Self { origin, best: None }
    }

    /// Fold step: keep `candidate` if it is strictly closer than the best so far.
    #[must_use]
    pub fn offer(self, candidate: Position) -> Self {
        let distance = self.origin.distance_squared(candidate);
        match self.best {
            Some((best, _)) if best <= distance => self,
            _ => Self {
                best: Some((distance, candidate)),
                ..self
            },
        }
    }

    /// The closest candidate offered, if any.
    pub fn position(&self) -> Option<Position> {
        self.best.map(|(_, p)| p)
    }

    /// Squared distance to the closest candidate, if any.
    pub fn distance_squared(&self) -> Option<u64> {
        self.best.map(|(d, _)| d)
    }
}

/// The closest cell within `radius_sq` of `origin` for which `wanted`
/// holds.
pub fn closest_cell<F>(map: &GridMap, origin: Position, radius_sq: u64, wanted: F) -> Option<Position>
where
    F: Fn(Position, &Cell) -> bool,
{
    map.positions_within(origin, radius_sq)
        .into_iter()
        .filter(|p| map.cell(*p).is_some_and(|cell| wanted(*p, cell)))
        .fold(Closest::new(origin), Closest::offer)
        .position()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn keeps_strictly_closer_candidates() {
        let origin = Position::new(0, 0);
        let closest = [Position::new(3, 0), Position::new(1, 1), Position::new(0, 2)]
            .into_iter()
            .fold(Closest::new(origin), Closest::offer);
        assert_eq!(closest.position(), Some(Position::new(1, 1)));
        assert_eq!(closest.distance_squared(), Some(2));
    }

    #[test]
    fn ties_keep_first() {
        let origin = Position::new(0, 0);
        let closest = Closest::new(origin)
            .offer(Position::new(1, 0))
            .offer(Position::new(0, 1));
        assert_eq!(closest.position(), Some(Position::new(1, 0)));
    }

    #[test]
    fn empty_pass_finds_nothing() {
        assert_eq!(Closest::new(Position::new(0, 0)).position(), None);
    }

    #[test]
    fn closest_resource_cell() {
        let mut map = GridMap::new(10, 10).unwrap();
        for (x, y) in [(8, 8), (4, 6)] {
            if let Some(cell) = map.cell_mut(Position::new(x, y)) {
                cell.resource = 3;
            }
        }
        let found = closest_cell(&map, Position::new(2, 2), 100, |_, cell| cell.has_resource());
        assert_eq!(found, Some(Position::new(4, 6)));

        let skipping = closest_cell(&map, Position::new(2, 2), 100, |p, cell| {
            cell.has_resource() && p != Position::new(4, 6)
        });
        assert_eq!(skipping, Some(Position::new(8, 8)));

        let out_of_range = closest_cell(&map, Position::new(2, 2), 9, |_, cell| cell.has_resource());
        assert_eq!(out_of_range, None);
    }
}

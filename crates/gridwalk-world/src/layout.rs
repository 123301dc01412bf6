//! ASCII layouts and the built-in default map.
//!
//! One character per cell, one line per row. The first line is the
//! northernmost row (highest `y`).
//!
//! | Char | Cell |
//! |------|------|
//! | `.` | open ground, elevation 0 |
//! | `0`-`9` | open ground at that elevation |
//! | `#` | wall |
//! | `~` | water |
//! | `*` | open ground carrying resource |
//! | `B` | base |
//!
//! Blank lines and trailing whitespace are ignored.

use gridwalk_types::Position;
use tracing::debug;

use crate::cell::{Cell, Terrain};
use crate::error::WorldError;
use crate::grid::GridMap;

/// The default 24x16 map: one base, four resource fields, a few obstacles,
/// a pond, and a raised plateau.
pub const DEFAULT_LAYOUT: &str = "\
########################
#......................#
#..****.........####...#
#..****.........####...#
#...............####...#
#......######..........#
#......######.....**...#
#..........B......**...#
#......................#
#...~~~~.......3333....#
#...~~~~.......3333....#
#..............3333..*.#
#..**..................#
#..**.......#######....#
#......................#
########################
";

/// A parsed layout: the grid plus the landmarks found in it.
#[derive(Debug, Clone)]
pub struct Layout {
    /// The grid, with no agents placed yet.
    pub map: GridMap,
    /// Base cells in row-major order (south to north, west to east).
    pub bases: Vec<Position>,
    /// Cells that started with resource on them.
    pub resources: Vec<Position>,
}

impl Layout {
    /// Parse an ASCII layout. Each `*` cell receives `resource_per_cell` units.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidLayout`] for empty input, ragged rows, or
    /// unknown characters.
    pub fn parse(text: &str, resource_per_cell: u32) -> Result<Self, WorldError> {
        let rows: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i.saturating_add(1), line.trim_end()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        let Some(&(_, first)) = rows.first() else {
            return Err(WorldError::InvalidLayout {
                line: 1,
                reason: "layout is empty".to_owned(),
            });
        };
        let width = first.chars().count();
        let height = rows.len();
        let width_u32 = to_u32(width, 1)?;
        let height_u32 = to_u32(height, 1)?;

        let mut cells = vec![Cell::open(); width.saturating_mul(height)];
        let mut bases = Vec::new();
        let mut resources = Vec::new();

        for (row_index, &(line_no, line)) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(WorldError::InvalidLayout {
                    line: line_no,
                    reason: format!("expected {width} columns, found {}", line.chars().count()),
                });
            }
            // First text row is the top (northernmost) grid row.
            let y = height.saturating_sub(1).saturating_sub(row_index);
            for (x, ch) in line.chars().enumerate() {
                let cell = parse_cell(ch, resource_per_cell).ok_or_else(|| {
                    WorldError::InvalidLayout {
                        line: line_no,
                        reason: format!("unknown cell character {ch:?}"),
                    }
                })?;
                let position = Position::new(to_i32(x, line_no)?, to_i32(y, line_no)?);
                match cell.terrain {
                    Terrain::Base => bases.push(position),
                    _ if cell.has_resource() => resources.push(position),
                    _ => {}
                }
                let index = y.saturating_mul(width).saturating_add(x);
                if let Some(slot) = cells.get_mut(index) {
                    *slot = cell;
                }
            }
        }

        bases.sort_unstable();
        resources.sort_unstable();
        let map = GridMap::from_cells(width_u32, height_u32, cells)?;
        debug!(
            width,
            height,
            bases = bases.len(),
            resource_cells = resources.len(),
            "Layout parsed"
        );
        Ok(Self {
            map,
            bases,
            resources,
        })
    }

    /// Parse [`DEFAULT_LAYOUT`].
    ///
    /// # Errors
    ///
    /// Never fails for the built-in text; the signature matches [`Layout::parse`].
    pub fn default_layout(resource_per_cell: u32) -> Result<Self, WorldError> {
        Self::parse(DEFAULT_LAYOUT, resource_per_cell)
    }

    /// The first base, if the layout has one.
    pub fn primary_base(&self) -> Option<Position> {
        self.bases.first().copied()
    }
}

fn parse_cell(ch: char, resource_per_cell: u32) -> Option<Cell> {
    let cell = match ch {
        '.' => Cell::open(),
        '#' => Cell::with_terrain(Terrain::Wall),
        '~' => Cell::with_terrain(Terrain::Water),
        'B' => Cell::with_terrain(Terrain::Base),
        '*' => Cell {
            resource: resource_per_cell,
            ..Cell::open()
        },
        digit => {
            let elevation = digit.to_digit(10)?;
            Cell {
                elevation: i32::try_from(elevation).ok()?,
                ..Cell::open()
            }
        }
    };
    Some(cell)
}

fn to_u32(value: usize, line: usize) -> Result<u32, WorldError> {
    u32::try_from(value).map_err(|_err| WorldError::InvalidLayout {
        line,
        reason: "layout is too large".to_owned(),
    })
}

fn to_i32(value: usize, line: usize) -> Result<i32, WorldError> {
    i32::try_from(value).map_err(|_err| WorldError::InvalidLayout {
        line,
        reason: "layout is too large".to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_parses() {
        let layout = Layout::default_layout(40).unwrap();
        assert_eq!(layout.map.width(), 24);
        assert_eq!(layout.map.height(), 16);
        assert_eq!(layout.primary_base(), Some(Position::new(11, 8)));
        assert_eq!(layout.resources.len(), 8 + 4 + 1 + 4);
        assert_eq!(layout.map.total_resource(), 40 * 17);
    }

    #[test]
    fn first_row_is_north() {
        let layout = Layout::parse("#.\n..\n", 1).unwrap();
        let top_left = layout.map.cell(Position::new(0, 1)).map(|c| c.terrain);
        let bottom_left = layout.map.cell(Position::new(0, 0)).map(|c| c.terrain);
        assert_eq!(top_left, Some(Terrain::Wall));
        assert_eq!(bottom_left, Some(Terrain::Open));
    }

    #[test]
    fn digits_are_elevation() {
        let layout = Layout::parse("07\n..\n", 1).unwrap();
        assert_eq!(layout.map.cell(Position::new(1, 1)).map(|c| c.elevation), Some(7));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Layout::parse("...\n..\n", 1);
        assert!(matches!(err, Err(WorldError::InvalidLayout { line: 2, .. })));
    }

    #[test]
    fn unknown_characters_rejected() {
        assert!(Layout::parse("..x\n", 1).is_err());
    }

    #[test]
    fn empty_layout_rejected() {
        assert!(Layout::parse("\n\n", 1).is_err());
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure progression system that decides which units a learner may enter.
//!
//! Units are laid out on a grid by their linear position. A unit becomes
//! available once any edge-adjacent unit is completed. When the learner has
//! not completed any of the supplied units, a single entry point is offered
//! instead: the highest-positioned mandatory unit, or the highest-positioned
//! unit overall when no unit is mandatory.

use std::collections::{BTreeMap, BTreeSet};

use almanac_core::{GridCoord, GridLayout, Unit, UnitId, UnitState};

/// Stateless progression engine parameterised by the grid layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progression {
    layout: GridLayout,
}

impl Progression {
    /// Creates a progression engine that lays units out with `layout`.
    #[must_use]
    pub const fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    /// Layout used to place units on the grid.
    #[must_use]
    pub const fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Assigns a progression state to every supplied unit.
    ///
    /// Identifiers in `completed` that do not belong to `units` are ignored.
    /// The returned map holds exactly one entry per distinct unit identifier.
    #[must_use]
    pub fn compute_states(
        &self,
        units: &[Unit],
        completed: &BTreeSet<UnitId>,
    ) -> BTreeMap<UnitId, UnitState> {
        let mut states = BTreeMap::new();
        if units.is_empty() {
            return states;
        }

        let completed_cells: Vec<GridCoord> = units
            .iter()
            .filter(|unit| completed.contains(&unit.id))
            .map(|unit| self.layout.coord_of(unit.position))
            .collect();

        if completed_cells.is_empty() {
            let entry = entry_point(units);
            for unit in units {
                let state = if Some(unit.id) == entry {
                    UnitState::Available
                } else {
                    UnitState::Locked
                };
                let _ = states.insert(unit.id, state);
            }
            return states;
        }

        for unit in units {
            let state = if completed.contains(&unit.id) {
                UnitState::Completed
            } else {
                let cell = self.layout.coord_of(unit.position);
                if completed_cells.iter().any(|done| done.is_adjacent(cell)) {
                    UnitState::Available
                } else {
                    UnitState::Locked
                }
            };
            let _ = states.insert(unit.id, state);
        }

        states
    }

    /// Resolves the state of a single unit, if it belongs to `units`.
    #[must_use]
    pub fn state_of(
        &self,
        units: &[Unit],
        completed: &BTreeSet<UnitId>,
        unit: UnitId,
    ) -> Option<UnitState> {
        self.compute_states(units, completed).get(&unit).copied()
    }
}

/// Selects the unit offered to a learner who has not completed anything yet.
///
/// Mandatory units take precedence; among the candidates the highest
/// position wins and equal positions resolve to the first unit in `units`.
#[must_use]
pub fn entry_point(units: &[Unit]) -> Option<UnitId> {
    highest_position(units.iter().filter(|unit| unit.mandatory))
        .or_else(|| highest_position(units.iter()))
        .map(|unit| unit.id)
}

fn highest_position<'a>(units: impl Iterator<Item = &'a Unit>) -> Option<&'a Unit> {
    units.fold(None::<&'a Unit>, |best, unit| match best {
        Some(current) if current.position >= unit.position => Some(current),
        _ => Some(unit),
    })
}

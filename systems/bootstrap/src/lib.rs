#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the Almanac experience.

use std::collections::BTreeMap;

use almanac_core::{CurriculumId, GridLayout, LearnerId, LearnerSnapshot, Unit, UnitId, UnitState};
use almanac_world::{query, World};

/// Produces data required to greet the learner and draw their learning path.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the experience starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Exposes the grid layout required for rendering learning paths.
    #[must_use]
    pub fn layout(&self, world: &World) -> GridLayout {
        query::layout(world)
    }

    /// Units of the curriculum in content-store order.
    #[must_use]
    pub fn units(&self, world: &World, curriculum: CurriculumId) -> Vec<Unit> {
        query::units(world, curriculum)
    }

    /// Progression state of every unit as the learner should see it.
    #[must_use]
    pub fn unit_states(
        &self,
        world: &World,
        learner: LearnerId,
        curriculum: CurriculumId,
    ) -> BTreeMap<UnitId, UnitState> {
        query::unit_states(world, learner, curriculum)
    }

    /// Exposes the learner's wallet for the status bar.
    #[must_use]
    pub fn learner(&self, world: &World, learner: LearnerId) -> Option<LearnerSnapshot> {
        query::learner(world, learner)
    }
}

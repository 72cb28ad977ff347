#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Almanac adapters.

use std::{collections::BTreeMap, error::Error, fmt};

use almanac_core::{GridCoord, GridLayout, Unit, UnitId, UnitState};
use anyhow::Result as AnyResult;
use glam::Vec2;

/// RGBA color used when presenting learning paths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Fill color used for a unit in the provided state.
    #[must_use]
    pub const fn for_state(state: UnitState) -> Self {
        match state {
            UnitState::Completed => Self::from_rgb_u8(255, 200, 0),
            UnitState::Available => Self::from_rgb_u8(88, 204, 2),
            UnitState::Locked => Self::from_rgb_u8(175, 175, 175),
        }
    }
}

/// Single unit drawn on the learning path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodePresentation {
    /// Unit represented by the node.
    pub unit: UnitId,
    /// Progression state displayed to the learner.
    pub state: UnitState,
    /// Grid cell occupied by the unit.
    pub coord: GridCoord,
    /// Centre of the node expressed in scene units.
    pub centre: Vec2,
    /// Fill color derived from the state.
    pub color: Color,
    /// Whether the unit is required for curriculum completion.
    pub mandatory: bool,
}

/// Path segment joining two grid-adjacent units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connector {
    /// Unit listed first in content-store order.
    pub from: UnitId,
    /// Unit listed second in content-store order.
    pub to: UnitId,
    /// Start of the segment in scene units.
    pub start: Vec2,
    /// End of the segment in scene units.
    pub end: Vec2,
    /// Whether the learner completed either end of the segment.
    pub unlocked: bool,
}

/// Scene description of a learner's path through a curriculum.
#[derive(Clone, Debug, PartialEq)]
pub struct PathScene {
    /// Number of columns of the grid.
    pub columns: u32,
    /// Number of rows needed to hold every unit.
    pub rows: u32,
    /// Distance between neighbouring node centres.
    pub spacing: f32,
    /// Nodes in content-store order.
    pub nodes: Vec<NodePresentation>,
    /// Segments between grid-adjacent units.
    pub connectors: Vec<Connector>,
}

impl PathScene {
    /// Lays out `units` on the grid described by `layout`.
    ///
    /// Units missing from `states` are drawn as locked. Returns an error when
    /// `spacing` is not a positive finite number.
    pub fn build(
        units: &[Unit],
        states: &BTreeMap<UnitId, UnitState>,
        layout: GridLayout,
        spacing: f32,
    ) -> Result<Self, RenderingError> {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(RenderingError::InvalidSpacing { spacing });
        }

        let nodes: Vec<NodePresentation> = units
            .iter()
            .map(|unit| {
                let state = states.get(&unit.id).copied().unwrap_or(UnitState::Locked);
                let coord = layout.coord_of(unit.position);
                NodePresentation {
                    unit: unit.id,
                    state,
                    coord,
                    centre: Vec2::new(coord.column() as f32, coord.row() as f32) * spacing,
                    color: Color::for_state(state),
                    mandatory: unit.mandatory,
                }
            })
            .collect();

        let mut connectors = Vec::new();
        for (index, first) in nodes.iter().enumerate() {
            for second in &nodes[index + 1..] {
                if !first.coord.is_adjacent(second.coord) {
                    continue;
                }
                connectors.push(Connector {
                    from: first.unit,
                    to: second.unit,
                    start: first.centre,
                    end: second.centre,
                    unlocked: first.state == UnitState::Completed
                        || second.state == UnitState::Completed,
                });
            }
        }

        let rows = units
            .iter()
            .map(|unit| layout.rows_for(unit.position))
            .max()
            .unwrap_or(0);

        Ok(Self {
            columns: layout.columns(),
            rows,
            spacing,
            nodes,
            connectors,
        })
    }

    /// Looks up the node drawn for a unit.
    #[must_use]
    pub fn node(&self, unit: UnitId) -> Option<&NodePresentation> {
        self.nodes.iter().find(|node| node.unit == unit)
    }
}

/// Rendering backend capable of presenting Almanac learning paths.
pub trait RenderingBackend {
    /// Draws the provided scene.
    fn present(&mut self, scene: &PathScene) -> AnyResult<()>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Node spacing must be positive so nodes do not overlap.
    InvalidSpacing {
        /// Provided spacing that failed validation.
        spacing: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpacing { spacing } => {
                write!(f, "spacing must be positive (received {spacing})")
            }
        }
    }
}

impl Error for RenderingError {}

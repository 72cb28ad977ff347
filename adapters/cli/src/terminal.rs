//! Plain-text rendering backend used by the command-line adapter.

use std::{collections::BTreeSet, io::Write};

use almanac_core::{GridCoord, UnitId, UnitState};
use almanac_rendering::{NodePresentation, PathScene, RenderingBackend};
use anyhow::Result;

const CELL_WIDTH: usize = 5;
const GAP_MARKER: &str = "...";

/// Renders learning paths as a character grid.
#[derive(Debug)]
pub(crate) struct TerminalBackend<W> {
    out: W,
}

impl<W: Write> TerminalBackend<W> {
    /// Creates a backend that writes to `out`.
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RenderingBackend for TerminalBackend<W> {
    fn present(&mut self, scene: &PathScene) -> Result<()> {
        // Only occupied rows and columns are walked; runs of empty rows collapse.
        let rows: BTreeSet<u32> = scene.nodes.iter().map(|node| node.coord.row()).collect();
        let last_column = scene
            .nodes
            .iter()
            .map(|node| node.coord.column())
            .max()
            .unwrap_or(0);

        let mut previous: Option<u32> = None;
        for &row in &rows {
            if let Some(above) = previous {
                if row - above > 1 {
                    writeln!(self.out, "{GAP_MARKER}")?;
                } else {
                    let mut between = String::new();
                    for column in 0..=last_column {
                        if column > 0 {
                            between.push_str("  ");
                        }
                        let upper = node_at(scene, GridCoord::new(above, column));
                        let lower = node_at(scene, GridCoord::new(row, column));
                        between.push_str(link(scene, upper, lower, "  |  ", "  :  ", "     "));
                    }
                    writeln!(self.out, "{}", between.trim_end())?;
                }
            }

            let mut line = String::new();
            for column in 0..=last_column {
                let node = node_at(scene, GridCoord::new(row, column));
                if column > 0 {
                    let left = node_at(scene, GridCoord::new(row, column - 1));
                    line.push_str(link(scene, left, node, "==", "--", "  "));
                }
                line.push_str(&cell(node));
            }
            writeln!(self.out, "{}", line.trim_end())?;
            previous = Some(row);
        }
        self.out.flush()?;
        Ok(())
    }
}

fn node_at(scene: &PathScene, coord: GridCoord) -> Option<&NodePresentation> {
    scene.nodes.iter().find(|node| node.coord == coord)
}

fn link<'a>(
    scene: &PathScene,
    first: Option<&NodePresentation>,
    second: Option<&NodePresentation>,
    unlocked: &'a str,
    locked: &'a str,
    none: &'a str,
) -> &'a str {
    let (Some(first), Some(second)) = (first, second) else {
        return none;
    };
    match connector_between(scene, first.unit, second.unit) {
        Some(true) => unlocked,
        Some(false) => locked,
        None => none,
    }
}

fn connector_between(scene: &PathScene, a: UnitId, b: UnitId) -> Option<bool> {
    scene
        .connectors
        .iter()
        .find(|connector| {
            (connector.from == a && connector.to == b) || (connector.from == b && connector.to == a)
        })
        .map(|connector| connector.unlocked)
}

fn cell(node: Option<&NodePresentation>) -> String {
    let Some(node) = node else {
        return " ".repeat(CELL_WIDTH);
    };
    let symbol = match node.state {
        UnitState::Completed => '*',
        UnitState::Available => '>',
        UnitState::Locked => 'x',
    };
    format!("{symbol}{:<width$}", node.unit.get(), width = CELL_WIDTH - 1)
}

//! Curriculum files loaded from TOML.

use std::{fs, path::Path};

use almanac_core::{
    CurriculumId, GridLayout, LessonId, Position, Unit, UnitId, UnitPlan, DEFAULT_GRID_COLUMNS,
};
use almanac_system_quiz::Question;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Curriculum definition as authored on disk.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct CurriculumFile {
    #[serde(default = "default_id")]
    pub(crate) id: CurriculumId,
    #[serde(default = "default_columns")]
    pub(crate) columns: u32,
    #[serde(default)]
    pub(crate) units: Vec<UnitEntry>,
}

/// Unit entry of a curriculum file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct UnitEntry {
    pub(crate) id: UnitId,
    pub(crate) position: Position,
    #[serde(default)]
    pub(crate) mandatory: bool,
    #[serde(default)]
    pub(crate) lessons: Vec<LessonEntry>,
}

/// Lesson entry nested inside a unit.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct LessonEntry {
    pub(crate) id: LessonId,
    #[serde(default)]
    pub(crate) questions: Vec<Question>,
}

fn default_id() -> CurriculumId {
    CurriculumId::new(1)
}

fn default_columns() -> u32 {
    DEFAULT_GRID_COLUMNS
}

impl CurriculumFile {
    /// Reads and parses a curriculum file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read curriculum {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse curriculum {}", path.display()))
    }

    /// Parses a curriculum from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Layout described by the `columns` setting.
    pub(crate) fn layout(&self) -> Result<GridLayout> {
        GridLayout::with_columns(self.columns).context("curriculum columns must be positive")
    }

    /// Units in file order.
    pub(crate) fn units(&self) -> Vec<Unit> {
        self.units
            .iter()
            .map(|entry| Unit::new(entry.id, entry.position, entry.mandatory))
            .collect()
    }

    /// Unit plans ready to be installed in the world.
    pub(crate) fn plans(&self) -> Vec<UnitPlan> {
        self.units
            .iter()
            .map(|entry| {
                UnitPlan::new(
                    Unit::new(entry.id, entry.position, entry.mandatory),
                    entry.lessons.iter().map(|lesson| lesson.id).collect(),
                )
            })
            .collect()
    }

    /// Questions attached to a lesson; unknown lessons have none.
    pub(crate) fn questions(&self, lesson: LessonId) -> Vec<Question> {
        self.units
            .iter()
            .flat_map(|unit| &unit.lessons)
            .find(|entry| entry.id == lesson)
            .map(|entry| entry.questions.clone())
            .unwrap_or_default()
    }
}

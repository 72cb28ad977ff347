#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Almanac experience.

mod curriculum;
mod progress_transfer;
mod terminal;
mod walk;

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::PathBuf,
};

use almanac_core::{Command, Event, GridLayout, LearnerId, Unit, UnitId, UnitState};
use almanac_rendering::{PathScene, RenderingBackend};
use almanac_system_bootstrap::Bootstrap;
use almanac_system_progression::Progression;
use almanac_world::{self as world, World};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    curriculum::CurriculumFile, progress_transfer::ProgressSnapshot, terminal::TerminalBackend,
};

const LEARNER: LearnerId = LearnerId::new(1);
const NODE_SPACING: f32 = 1.0;

/// Almanac learning-path tools.
#[derive(Debug, Parser)]
#[command(name = "almanac", version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the learning path of a curriculum
    Path(ProgressArgs),
    /// Print a single-line progress snapshot
    Export(ProgressArgs),
    /// Print the learning path stored in a progress snapshot
    Import {
        /// Snapshot produced by `almanac export`
        snapshot: String,
    },
    /// Answer every lesson of a curriculum correctly and log the events
    Walk(CurriculumArgs),
}

#[derive(Debug, Args)]
struct CurriculumArgs {
    /// Curriculum definition in TOML
    #[arg(short, long, env = "ALMANAC_CURRICULUM")]
    curriculum: PathBuf,
}

#[derive(Debug, Args)]
struct ProgressArgs {
    #[command(flatten)]
    source: CurriculumArgs,

    /// Identifiers of units the learner completed
    #[arg(long, value_delimiter = ',')]
    completed: Vec<u32>,
}

/// Filter used when `RUST_LOG` is unset.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "almanac=debug"
    } else {
        "almanac=info"
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

/// Entry point for the Almanac command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Path(args) => path(&args),
        Commands::Export(args) => export(&args),
        Commands::Import { snapshot } => import(&snapshot),
        Commands::Walk(args) => run_walk(&args),
    }
}

fn path(args: &ProgressArgs) -> Result<()> {
    let file = CurriculumFile::load(&args.source.curriculum)?;
    let world = progressed_world(&file, &args.completed)?;
    let bootstrap = Bootstrap;

    println!("{}", bootstrap.welcome_banner(&world));
    let units = bootstrap.units(&world, file.id);
    let states = bootstrap.unit_states(&world, LEARNER, file.id);
    present(&units, &states, bootstrap.layout(&world))
}

fn export(args: &ProgressArgs) -> Result<()> {
    let file = CurriculumFile::load(&args.source.curriculum)?;
    let world = progressed_world(&file, &args.completed)?;

    let completed = world::query::completed_units(&world, LEARNER, file.id)
        .into_iter()
        .collect();
    let snapshot = ProgressSnapshot::capture(file.layout()?, file.units(), completed);
    println!("{}", snapshot.encode()?);
    Ok(())
}

fn import(encoded: &str) -> Result<()> {
    let snapshot = ProgressSnapshot::decode(encoded).context("failed to decode snapshot")?;
    let layout = snapshot.layout()?;
    let completed: BTreeSet<UnitId> = snapshot.completed.iter().copied().collect();
    let states = Progression::new(layout).compute_states(&snapshot.units, &completed);
    info!(
        units = snapshot.units.len(),
        completed = completed.len(),
        "snapshot imported"
    );
    present(&snapshot.units, &states, layout)
}

fn run_walk(args: &CurriculumArgs) -> Result<()> {
    let file = CurriculumFile::load(&args.curriculum)?;
    let mut world = World::with_layout(file.layout()?);
    println!("{}", Bootstrap.welcome_banner(&world));

    let summary = walk::run(&mut world, &file, LEARNER)?;
    let snapshot = world::query::learner(&world, LEARNER).context("learner was not enrolled")?;
    info!(
        lessons = summary.lessons,
        finished = summary.finished,
        xp = snapshot.wallet.xp,
        streak = snapshot.wallet.streak.days(),
        hearts = snapshot.wallet.hearts,
        "walk complete"
    );

    let bootstrap = Bootstrap;
    present(
        &bootstrap.units(&world, file.id),
        &bootstrap.unit_states(&world, LEARNER, file.id),
        bootstrap.layout(&world),
    )
}

/// Builds a world holding the curriculum and a learner credited with `completed`.
fn progressed_world(file: &CurriculumFile, completed: &[u32]) -> Result<World> {
    let mut world = World::with_layout(file.layout()?);
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::ConfigureCurriculum {
            curriculum: file.id,
            units: file.plans(),
        },
        &mut events,
    );
    world::apply(&mut world, Command::EnrollLearner { learner: LEARNER }, &mut events);
    for unit in completed {
        world::apply(
            &mut world,
            Command::MarkUnitCompleted {
                learner: LEARNER,
                curriculum: file.id,
                unit: UnitId::new(*unit),
            },
            &mut events,
        );
    }

    if let Some(Event::CurriculumRejected { reason, .. }) = events.first() {
        bail!("curriculum rejected: {reason}");
    }
    Ok(world)
}

fn present(
    units: &[Unit],
    states: &BTreeMap<UnitId, UnitState>,
    layout: GridLayout,
) -> Result<()> {
    let scene = PathScene::build(units, states, layout, NODE_SPACING)?;
    TerminalBackend::new(io::stdout().lock()).present(&scene)
}

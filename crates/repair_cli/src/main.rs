use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use repair_control::{commands_for_cycle, AutoAssignController};
use repair_core::scheduler::{actionable_tasks, summarize};
use repair_core::{CampaignState, Event, EventLevel, PartWork, Rules, TaskSummary};
use repair_world::{
    build_campaign, cycle_date, load_campaign_file, load_rules, load_save, write_save, SaveFile,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "repair_cli", about = "Campaign repair bay CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct Source {
    /// Build the campaign from --campaign with this seed. Mutually exclusive with --state.
    #[arg(long, conflicts_with = "state_file")]
    seed: Option<u64>,
    /// Load a saved campaign state from a JSON file. Mutually exclusive with --seed.
    #[arg(long = "state", conflicts_with = "seed")]
    state_file: Option<String>,
    #[arg(long, default_value = "./content")]
    content_dir: String,
    #[arg(long, default_value = "./content/campaign.json")]
    campaign: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a fixed number of maintenance cycles with automatic assignment.
    Run {
        #[arg(long)]
        cycles: u64,
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value_t = 1)]
        print_every: u64,
        #[arg(long, default_value = "normal", value_parser = ["normal", "debug"])]
        event_level: String,
        /// Write the final state here.
        #[arg(long)]
        save: Option<String>,
    },
    /// Print the task board.
    Tasks {
        #[command(flatten)]
        source: Source,
    },
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn load(source: &Source) -> Result<(Rules, SaveFile, ChaCha8Rng)> {
    let rules = load_rules(&source.content_dir)?;

    if let Some(path) = &source.state_file {
        let save = load_save(path)?;
        anyhow::ensure!(
            save.state.meta.rules_version == rules.rules_version,
            "state file was written under rules '{}', content has '{}'",
            save.state.meta.rules_version,
            rules.rules_version,
        );
        // Continue the stream rather than replaying it.
        let rng = ChaCha8Rng::seed_from_u64(save.state.meta.seed ^ save.state.meta.tick);
        return Ok((rules, save, rng));
    }

    let file = load_campaign_file(&source.campaign)?;
    let seed = source.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let state = build_campaign(&rules, &file, seed, &mut rng);
    let save = SaveFile {
        start_date: file.start_date,
        state,
    };
    Ok((rules, save, rng))
}

fn date_label(start: NaiveDate, tick: u64) -> String {
    cycle_date(start, tick).map_or_else(|| format!("cycle {tick}"), |d| d.to_string())
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(
    cycles: u64,
    source: &Source,
    print_every: u64,
    event_level: EventLevel,
    save_path: Option<&str>,
) -> Result<()> {
    let (rules, SaveFile { start_date, mut state }, mut rng) = load(source)?;
    let mut controller = AutoAssignController;

    println!(
        "Starting repairs: cycles={cycles} seed={} units={} technicians={} rules={}",
        state.meta.seed,
        state.units.len(),
        state.technicians.len(),
        rules.rules_version,
    );
    println!("{}", "-".repeat(80));

    for _ in 0..cycles {
        let date = date_label(start_date, state.meta.tick);
        let commands = commands_for_cycle(&mut controller, &mut state, &rules.constants);
        let events = repair_core::tick(&mut state, &commands, &rules, &mut rng, event_level);

        // Print notable events regardless of print_every.
        for envelope in &events {
            match &envelope.event {
                Event::TaskResolved {
                    task_name,
                    mode,
                    outcome,
                    margin,
                    ..
                } => println!(
                    "[{date}] {} {task_name}: {outcome:?} (margin {margin:+})",
                    mode.action()
                ),
                Event::ReplacementUnavailable { kind, .. } => {
                    println!("[{date}] no replacement in stock: {kind}");
                }
                Event::AttemptBlocked { reason, .. } => println!("[{date}] blocked: {reason}"),
                _ => {}
            }
        }

        if print_every > 0 && state.meta.tick % print_every == 0 {
            print_status(&state, &rules, start_date);
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state at {}:", date_label(start_date, state.meta.tick));
    print_board(&state, &rules)?;

    if let Some(path) = save_path {
        write_save(path, &SaveFile { start_date, state })
            .with_context(|| format!("saving state to {path}"))?;
        info!(path, "state saved");
    }
    Ok(())
}

fn print_status(state: &CampaignState, rules: &Rules, start_date: NaiveDate) {
    let board = actionable_tasks(state, None, &rules.constants);
    let scheduled = state
        .tasks
        .values()
        .filter(|t| t.team_id().is_some())
        .count();
    println!(
        "[{}]  open_tasks={:3}  scheduled={:3}  spares={:3}",
        date_label(start_date, state.meta.tick),
        board.len(),
        scheduled,
        state.parts.spares().count(),
    );
}

// ---------------------------------------------------------------------------
// Task board
// ---------------------------------------------------------------------------

fn describe(summary: &TaskSummary) -> String {
    let skill = match (summary.show_skill, summary.skill_min) {
        (false, _) => String::new(),
        (true, Some(tier)) => format!("  {tier}+"),
        (true, None) => "  Impossible".to_string(),
    };
    let technician = summary
        .technician
        .map_or_else(String::new, |id| format!("  [{id}]"));
    format!(
        "{:<11} {:<32} {:>4}m  {:>10}{skill}{technician}",
        summary.action.action(),
        summary.name,
        summary.time_left,
        summary.modifier_total.to_string(),
    )
}

fn print_board(state: &CampaignState, rules: &Rules) -> Result<()> {
    for (task_id, availability) in actionable_tasks(state, None, &rules.constants) {
        let summary = summarize(state, &task_id, &rules.constants)?;
        println!("{task_id}  {:<13} {}", format!("{availability:?}"), describe(&summary));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            cycles,
            source,
            print_every,
            event_level,
            save,
        } => {
            let level = match event_level.as_str() {
                "debug" => EventLevel::Debug,
                _ => EventLevel::Normal,
            };
            run(cycles, &source, print_every, level, save.as_deref())?;
        }
        Commands::Tasks { source } => {
            let (rules, save, _) = load(&source)?;
            println!("Task board at {}:", date_label(save.start_date, save.state.meta.tick));
            print_board(&save.state, &rules)?;
        }
    }
    Ok(())
}

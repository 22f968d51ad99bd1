//! Classroom Gacha - command line front end
//!
//! All commands work on one JSON data file (the image of the in-memory
//! backend), loaded asynchronously together with an optional config file.

use clap::{Parser, Subcommand, ValueEnum};
use classroom_gacha::{
    backend::MemoryBackend,
    config::{ConfigOverrides, SessionConfig},
    core::StudentId,
    game::{
        ClassSession, InteractiveJudge, JudgeController, OutputFormat, RandomJudge, Roster, SessionLogger,
        SessionSnapshot, TurnLoop, VerbosityLevel,
    },
    loader::{demo_students, load_workspace, save_class_data, ClassData},
    simulation::{run_simulation, SimulationConfig},
    GachaError, Result,
};
use std::path::PathBuf;
use std::time::Duration;

/// Offset separating the auto judge's RNG stream from the session's
const JUDGE_SEED_OFFSET: u64 = 0x1234_5678_9ABC_DEF0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser)]
#[command(name = "gacha")]
#[command(about = "Classroom Gacha - weighted random student picker", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, global = true, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Class data file (default: classroom.json, or the config's data_file)
    #[arg(long, short = 'd', global = true, value_name = "DATA_FILE")]
    data: Option<PathBuf>,

    /// Random seed for deterministic sessions
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Verbosity (silent/0, minimal/1, normal/2, verbose/3)
    #[arg(long, short = 'v', global = true)]
    verbosity: Option<VerbosityLevel>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    format: Option<FormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a data file
    Init {
        /// Fill the roster with the demo class
        #[arg(long)]
        demo: bool,

        /// Students per dorm for the demo class (0 = no dorms)
        #[arg(long, default_value_t = 4)]
        dorm_size: usize,

        /// Overwrite an existing data file
        #[arg(long)]
        force: bool,
    },

    /// Add a student
    Add {
        name: String,

        #[arg(long)]
        dorm: Option<String>,
    },

    /// Remove a student and their cards
    Remove { id: u32 },

    /// Manually change a student's stars
    Adjust {
        id: u32,

        #[arg(allow_hyphen_values = true)]
        delta: i32,
    },

    /// Run a classroom session
    Play {
        /// Judge with the random judge instead of prompting
        #[arg(long)]
        auto: bool,

        /// Maximum number of draws
        #[arg(long, short = 't', default_value_t = 10)]
        turns: u32,

        /// Stop once every student has been called on
        #[arg(long)]
        until_coverage: bool,

        /// Save a session snapshot here when the session stops
        #[arg(long, value_name = "SNAPSHOT_FILE")]
        snapshot: Option<PathBuf>,

        /// Resume from a session snapshot
        #[arg(long, value_name = "SNAPSHOT_FILE")]
        resume: Option<PathBuf>,
    },

    /// Show the roster, coverage and leaderboards
    Roster {
        /// Leaderboard length
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// List the item card catalog
    Catalog,

    /// Simulate many sessions in parallel and report statistics
    Simulate {
        #[arg(long, short = 's', default_value_t = 100)]
        sessions: usize,

        /// Turns per session
        #[arg(long, short = 't', default_value_t = 60)]
        turns: u32,

        /// Stop starting sessions after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        seed: cli.seed,
        verbosity: cli.verbosity,
        output_format: cli.format.map(OutputFormat::from),
        data_file: cli.data.clone(),
    };

    match cli.command {
        Commands::Init { demo, dorm_size, force } => run_init(cli.config, overrides, demo, dorm_size, force).await?,
        Commands::Add { name, dorm } => {
            let (config, mut backend) = open_backend(cli.config, overrides).await?;
            let id = backend.add_student(&name, dorm.as_deref())?;
            save_class_data(&config.data_file, &backend.to_data()).await?;
            println!("Added {name} as {id}");
        }
        Commands::Remove { id } => {
            let (config, backend) = open_backend(cli.config, overrides).await?;
            let mut session = open_session(&config, backend)?;
            let removed = session.remove_student(StudentId::new(id))?;
            finish_session(&config, session).await?;
            println!("Removed {}", removed.name);
        }
        Commands::Adjust { id, delta } => {
            let (config, backend) = open_backend(cli.config, overrides).await?;
            let mut session = open_session(&config, backend)?;
            let change = session.adjust_stars(StudentId::new(id), delta)?;
            let name = session.roster().name_of(change.student);
            println!("{name}: {} -> {} stars", change.stars_before, change.stars_after);
            finish_session(&config, session).await?;
        }
        Commands::Play {
            auto,
            turns,
            until_coverage,
            snapshot,
            resume,
        } => run_play(cli.config, overrides, auto, turns, until_coverage, snapshot, resume).await?,
        Commands::Roster { top } => {
            let (_, backend) = open_backend(cli.config, overrides).await?;
            print_roster(&backend, top);
        }
        Commands::Catalog => {
            let (_, backend) = open_backend(cli.config, overrides).await?;
            print_catalog(&backend);
        }
        Commands::Simulate {
            sessions,
            turns,
            seconds,
        } => run_simulate(cli.config, overrides, sessions, turns, seconds).await?,
    }

    Ok(())
}

async fn load_config(config_path: Option<PathBuf>, overrides: ConfigOverrides) -> Result<(SessionConfig, Option<ClassData>)> {
    let data_override = overrides.data_file.clone();
    let (mut config, data) = load_workspace(config_path, data_override).await?;
    config.apply_overrides(overrides);
    Ok((config, data))
}

/// Load config and data; a missing data file is an error
async fn open_backend(config_path: Option<PathBuf>, overrides: ConfigOverrides) -> Result<(SessionConfig, MemoryBackend)> {
    let (config, data) = load_config(config_path, overrides).await?;
    let Some(data) = data else {
        return Err(GachaError::InvalidAction(format!(
            "no data file at {}; run `gacha init` first",
            config.data_file.display()
        )));
    };
    let backend = MemoryBackend::from_data(data, config.resolved_seed());
    Ok((config, backend))
}

fn session_logger(config: &SessionConfig) -> SessionLogger {
    let mut logger = SessionLogger::with_verbosity(config.verbosity);
    logger.set_output_format(config.output_format);
    logger
}

fn open_session(config: &SessionConfig, backend: MemoryBackend) -> Result<ClassSession> {
    let seed = config.resolved_seed();
    Ok(ClassSession::new(backend, seed)?.with_logger(session_logger(config)))
}

/// Report queued persistence failures and write the data file
async fn finish_session(config: &SessionConfig, mut session: ClassSession) -> Result<()> {
    for alert in session.drain_alerts() {
        eprintln!("Warning: turn {}: {} failed: {}", alert.turn, alert.operation, alert.message);
    }
    save_class_data(&config.data_file, &session.backend().to_data()).await
}

async fn run_init(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    demo: bool,
    dorm_size: usize,
    force: bool,
) -> Result<()> {
    let (config, existing) = load_config(config_path, overrides).await?;
    if existing.is_some() && !force {
        return Err(GachaError::InvalidAction(format!(
            "{} already exists (use --force to overwrite)",
            config.data_file.display()
        )));
    }

    let students = if demo { demo_students(dorm_size) } else { Vec::new() };
    let data = ClassData::new(students);
    save_class_data(&config.data_file, &data).await?;
    println!(
        "Created {} with {} students and {} cards",
        config.data_file.display(),
        data.students.len(),
        data.catalog.len()
    );
    Ok(())
}

async fn run_play(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    auto: bool,
    turns: u32,
    until_coverage: bool,
    snapshot_output: Option<PathBuf>,
    resume: Option<PathBuf>,
) -> Result<()> {
    let (config, backend) = open_backend(config_path, overrides).await?;
    let seed = config.resolved_seed();

    let (mut session, mut saved_judge) = match resume {
        Some(path) => {
            let snapshot = SessionSnapshot::load_from_file(&path)?;
            println!("Resuming turn {} from {}", snapshot.turn_number(), path.display());
            let judge = snapshot.judge.clone();
            (ClassSession::resume(snapshot, backend), judge)
        }
        None => (ClassSession::new(backend, seed)?, None),
    };
    session = session.with_logger(session_logger(&config));
    if config.seed.is_some() {
        println!("Using seed: {seed}");
    }

    let mut random_judge = if auto {
        Some(saved_judge.take().unwrap_or_else(|| RandomJudge::new(config.judge, seed.wrapping_add(JUDGE_SEED_OFFSET))))
    } else {
        None
    };
    let mut interactive = InteractiveJudge::stdin();
    let controller: &mut dyn JudgeController = match random_judge.as_mut() {
        Some(judge) => judge as &mut dyn JudgeController,
        None => &mut interactive,
    };

    let result = TurnLoop::new(&mut session)
        .with_max_turns(turns)
        .stop_at_full_coverage(until_coverage)
        .run(controller)?;

    let stats = session.roster().coverage();
    println!("\n=== Session Over ===");
    println!("Turns played: {}", result.turns_played);
    println!("Reason: {:?}", result.end_reason);
    println!("Coverage: {}/{} ({}%)", stats.picked, stats.total, stats.progress);

    if let Some(path) = snapshot_output {
        let mut snapshot = session.snapshot();
        if let Some(judge) = random_judge {
            snapshot = snapshot.with_judge(judge);
        }
        snapshot.save_to_file(&path)?;
        println!("Snapshot saved to {}", path.display());
    }

    finish_session(&config, session).await
}

fn print_roster(backend: &MemoryBackend, top: usize) {
    let roster = Roster::from_students(backend.students().cloned());

    println!("{:>4}  {:<16} {:<6} {:>5} {:<4} {:>5} {:>6}", "id", "name", "dorm", "stars", "tier", "picks", "cards");
    for student in roster.students() {
        let cards = backend.items().filter(|item| item.student_id == student.id).count();
        let dorm = student.dorm_number.as_ref().map(|d| d.to_string()).unwrap_or_default();
        let mut flags = String::new();
        if student.is_cursed() {
            flags.push_str(" cursed");
        }
        if student.is_immune() {
            flags.push_str(&format!(" immune:{}", student.immunity()));
        }
        println!(
            "{:>4}  {:<16} {:<6} {:>5} {:<4} {:>5} {:>6}{flags}",
            student.id.as_u32(),
            student.name.to_string(),
            dorm,
            student.stars(),
            student.rarity().label(),
            student.pick_count(),
            cards
        );
    }

    let stats = roster.coverage();
    println!("\nCoverage: {}/{} called on ({}%), {} never picked", stats.picked, stats.total, stats.progress, stats.unpicked);

    println!("\nMost picked:");
    for (rank, student) in roster.leaderboard_by_picks(top).into_iter().enumerate() {
        println!("  {}. {} - {} picks", rank + 1, student.name, student.pick_count());
    }
    println!("\nMost stars:");
    for (rank, student) in roster.leaderboard_by_stars(top).into_iter().enumerate() {
        println!("  {}. {} - {} [{}]", rank + 1, student.name, student.stars(), student.rarity().title());
    }
}

fn print_catalog(backend: &MemoryBackend) {
    for card in backend.catalog() {
        println!(
            "{:>3}  {:<24} {:<9} x{:<4} {}",
            card.id.as_u32(),
            card.name.to_string(),
            card.pool.to_string(),
            card.draw_weight(),
            card.function_desc
        );
    }
}

async fn run_simulate(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    sessions: usize,
    turns: u32,
    seconds: Option<u64>,
) -> Result<()> {
    let (config, data) = load_config(config_path, overrides).await?;
    let data = data.unwrap_or_else(|| {
        println!("No data file; simulating the demo class");
        ClassData::new(demo_students(4))
    });

    let sim_config = SimulationConfig {
        sessions,
        turns,
        seed: config.resolved_seed(),
        judge: config.judge,
        time_limit: seconds.map(Duration::from_secs),
    };
    println!(
        "Simulating {sessions} sessions of {turns} turns over {} students (seed {})\n",
        data.students.len(),
        sim_config.seed
    );

    let report = tokio::task::spawn_blocking(move || run_simulation(&data, &sim_config)).await??;
    match config.output_format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| GachaError::SerializationError(e.to_string()))?;
            println!("{json}");
        }
    }
    for failure in &report.failures {
        eprintln!("Warning: {failure}");
    }
    Ok(())
}

use clap::{Parser, Subcommand};
use fitplay_core::*;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "fitplay")]
#[command(about = "Workout routine player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a routine with the workout timer
    Play {
        /// Routine JSON file
        routine: PathBuf,

        /// Start immediately and run to completion without reading stdin
        #[arg(long)]
        auto: bool,

        /// Override the tick interval (milliseconds)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Show a routine's exercises in play order
    Show {
        /// Routine JSON file
        routine: PathBuf,
    },

    /// Show totals for completed workouts
    Stats,
}

fn main() -> Result<()> {
    fitplay_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Play {
            routine,
            auto,
            interval_ms,
        } => cmd_play(&routine, auto, interval_ms, &data_dir, &config),
        Commands::Show { routine } => cmd_show(&routine, &config),
        Commands::Stats => cmd_stats(&data_dir),
    }
}

fn cmd_play(
    routine_path: &Path,
    auto: bool,
    interval_ms: Option<u64>,
    data_dir: &Path,
    config: &Config,
) -> Result<()> {
    let routine = Routine::load_from(routine_path)?;
    tracing::debug!("Stats will be written under {:?}", data_dir);

    let mut player_config = config.player.clone();
    if let Some(ms) = interval_ms {
        if ms == 0 {
            return Err(Error::Config("--interval-ms must be positive".into()));
        }
        player_config.tick_interval_ms = ms;
    }

    let (tx, events) = channel();
    let mut player = Player::open(routine, &player_config, tx);

    let sequence = player.sequence()?;
    if sequence.source() == SequenceSource::DefaultFallback {
        println!("  ⚠ '{}' has no exercises; playing the default workout", player.routine().name);
    }
    display_header(player.routine(), &sequence);

    let completed = if auto {
        run_auto(&mut player, &events)?
    } else {
        let mut favorites = JsonFavorites::load(Config::favorites_path(data_dir))?;
        run_interactive(&mut player, &events, &mut favorites)?
    };

    if completed {
        let record = player.completion_record(&config.stats)?;
        let mut sink = JsonlStatsSink::new(Config::stats_log_path(data_dir));
        report_completion(&mut sink, &record);

        println!("\n✓ Workout complete!");
        println!(
            "  {} exercises · {} min · ~{} kcal",
            sequence.len(),
            record.update.minutes_active,
            record.update.calories_burned
        );
    }

    player.close();
    Ok(())
}

/// Start and block until the routine completes
fn run_auto(player: &mut Player, events: &Receiver<PlayerEvent>) -> Result<bool> {
    if player.command(Command::Start)? == Outcome::Ignored {
        println!("Nothing to play.");
        return Ok(false);
    }
    display_current(&player.snapshot()?);

    for event in events.iter() {
        match event {
            PlayerEvent::Tick(_) => {}
            PlayerEvent::Advanced(snapshot) => display_current(&snapshot),
            PlayerEvent::Completed(_) => return Ok(true),
        }
    }
    Ok(false)
}

enum UserAction {
    Toggle,
    Next,
    Back,
    Reset,
    Favorite,
    Quit,
}

fn parse_action(input: &str) -> Option<UserAction> {
    match input.trim().to_lowercase().as_str() {
        "" | "p" => Some(UserAction::Toggle),
        "n" => Some(UserAction::Next),
        "b" => Some(UserAction::Back),
        "r" => Some(UserAction::Reset),
        "f" => Some(UserAction::Favorite),
        "q" => Some(UserAction::Quit),
        _ => None,
    }
}

/// Forward stdin lines to the main loop
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn run_interactive(
    player: &mut Player,
    events: &Receiver<PlayerEvent>,
    favorites: &mut dyn FavoritesStore,
) -> Result<bool> {
    let mut favorite = favorites.is_favorite(player.routine().identity());
    if favorite {
        println!("  ♥ Favorite");
    }
    println!("─────────────────────────────────────────");
    println!("Enter to play/pause · 'n' next · 'b' back · 'r' restart · 'f' favorite · 'q' quit");
    println!("─────────────────────────────────────────");

    let input = spawn_input_reader();

    loop {
        while let Ok(event) = events.try_recv() {
            match event {
                PlayerEvent::Tick(snapshot) => display_timer(&snapshot)?,
                PlayerEvent::Advanced(snapshot) => {
                    println!();
                    display_current(&snapshot);
                }
                PlayerEvent::Completed(_) => return Ok(true),
            }
        }

        let line = match input.recv_timeout(Duration::from_millis(50)) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Ok(false),
        };

        let command = match parse_action(&line) {
            Some(UserAction::Quit) => return Ok(false),
            Some(UserAction::Toggle) => Command::Toggle,
            Some(UserAction::Next) => Command::SkipForward,
            Some(UserAction::Back) => Command::SkipBackward,
            Some(UserAction::Reset) => Command::Reset,
            Some(UserAction::Favorite) => {
                favorite = toggle_favorite(favorites, player.routine(), favorite);
                if favorite {
                    println!("♥ Added to favorites");
                } else {
                    println!("♡ Removed from favorites");
                }
                continue;
            }
            None => {
                println!("Unknown command: {}", line.trim());
                continue;
            }
        };

        if player.command(command)? == Outcome::Ignored {
            continue;
        }
        let snapshot = player.snapshot()?;
        match snapshot.status {
            PlayerStatus::Paused => {
                println!("⏸  Paused at {}", format_clock(u64::from(snapshot.remaining_seconds)))
            }
            PlayerStatus::Idle => println!("↺  Back to the start"),
            _ => {}
        }
        if matches!(command, Command::SkipForward | Command::SkipBackward) {
            display_current(&snapshot);
        }
    }
}

fn cmd_show(routine_path: &Path, config: &Config) -> Result<()> {
    let routine = Routine::load_from(routine_path)?;

    for problem in routine.validate() {
        eprintln!("  - {}", problem);
    }

    let sequence = ExerciseSequence::build_with(&routine, config.player.use_default_sequence);
    display_header(&routine, &sequence);

    match (&routine.exercises, sequence.source()) {
        (Some(RoutineExercises::Sections(sections)), SequenceSource::Routine) => {
            for section in &sections.0 {
                println!("  {} ({} exercises)", section.name, section.exercises.len());
                for exercise in &section.exercises {
                    display_exercise(exercise);
                }
            }
        }
        _ => {
            for exercise in sequence.iter() {
                display_exercise(exercise);
            }
        }
    }
    println!();
    Ok(())
}

fn cmd_stats(data_dir: &Path) -> Result<()> {
    let records = read_records(&Config::stats_log_path(data_dir))?;
    let totals = StatsTotals::from_records(&records);

    if totals.completed_workouts == 0 {
        println!("No completed workouts yet.");
        return Ok(());
    }

    println!("Completed workouts: {}", totals.completed_workouts);
    println!("Calories burned:    {}", totals.calories_burned);
    println!("Minutes active:     {}", totals.minutes_active);
    if let Some(last) = totals.last_completed_at {
        println!("Last workout:       {}", last.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

fn display_header(routine: &Routine, sequence: &ExerciseSequence) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", routine.name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    if let Some(ref trainer) = routine.trainer {
        println!("  Trainer: {}", trainer);
    }
    if let Some(ref level) = routine.level {
        println!("  Level: {}", level);
    }
    println!(
        "  {} exercises · {}",
        sequence.len(),
        format_clock(sequence.total_seconds())
    );
    println!();
}

fn display_exercise(exercise: &Exercise) {
    if exercise.muscle_group.is_empty() {
        println!("    → {} ({})", exercise.name, format_duration(exercise.duration_seconds));
    } else {
        println!(
            "    → {} ({}) · {}",
            exercise.name,
            format_duration(exercise.duration_seconds),
            exercise.muscle_group
        );
    }
}

fn display_current(snapshot: &SessionSnapshot) {
    if let Some(ref exercise) = snapshot.current_exercise {
        println!(
            "▶ [{}/{}] {} · {}",
            snapshot.current_index + 1,
            snapshot.total,
            exercise.name,
            format_clock(u64::from(snapshot.remaining_seconds))
        );
    }
}

fn display_timer(snapshot: &SessionSnapshot) -> Result<()> {
    print!(
        "\r  {}  {:>3.0}% ",
        format_clock(u64::from(snapshot.remaining_seconds)),
        snapshot.progress() * 100.0
    );
    io::stdout().flush()?;
    Ok(())
}

/// "mm:ss"; minutes widen past 99
fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// "m:ss" for exercise lists
fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

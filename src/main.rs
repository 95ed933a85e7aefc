//! strive-sync - client-side sync engine for the Strive productivity app
//!
//! A thin CLI over the sync library: keeps a local state file, applies
//! user mutations to it, and synchronizes with the hosted store on demand.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use strive_sync::coach::{CoachClient, CoachMode, CoachSnapshot};
use strive_sync::models::{Priority, Reward, Task};
use strive_sync::orchestrator::{HydrateOutcome, PushOutcome, SyncOrchestrator};
use strive_sync::prefs::Prefs;
use strive_sync::{AppState, Config, HttpBackend};

#[derive(Parser)]
#[command(name = "strive-sync")]
#[command(about = "Client-side sync engine for the Strive productivity app")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new config file
    Init {
        /// Output path for config file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show local state and sync status
    Status,

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Reward points for completing it
        #[arg(short, long, default_value_t = 0)]
        points: u32,

        /// Priority: low, medium, high
        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// Mark a task completed
    Done {
        /// Task id
        id: String,
    },

    /// Add a claimable reward
    AddReward {
        /// Reward title
        title: String,

        /// Points required to claim it
        #[arg(short, long)]
        points: u32,
    },

    /// Claim an available reward
    Claim {
        /// Reward id
        id: String,
    },

    /// Hydrate from the remote store and push local changes
    Sync,

    /// Ask the AI coach
    Coach {
        /// Mode: suggest, analyze, chat
        #[arg(long, default_value = "suggest")]
        mode: String,

        /// Free-text message (chat mode)
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("strive_sync=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let config = if let Some(path) = &cli.config {
        Config::load_from(path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Init { output } => {
            let path = match output {
                Some(path) => path,
                None => Config::default_path()?,
            };
            Config::default().save_to(&path)?;

            println!("Created config file: {}", path.display());
            println!();
            println!("Next steps:");
            println!("  1. Set server.url and server.access_token");
            println!("  2. Set account.owner_id to your account id");
            println!("  3. Run: strive-sync sync");
            Ok(())
        }

        Commands::Status => {
            let state = load_state()?;
            println!(
                "Level {} | {} points ({} to next level)",
                state.profile.level,
                state.profile.points,
                state.profile.points_to_next_level()
            );
            println!();
            println!("Tasks:");
            for task in &state.tasks {
                let mark = if task.completed { "x" } else { " " };
                println!("  [{}] {}  ({})", mark, task.title, task.id);
            }
            println!("Rewards:");
            for reward in &state.rewards {
                println!(
                    "  {:?} {} ({} pts)  ({})",
                    reward.status, reward.title, reward.required_points, reward.id
                );
            }
            Ok(())
        }

        Commands::Add {
            title,
            points,
            priority,
        } => {
            let mut state = load_state()?;
            let mut task = Task::new(title);
            task.reward_points = points;
            task.priority = parse_priority(&priority)?;
            let id = task.id.clone();
            state.add_task(task);
            save_state(&state)?;
            println!("Added task {}", id);
            Ok(())
        }

        Commands::Done { id } => {
            let mut state = load_state()?;
            state.complete_task(&id, Utc::now())?;
            save_state(&state)?;
            println!(
                "Completed. {} points (level {})",
                state.profile.points, state.profile.level
            );
            Ok(())
        }

        Commands::AddReward { title, points } => {
            let mut state = load_state()?;
            let reward = Reward::new(title, points);
            let id = reward.id.clone();
            state.add_reward(reward);
            save_state(&state)?;
            println!("Added reward {}", id);
            Ok(())
        }

        Commands::Claim { id } => {
            let mut state = load_state()?;
            let spent = state.claim_reward(&id, Utc::now())?;
            save_state(&state)?;
            println!(
                "Claimed for {} points, {} remaining",
                spent, state.profile.points
            );
            Ok(())
        }

        Commands::Sync => run_sync(config).await,

        Commands::Coach { mode, message } => {
            let mode = match mode.as_str() {
                "suggest" => CoachMode::Suggest,
                "analyze" => CoachMode::Analyze,
                "chat" => CoachMode::Chat,
                other => anyhow::bail!("Unknown coach mode: {}", other),
            };
            let state = load_state()?;
            let client = CoachClient::new(&config.server.url, &config.server.access_token)?;
            let snapshot = CoachSnapshot::of(&state);
            let reply = client.request(mode, message.as_deref(), &snapshot).await?;

            match reply {
                strive_sync::coach::CoachReply::Suggestions { tasks } => {
                    for suggestion in tasks {
                        println!("- {} (+{} pts)", suggestion.title, suggestion.reward_points);
                    }
                }
                strive_sync::coach::CoachReply::Analysis { text }
                | strive_sync::coach::CoachReply::Chat { text } => println!("{}", text),
            }
            Ok(())
        }
    }
}

async fn run_sync(config: Config) -> Result<()> {
    if !config.sync.enabled {
        println!("Sync is disabled in the config.");
        return Ok(());
    }
    if config.account.owner_id.is_empty() {
        anyhow::bail!("account.owner_id is not configured; run 'strive-sync init' first");
    }

    let backend = Arc::new(HttpBackend::new(
        &config.server.url,
        &config.server.access_token,
    )?);
    let store = Arc::new(tokio::sync::Mutex::new(load_state()?));
    let orchestrator = SyncOrchestrator::new(backend, store.clone(), config.account.owner_id.clone())
        .with_debounce(config.debounce());

    match orchestrator.hydrate().await {
        HydrateOutcome::Completed(report) => {
            let merged: usize = report.merged.values().sum();
            if report.is_clean() {
                println!("Hydrated {} remote rows", merged);
            } else {
                println!(
                    "Hydrated {} remote rows ({} collections failed, kept local data)",
                    merged,
                    report.errors.len()
                );
            }
        }
        HydrateOutcome::AlreadyHydrated => {}
    }

    match orchestrator.sync_now().await {
        PushOutcome::Completed(report) => {
            let pushed: usize = report.pushed.values().sum();
            if report.is_clean() {
                println!("Pushed {} rows", pushed);
            } else {
                println!(
                    "Pushed {} rows, {} collections failed (will retry next sync)",
                    pushed,
                    report.errors.len()
                );
            }
        }
        other => println!("Push skipped: {:?}", other),
    }

    save_state(&*store.lock().await)?;

    let mut prefs = Prefs::load().unwrap_or_default();
    if prefs.record_sign_in(&config.account.owner_id) {
        if let Err(error) = prefs.save_to(&Prefs::default_path()?) {
            tracing::warn!(%error, "Failed to update prefs");
        }
    }
    Ok(())
}

fn parse_priority(raw: &str) -> Result<Priority> {
    match raw {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => anyhow::bail!("Unknown priority: {}", other),
    }
}

fn state_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("Could not determine data directory")?
        .join("strive-sync");
    Ok(data_dir.join("state.json"))
}

fn load_state() -> Result<AppState> {
    let path = state_path()?;
    if !path.exists() {
        return Ok(AppState::new());
    }
    let content = std::fs::read_to_string(&path).context("Failed to read state file")?;
    serde_json::from_str(&content).context("Failed to parse state file")
}

fn save_state(state: &AppState) -> Result<()> {
    let path = state_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create data directory")?;
    }
    let content = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
    std::fs::write(&path, content).context("Failed to write state file")?;
    Ok(())
}

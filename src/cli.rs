//! Command-line surface of the `qhelper` binary

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::chat::AskMode;
use crate::commands::{self, ask, profile};
use crate::config::Config;
use crate::error::{AppError, CommandError, CommandResult};
use crate::models::Profile;
use crate::profiles::ProfileManager;
use crate::prompt::Prompt;
use crate::store::KeyValueStore;

#[derive(Debug, Parser)]
#[command(name = "qhelper")]
#[command(about = "First-aid assistant with encrypted medical profiles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print results (and errors) as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory (overrides QHELPER_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Medical profile management
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Ask a single first-aid question
    Ask {
        message: String,

        /// Knowledge-base search only, no LLM reasoning
        #[arg(long)]
        rag_only: bool,
    },

    /// Interactive question loop
    Chat {
        #[arg(long)]
        rag_only: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// List profiles (guest first)
    List,

    /// Create a profile and select it
    Create(profile::CreateProfileArgs),

    /// Edit a profile
    Update(profile::UpdateProfileArgs),

    /// Delete a profile
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Select the active profile ("guest" for none)
    Select { id: String },

    /// Show the active profile
    Show,
}

/// A command result in both output forms
#[derive(Debug)]
pub struct Rendered {
    pub json: serde_json::Value,
    pub text: String,
}

impl Rendered {
    fn new<T: Serialize>(value: &T, text: String) -> CommandResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| CommandError::from(AppError::Serialization(e)))?;
        Ok(Self { json, text })
    }

    pub fn print(&self, as_json: bool) {
        if as_json {
            println!("{}", self.json);
        } else {
            println!("{}", self.text);
        }
    }
}

/// Prints a command error to stderr (stdout for `--json`).
pub fn report(as_json: bool, error: &CommandError) {
    if as_json {
        match serde_json::to_string(error) {
            Ok(s) => println!("{}", s),
            Err(_) => eprintln!("error: {}", error.message),
        }
    } else {
        eprintln!("error: {}", error.message);
        if let Some(details) = &error.details {
            eprintln!("  {}", details);
        }
    }
}

pub async fn run<P: Prompt>(cli: Cli, mut config: Config, prompt: P) -> CommandResult<()> {
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let mut manager = commands::open_manager(&config, prompt)
        .await
        .map_err(CommandError::from)?;
    tracing::info!(state = ?manager.state(), "profiles ready");

    match cli.command {
        Command::Chat { rag_only } => chat_loop(&config, &mut manager, mode(rag_only), cli.json).await,
        command => {
            let rendered = execute(command, &config, &mut manager).await?;
            rendered.print(cli.json);
            Ok(())
        }
    }
}

fn mode(rag_only: bool) -> AskMode {
    if rag_only {
        AskMode::RagOnly
    } else {
        AskMode::Enhanced
    }
}

fn describe(profile: &Profile) -> String {
    if profile.is_guest() {
        return format!("{} (no medical details are shared)", profile.name);
    }
    let mut lines = vec![format!("{} [{}]", profile.name, profile.id)];
    for (label, value) in [
        ("Age", &profile.age),
        ("Sex", &profile.sex),
        ("Blood group", &profile.blood_group),
        ("Conditions", &profile.pre_cond),
    ] {
        if !value.is_empty() {
            lines.push(format!("  {}: {}", label, value));
        }
    }
    lines.join("\n")
}

/// Runs one non-interactive command against an initialized manager.
pub async fn execute<S: KeyValueStore, P: Prompt>(
    command: Command,
    config: &Config,
    manager: &mut ProfileManager<S, P>,
) -> CommandResult<Rendered> {
    match command {
        Command::Profile { command } => match command {
            ProfileCommand::List => {
                let summaries = profile::list_profiles(manager);
                let text = summaries
                    .iter()
                    .map(|s| {
                        let marker = if s.selected { "*" } else { " " };
                        format!("{} {}  {}", marker, s.id, s.name)
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                Rendered::new(&summaries, text)
            }
            ProfileCommand::Create(args) => {
                let created = profile::create_profile(manager, args).await?;
                let text = format!("Created profile {} [{}]", created.name, created.id);
                Rendered::new(&created, text)
            }
            ProfileCommand::Update(args) => {
                let updated = profile::update_profile(manager, args).await?;
                let text = describe(&updated);
                Rendered::new(&updated, text)
            }
            ProfileCommand::Delete { id, yes } => {
                let deleted = profile::delete_profile(manager, &id, yes).await?;
                let text = if deleted {
                    format!("Deleted profile {}", id)
                } else {
                    "Deletion cancelled".to_string()
                };
                Rendered::new(&serde_json::json!({ "id": id, "deleted": deleted }), text)
            }
            ProfileCommand::Select { id } => {
                let selected = profile::select_profile(manager, &id)?;
                let text = format!("Active profile: {}", selected.name);
                Rendered::new(&selected, text)
            }
            ProfileCommand::Show => {
                let current = manager.current();
                let text = describe(&current);
                Rendered::new(&current, text)
            }
        },
        Command::Ask { message, rag_only } => {
            let reply = ask::ask(config, manager, &message, mode(rag_only)).await?;
            let mut text = reply.text.clone();
            if let Some(method) = &reply.method {
                text.push_str(&format!("\n\n[{}]", method));
            }
            if let Some(confidence) = &reply.confidence {
                text.push_str(&format!(" confidence {}", confidence));
            }
            Rendered::new(&reply, text)
        }
        Command::Chat { .. } => Err(CommandError::from(AppError::InvalidOperation(
            "chat is interactive; run it from the command line".to_string(),
        ))),
    }
}

/// Reads questions from stdin until EOF or `/quit`.
///
/// `/use <id>` switches the active profile, `/mode` toggles RAG-only answers.
async fn chat_loop<S: KeyValueStore, P: Prompt>(
    config: &Config,
    manager: &mut ProfileManager<S, P>,
    mut mode: AskMode,
    as_json: bool,
) -> CommandResult<()> {
    let io_err = |e: std::io::Error| {
        CommandError::from(AppError::InvalidOperation(format!("terminal error: {}", e)))
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stderr = tokio::io::stderr();

    eprintln!(
        "Asking as {} ({}). /use <id>, /mode, /quit",
        manager.current().name,
        mode.label()
    );

    loop {
        stderr.write_all(b"> ").await.map_err(io_err)?;
        stderr.flush().await.map_err(io_err)?;

        let Some(line) = lines.next_line().await.map_err(io_err)? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/mode" => {
                mode = match mode {
                    AskMode::Enhanced => AskMode::RagOnly,
                    AskMode::RagOnly => AskMode::Enhanced,
                };
                eprintln!("Mode: {}", mode.label());
                continue;
            }
            _ => {}
        }

        if let Some(id) = line.strip_prefix("/use ") {
            match profile::select_profile(manager, id.trim()) {
                Ok(p) => eprintln!("Active profile: {}", p.name),
                Err(e) => report(as_json, &e),
            }
            continue;
        }

        let command = Command::Ask {
            message: line.to_string(),
            rag_only: mode == AskMode::RagOnly,
        };
        match execute(command, config, manager).await {
            Ok(rendered) => rendered.print(as_json),
            // A failed question should not end the session.
            Err(e) => report(as_json, &e),
        }
    }

    Ok(())
}

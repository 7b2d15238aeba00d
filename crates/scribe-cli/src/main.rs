use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod logging;

use context::AppContext;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Scribe CLI - transcription sessions with an AI assistant", long_about = None)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Manage the sources of a session
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Feed a text transcript through the recorder as if it was spoken
    Replay {
        /// Text file with one spoken fragment per line
        file: PathBuf,
        /// Recognition and diarization language (BCP-47)
        #[arg(short, long)]
        language: Option<String>,
        /// Title of the new session
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Ask the assistant a question about a session
    Ask {
        session_id: String,
        question: String,
    },
    /// Add a generated summary note to a session
    Summarize { session_id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Change one setting, e.g. `config set capture.language de-DE`
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List the most recently updated sessions
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Print a session's transcript, chat, sources and notes
    Show { session_id: String },
    /// Rename a session
    Rename { session_id: String, title: String },
    /// Delete a session and its audio
    Delete { session_id: String },
    /// Write a session document as JSON
    Export {
        session_id: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SourcesAction {
    /// Attach a file to a session as a source
    Add { session_id: String, path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::load()?;
    let _log_guard = logging::init(&ctx.paths, cli.verbose)?;

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&ctx)?,
            ConfigAction::Path => commands::config::path(&ctx),
            ConfigAction::Set { key, value } => commands::config::set(&ctx, &key, &value)?,
        },
        Commands::Sessions { action } => match action {
            SessionsAction::List { limit } => commands::sessions::list(&ctx, limit).await?,
            SessionsAction::Show { session_id } => {
                commands::sessions::show(&ctx, &session_id).await?
            }
            SessionsAction::Rename { session_id, title } => {
                commands::sessions::rename(&ctx, &session_id, &title).await?
            }
            SessionsAction::Delete { session_id } => {
                commands::sessions::delete(&ctx, &session_id).await?
            }
            SessionsAction::Export { session_id, out } => {
                commands::sessions::export(&ctx, &session_id, out.as_deref()).await?
            }
        },
        Commands::Sources { action } => match action {
            SourcesAction::Add { session_id, path } => {
                commands::sources::add(&ctx, &session_id, &path).await?
            }
        },
        Commands::Replay {
            file,
            language,
            title,
        } => commands::replay::run(&ctx, &file, language.as_deref(), title.as_deref()).await?,
        Commands::Ask {
            session_id,
            question,
        } => commands::assistant::ask(&ctx, &session_id, &question).await?,
        Commands::Summarize { session_id } => {
            commands::assistant::summarize(&ctx, &session_id).await?
        }
    }

    Ok(())
}

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use eta_core::session::SessionController;
use eta_core::tracing_setup::init_tracing;
use eta_core::{CoreConfig, HttpBackend};

// ANSI color codes
pub(crate) const CYAN: &str = "\x1b[36m";
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const ACCENT: &str = "\x1b[38;2;255;193;7m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const WHITE_BOLD: &str = "\x1b[1;37m";
pub(crate) const DIM: &str = "\x1b[2m";
pub(crate) const RESET: &str = "\x1b[0m";

mod commands;
mod format;
mod player;

use commands::{poll_playback, run_command, Command};
use format::{print_banner, print_error, print_thread_list};
use player::AudioPlayer;

#[derive(Parser, Debug)]
#[command(name = "eta-repl")]
#[command(about = "ETA command-line study client")]
struct Args {
    /// Display name (prefer ETA_NAME env var)
    #[arg(long)]
    name: Option<String>,

    /// Email address, required the first time an account is created
    #[arg(long)]
    email: Option<String>,

    /// Authentication subject, e.g. an OAuth `sub` claim
    #[arg(long)]
    auth_subject: Option<String>,

    /// ETA backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Directory for local state and voice replies
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn env_fallback(value: Option<String>, var: &str) -> Option<String> {
    value.or_else(|| std::env::var(var).ok().filter(|v| !v.is_empty()))
}

fn resolve_name(args: &Args) -> Result<String> {
    env_fallback(args.name.clone(), "ETA_NAME")
        .ok_or_else(|| anyhow::anyhow!("No name provided. Use --name or set ETA_NAME."))
}

fn resolve_data_dir(args: &Args) -> PathBuf {
    if let Some(ref dir) = args.data_dir {
        return dir.clone();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eta")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let name = resolve_name(&args)?;
    let email = env_fallback(args.email.clone(), "ETA_EMAIL");
    let auth_subject = env_fallback(args.auth_subject.clone(), "ETA_AUTH_SUBJECT")
        .unwrap_or_else(|| format!("local|{name}"));
    let base_url = env_fallback(args.base_url.clone(), "ETA_BASE_URL")
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    let config = CoreConfig::new(&base_url, resolve_data_dir(&args));
    let backend = HttpBackend::new(&config.base_url);
    let mut controller = SessionController::new(backend, config);
    let mut player = AudioPlayer::new();
    if !player.is_available() {
        format::print_system("No audio device found; /play will be unavailable.");
    }

    if !controller
        .sync_profile(&name, email.as_deref(), &auth_subject)
        .await
    {
        if let Some(notice) = controller.error_notice() {
            print_error(notice);
        }
        anyhow::bail!("Could not sign in to the ETA backend at {base_url}.");
    }

    print_banner(&name, controller.persona().display_label());
    if controller.load_threads().await {
        print_thread_list(controller.threads(), controller.store().active_thread_id());
    } else if let Some(notice) = controller.error_notice() {
        print_error(notice);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        poll_playback(&mut controller, &mut player);

        print!("{GREEN}eta>{RESET} ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = Command::parse(&line);
        if !run_command(&mut controller, &mut player, command).await {
            break;
        }
    }

    controller.shutdown();
    Ok(())
}

use std::path::PathBuf;
use std::time::Instant;

use eta_core::models::Persona;
use eta_core::session::{ActionKind, SessionController};
use eta_core::Backend;

use crate::format::{
    print_error, print_expanded, print_help, print_message, print_messages, print_separator,
    print_system, print_thread_list,
};
use crate::player::AudioPlayer;
use crate::{ACCENT, DIM, GREEN, RESET, WHITE_BOLD};

// ─── Command Parsing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(String),
    Threads,
    Open(String),
    New,
    Reload,
    Action(String),
    Persona(Option<String>),
    Notes,
    Practice(Option<String>),
    Voice(String),
    Upload(PathBuf),
    Play,
    Pause,
    Stop,
    Messages,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        if !trimmed.starts_with('/') {
            return Command::Input(trimmed.to_string());
        }

        let (name, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (trimmed, ""),
        };
        match name {
            "/threads" | "/ls" => Command::Threads,
            "/open" if !rest.is_empty() => Command::Open(rest.to_string()),
            "/new" => Command::New,
            "/reload" => Command::Reload,
            "/action" if !rest.is_empty() => Command::Action(rest.to_string()),
            "/persona" => Command::Persona((!rest.is_empty()).then(|| rest.to_string())),
            "/notes" => Command::Notes,
            "/practice" => Command::Practice((!rest.is_empty()).then(|| rest.to_string())),
            "/voice" if !rest.is_empty() => Command::Voice(rest.to_string()),
            "/upload" if !rest.is_empty() => Command::Upload(PathBuf::from(rest)),
            "/play" => Command::Play,
            "/pause" => Command::Pause,
            "/stop" => Command::Stop,
            "/messages" | "/log" => Command::Messages,
            "/status" => Command::Status,
            "/help" | "/?" => Command::Help,
            "/quit" | "/exit" | "/q" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

// ─── Command Handlers ───────────────────────────────────────────────────────

fn parse_action(token: &str) -> Option<ActionKind> {
    ActionKind::ALL
        .into_iter()
        .find(|kind| kind.label() == token)
}

/// Surface whatever the last operation left behind: the error notice
/// takes precedence, then any expanded overlay.
fn report<B: Backend>(controller: &mut SessionController<B>) {
    if let Some(notice) = controller.error_notice() {
        print_error(notice);
        return;
    }
    if let Some(expanded) = controller.expanded_message() {
        let content = expanded.content.clone();
        print_expanded(&content);
        controller.close_expanded_message();
    }
}

fn print_tail<B: Backend>(controller: &SessionController<B>, count: usize) {
    let messages = controller.active_messages();
    let start = messages.len().saturating_sub(count);
    for message in &messages[start..] {
        print_message(message);
        println!();
    }
}

fn resolve_thread_id<B: Backend>(
    controller: &SessionController<B>,
    token: &str,
) -> Option<String> {
    if let Ok(index) = token.parse::<usize>() {
        return controller.threads().get(index).map(|t| t.id.clone());
    }
    controller
        .store()
        .get(token)
        .map(|thread| thread.id.clone())
}

/// Detect end of playback and let the session release the reply.
pub fn poll_playback<B: Backend>(controller: &mut SessionController<B>, player: &mut AudioPlayer) {
    if controller.voice().is_speaking() && player.finished() {
        player.stop();
        controller.voice_ended();
        print_system("Voice reply finished.");
    }
}

/// Run one parsed command. Returns false when the REPL should exit.
pub async fn run_command<B: Backend>(
    controller: &mut SessionController<B>,
    player: &mut AudioPlayer,
    command: Command,
) -> bool {
    match command {
        Command::Empty => {}
        Command::Quit => {
            player.stop();
            controller.shutdown();
            return false;
        }
        Command::Help => print_help(),
        Command::Unknown(name) => {
            print_error(&format!("Unknown command {name}. Try /help."));
        }

        Command::Input(text) => {
            controller.set_input(&text);
            controller.dispatch_primary_action().await;
            report(controller);
            if controller.error_notice().is_none() {
                print_tail(controller, 2);
            }
        }

        Command::Threads => {
            print_thread_list(controller.threads(), controller.store().active_thread_id());
        }
        Command::Open(token) => match resolve_thread_id(controller, &token) {
            Some(thread_id) => {
                if controller.select_thread(&thread_id).await {
                    let title = controller
                        .active_thread()
                        .map(|t| t.title.clone())
                        .unwrap_or_default();
                    println!("{WHITE_BOLD}{title}{RESET}");
                    print_separator();
                    print_messages(controller.active_messages());
                } else {
                    report(controller);
                }
            }
            None => print_error(&format!("No session matches {token:?}.")),
        },
        Command::New => {
            if let Some(thread_id) = controller.create_thread(true).await {
                print_system(&format!("Started session {thread_id}."));
            } else {
                report(controller);
            }
        }
        Command::Reload => {
            if controller.load_threads().await {
                print_thread_list(controller.threads(), controller.store().active_thread_id());
            } else {
                report(controller);
            }
        }

        Command::Action(token) => match parse_action(&token) {
            Some(kind) => {
                controller.select_action(kind);
                print_system(&format!("Primary action set to {kind}."));
            }
            None => print_error(&format!(
                "Unknown action {token:?}. Use send, notes, practice, or voice."
            )),
        },
        Command::Persona(None) => {
            for persona in Persona::ALL {
                let marker = if persona == controller.persona() {
                    format!("{GREEN}▸{RESET}")
                } else {
                    " ".to_string()
                };
                println!(
                    "{marker} {ACCENT}{}{RESET} {WHITE_BOLD}{}{RESET} {DIM}{}{RESET}",
                    persona.id(),
                    persona.display_label(),
                    persona.summary()
                );
            }
        }
        Command::Persona(Some(token)) => match Persona::from_id(&token) {
            Some(persona) => {
                controller.set_persona(persona);
                print_system(&format!("Persona set to {}.", persona.display_label()));
            }
            None => print_error(&format!("Unknown persona {token:?}.")),
        },

        Command::Notes => {
            controller.generate_notes().await;
            report(controller);
        }
        Command::Practice(prompt) => {
            controller.set_input(prompt.as_deref().unwrap_or(""));
            controller.generate_practice().await;
            report(controller);
        }
        Command::Voice(question) => {
            controller.set_input(&question);
            controller.request_voice().await;
            report(controller);
        }
        Command::Upload(path) => match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("context.pdf")
                    .to_string();
                controller.upload_context(&file_name, bytes).await;
                report(controller);
            }
            Err(err) => print_error(&format!("Cannot read {}: {err}", path.display())),
        },

        Command::Play => {
            let path = controller
                .voice()
                .reply()
                .map(|reply| reply.audio_path.clone());
            match path {
                Some(path) => {
                    if controller.voice_play() {
                        if player.has_source() {
                            player.resume();
                            print_system("Resuming voice reply…");
                        } else {
                            match player.play(&path) {
                                Ok(()) => print_system("Playing voice reply…"),
                                Err(err) => {
                                    controller.voice_pause();
                                    print_error(&err);
                                }
                            }
                        }
                    } else {
                        print_system("Voice reply is already playing.");
                    }
                }
                None => print_error("No voice reply to play. Ask with /voice first."),
            }
        }
        Command::Pause => {
            player.pause();
            controller.voice_pause();
        }
        Command::Stop => {
            player.stop();
            controller.close_voice();
            print_system("Voice reply closed.");
        }

        Command::Messages => {
            print_messages(controller.active_messages());
        }
        Command::Status => {
            let eta_id = controller
                .profile()
                .and_then(|p| p.eta_id())
                .unwrap_or("none");
            println!("{WHITE_BOLD}identity{RESET}  {eta_id}");
            println!(
                "{WHITE_BOLD}persona{RESET}   {}",
                controller.persona().display_label()
            );
            println!("{WHITE_BOLD}action{RESET}    {}", controller.selected_action());
            println!(
                "{WHITE_BOLD}session{RESET}   {}",
                controller
                    .active_thread()
                    .map(|t| t.title.as_str())
                    .unwrap_or("none")
            );
            let mut pending: Vec<&str> = ActionKind::ALL
                .into_iter()
                .filter(|kind| controller.pending().get(*kind))
                .map(|kind| kind.label())
                .collect();
            if controller.pending().upload() {
                pending.push("upload");
            }
            println!(
                "{WHITE_BOLD}pending{RESET}   {}",
                if pending.is_empty() {
                    "none".to_string()
                } else {
                    pending.join(", ")
                }
            );
            if controller.is_speaking(Instant::now()) {
                print_system("ETA is speaking.");
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_text_is_input() {
        assert_eq!(
            Command::parse("what is entropy?"),
            Command::Input("what is entropy?".to_string())
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  "), Command::Empty);
        assert_eq!(Command::parse("/threads"), Command::Threads);
        assert_eq!(Command::parse("/open 2"), Command::Open("2".to_string()));
        assert_eq!(
            Command::parse("/voice explain osmosis"),
            Command::Voice("explain osmosis".to_string())
        );
        assert_eq!(Command::parse("/practice"), Command::Practice(None));
        assert_eq!(
            Command::parse("/practice chapter 3"),
            Command::Practice(Some("chapter 3".to_string()))
        );
        assert_eq!(Command::parse("/persona"), Command::Persona(None));
        assert_eq!(Command::parse("/q"), Command::Quit);
        assert_eq!(
            Command::parse("/bogus"),
            Command::Unknown("/bogus".to_string())
        );
    }

    #[test]
    fn test_parse_voice_requires_argument() {
        assert_eq!(
            Command::parse("/voice"),
            Command::Unknown("/voice".to_string())
        );
    }

    #[test]
    fn test_parse_action_tokens() {
        assert_eq!(parse_action("notes"), Some(ActionKind::Notes));
        assert_eq!(parse_action("shout"), None);
    }
}

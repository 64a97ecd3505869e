use chrono::{DateTime, Local};
use eta_core::models::{Message, Role, Thread};

use crate::{ACCENT, CYAN, DIM, GREEN, RED, RESET, WHITE_BOLD};

// ─── Output Helpers ─────────────────────────────────────────────────────────

pub fn print_separator() {
    println!("{DIM}{}{RESET}", "─".repeat(60));
}

pub fn print_error(message: &str) {
    println!("{RED}✗ {message}{RESET}");
}

pub fn print_system(message: &str) {
    println!("{DIM}{message}{RESET}");
}

pub fn print_banner(name: &str, persona_label: &str) {
    print_separator();
    println!("{WHITE_BOLD}ETA{RESET} {DIM}· your teaching assistant{RESET}");
    println!("Signed in as {GREEN}{name}{RESET}, persona {ACCENT}{persona_label}{RESET}");
    print_system("Type a question to send it, or /help for commands.");
    print_separator();
}

// ─── Threads & Messages ─────────────────────────────────────────────────────

/// Local wall-clock rendering of an RFC 3339 timestamp, passing
/// anything unparseable through untouched.
fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn print_thread_list(threads: &[Thread], active_id: Option<&str>) {
    if threads.is_empty() {
        print_system("No sessions yet. Send a message to start one.");
        return;
    }
    for (index, thread) in threads.iter().enumerate() {
        let marker = if Some(thread.id.as_str()) == active_id {
            format!("{GREEN}▸{RESET}")
        } else {
            " ".to_string()
        };
        println!(
            "{marker} {WHITE_BOLD}[{index}]{RESET} {CYAN}{}{RESET} {DIM}· {}{RESET}",
            thread.title, thread.summary
        );
    }
}

pub fn print_message(message: &Message) {
    let (label, color) = match message.role {
        Role::User => ("you", GREEN),
        Role::Assistant => ("eta", CYAN),
    };
    let stamp = message
        .timestamp
        .as_deref()
        .map(|t| format!(" {DIM}{}{RESET}", format_timestamp(t)))
        .unwrap_or_default();
    let pending = if message.is_optimistic() {
        format!(" {DIM}(sending…){RESET}")
    } else {
        String::new()
    };
    println!("{color}{label}{RESET}{stamp}{pending}");
    for line in message.content.lines() {
        println!("  {line}");
    }
}

pub fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        print_system("No messages yet.");
        return;
    }
    for message in messages {
        print_message(message);
        println!();
    }
}

pub fn print_expanded(content: &str) {
    print_separator();
    for line in content.lines() {
        println!("{line}");
    }
    print_separator();
}

pub fn print_help() {
    let entries: &[(&str, &str)] = &[
        ("<text>", "run the selected action with <text> as input"),
        ("/threads", "list your sessions"),
        ("/open <n|id>", "open a session by index or id"),
        ("/new", "start a fresh session"),
        ("/reload", "re-fetch all sessions from the server"),
        ("/action <send|notes|practice|voice>", "choose the primary action"),
        ("/persona [id]", "show or switch the tutoring persona"),
        ("/notes", "generate session notes"),
        ("/practice [prompt]", "generate practice problems"),
        ("/voice <question>", "ask for a spoken answer"),
        ("/upload <file.pdf>", "add course material as context"),
        ("/play | /pause | /stop", "control voice playback"),
        ("/messages", "print the active session transcript"),
        ("/status", "show identity and pending operations"),
        ("/help", "this list"),
        ("/quit", "exit"),
    ];
    for (command, description) in entries {
        println!("  {WHITE_BOLD}{command:<38}{RESET}{DIM}{description}{RESET}");
    }
}

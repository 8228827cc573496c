//! Line-oriented terminal controls
//!
//! Commands typed on stdin are queued on the controller; a watcher prints
//! status changes, narrations and alerts as they are published.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crate::Result;
use crate::assistant::{Action, AlertLog, ControllerHandle, DisplayState, Mode, Severity, Status};

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the controller
    Action(Action),
    /// Print the current display snapshot
    Status,
    Help,
    Quit,
}

const HELP: &str = "\
Commands:
  listen                  speak a command
  say <text>              type a command as if spoken
  mode <name> [target]    navigation | reading | find | sos
  start                   start scanning
  stop                    stop after the current scan
  alert                   send the simulated SOS alert
  guardian <number>       set the emergency contact
  status                  show current state
  help                    show this help
  quit                    exit";

/// Parse one input line; `Ok(None)` for blank lines
///
/// # Errors
///
/// Returns a message describing why the line was rejected
pub fn parse(line: &str) -> std::result::Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let command = match word.to_lowercase().as_str() {
        "listen" | "l" => ConsoleCommand::Action(Action::Listen),
        "say" if rest.is_empty() => return Err("usage: say <text>".to_string()),
        "say" => ConsoleCommand::Action(Action::Utterance(rest.to_string())),
        "mode" => parse_mode(rest)?,
        "start" => ConsoleCommand::Action(Action::Start),
        "stop" => ConsoleCommand::Action(Action::Stop),
        "alert" | "sos" => ConsoleCommand::Action(Action::Alert),
        "guardian" if rest.is_empty() => return Err("usage: guardian <number>".to_string()),
        "guardian" => ConsoleCommand::Action(Action::SetGuardian(rest.to_string())),
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}', type 'help'")),
    };

    Ok(Some(command))
}

fn parse_mode(rest: &str) -> std::result::Result<ConsoleCommand, String> {
    let (name, target) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(n, t)| (n, t.trim()));

    if name.is_empty() {
        return Err("usage: mode <navigation|reading|find|sos> [target]".to_string());
    }

    let mode: Mode = name.parse().map_err(|e: crate::Error| e.to_string())?;
    let target = (!target.is_empty()).then(|| target.to_string());

    Ok(ConsoleCommand::Action(Action::SetMode { mode, target }))
}

/// Why the console stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Quit,
    EndOfInput,
}

/// Read commands from stdin until `quit` or end of input
///
/// # Errors
///
/// Returns error if stdin cannot be read or the controller has stopped
pub async fn run(handle: ControllerHandle) -> Result<ConsoleExit> {
    println!("{HELP}\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Quit)) => return Ok(ConsoleExit::Quit),
            Ok(Some(ConsoleCommand::Help)) => println!("{HELP}"),
            Ok(Some(ConsoleCommand::Status)) => print_snapshot(&handle.display()),
            Ok(Some(ConsoleCommand::Action(action))) => handle.submit(action).await?,
            Err(message) => eprintln!("{message}"),
        }
    }

    Ok(ConsoleExit::EndOfInput)
}

/// Print display changes until the controller goes away
pub async fn watch_display(mut rx: watch::Receiver<DisplayState>) {
    let mut last_status: Option<Status> = None;
    let mut last_alert: Option<AlertLog> = None;

    while rx.changed().await.is_ok() {
        let display = rx.borrow_and_update().clone();

        if display.status != last_status {
            if let Some(status) = &display.status {
                println!("{}", format_status(status));
            }
            last_status = display.status;
        }

        if display.alert != last_alert {
            if let Some(alert) = &display.alert {
                println!("{alert}");
            }
            last_alert = display.alert;
        }
    }
}

fn format_status(status: &Status) -> String {
    let tag = match status.severity {
        Severity::Success => "OK",
        Severity::Info => "..",
        Severity::Warning => "??",
        Severity::Error => "!!",
    };
    format!("[{tag}] {}", status.message)
}

fn print_snapshot(display: &DisplayState) {
    println!("Mode:     {}", display.mode_label);
    if let Some(target) = &display.target_query {
        println!("Target:   {target}");
    }
    println!("Running:  {}", display.running);
    println!("Guardian: {}", display.guardian_contact);
    println!("Scans:    {}", display.iterations);
    if let Some(narration) = &display.narration {
        println!("Last:     {narration}");
    }
    if let Some(artifact) = &display.artifact {
        println!("Audio:    {}", artifact.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn test_parse_say_keeps_text() {
        assert_eq!(
            parse("say Find my keys"),
            Ok(Some(ConsoleCommand::Action(Action::Utterance(
                "Find my keys".to_string()
            ))))
        );
        assert!(parse("say").is_err());
    }

    #[test]
    fn test_parse_mode_with_target() {
        assert_eq!(
            parse("mode find red umbrella"),
            Ok(Some(ConsoleCommand::Action(Action::SetMode {
                mode: Mode::FindObject,
                target: Some("red umbrella".to_string()),
            })))
        );
        assert_eq!(
            parse("mode reading"),
            Ok(Some(ConsoleCommand::Action(Action::SetMode {
                mode: Mode::Reading,
                target: None,
            })))
        );
        assert!(parse("mode dance").is_err());
        assert!(parse("mode").is_err());
    }

    #[test]
    fn test_parse_controls() {
        assert_eq!(parse("START"), Ok(Some(ConsoleCommand::Action(Action::Start))));
        assert_eq!(parse("stop"), Ok(Some(ConsoleCommand::Action(Action::Stop))));
        assert_eq!(parse("alert"), Ok(Some(ConsoleCommand::Action(Action::Alert))));
        assert_eq!(
            parse("guardian +1 555 0199"),
            Ok(Some(ConsoleCommand::Action(Action::SetGuardian(
                "+1 555 0199".to_string()
            ))))
        );
        assert_eq!(parse("quit"), Ok(Some(ConsoleCommand::Quit)));
        assert!(parse("dance").is_err());
    }

    #[test]
    fn test_format_status() {
        assert_eq!(
            format_status(&Status::warning("Camera unavailable")),
            "[??] Camera unavailable"
        );
    }
}

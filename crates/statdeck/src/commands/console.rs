//! Line commands accepted by `statdeck watch` on stdin.
//!
//! Plain words cover the common actions. A line starting with `{` is parsed
//! as a serialized [`Command`], which reaches everything `dispatch` accepts.

use statdeck_core::{Command, MutationKind, ResourceName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Dispatch(Command),
    Help,
    Quit,
    Empty,
}

pub const HELP: &str = "Commands: refresh, force, auto on|off, interval <ms>, clear-cache, \
                        reset-metrics, cancel <resource>, help, quit";

pub fn parse_console_line(line: &str) -> Result<ConsoleInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleInput::Empty);
    }
    if line.starts_with('{') {
        return serde_json::from_str::<Command>(line)
            .map(ConsoleInput::Dispatch)
            .map_err(|e| format!("Invalid command JSON: {}", e));
    }

    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("Too many arguments for '{}'", verb));
    }

    let command = match (verb.as_str(), arg) {
        ("quit" | "exit" | "q", None) => return Ok(ConsoleInput::Quit),
        ("help" | "?", None) => return Ok(ConsoleInput::Help),
        ("refresh", None) => Command::ManualRefresh,
        ("force", None) => Command::ForcedRefresh,
        ("auto", Some("on")) => Command::SetAutoRefresh { enabled: true },
        ("auto", Some("off")) => Command::SetAutoRefresh { enabled: false },
        ("auto", _) => return Err("Usage: auto on|off".to_string()),
        ("interval", Some(ms)) => {
            let interval_ms = ms
                .parse::<u64>()
                .map_err(|_| format!("Invalid interval '{}': expected milliseconds", ms))?;
            Command::SetRefreshInterval { interval_ms }
        }
        ("interval", None) => return Err("Usage: interval <ms>".to_string()),
        ("clear-cache" | "reset-metrics", None) => Command::PerformMutation {
            kind: verb.parse::<MutationKind>().map_err(|e| e.to_string())?,
        },
        ("cancel", Some(resource)) => Command::Cancel {
            resource: resource
                .parse::<ResourceName>()
                .map_err(|e| e.to_string())?
                .tracked(),
        },
        ("cancel", None) => return Err("Usage: cancel <resource>".to_string()),
        _ => return Err(format!("Unknown command '{}'. {}", line, HELP)),
    };
    Ok(ConsoleInput::Dispatch(command))
}

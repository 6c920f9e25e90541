//! User commands

use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

/// A command issued to the running application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Flip the sign of the force field
    TogglePolarity,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown command {0:?} (expected 'p' to toggle polarity or 'q' to quit)")]
pub struct ParseCommandError(pub String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "polarity" | "toggle" => Ok(Command::TogglePolarity),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(ParseCommandError(other.to_string())),
        }
    }
}

/// Non-blocking source of commands, polled once per frame
pub trait CommandSource {
    fn poll(&mut self) -> Option<Command>;
}

impl CommandSource for flume::Receiver<Command> {
    fn poll(&mut self) -> Option<Command> {
        self.try_recv().ok()
    }
}

/// Source that never produces a command
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCommands;

impl CommandSource for NoCommands {
    fn poll(&mut self) -> Option<Command> {
        None
    }
}

/// Parse `input` line by line and send each command to `commands`
///
/// Blank lines are skipped and unknown commands logged. When the input ends
/// or fails a final [`Command::Quit`] is sent, so a closed terminal still
/// stops the frame loop. Returns early if the receiver is gone.
pub fn forward_commands<R: BufRead>(input: R, commands: &flume::Sender<Command>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read command input: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(command) => {
                if commands.send(command).is_err() {
                    return;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
    info!("Command input closed");
    let _ = commands.send(Command::Quit);
}

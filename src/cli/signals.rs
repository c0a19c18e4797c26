//! Input sources for the interactive record session
//!
//! OS shutdown signals and typed stdin commands are funnelled into one
//! channel so the session loop only has a single receiver to select on.

use std::io::BufRead;
use std::str::FromStr;
use std::thread;

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::debug;

/// Commands accepted by the record session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    /// Begin a new take
    Record,
    /// Stop recording, or stop playback when playing
    Stop,
    /// Start or resume playback of the take
    Play,
    Pause,
    /// Seek playback to a position in seconds
    Seek(f64),
    /// Save the take under the session reference
    Save,
    /// Discard the take
    Cancel,
    Status,
    Help,
    /// Leave the session (typed, SIGINT, SIGTERM or end of input)
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(word) = words.next() else {
            return Err("empty command".to_string());
        };

        let command = match word.to_lowercase().as_str() {
            "record" | "rec" | "r" | "start" => Self::Record,
            "stop" | "s" => Self::Stop,
            "play" | "p" | "resume" => Self::Play,
            "pause" => Self::Pause,
            "seek" => {
                let secs = words
                    .next()
                    .ok_or_else(|| "seek needs a position in seconds".to_string())?;
                let secs: f64 = secs
                    .parse()
                    .map_err(|_| format!("invalid seek position '{}'", secs))?;
                if !secs.is_finite() {
                    return Err(format!("invalid seek position '{}'", secs));
                }
                Self::Seek(secs)
            }
            "save" => Self::Save,
            "cancel" | "c" | "discard" => Self::Cancel,
            "status" => Self::Status,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(format!("unknown command '{}'", other)),
        };

        if words.next().is_some() && !matches!(command, Self::Seek(_)) {
            return Err(format!("'{}' takes no arguments", word));
        }
        Ok(command)
    }
}

/// What arrived on the session channel
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Command(SessionCommand),
    /// A line that did not parse; carries the reason
    Invalid(String),
}

/// Session input handler
///
/// Listens for SIGINT/SIGTERM and reads commands line by line from stdin.
pub struct SessionInputHandler {
    receiver: mpsc::Receiver<SessionInput>,
}

impl SessionInputHandler {
    /// Start listening on signals and stdin
    pub async fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(16);

        let tx_int = tx.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            sigint.recv().await;
            eprintln!("{} Received SIGINT (quit)", "↓".cyan());
            let _ = tx_int.send(SessionInput::Command(SessionCommand::Quit)).await;
        });

        let tx_term = tx.clone();
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            sigterm.recv().await;
            eprintln!("{} Received SIGTERM (quit)", "↓".cyan());
            let _ = tx_term.send(SessionInput::Command(SessionCommand::Quit)).await;
        });

        // A blocking stdin read cannot be cancelled, so it lives on a detached
        // thread instead of the runtime's blocking pool.
        thread::Builder::new()
            .name("verse-stdin".to_string())
            .spawn(move || read_commands(tx))?;

        Ok(Self { receiver: rx })
    }

    /// Wait for the next input
    pub async fn recv(&mut self) -> Option<SessionInput> {
        self.receiver.recv().await
    }
}

fn read_commands(tx: mpsc::Sender<SessionInput>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let input = match line.parse::<SessionCommand>() {
            Ok(command) => SessionInput::Command(command),
            Err(reason) => SessionInput::Invalid(reason),
        };
        if tx.blocking_send(input).is_err() {
            return;
        }
    }
    debug!("stdin closed");
    let _ = tx.blocking_send(SessionInput::Command(SessionCommand::Quit));
}

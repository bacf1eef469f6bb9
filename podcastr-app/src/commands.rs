//! Line commands typed at the player prompt.

use podcastr_core::PlayerCommand;
use thiserror::Error;

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Print the home listing
    List,
    /// Play the listing from a zero-based row of the combined playlist
    PlayRow(usize),
    /// Fetch one episode, show its details and play it alone
    Episode(String),
    /// A controller operation that needs no listing context
    Player(PlayerCommand),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),

    #[error("'{command}' needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("'{0}' is not a row number (rows start at 1)")]
    InvalidRow(String),
}

pub const HELP: &str = "\
Commands:
  list              show the episode listing
  play <row>        play the listing starting at <row>
  episode <id>      show one episode and play it on its own
  toggle            play / pause
  next, prev        skip forward / back
  loop, shuffle     toggle repeat-one / shuffle
  clear             stop and empty the player
  status            show what is playing
  help              show this help
  quit              exit";

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns a [`CommandError`] describing why the line was not understood.
pub fn parse(line: &str) -> Result<Option<Input>, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };
    let argument = parts.next();

    let input = match command.to_lowercase().as_str() {
        "list" | "ls" => Input::List,
        "play" => {
            let row = argument.ok_or(CommandError::MissingArgument {
                command: "play",
                what: "a row number",
            })?;
            Input::PlayRow(parse_row(row)?)
        }
        "episode" | "ep" => {
            let id = argument.ok_or(CommandError::MissingArgument {
                command: "episode",
                what: "an episode id",
            })?;
            Input::Episode(id.to_string())
        }
        "toggle" | "p" | "pause" | "resume" => Input::Player(PlayerCommand::TogglePlay),
        "next" | "n" => Input::Player(PlayerCommand::Next),
        "prev" | "previous" => Input::Player(PlayerCommand::Previous),
        "loop" => Input::Player(PlayerCommand::ToggleLoop),
        "shuffle" => Input::Player(PlayerCommand::ToggleShuffle),
        "clear" | "stop" => Input::Player(PlayerCommand::Clear),
        "status" | "s" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(input))
}

fn parse_row(row: &str) -> Result<usize, CommandError> {
    match row.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::InvalidRow(row.to_string())),
    }
}

//! Input line parsing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/call <userId> [display name]`
    Call {
        user_id: String,
        name: Option<String>,
    },
    /// `/accept [userId]`
    Accept(Option<String>),
    /// `/decline [userId]`
    Decline(Option<String>),
    /// Confirms the local user is in the video conference.
    Join,
    Mute,
    Video,
    Chat,
    End,
    Who,
    Help,
    Quit,
    /// Plain text is a chat message.
    Say(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    MissingArgument(&'static str),

    #[error("unknown command '/{0}', try /help")]
    Unknown(String),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let arg = (!args.is_empty()).then(|| args.to_string());

    let command = match name {
        "call" => {
            let mut parts = args.splitn(2, char::is_whitespace);
            let user_id = parts
                .next()
                .filter(|id| !id.is_empty())
                .ok_or(CommandError::MissingArgument("/call <userId> [name]"))?;
            Command::Call {
                user_id: user_id.to_string(),
                name: parts
                    .next()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string),
            }
        }
        "accept" => Command::Accept(arg),
        "decline" => Command::Decline(arg),
        "join" => Command::Join,
        "mute" => Command::Mute,
        "video" => Command::Video,
        "chat" => Command::Chat,
        "end" => Command::End,
        "who" => Command::Who,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

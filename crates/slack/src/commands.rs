//! Slash command payloads and their normalization.

use thiserror::Error;

/// The raw `/triage` invocation as the transport delivers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    /// Timestamp of the triggering message; the reply thread is keyed on it.
    pub trigger_ts: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriageCommand {
    Classify { text: String },
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
}

pub fn normalize_triage_command(
    payload: &SlashCommandPayload,
) -> Result<TriageCommand, CommandParseError> {
    if payload.command != "/triage" {
        return Err(CommandParseError::UnsupportedCommand(payload.command.clone()));
    }

    let text = payload.text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("help") {
        return Ok(TriageCommand::Help);
    }
    Ok(TriageCommand::Classify { text: text.to_owned() })
}

#[cfg(test)]
mod tests {
    use super::{normalize_triage_command, CommandParseError, SlashCommandPayload, TriageCommand};

    fn payload(command: &str, text: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            command: command.to_owned(),
            text: text.to_owned(),
            channel_id: "C1".to_owned(),
            user_id: "U1".to_owned(),
            trigger_ts: "1724.0001".to_owned(),
            request_id: "req-1".to_owned(),
        }
    }

    #[test]
    fn request_text_becomes_a_classify_command() {
        let parsed = normalize_triage_command(&payload("/triage", "  need a firewall change  "));
        assert_eq!(parsed, Ok(TriageCommand::Classify { text: "need a firewall change".to_owned() }));
    }

    #[test]
    fn empty_text_and_help_both_show_help() {
        assert_eq!(normalize_triage_command(&payload("/triage", "")), Ok(TriageCommand::Help));
        assert_eq!(normalize_triage_command(&payload("/triage", " HELP ")), Ok(TriageCommand::Help));
    }

    #[test]
    fn foreign_commands_are_refused() {
        let parsed = normalize_triage_command(&payload("/deploy", "something"));
        assert_eq!(parsed, Err(CommandParseError::UnsupportedCommand("/deploy".to_owned())));
    }
}

//! Slack interface for the triage bot:
//! - **Slash Commands** (`commands`) - `/triage <request text>`, `/triage help`
//! - **Events** (`events`) - envelope model, dispatcher, thread-reply handling
//! - **Block Kit** (`blocks`) - triage reply and status message builders
//!
//! The actual transport (Socket Mode, request signing) is out of scope here;
//! a runner feeds [`events::SlackEnvelope`] values into the
//! [`events::EventDispatcher`] and posts the returned message templates.
//!
//! # Architecture
//!
//! ```text
//! Slack Events → EventDispatcher → Handlers → TriageEngine
//!                    ↓
//!              Block Kit UI ← Response
//! ```
//!
//! Set `TRIAGE_SLACK_APP_TOKEN` and `TRIAGE_SLACK_BOT_TOKEN` before wiring a
//! real transport.

pub mod blocks;
pub mod commands;
pub mod events;

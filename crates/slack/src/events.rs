//! Event envelope, dispatcher and the engine-backed handlers.
//!
//! The real transport (socket mode, signature checks) lives outside this
//! crate; everything here is driven through [`SlackEnvelope`] values, which
//! keeps the handlers testable without a network.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use triage_core::errors::{ApplicationError, DomainError, InterfaceError};
use triage_core::policy::Outcome;
use triage_core::{ThreadOrigin, TriageEngine};

use crate::{
    blocks::{self, MessageTemplate},
    commands::{normalize_triage_command, CommandParseError, SlashCommandPayload, TriageCommand},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    SlashCommand(SlashCommandPayload),
    ThreadMessage(ThreadMessageEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::SlashCommand(_) => SlackEventType::SlashCommand,
            Self::ThreadMessage(_) => SlackEventType::ThreadMessage,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    SlashCommand,
    ThreadMessage,
    Unsupported,
}

/// A reply posted inside an existing thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadMessageEvent {
    pub channel_id: String,
    /// Root timestamp of the thread; conversations are keyed on it.
    pub thread_ts: String,
    pub ts: String,
    pub user_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(MessageTemplate),
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

/// Maps a dispatch failure to a reply that is safe to post back to the
/// channel. Internal detail goes to the logs under the correlation id.
pub fn failure_reply(error: &DispatchError, ctx: &EventContext) -> MessageTemplate {
    tracing::warn!(
        event_name = "slack.handler_failed",
        correlation_id = %ctx.correlation_id,
        %error,
        "handler failure mapped to a user-safe reply"
    );

    let DispatchError::Handler(handler_error) = error;
    let interface = match handler_error {
        EventHandlerError::Parse(parse) => InterfaceError::BadRequest {
            message: parse.to_string(),
            correlation_id: ctx.correlation_id.clone(),
        },
        EventHandlerError::Domain(domain) => {
            ApplicationError::from(domain.clone()).into_interface(ctx.correlation_id.clone())
        }
    };
    blocks::error_message(interface.user_message(), &ctx.correlation_id)
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Resolves whether the root of a thread was posted by this bot. The real
/// implementation asks the Slack API; failures are tolerated and read as
/// [`ThreadOrigin::Unresolved`] by the caller.
#[async_trait]
pub trait ThreadOriginResolver: Send + Sync {
    async fn resolve(&self, channel_id: &str, thread_ts: &str)
        -> anyhow::Result<ThreadOrigin>;
}

/// Fixed-answer resolver for wiring without a transport, and for tests.
pub struct StaticOriginResolver {
    origin: ThreadOrigin,
}

impl StaticOriginResolver {
    pub fn new(origin: ThreadOrigin) -> Self {
        Self { origin }
    }
}

#[async_trait]
impl ThreadOriginResolver for StaticOriginResolver {
    async fn resolve(&self, _channel_id: &str, _thread_ts: &str) -> anyhow::Result<ThreadOrigin> {
        Ok(self.origin)
    }
}

pub fn default_dispatcher(
    engine: Arc<TriageEngine>,
    resolver: Arc<dyn ThreadOriginResolver>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(engine.clone()));
    dispatcher.register(ThreadMessageHandler::new(engine, resolver));
    dispatcher
}

pub struct SlashCommandHandler {
    engine: Arc<TriageEngine>,
}

impl SlashCommandHandler {
    pub fn new(engine: Arc<TriageEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl EventHandler for SlashCommandHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        match normalize_triage_command(payload)? {
            TriageCommand::Help => Ok(HandlerResult::Responded(blocks::help_message())),
            TriageCommand::Classify { text } => {
                let round = self.engine.evaluate_message(&text, &payload.trigger_ts);
                // The reply thread is keyed on the triggering message, so the
                // round can be tracked before the reply is actually posted.
                self.engine.track(&payload.trigger_ts, &round);
                Ok(HandlerResult::Responded(blocks::triage_reply(&payload.user_id, &round)))
            }
        }
    }
}

pub struct ThreadMessageHandler {
    engine: Arc<TriageEngine>,
    resolver: Arc<dyn ThreadOriginResolver>,
}

impl ThreadMessageHandler {
    pub fn new(engine: Arc<TriageEngine>, resolver: Arc<dyn ThreadOriginResolver>) -> Self {
        Self { engine, resolver }
    }
}

#[async_trait]
impl EventHandler for ThreadMessageHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ThreadMessage
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ThreadMessage(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let origin = match self.resolver.resolve(&event.channel_id, &event.thread_ts).await {
            Ok(origin) => origin,
            Err(error) => {
                tracing::warn!(
                    event_name = "slack.origin_resolution_failed",
                    correlation_id = %ctx.correlation_id,
                    thread_ts = %event.thread_ts,
                    %error,
                    "could not resolve thread origin; treating as unresolved"
                );
                ThreadOrigin::Unresolved
            }
        };

        let round = self.engine.continue_thread(&event.thread_ts, &event.text, origin)?;
        if round.outcome() == Outcome::Irrelevant {
            // In our own thread this means the conversation was closed or
            // expired; anywhere else we stay silent.
            return Ok(if origin == ThreadOrigin::Ours {
                HandlerResult::Responded(blocks::thread_closed_message())
            } else {
                HandlerResult::Processed
            });
        }
        Ok(HandlerResult::Responded(blocks::triage_reply(&event.user_id, &round)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use triage_core::audit::InMemoryAuditSink;
    use triage_core::policy::DecisionPolicy;
    use triage_core::tracker::ConversationTracker;
    use triage_core::{ThreadOrigin, TriageEngine};

    use super::{
        default_dispatcher, failure_reply, DispatchError, EventContext, EventDispatcher,
        EventHandlerError, HandlerResult, SlackEnvelope, SlackEvent, StaticOriginResolver,
        ThreadMessageEvent, ThreadOriginResolver,
    };
    use crate::blocks::{Block, TextObject};
    use crate::commands::SlashCommandPayload;

    struct FailingResolver;

    #[async_trait]
    impl ThreadOriginResolver for FailingResolver {
        async fn resolve(
            &self,
            _channel_id: &str,
            _thread_ts: &str,
        ) -> anyhow::Result<ThreadOrigin> {
            Err(anyhow::anyhow!("slack api unavailable"))
        }
    }

    fn engine() -> Arc<TriageEngine> {
        Arc::new(TriageEngine::new(
            DecisionPolicy::default(),
            ConversationTracker::default(),
            Arc::new(InMemoryAuditSink::new()),
        ))
    }

    fn dispatcher_with(origin: ThreadOrigin) -> EventDispatcher {
        default_dispatcher(engine(), Arc::new(StaticOriginResolver::new(origin)))
    }

    fn slash_envelope(text: &str, trigger_ts: &str) -> SlackEnvelope {
        SlackEnvelope {
            envelope_id: "env-1".to_owned(),
            event: SlackEvent::SlashCommand(SlashCommandPayload {
                command: "/triage".to_owned(),
                text: text.to_owned(),
                channel_id: "C1".to_owned(),
                user_id: "U1".to_owned(),
                trigger_ts: trigger_ts.to_owned(),
                request_id: "req-1".to_owned(),
            }),
        }
    }

    fn thread_envelope(text: &str, thread_ts: &str) -> SlackEnvelope {
        SlackEnvelope {
            envelope_id: "env-2".to_owned(),
            event: SlackEvent::ThreadMessage(ThreadMessageEvent {
                channel_id: "C1".to_owned(),
                thread_ts: thread_ts.to_owned(),
                ts: "1724.9999".to_owned(),
                user_id: "U1".to_owned(),
                text: text.to_owned(),
            }),
        }
    }

    fn message_text(result: &HandlerResult) -> String {
        let HandlerResult::Responded(message) = result else {
            panic!("expected a responded message, got {result:?}");
        };
        message
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Section { text: TextObject::Mrkdwn { text }, .. }
                | Block::Section { text: TextObject::Plain { text }, .. } => Some(text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn help_command_responds_with_usage() {
        let dispatcher = dispatcher_with(ThreadOrigin::Ours);
        let result = dispatcher
            .dispatch(&slash_envelope("help", "1724.0001"), &EventContext::default())
            .await
            .expect("dispatch");
        assert!(message_text(&result).contains("/triage help"));
    }

    #[tokio::test]
    async fn partial_request_then_follow_up_resolves_in_the_thread() {
        let engine = engine();
        let dispatcher = default_dispatcher(
            engine.clone(),
            Arc::new(StaticOriginResolver::new(ThreadOrigin::Ours)),
        );
        let ctx = EventContext::default();

        let first = dispatcher
            .dispatch(
                &slash_envelope("Allow SSH to external IP 196.181.12.201 on port 22", "1724.0002"),
                &ctx,
            )
            .await
            .expect("dispatch");
        assert!(message_text(&first).contains("fill in the following fields"));
        assert_eq!(engine.open_conversations(), 1);

        let second = dispatcher
            .dispatch(
                &thread_envelope(
                    "send it to 196.181.12.201 on port 22 for scheduled maintenance",
                    "1724.0002",
                ),
                &ctx,
            )
            .await
            .expect("dispatch");
        assert!(message_text(&second).contains("has been approved"));
        assert_eq!(engine.open_conversations(), 0);
    }

    #[tokio::test]
    async fn reply_in_a_foreign_thread_stays_silent() {
        let dispatcher = dispatcher_with(ThreadOrigin::NotOurs);
        let result = dispatcher
            .dispatch(&thread_envelope("some unrelated chatter", "1724.0003"), &EventContext::default())
            .await
            .expect("dispatch");
        assert_eq!(result, HandlerResult::Processed);
    }

    #[tokio::test]
    async fn resolver_failure_degrades_to_silence_not_an_error() {
        let dispatcher = default_dispatcher(engine(), Arc::new(FailingResolver));
        let result = dispatcher
            .dispatch(&thread_envelope("follow up details", "1724.0004"), &EventContext::default())
            .await
            .expect("dispatch");
        assert_eq!(result, HandlerResult::Processed);
    }

    #[tokio::test]
    async fn reply_in_our_thread_without_a_pending_request_announces_closure() {
        let dispatcher = dispatcher_with(ThreadOrigin::Ours);
        let result = dispatcher
            .dispatch(&thread_envelope("late follow up", "1724.0005"), &EventContext::default())
            .await
            .expect("dispatch");
        assert!(message_text(&result).contains("start over"));
    }

    #[tokio::test]
    async fn unsupported_events_are_ignored() {
        let dispatcher = dispatcher_with(ThreadOrigin::Ours);
        let envelope = SlackEnvelope {
            envelope_id: "env-9".to_owned(),
            event: SlackEvent::Unsupported { event_type: "reaction_added".to_owned() },
        };
        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");
        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn failure_reply_hides_internal_detail_behind_the_correlation_id() {
        use triage_core::errors::DomainError;
        use triage_core::requests::RequestKind;

        let error = DispatchError::Handler(EventHandlerError::Domain(
            DomainError::MergeKindMismatch {
                expected: RequestKind::FirewallChange,
                found: RequestKind::DataExport,
            },
        ));
        let ctx = EventContext { correlation_id: "corr-7".to_owned() };

        let message = failure_reply(&error, &ctx);
        let rendered = serde_json::to_string(&message.blocks).expect("serializable blocks");
        assert!(rendered.contains("could not process that request"));
        assert!(rendered.contains("corr-7"));
        assert!(!rendered.contains("FirewallChange"), "internal kinds stay out of replies");
    }

    #[test]
    fn default_dispatcher_registers_both_handlers() {
        let dispatcher = dispatcher_with(ThreadOrigin::Ours);
        assert_eq!(dispatcher.handler_count(), 2);
    }
}

//! Block Kit message model and the triage reply templates.

use serde::Serialize;

use triage_core::policy::Outcome;
use triage_core::requests::{FieldSpec, FieldValue, SecurityRequest};
use triage_core::TriageRound;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// The full reply to a triage round: acknowledgement, classification,
/// what was understood, and the outcome.
pub fn triage_reply(user_id: &str, round: &TriageRound) -> MessageTemplate {
    let kind_label = round.request.kind().label();
    let mut builder = MessageBuilder::new(format!(
        "Triage decision for <@{user_id}>: {}",
        round.outcome().label()
    ))
    .section("triage.reply.ack.v1", |section| {
        section.mrkdwn(format!(
            "I received a request to classify the following input for <@{user_id}>:"
        ));
    })
    .section("triage.reply.classification.v1", |section| {
        section.mrkdwn(format!(
            "From what I gather, this is {} *{kind_label}* request.",
            indefinite_article(kind_label)
        ));
    });

    if let Some(fields) = field_summary(&round.request) {
        builder = builder.section("triage.reply.fields.v1", |section| {
            section.mrkdwn(fields);
        });
    }

    builder = builder.section("triage.reply.outcome.v1", |section| {
        section.mrkdwn(outcome_text(round));
    });

    builder
        .context("triage.reply.context.v1", |context| {
            context
                .plain(format!("Ticket: {}", round.decision.ticket_id))
                .plain(format!("Risk score: {}", round.decision.risk_score));
        })
        .build()
}

pub fn thread_closed_message() -> MessageTemplate {
    MessageBuilder::new("This request is closed")
        .section("triage.closed.v1", |section| {
            section.mrkdwn(
                "I'm sorry, but I closed the request in this thread due to timeout or \
                 completion. Let's start over.",
            );
        })
        .build()
}

pub fn help_message() -> MessageTemplate {
    MessageBuilder::new("Triage command help")
        .section("triage.help.v1", |section| {
            section.mrkdwn(
                "*Usage*\n• `/triage <describe your security request>`\n• `/triage help`\n\
                 Describe what you need and why; I will classify it, score the risk and \
                 either approve it or ask for the missing details.",
            );
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("triage.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("triage.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

fn outcome_text(round: &TriageRound) -> String {
    match round.outcome() {
        Outcome::Accept => {
            "I am delighted to inform you that your request has been approved.".to_owned()
        }
        Outcome::Reject => {
            "I regret to inform you that your request has been rejected.".to_owned()
        }
        Outcome::RequestFurtherDetails => {
            // Only demand the mandatory gaps; optional fields stay optional.
            let missing: Vec<String> = round
                .request
                .missing_fields()
                .into_iter()
                .filter(|spec| spec.required)
                .map(|spec| format_missing_field(&spec))
                .collect();
            format!("I must ask you to fill in the following fields:\n{}", missing.join("\n"))
        }
        Outcome::Irrelevant => "This message does not belong to an open request.".to_owned(),
    }
}

fn format_missing_field(spec: &FieldSpec) -> String {
    format!("• *{}*: {}", spec.name, spec.description)
}

fn field_summary(request: &SecurityRequest) -> Option<String> {
    let summaries = request.describe();
    if summaries.is_empty() {
        return None;
    }
    let lines: Vec<String> = summaries
        .iter()
        .map(|summary| {
            let marker = if summary.spec.required { "required" } else { "optional" };
            let value = match &summary.value {
                Some(FieldValue::Text(text)) => format!("`{text}`"),
                Some(FieldValue::Flag(true)) => "yes".to_owned(),
                Some(FieldValue::Flag(false)) => "no".to_owned(),
                None => "_not provided_".to_owned(),
            };
            format!("• {} ({marker}): {value}", summary.spec.name)
        })
        .collect();
    Some(format!("*What I understood so far:*\n{}", lines.join("\n")))
}

fn indefinite_article(label: &str) -> &'static str {
    match label.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u' | 'A' | 'E' | 'I' | 'O' | 'U') => "an",
        _ => "a",
    }
}

#[cfg(test)]
mod tests {
    use super::{error_message, help_message, thread_closed_message, triage_reply, Block, TextObject};
    use triage_core::audit::Decision;
    use triage_core::policy::Outcome;
    use triage_core::requests::{FirewallChange, SecurityRequest};
    use triage_core::TriageRound;

    fn round(request: SecurityRequest, risk: u8, outcome: Outcome) -> TriageRound {
        let decision = Decision::new("SEC-1724-0001", &request, risk, outcome);
        TriageRound { request, decision }
    }

    fn section_texts(blocks: &[Block]) -> Vec<&str> {
        blocks
            .iter()
            .filter_map(|block| match block {
                Block::Section { text: TextObject::Mrkdwn { text }, .. }
                | Block::Section { text: TextObject::Plain { text }, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn approval_reply_names_the_kind_and_the_ticket() {
        let request = SecurityRequest::FirewallChange(FirewallChange {
            business_justification: Some("scheduled maintenance".to_owned()),
            destination: Some("196.181.12.201:22".to_owned()),
            source_system: None,
        });
        let message = triage_reply("U123", &round(request, 35, Outcome::Accept));

        let sections = section_texts(&message.blocks);
        assert!(sections.iter().any(|text| text.contains("<@U123>")));
        assert!(sections.iter().any(|text| text.contains("*firewall change*")));
        assert!(sections.iter().any(|text| text.contains("has been approved")));
        assert!(message.fallback_text.contains("accepted"));
    }

    #[test]
    fn further_details_reply_lists_each_missing_field() {
        let request = SecurityRequest::FirewallChange(FirewallChange {
            business_justification: None,
            destination: Some("196.181.12.201:22".to_owned()),
            source_system: None,
        });
        let message = triage_reply("U123", &round(request, 100, Outcome::RequestFurtherDetails));

        let sections = section_texts(&message.blocks);
        let ask = sections
            .iter()
            .find(|text| text.contains("fill in the following fields"))
            .expect("ask section present");
        assert!(ask.contains("business_justification"));
        assert!(!ask.contains("source_system"), "optional fields are not demanded");
    }

    #[test]
    fn rejection_reply_is_unambiguous() {
        let message =
            triage_reply("U123", &round(SecurityRequest::Unidentified, 100, Outcome::Reject));
        let sections = section_texts(&message.blocks);
        assert!(sections.iter().any(|text| text.contains("has been rejected")));
    }

    #[test]
    fn closed_thread_message_invites_a_restart() {
        let message = thread_closed_message();
        let sections = section_texts(&message.blocks);
        assert!(sections.iter().any(|text| text.contains("start over")));
    }

    #[test]
    fn error_message_carries_the_correlation_id() {
        let message = error_message("Something went wrong on our side", "corr-42");
        let context = message.blocks.iter().find_map(|block| match block {
            Block::Context { elements, .. } => Some(elements),
            _ => None,
        });
        let elements = context.expect("context block present");
        assert!(elements.iter().any(|element| matches!(
            element,
            TextObject::Plain { text } if text.contains("corr-42")
        )));
    }

    #[test]
    fn help_message_shows_both_command_forms() {
        let message = help_message();
        let sections = section_texts(&message.blocks);
        assert!(sections.iter().any(|text| text.contains("/triage help")));
    }
}

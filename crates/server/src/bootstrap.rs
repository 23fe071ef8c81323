use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use triage_core::audit::{AuditSink, InMemoryAuditSink, JsonLinesAuditSink};
use triage_core::config::{AppConfig, ConfigError, LoadOptions};
use triage_core::policy::DecisionPolicy;
use triage_core::tracker::ConversationTracker;
use triage_core::{ThreadOrigin, TriageEngine};
use triage_slack::events::{default_dispatcher, EventDispatcher, StaticOriginResolver};

pub struct Application {
    pub config: AppConfig,
    pub engine: Arc<TriageEngine>,
    pub dispatcher: EventDispatcher,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    Ok(bootstrap_with_config(config))
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    let audit: Arc<dyn AuditSink> = match &config.audit.log_path {
        Some(path) => {
            info!(
                event_name = "system.bootstrap.audit_log",
                correlation_id = "bootstrap",
                path = %path.display(),
                "decision log enabled"
            );
            Arc::new(JsonLinesAuditSink::new(path))
        }
        None => Arc::new(InMemoryAuditSink::new()),
    };

    let tracker = ConversationTracker::new(config.tracker.ttl(), config.tracker.capacity);
    let policy = DecisionPolicy::new(config.policy.approval_threshold);
    let engine = Arc::new(TriageEngine::new(policy, tracker, audit));

    // Until a transport that can query thread ownership is wired in, thread
    // replies resolve as unresolved and are ignored rather than merged.
    let resolver = Arc::new(StaticOriginResolver::new(ThreadOrigin::Unresolved));
    let dispatcher = default_dispatcher(engine.clone(), resolver);

    info!(
        event_name = "system.bootstrap.engine_ready",
        correlation_id = "bootstrap",
        approval_threshold = config.policy.approval_threshold,
        tracker_capacity = config.tracker.capacity,
        "triage engine ready"
    );

    Application { config, engine, dispatcher }
}

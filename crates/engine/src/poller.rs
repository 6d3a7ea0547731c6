// Event poller
//
// States: POLLING -> { artefact found, messages complete, failed, timeout }.
// PollState holds the pure per-batch logic; poll_session drives it against a FlowApi.
//
// Decision: Poll errors are transient and only consume an attempt
// Decision: An event seen in an earlier batch is skipped. Untimed events are resent by the
// service on every poll, so a batch of nothing but resent events counts as an empty poll.
// Decision: "Done" is inferred from a streak of empty polls after AI output, the service
// sends no explicit completion event. Only PollState::on_empty knows about this.

use crate::client::FlowApi;
use crate::config::PollConfig;
use crate::error::ClientError;
use crate::events::{find_matching_artefact, EventKind, FlowEvent};
use crate::timestamp::Timestamp;
use serde::Serialize;
use std::collections::HashSet;

/// Artefact captured for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtefactRef {
    pub name: String,
    pub download_url: String,
}

/// Result of feeding one poll response into [`PollState`]
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue,
    /// A matching artefact; `download_url` is `None` when the service sent none
    Artefact {
        name: String,
        download_url: Option<String>,
    },
    Failed(FlowEvent),
    Completed,
}

/// Accumulators of a polling run
#[derive(Debug, Clone)]
pub struct PollState {
    watermark: Timestamp,
    messages: Vec<String>,
    seen: HashSet<String>,
    empty_streak: u32,
    empty_streak_limit: u32,
    artefact_pattern: String,
}

impl PollState {
    pub fn new(config: &PollConfig) -> Self {
        Self::starting_at(config, Timestamp::zero())
    }

    pub fn starting_at(config: &PollConfig, watermark: Timestamp) -> Self {
        Self {
            watermark,
            messages: Vec::new(),
            seen: HashSet::new(),
            empty_streak: 0,
            empty_streak_limit: config.empty_streak_limit,
            artefact_pattern: config.artefact_pattern.clone(),
        }
    }

    pub fn watermark(&self) -> &Timestamp {
        &self.watermark
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn empty_streak(&self) -> u32 {
        self.empty_streak
    }

    /// Number of events in `events` not processed by an earlier call
    pub fn count_new(&self, events: &[FlowEvent]) -> usize {
        events.iter().filter(|event| !self.was_seen(event)).count()
    }

    fn was_seen(&self, event: &FlowEvent) -> bool {
        fingerprint(event).is_some_and(|key| self.seen.contains(&key))
    }

    /// Process a batch in arrival order.
    ///
    /// Stops at the first matching artefact or the first failure event; later
    /// events of the batch are not looked at. A batch without new events is
    /// handled like an empty poll.
    pub fn on_events(&mut self, events: Vec<FlowEvent>) -> Step {
        if self.count_new(&events) == 0 {
            return self.on_empty();
        }
        self.empty_streak = 0;

        for event in events {
            if let Some(key) = fingerprint(&event) {
                if !self.seen.insert(key) {
                    continue;
                }
            }

            if let Some(ts) = &event.created_at_timestamp {
                if ts.is_after(&self.watermark) {
                    self.watermark = ts.clone();
                }
            }

            match event.kind() {
                EventKind::AiMessage(Some(text)) => self.messages.push(text),
                EventKind::AiMessage(None) | EventKind::Other => {}
                EventKind::Artefacts(artefacts) => {
                    if let Some(found) = find_matching_artefact(&artefacts, &self.artefact_pattern)
                    {
                        return Step::Artefact {
                            name: found.name.clone(),
                            download_url: found.download_url.clone().filter(|u| !u.is_empty()),
                        };
                    }
                }
                EventKind::Failed => return Step::Failed(event),
            }
        }

        Step::Continue
    }

    /// Record a poll that returned nothing
    pub fn on_empty(&mut self) -> Step {
        self.empty_streak += 1;
        if !self.messages.is_empty() && self.empty_streak >= self.empty_streak_limit {
            Step::Completed
        } else {
            Step::Continue
        }
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

fn fingerprint(event: &FlowEvent) -> Option<String> {
    serde_json::to_string(event).ok()
}

/// How a polling run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    Artefact(ArtefactRef),
    Completed,
    Failed { event: FlowEvent },
    Timeout,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollReport {
    pub outcome: PollOutcome,
    pub messages: Vec<String>,
    pub attempts: u32,
    pub watermark: Timestamp,
}

/// Progress callbacks for a polling run
pub trait PollObserver: Send + Sync {
    fn on_events(&self, _attempt: u32, _max_attempts: u32, _count: usize) {}
    fn on_empty(&self, _attempt: u32, _max_attempts: u32, _empty_streak: u32) {}
    fn on_error(&self, _attempt: u32, _max_attempts: u32, _error: &ClientError) {}
    fn on_artefact_found(&self, _name: &str) {}
    fn on_artefact_without_url(&self, _name: &str) {}
}

/// Observer that ignores every callback
pub struct NoopObserver;

impl PollObserver for NoopObserver {}

/// Poll a session until an artefact shows up, the flow fails, output stops, or
/// `max_attempts` polls have been made.
pub async fn poll_session<A: FlowApi + ?Sized>(
    api: &A,
    session_id: &str,
    from_timestamp: Timestamp,
    config: &PollConfig,
    observer: &dyn PollObserver,
) -> PollReport {
    let mut state = PollState::starting_at(config, from_timestamp);
    let max = config.max_attempts;

    if !config.initial_delay.is_zero() {
        tokio::time::sleep(config.initial_delay).await;
    }

    let mut attempt = 0;
    let outcome = loop {
        if attempt >= max {
            tracing::info!(session_id, attempts = attempt, "polling timed out");
            break PollOutcome::Timeout;
        }
        attempt += 1;

        let step = match api.poll_events(session_id, state.watermark()).await {
            Ok(events) if state.count_new(&events) == 0 => {
                tracing::debug!(session_id, attempt, resent = events.len(), "no new events");
                let step = state.on_empty();
                observer.on_empty(attempt, max, state.empty_streak());
                step
            }
            Ok(events) => {
                observer.on_events(attempt, max, state.count_new(&events));
                state.on_events(events)
            }
            Err(e) => {
                // Reported to the user through the observer
                tracing::debug!(session_id, attempt, error = %e, "poll failed, retrying");
                observer.on_error(attempt, max, &e);
                Step::Continue
            }
        };

        match step {
            Step::Continue => {}
            Step::Artefact {
                name,
                download_url: Some(download_url),
            } => {
                tracing::info!(session_id, artefact = %name, "artefact found");
                observer.on_artefact_found(&name);
                break PollOutcome::Artefact(ArtefactRef { name, download_url });
            }
            Step::Artefact {
                name,
                download_url: None,
            } => {
                tracing::debug!(session_id, artefact = %name, "artefact has no download url");
                observer.on_artefact_without_url(&name);
            }
            Step::Failed(event) => {
                tracing::info!(session_id, "flow reported failure");
                break PollOutcome::Failed { event };
            }
            Step::Completed => {
                tracing::info!(
                    session_id,
                    messages = state.messages().len(),
                    "flow output complete"
                );
                break PollOutcome::Completed;
            }
        }

        if attempt < max {
            tokio::time::sleep(config.poll_interval).await;
        }
    };

    let watermark = state.watermark().clone();
    PollReport {
        outcome,
        messages: state.into_messages(),
        attempts: attempt,
        watermark,
    }
}

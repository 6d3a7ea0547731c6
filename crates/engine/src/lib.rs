// Flowrun Engine - FlowHunt flow invocation
//
// Decision: One sequential pipeline: create session, invoke, poll events, resolve artefact
// Decision: The poll loop never touches stdout; progress goes through PollObserver

pub mod artefact;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod poller;
pub mod timestamp;

pub use artefact::{render_artefact, resolve_artefact, ArtefactContent};
pub use client::{FlowApi, FlowClient};
pub use config::{ApiConfig, FlowTarget, PollConfig};
pub use error::ClientError;
pub use events::{find_matching_artefact, ArtefactInfo, EventKind, FlowEvent};
pub use poller::{
    poll_session, ArtefactRef, NoopObserver, PollObserver, PollOutcome, PollReport, PollState,
    Step,
};
pub use timestamp::{InvalidTimestamp, Timestamp};

// Artefact download and rendering

use crate::client::FlowApi;
use crate::error::ClientError;
use crate::poller::ArtefactRef;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

/// Downloaded artefact body, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "body", rename_all = "snake_case")]
pub enum ArtefactContent {
    /// Pretty-printed JSON, non-ASCII kept literal, key order kept
    Json(String),
    /// Body that is not JSON, unchanged
    Text(String),
}

impl ArtefactContent {
    pub fn body(&self) -> &str {
        match self {
            ArtefactContent::Json(body) | ArtefactContent::Text(body) => body,
        }
    }
}

/// Pretty-print `raw` when it parses as JSON, otherwise pass it through
pub fn render_artefact(raw: &str) -> ArtefactContent {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => match pretty(&value) {
            Some(body) => ArtefactContent::Json(body),
            None => ArtefactContent::Text(raw.to_string()),
        },
        Err(_) => ArtefactContent::Text(raw.to_string()),
    }
}

fn pretty(value: &Value) -> Option<String> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser).ok()?;
    String::from_utf8(out).ok()
}

/// Download and render a captured artefact
pub async fn resolve_artefact<A: FlowApi + ?Sized>(
    api: &A,
    artefact: &ArtefactRef,
) -> Result<ArtefactContent, ClientError> {
    let raw = api.fetch_artefact(&artefact.download_url).await?;
    tracing::debug!(artefact = %artefact.name, bytes = raw.len(), "artefact downloaded");
    Ok(render_artefact(&raw))
}

// Flow session events as returned by the invocation_response endpoint
//
// Decision: Keep the raw event (for display of failures) and decode metadata lazily via kind()
// Decision: Timestamps arrive as numbers or numeric strings; anything else counts as absent

use crate::timestamp::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One event emitted by a flow session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    #[serde(default)]
    pub event_type: Option<String>,

    #[serde(default)]
    pub action_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at_timestamp: Option<Timestamp>,

    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Typed view of an event, selected by `action_type`
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `ai` / `message`; the text is absent when metadata carries no message
    AiMessage(Option<String>),
    /// `artefacts`; entries that are not artefact records are dropped
    Artefacts(Vec<ArtefactInfo>),
    Failed,
    Other,
}

/// File produced by a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtefactInfo {
    pub name: String,

    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Deserialize)]
struct MessageMetadata {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ArtefactsMetadata {
    #[serde(default)]
    artefacts: Option<Vec<Value>>,
}

impl FlowEvent {
    pub fn kind(&self) -> EventKind {
        match self.action_type.as_deref() {
            Some("message") if self.event_type.as_deref() == Some("ai") => {
                EventKind::AiMessage(self.message_text())
            }
            Some("artefacts") => EventKind::Artefacts(self.artefacts()),
            Some("failed") => EventKind::Failed,
            _ => EventKind::Other,
        }
    }

    fn message_text(&self) -> Option<String> {
        let metadata = self.metadata.clone()?;
        serde_json::from_value::<MessageMetadata>(metadata)
            .ok()?
            .message
            .filter(|m| !m.is_empty())
    }

    fn artefacts(&self) -> Vec<ArtefactInfo> {
        let Some(metadata) = self.metadata.clone() else {
            return Vec::new();
        };
        let Ok(ArtefactsMetadata {
            artefacts: Some(entries),
        }) = serde_json::from_value::<ArtefactsMetadata>(metadata)
        else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }
}

/// Case-insensitive substring match on the artefact name
pub fn artefact_matches(artefact: &ArtefactInfo, pattern: &str) -> bool {
    artefact
        .name
        .to_lowercase()
        .contains(&pattern.to_lowercase())
}

/// First artefact whose name contains `pattern`, ignoring case
pub fn find_matching_artefact<'a>(
    artefacts: &'a [ArtefactInfo],
    pattern: &str,
) -> Option<&'a ArtefactInfo> {
    artefacts.iter().find(|a| artefact_matches(a, pattern))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Timestamp::from_json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> FlowEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ai_message_kind() {
        let ev = event(json!({
            "event_type": "ai",
            "action_type": "message",
            "created_at_timestamp": 1700000000,
            "metadata": {"message": "hello"}
        }));
        assert_eq!(ev.kind(), EventKind::AiMessage(Some("hello".to_string())));
        assert_eq!(ev.created_at_timestamp, Some(Timestamp::from(1700000000)));
    }

    #[test]
    fn test_message_from_non_ai_is_other() {
        let ev = event(json!({
            "event_type": "human",
            "action_type": "message",
            "metadata": {"message": "hi"}
        }));
        assert_eq!(ev.kind(), EventKind::Other);
    }

    #[test]
    fn test_ai_message_without_metadata() {
        let ev = event(json!({"event_type": "ai", "action_type": "message"}));
        assert_eq!(ev.kind(), EventKind::AiMessage(None));

        let ev = event(json!({
            "event_type": "ai",
            "action_type": "message",
            "metadata": {"other": 1}
        }));
        assert_eq!(ev.kind(), EventKind::AiMessage(None));
    }

    #[test]
    fn test_artefacts_kind_skips_malformed_entries() {
        let ev = event(json!({
            "event_type": "system",
            "action_type": "artefacts",
            "metadata": {"artefacts": [
                "not-an-artefact",
                {"name": "draft.txt", "download_url": "https://files/draft.txt"},
                {"download_url": "https://files/nameless"}
            ]}
        }));
        assert_eq!(
            ev.kind(),
            EventKind::Artefacts(vec![ArtefactInfo {
                name: "draft.txt".to_string(),
                download_url: Some("https://files/draft.txt".to_string()),
            }])
        );
    }

    #[test]
    fn test_artefacts_without_list() {
        let ev = event(json!({"action_type": "artefacts", "metadata": {"message": "x"}}));
        assert_eq!(ev.kind(), EventKind::Artefacts(vec![]));
    }

    #[test]
    fn test_failed_and_unknown_kinds() {
        assert_eq!(event(json!({"action_type": "failed"})).kind(), EventKind::Failed);
        assert_eq!(event(json!({"action_type": "tool_call"})).kind(), EventKind::Other);
        assert_eq!(event(json!({})).kind(), EventKind::Other);
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(
            event(json!({"created_at_timestamp": "1700000001"})).created_at_timestamp,
            Some(Timestamp::from(1700000001))
        );
        assert_eq!(
            event(json!({"created_at_timestamp": 1700000002.75}))
                .created_at_timestamp
                .map(|ts| ts.to_string()),
            Some("1700000002.75".to_string())
        );
        assert_eq!(
            event(json!({"created_at_timestamp": null})).created_at_timestamp,
            None
        );
        assert_eq!(
            event(json!({"created_at_timestamp": "yesterday"})).created_at_timestamp,
            None
        );
    }

    #[test]
    fn test_find_matching_artefact_ignores_case_and_takes_first() {
        let artefacts = vec![
            ArtefactInfo {
                name: "summary.md".to_string(),
                download_url: None,
            },
            ArtefactInfo {
                name: "Final-KOREKTURA.json".to_string(),
                download_url: Some("https://files/1".to_string()),
            },
            ArtefactInfo {
                name: "korektura-v2.json".to_string(),
                download_url: Some("https://files/2".to_string()),
            },
        ];

        let found = find_matching_artefact(&artefacts, "korektura").unwrap();
        assert_eq!(found.name, "Final-KOREKTURA.json");
        assert!(find_matching_artefact(&artefacts, "missing").is_none());
    }
}

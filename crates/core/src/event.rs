//! UpdateEvent — emitted to stream subscribers on every committed write.

use crate::id::WorkspaceId;
use crate::session::Session;
use crate::snapshot::StateSnapshot;
use crate::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What kind of change a given [`UpdateEvent`] carries.
///
/// `Other` covers any collector source not named explicitly by the
/// protocol (`source` still identifies which one); wire representation is
/// `"other:<source>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateType {
    Initial,
    Workspaces,
    Sessions,
    Focus,
    Other(String),
}

impl UpdateType {
    pub fn as_wire_str(&self) -> String {
        match self {
            UpdateType::Initial => "initial".to_string(),
            UpdateType::Workspaces => "workspaces".to_string(),
            UpdateType::Sessions => "sessions".to_string(),
            UpdateType::Focus => "focus".to_string(),
            UpdateType::Other(source) => format!("other:{source}"),
        }
    }
}

impl Serialize for UpdateType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_wire_str())
    }
}

impl<'de> Deserialize<'de> for UpdateType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "initial" => UpdateType::Initial,
            "workspaces" => UpdateType::Workspaces,
            "sessions" => UpdateType::Sessions,
            "focus" => UpdateType::Focus,
            other => match other.strip_prefix("other:") {
                Some(source) => UpdateType::Other(source.to_string()),
                None => UpdateType::Other(other.to_string()),
            },
        })
    }
}

/// Payload accompanying an [`UpdateEvent`], sized to the kind of update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspaces: Option<Arc<Vec<Workspace>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Arc<Vec<Session>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<Arc<Vec<WorkspaceId>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub revision: u64,
    pub updated_at: u64,
    #[serde(rename = "update_type")]
    pub update_type: UpdateType,
    /// Which collector produced this event, empty for `initial`.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned: Option<u64>,
    #[serde(flatten)]
    pub payload: UpdatePayload,
}

impl UpdateEvent {
    /// The synthesized event a new subscriber receives first.
    pub fn initial(snapshot: &StateSnapshot) -> Self {
        Self {
            revision: snapshot.revision,
            updated_at: snapshot.updated_at,
            update_type: UpdateType::Initial,
            source: String::new(),
            scanned: None,
            payload: UpdatePayload {
                workspaces: Some(Arc::clone(&snapshot.workspaces)),
                sessions: Some(Arc::clone(&snapshot.sessions)),
                focus: Some(Arc::clone(&snapshot.focus)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_type_round_trips_other_variant() {
        let event_type = UpdateType::Other("git".to_string());
        let json = serde_json::to_string(&event_type).unwrap();
        assert_eq!(json, "\"other:git\"");
        let parsed: UpdateType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, UpdateType::Other("git".to_string()));
    }

    #[test]
    fn initial_event_has_empty_source() {
        let snapshot = StateSnapshot::empty();
        let event = UpdateEvent::initial(&snapshot);
        assert_eq!(event.update_type, UpdateType::Initial);
        assert_eq!(event.source, "");
        assert_eq!(event.revision, snapshot.revision);
    }
}

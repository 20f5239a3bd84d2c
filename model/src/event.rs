use crate::plugin::ChePlugin;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrokerStatus {
    Started,
    Done,
    Failed,
}

/// A status report published by a broker about the workspace it is running for.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BrokerEvent {
    /// The workspace id of the runtime that the broker serves.
    pub runtime_id: String,
    pub status: BrokerStatus,
    pub error: Option<String>,
    /// The resolved plugins, present when the broker is done.
    pub tooling: Option<Vec<ChePlugin>>,
}

impl BrokerEvent {
    pub fn started<S: Into<String>>(runtime_id: S) -> Self {
        Self {
            runtime_id: runtime_id.into(),
            status: BrokerStatus::Started,
            error: None,
            tooling: None,
        }
    }

    pub fn done<S: Into<String>>(runtime_id: S, tooling: Vec<ChePlugin>) -> Self {
        Self {
            runtime_id: runtime_id.into(),
            status: BrokerStatus::Done,
            error: None,
            tooling: Some(tooling),
        }
    }

    pub fn failed<S1, S2>(runtime_id: S1, error: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            runtime_id: runtime_id.into(),
            status: BrokerStatus::Failed,
            error: Some(error.into()),
            tooling: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_failed_event() {
        let event: BrokerEvent = serde_json::from_str(
            r#"{"runtimeId": "workspace1", "status": "FAILED", "error": "no such plugin"}"#,
        )
        .unwrap();
        assert_eq!(event, BrokerEvent::failed("workspace1", "no such plugin"));
    }
}

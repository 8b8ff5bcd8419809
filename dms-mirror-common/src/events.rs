//! DMS webhook events
//!
//! A payload is validated completely before any of it is processed:
//! `componentVersion.component` and `componentVersion.version` must be
//! non-empty strings and `type` must name a known event kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::models::{Artifact, NewComponentRecord};
use crate::{Error, Result};

/// Label marking a component as not shipped to customers
pub const NON_DELIVERABLE_LABEL: &str = "non-deliverable";

/// Event kinds sent by DMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DmsEventKind {
    PublishComponentVersion,
    RevokeComponentVersion,
    RegisterComponentVersionArtifact,
    DeleteComponentVersionArtifact,
}

impl DmsEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DmsEventKind::PublishComponentVersion => "PUBLISH_COMPONENT_VERSION",
            DmsEventKind::RevokeComponentVersion => "REVOKE_COMPONENT_VERSION",
            DmsEventKind::RegisterComponentVersionArtifact => "REGISTER_COMPONENT_VERSION_ARTIFACT",
            DmsEventKind::DeleteComponentVersionArtifact => "DELETE_COMPONENT_VERSION_ARTIFACT",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        [
            DmsEventKind::PublishComponentVersion,
            DmsEventKind::RevokeComponentVersion,
            DmsEventKind::RegisterComponentVersionArtifact,
            DmsEventKind::DeleteComponentVersionArtifact,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == raw)
    }
}

impl fmt::Display for DmsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `componentVersion` section of an event
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentVersionRef {
    pub component: String,
    pub version: String,
    pub display_name: Option<String>,
    pub labels: Vec<String>,
    pub client_code: Option<String>,
}

impl ComponentVersionRef {
    pub fn is_deliverable(&self) -> bool {
        !self
            .labels
            .iter()
            .any(|label| label.eq_ignore_ascii_case(NON_DELIVERABLE_LABEL))
    }

    /// Registration record for a component not yet known to the relational store
    pub fn to_new_component_record(&self) -> NewComponentRecord {
        NewComponentRecord {
            dms_id: self.component.clone(),
            name: self
                .display_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| self.component.clone()),
            is_deliverable: self.is_deliverable(),
            client_code: self.client_code.clone(),
        }
    }
}

/// A validated webhook event
#[derive(Debug, Clone, PartialEq)]
pub enum DmsEvent {
    PublishComponentVersion {
        component_version: ComponentVersionRef,
        artifacts: Vec<Artifact>,
    },
    RevokeComponentVersion(ComponentVersionRef),
    RegisterComponentVersionArtifact(ComponentVersionRef),
    DeleteComponentVersionArtifact(ComponentVersionRef),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Name(String),
    Object { name: String },
}

impl DmsEvent {
    /// Validate a raw webhook payload
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let component_version = payload
            .get("componentVersion")
            .filter(|v| v.is_object())
            .ok_or_else(|| invalid("'componentVersion' is missing or not an object"))?;

        let component = required_str(component_version, "component")?;
        let version = required_str(component_version, "version")?;

        let display_name = component_version
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_string);
        let client_code = component_version
            .get("clientCode")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let labels = match component_version.get("labels") {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => serde_json::from_value::<Vec<RawLabel>>(raw.clone())
                .map_err(|e| invalid(&format!("'componentVersion.labels' is malformed: {}", e)))?
                .into_iter()
                .map(|label| match label {
                    RawLabel::Name(name) | RawLabel::Object { name } => name,
                })
                .collect(),
        };

        let component_version = ComponentVersionRef {
            component,
            version,
            display_name,
            labels,
            client_code,
        };

        let raw_type = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("'type' is missing"))?;
        let kind = DmsEventKind::parse(raw_type)
            .ok_or_else(|| invalid(&format!("Unexpected event type [{}]", raw_type)))?;

        Ok(match kind {
            DmsEventKind::PublishComponentVersion => {
                let artifacts = match payload.get("artifacts") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(raw) => serde_json::from_value(raw.clone())
                        .map_err(|e| invalid(&format!("'artifacts' is malformed: {}", e)))?,
                };
                DmsEvent::PublishComponentVersion {
                    component_version,
                    artifacts,
                }
            }
            DmsEventKind::RevokeComponentVersion => DmsEvent::RevokeComponentVersion(component_version),
            DmsEventKind::RegisterComponentVersionArtifact => {
                DmsEvent::RegisterComponentVersionArtifact(component_version)
            }
            DmsEventKind::DeleteComponentVersionArtifact => {
                DmsEvent::DeleteComponentVersionArtifact(component_version)
            }
        })
    }

    pub fn kind(&self) -> DmsEventKind {
        match self {
            DmsEvent::PublishComponentVersion { .. } => DmsEventKind::PublishComponentVersion,
            DmsEvent::RevokeComponentVersion(_) => DmsEventKind::RevokeComponentVersion,
            DmsEvent::RegisterComponentVersionArtifact(_) => DmsEventKind::RegisterComponentVersionArtifact,
            DmsEvent::DeleteComponentVersionArtifact(_) => DmsEventKind::DeleteComponentVersionArtifact,
        }
    }

    pub fn component_version(&self) -> &ComponentVersionRef {
        match self {
            DmsEvent::PublishComponentVersion { component_version, .. } => component_version,
            DmsEvent::RevokeComponentVersion(cv)
            | DmsEvent::RegisterComponentVersionArtifact(cv)
            | DmsEvent::DeleteComponentVersionArtifact(cv) => cv,
        }
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidInput(message.to_string())
}

fn required_str(section: &Value, key: &str) -> Result<String> {
    section
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid(&format!("'componentVersion.{}' is missing or empty", key)))
}

//! DMS and relational-store data model

use serde::{Deserialize, Deserializer, Serialize};

/// Repository type marker of container layers; those are never mirrored
pub const DOCKER_REPOSITORY_TYPE: &str = "DOCKER";

/// Artifact descriptor as reported by DMS.
///
/// The older API fills `name`, `packaging` and `classifier`; the newer one
/// only reports `id`, `type` and `fileName`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default, deserialize_with = "deserialize_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_type: Option<String>,
}

impl Artifact {
    pub fn new(artifact_type: impl Into<String>) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            ..Self::default()
        }
    }

    pub fn is_docker_layer(&self) -> bool {
        self.repository_type.as_deref() == Some(DOCKER_REPOSITORY_TYPE)
    }
}

/// Structured coordinate inside a detailed artifact lookup
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactGav {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
}

/// Detailed artifact lookup (newer DMS API)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactInfo {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub gav: Option<ArtifactGav>,
    #[serde(default)]
    pub repository_type: Option<String>,
}

/// Component entry of the DMS component list
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DmsComponent {
    pub id: String,
    #[serde(default)]
    pub client_code: Option<String>,
}

/// Relational-store record linking a DMS component to its registration category
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CiTypeDms {
    #[serde(default)]
    pub dms_id: Option<String>,
    #[serde(default)]
    pub ci_type_id: Option<String>,
}

/// New component record submitted by auto-provisioning
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewComponentRecord {
    pub dms_id: String,
    pub name: String,
    pub is_deliverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_code: Option<String>,
}

/// DMS reports identifiers either as numbers or as strings
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    }))
}

//! GAV substitution resolver
//!
//! Builds the values a GAV template is filled with. Stages run in order and
//! stop as soon as both name and packaging are known:
//!
//! 1. direct artifact fields
//! 2. detailed DMS lookup (only when the API offers it)
//! 3. parsing the file name around the version string
//!
//! A later stage never replaces a value an earlier stage already set.
//! An artifact the stages cannot resolve is a lookup miss, not an error.

use dms_mirror_common::models::Artifact;
use dms_mirror_common::{call_with_retries, ClientError, RetryPolicy};
use tracing::{trace, warn};

use crate::clients::DmsClient;
use crate::error::{MirrorError, MirrorResult};

const DEFAULT_PACKAGING: &str = "bin";

/// Values available to a GAV template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    pub artifact_type: String,
    pub name: String,
    pub version: String,
    pub packaging: String,
    pub classifier: String,
    pub prefix: String,
}

fn fill(slot: &mut String, value: Option<&str>) {
    if slot.is_empty() {
        if let Some(value) = value {
            slot.push_str(value);
        }
    }
}

impl SubstitutionMap {
    /// Stage 1: direct artifact fields
    pub fn seed(artifact: &Artifact, version: &str, prefix: &str) -> Self {
        Self {
            artifact_type: artifact.artifact_type.clone(),
            name: artifact.name.clone().unwrap_or_default(),
            version: version.to_string(),
            packaging: artifact.packaging.clone().unwrap_or_default(),
            classifier: artifact.classifier.clone().unwrap_or_default(),
            prefix: prefix.to_string(),
        }
    }

    /// Both mandatory fields are known
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.packaging.is_empty()
    }

    pub fn fill_gaps(&mut self, name: Option<&str>, packaging: Option<&str>, classifier: Option<&str>) {
        fill(&mut self.name, name);
        fill(&mut self.packaging, packaging);
        fill(&mut self.classifier, classifier);
    }

    /// Value of a template placeholder
    pub fn get(&self, placeholder: &str) -> Option<String> {
        let value = match placeholder {
            "at" => self.artifact_type.clone(),
            "n" => self.name.clone(),
            "v" => self.version.clone(),
            "p" => self.packaging.clone(),
            "c" | "cl" => self.classifier.clone(),
            "c_hyphen" => self.prefixed_classifier('-'),
            "c_colon" => self.prefixed_classifier(':'),
            "prefix" => self.prefix.clone(),
            _ => return None,
        };
        Some(value)
    }

    fn prefixed_classifier(&self, separator: char) -> String {
        if self.classifier.is_empty() {
            String::new()
        } else {
            format!("{}{}", separator, self.classifier)
        }
    }
}

/// Parts derived from a file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameParts {
    pub name: String,
    pub classifier: String,
    pub packaging: String,
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c == '-' || c == '_' || c == '.' || c.is_whitespace())
}

/// Split `file` at its extension and its base name at `version`.
///
/// Only the last path segment can carry the extension, and its leading
/// dots never start one.
pub fn parse_file_name(file: &str, version: &str) -> FileNameParts {
    let segment_start = file.rfind('/').map_or(0, |i| i + 1);
    let segment = &file[segment_start..];
    let leading_dots = segment.len() - segment.trim_start_matches('.').len();
    let (base, extension) = match segment[leading_dots..].rfind('.') {
        Some(i) => file.split_at(segment_start + leading_dots + i),
        None => (file, ""),
    };

    let packaging = match extension.trim_matches('.') {
        "" => DEFAULT_PACKAGING,
        ext => ext,
    };

    let pieces: Vec<&str> = if version.is_empty() {
        vec![base]
    } else {
        base.split(version).collect()
    };

    let name = pieces.first().copied().unwrap_or_default();
    let classifier = if pieces.len() > 1 {
        pieces.last().copied().unwrap_or_default()
    } else {
        ""
    };

    FileNameParts {
        name: trim_separators(name).to_string(),
        classifier: trim_separators(classifier).to_string(),
        packaging: packaging.to_string(),
    }
}

/// Build the substitution map of one artifact; `None` when neither the
/// detailed lookup nor the file name yields a name and a packaging
pub async fn resolve(
    dms: &dyn DmsClient,
    retry: &RetryPolicy,
    prefix: &str,
    component: &str,
    version: &str,
    artifact: &Artifact,
) -> MirrorResult<Option<SubstitutionMap>> {
    let mut map = SubstitutionMap::seed(artifact, version, prefix);
    let mut file_name = artifact.file_name.clone();

    if !map.is_complete() && dms.api_version().supports_artifact_info() {
        trace!("Looking up missing name/packaging with the detailed artifact call");
        let id = artifact
            .id
            .as_deref()
            .ok_or_else(|| MirrorError::MissingField(format!("artifact id of [{}]", artifact.artifact_type)))?;

        let lookup = call_with_retries(retry, "get_artifact_info", || {
            dms.get_artifact_info(component, version, id)
        })
        .await;

        match lookup {
            Ok(info) => {
                if let Some(gav) = info.gav.as_ref() {
                    map.fill_gaps(
                        gav.artifact_id.as_deref().filter(|v| !v.is_empty()),
                        gav.packaging.as_deref().filter(|v| !v.is_empty()),
                        gav.classifier.as_deref().filter(|v| !v.is_empty()),
                    );
                }
                if file_name.is_none() {
                    file_name = info.file_name;
                }
            }
            Err(ClientError::NotFound(message)) => {
                warn!(
                    "No detailed info for artifact [{}:{}:{}]: {}",
                    component, artifact.artifact_type, id, message
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !map.is_complete() {
        let Some(file_name) = file_name.filter(|f| !f.trim().is_empty()) else {
            warn!(
                "Artifact [{}:{}:{}] has no fileName to derive name and packaging from",
                component, artifact.artifact_type, version
            );
            return Ok(None);
        };
        trace!(file_name = %file_name, "Parsing file name");
        let parts = parse_file_name(&file_name, version);
        map.fill_gaps(
            Some(parts.name.as_str()),
            Some(parts.packaging.as_str()),
            Some(parts.classifier.as_str()),
        );
    }

    if !map.is_complete() {
        warn!(
            "Cannot resolve name and packaging of [{}:{}:{}]",
            component, artifact.artifact_type, version
        );
        return Ok(None);
    }

    trace!(substitution = ?map, "Resolved substitution");
    Ok(Some(map))
}

//! Component configuration loading and synthesis
//!
//! The components file maps a DMS component id to its mirroring settings.
//! It is JSON unless the file extension is `.toml`. Entry order is kept so
//! components are processed in file order.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::{Error, Result};

const COMPONENT_TOKEN: &str = "$component";
const CLIENT_TOKEN: &str = "$client";

fn default_enabled() -> bool {
    true
}

/// Mirroring settings of one component
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ComponentConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Default registration category
    #[serde(rename = "ciType", alias = "ci_type", default, skip_serializing_if = "Option::is_none")]
    pub ci_type: Option<String>,
    /// Artifact type → GAV template
    #[serde(rename = "gavTemplates", alias = "tgtGavTemplate", default)]
    pub gav_templates: IndexMap<String, String>,
    /// Deprecated, ignored
    #[serde(rename = "componentId", default, skip_serializing)]
    pub component_id: Option<serde_json::Value>,
    /// Deprecated, ignored
    #[serde(rename = "artifactType", default, skip_serializing)]
    pub artifact_type: Option<serde_json::Value>,
}

impl ComponentConfig {
    /// GAV template for an artifact type, backslashes removed
    pub fn gav_template(&self, artifact_type: &str) -> Option<String> {
        self.gav_templates
            .get(artifact_type)
            .map(|template| template.replace('\\', ""))
    }

    pub fn has_deprecated_keys(&self) -> bool {
        self.component_id.is_some() || self.artifact_type.is_some()
    }
}

/// All statically configured components, in file order
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ComponentsConfig {
    components: IndexMap<String, ComponentConfig>,
}

impl ComponentsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_file(path)?;
        info!(
            "Loaded {} component(s) from {}",
            config.components.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn get(&self, component: &str) -> Option<&ComponentConfig> {
        self.components.get(component)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.components.keys()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Fallback configuration pattern for components absent from the
/// components file.
///
/// String fields may contain `$component` (replaced with the relational
/// store's ci type id) and `$client` (replaced with the DMS client code).
/// A `.$client` segment disappears entirely when there is no client code.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GenericComponentTemplate {
    pattern: ComponentConfig,
}

impl GenericComponentTemplate {
    /// Load the template if the file exists; a missing file disables synthesis
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            warn!("GAV template config file not found: {}", path.display());
            return Ok(None);
        }
        load_file(path).map(Some)
    }

    /// Produce a typed configuration for one component
    pub fn build(&self, ci_type_id: &str, client_code: Option<&str>) -> ComponentConfig {
        let apply = |text: &str| substitute_tokens(text, ci_type_id, client_code);

        ComponentConfig {
            enabled: self.pattern.enabled,
            ci_type: self.pattern.ci_type.as_deref().map(apply),
            gav_templates: self
                .pattern
                .gav_templates
                .iter()
                .map(|(artifact_type, template)| (artifact_type.clone(), apply(template)))
                .collect(),
            component_id: None,
            artifact_type: None,
        }
    }
}

fn substitute_tokens(text: &str, ci_type_id: &str, client_code: Option<&str>) -> String {
    let dotted_client = format!(".{}", CLIENT_TOKEN);
    let text = text.replace(COMPONENT_TOKEN, ci_type_id);
    match client_code.filter(|c| !c.is_empty()) {
        Some(code) => text
            .replace(&dotted_client, &format!(".{}", code))
            .replace(CLIENT_TOKEN, code),
        None => text.replace(&dotted_client, "").replace(CLIENT_TOKEN, ""),
    }
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    } else {
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }
}

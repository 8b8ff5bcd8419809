//! GAV (Group/Artifact/Version) coordinates
//!
//! Coordinates are written `group:artifact:version[:packaging[:classifier]]`.
//! Packaging defaults to `jar` when absent, as in Maven.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::{Error, Result};

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9_.:\-]+").expect("static regex")
});

const DEFAULT_PACKAGING: &str = "jar";

/// Replace every run of characters outside `[A-Za-z0-9_.:-]` with one `_`.
///
/// Sanitizing an already sanitized coordinate returns it unchanged.
pub fn sanitize_gav(raw: &str) -> String {
    UNSAFE_CHARS.replace_all(raw, "_").into_owned()
}

/// Parsed Maven coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gav {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    pub classifier: Option<String>,
}

impl Gav {
    pub fn parse(coordinate: &str) -> Result<Self> {
        let parts: Vec<&str> = coordinate.split(':').collect();
        if parts.len() < 3 || parts.len() > 5 || parts.iter().take(3).any(|p| p.is_empty()) {
            return Err(Error::InvalidInput(format!(
                "Invalid GAV coordinate: [{}]",
                coordinate
            )));
        }

        let packaging = parts
            .get(3)
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
            .unwrap_or_else(|| DEFAULT_PACKAGING.to_string());

        let classifier = parts
            .get(4)
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string());

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            packaging,
            classifier,
        })
    }

    /// Directory of this artifact inside a Maven2 repository
    pub fn directory(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version
        )
    }

    fn base_name(&self) -> String {
        format!("{}-{}", self.artifact_id, self.version)
    }

    /// Repository-relative path of the binary
    pub fn artifact_path(&self) -> String {
        let classifier = self
            .classifier
            .as_ref()
            .map(|c| format!("-{}", c))
            .unwrap_or_default();

        format!(
            "{}/{}{}.{}",
            self.directory(),
            self.base_name(),
            classifier,
            self.packaging
        )
    }

    /// Repository-relative path of the descriptor uploaded next to the binary
    pub fn pom_path(&self) -> String {
        format!("{}/{}.pom", self.directory(), self.base_name())
    }

    /// Minimal POM describing this coordinate.
    ///
    /// Classified artifacts share the POM of their unclassified parent, so
    /// the classifier never appears here.
    pub fn pom_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{}</groupId>
  <artifactId>{}</artifactId>
  <version>{}</version>
  <packaging>{}</packaging>
</project>
"#,
            self.group_id, self.artifact_id, self.version, self.packaging
        )
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.version, self.packaging
        )?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        Ok(())
    }
}

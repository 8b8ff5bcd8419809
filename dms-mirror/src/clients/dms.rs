//! DMS REST client (API v2 and v3)

use async_trait::async_trait;
use dms_mirror_common::models::{Artifact, ArtifactGav, ArtifactInfo, DmsComponent};
use dms_mirror_common::ClientError;
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;

use super::http::{self, Credentials};
use super::{ByteSink, DmsClient, TransferStrategy};
use crate::settings::DmsApiVersion;

/// Connection parameters of one DMS instance
#[derive(Debug, Clone)]
pub struct DmsEndpoint {
    pub api_version: DmsApiVersion,
    pub root: Url,
    /// Component registry, the v2 source of the component list
    pub crs_root: Option<Url>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

impl DmsEndpoint {
    fn api_segment(&self) -> &'static str {
        match self.api_version {
            DmsApiVersion::V2 => "2",
            DmsApiVersion::V3 => "3",
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut all = vec!["rest", "api", self.api_segment()];
        all.extend_from_slice(segments);
        http::endpoint(&self.root, &all)
    }

    fn components_url(&self) -> Result<Url, ClientError> {
        match self.api_version {
            DmsApiVersion::V3 => self.url(&["components"]),
            DmsApiVersion::V2 => {
                let crs = self.crs_root.as_ref().ok_or_else(|| {
                    ClientError::Unsupported("component listing needs the DMS CRS URL".to_string())
                })?;
                http::endpoint(crs, &["rest", "api", "1", "components"])
            }
        }
    }
}

/// Version entries come either as bare strings or as `{"version": ...}`
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionEntry {
    Text(String),
    Object { version: String },
}

impl From<VersionEntry> for String {
    fn from(entry: VersionEntry) -> Self {
        match entry {
            VersionEntry::Text(v) | VersionEntry::Object { version: v } => v,
        }
    }
}

/// Coordinate text of a structured GAV, `g:a:v[:p[:c]]`
pub fn coordinate(gav: &ArtifactGav) -> Result<String, ClientError> {
    let field = |value: &Option<String>, name: &str| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ClientError::MissingField(format!("gav.{}", name)))
    };

    let mut parts = vec![
        field(&gav.group_id, "groupId")?,
        field(&gav.artifact_id, "artifactId")?,
        field(&gav.version, "version")?,
    ];

    let classifier = gav.classifier.clone().filter(|c| !c.is_empty());
    match gav.packaging.clone().filter(|p| !p.is_empty()) {
        Some(packaging) => parts.push(packaging),
        None if classifier.is_some() => parts.push("jar".to_string()),
        None => {}
    }
    parts.extend(classifier);

    Ok(parts.join(":"))
}

pub struct HttpDmsClient {
    endpoint: DmsEndpoint,
    http: reqwest::Client,
}

impl HttpDmsClient {
    pub fn new(endpoint: DmsEndpoint) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint,
            http: http::pooled_client()?,
        })
    }

    fn get(&self, url: Url) -> RequestBuilder {
        tracing::debug!(url = %url, "DMS request");
        let request = self.http.get(url);
        match self.endpoint.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => request.bearer_auth(token),
            None => http::with_basic_auth(
                request,
                Credentials::from_parts(self.endpoint.user.clone(), self.endpoint.password.clone()).as_ref(),
            ),
        }
    }

    fn require(&self, strategy: TransferStrategy, operation: &str) -> Result<(), ClientError> {
        if self.endpoint.api_version.transfer_strategy() == strategy {
            Ok(())
        } else {
            Err(ClientError::Unsupported(format!(
                "{} is not offered by DMS API v{}",
                operation,
                self.endpoint.api_segment()
            )))
        }
    }
}

#[async_trait]
impl DmsClient for HttpDmsClient {
    fn api_version(&self) -> DmsApiVersion {
        self.endpoint.api_version
    }

    async fn get_components(&self) -> Result<Vec<DmsComponent>, ClientError> {
        let url = self.endpoint.components_url()?;
        http::send_json(self.get(url)).await
    }

    async fn get_versions(&self, component: &str) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint.url(&["components", component, "versions"])?;
        let entries: Vec<VersionEntry> = http::send_json(self.get(url)).await?;
        Ok(entries.into_iter().map(String::from).collect())
    }

    async fn get_artifacts(&self, component: &str, version: &str) -> Result<Vec<Artifact>, ClientError> {
        let url = self
            .endpoint
            .url(&["components", component, "versions", version, "artifacts"])?;
        http::send_json(self.get(url)).await
    }

    async fn get_artifact_info(
        &self,
        component: &str,
        version: &str,
        artifact_id: &str,
    ) -> Result<ArtifactInfo, ClientError> {
        if !self.endpoint.api_version.supports_artifact_info() {
            return Err(ClientError::Unsupported(
                "artifact info is not offered by DMS API v2".to_string(),
            ));
        }
        let url = self.endpoint.url(&[
            "components", component, "versions", version, "artifacts", artifact_id,
        ])?;
        http::send_json(self.get(url)).await
    }

    async fn download_component(
        &self,
        component: &str,
        version: &str,
        artifact_id: &str,
        sink: &mut ByteSink<'_>,
    ) -> Result<u64, ClientError> {
        self.require(TransferStrategy::DirectDownload, "download")?;
        let url = self.endpoint.url(&[
            "components", component, "versions", version, "artifacts", artifact_id, "download",
        ])?;
        let response = http::send(self.get(url)).await?;
        http::stream_into(response, sink).await
    }

    async fn get_gav(
        &self,
        component: &str,
        version: &str,
        artifact_type: &str,
        name: Option<&str>,
        classifier: Option<&str>,
    ) -> Result<String, ClientError> {
        self.require(TransferStrategy::ViaRepository, "GAV lookup")?;
        let mut url = self
            .endpoint
            .url(&["components", component, "versions", version, artifact_type, "gav"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(name) = name {
                query.append_pair("name", name);
            }
            if let Some(classifier) = classifier {
                query.append_pair("classifier", classifier);
            }
        }
        let gav: ArtifactGav = http::send_json(self.get(url)).await?;
        coordinate(&gav)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(api_version: DmsApiVersion, crs: Option<&str>) -> DmsEndpoint {
        DmsEndpoint {
            api_version,
            root: Url::parse("http://dms.local/dms-service").unwrap(),
            crs_root: crs.map(|c| Url::parse(c).unwrap()),
            user: None,
            password: None,
            token: None,
        }
    }

    #[test]
    fn test_versioned_urls() {
        let v3 = endpoint(DmsApiVersion::V3, None);
        assert_eq!(
            v3.url(&["components", "comp", "versions"]).unwrap().as_str(),
            "http://dms.local/dms-service/rest/api/3/components/comp/versions"
        );
        let v2 = endpoint(DmsApiVersion::V2, None);
        assert_eq!(
            v2.url(&["components", "comp", "versions", "1.0", "artifacts"]).unwrap().as_str(),
            "http://dms.local/dms-service/rest/api/2/components/comp/versions/1.0/artifacts"
        );
    }

    #[test]
    fn test_v2_components_need_crs() {
        let v2 = endpoint(DmsApiVersion::V2, None);
        assert!(matches!(v2.components_url(), Err(ClientError::Unsupported(_))));

        let v2 = endpoint(DmsApiVersion::V2, Some("http://crs.local"));
        assert_eq!(
            v2.components_url().unwrap().as_str(),
            "http://crs.local/rest/api/1/components"
        );
    }

    #[test]
    fn test_version_entries() {
        let entries: Vec<VersionEntry> =
            serde_json::from_str(r#"["1.0", {"version": "2.0"}]"#).unwrap();
        let versions: Vec<String> = entries.into_iter().map(String::from).collect();
        assert_eq!(versions, ["1.0", "2.0"]);
    }

    #[test]
    fn test_coordinate() {
        let mut gav = ArtifactGav {
            group_id: Some("org.dms".into()),
            artifact_id: Some("app".into()),
            version: Some("1.0".into()),
            packaging: Some("zip".into()),
            classifier: None,
        };
        assert_eq!(coordinate(&gav).unwrap(), "org.dms:app:1.0:zip");

        gav.classifier = Some("linux".into());
        assert_eq!(coordinate(&gav).unwrap(), "org.dms:app:1.0:zip:linux");

        gav.packaging = None;
        assert_eq!(coordinate(&gav).unwrap(), "org.dms:app:1.0:jar:linux");

        gav.group_id = None;
        assert!(matches!(coordinate(&gav), Err(ClientError::MissingField(_))));
    }

    #[tokio::test]
    async fn test_operations_gated_by_api_version() {
        let v2 = HttpDmsClient::new(endpoint(DmsApiVersion::V2, None)).unwrap();
        let mut sink = Vec::new();
        assert!(matches!(
            v2.get_artifact_info("c", "1", "7").await,
            Err(ClientError::Unsupported(_))
        ));
        assert!(matches!(
            v2.download_component("c", "1", "7", &mut sink).await,
            Err(ClientError::Unsupported(_))
        ));

        let v3 = HttpDmsClient::new(endpoint(DmsApiVersion::V3, None)).unwrap();
        assert!(matches!(
            v3.get_gav("c", "1", "distribution", None, None).await,
            Err(ClientError::Unsupported(_))
        ));
    }
}

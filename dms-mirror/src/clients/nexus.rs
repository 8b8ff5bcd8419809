//! Maven repository client (Maven2 layout over HTTP)

use async_trait::async_trait;
use dms_mirror_common::{ClientError, Gav};
use reqwest::{RequestBuilder, StatusCode, Url};
use tokio_util::io::ReaderStream;

use super::http::{self, Credentials};
use super::{ArtifactRepository, ByteSink};

pub struct NexusClient {
    root: Url,
    credentials: Option<Credentials>,
    http: reqwest::Client,
}

impl NexusClient {
    pub fn new(root: Url, credentials: Option<Credentials>) -> Result<Self, ClientError> {
        Ok(Self {
            root,
            credentials,
            http: http::pooled_client()?,
        })
    }

    fn parse(gav: &str) -> Result<Gav, ClientError> {
        Gav::parse(gav).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// `{root}/repository/{repo}/{path}`
    fn file_url(&self, repo: &str, path: &str) -> Result<Url, ClientError> {
        let base = http::endpoint(&self.root, &["repository", repo])?;
        http::join_path(&base, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        http::with_basic_auth(request, self.credentials.as_ref())
    }
}

#[async_trait]
impl ArtifactRepository for NexusClient {
    async fn exists(&self, gav: &str, repo: &str) -> Result<bool, ClientError> {
        let url = self.file_url(repo, &Self::parse(gav)?.artifact_path())?;
        let response = self
            .authorized(self.http.head(url))
            .send()
            .await
            .map_err(http::transport_error)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("HEAD {} in {}", gav, repo),
            }),
        }
    }

    async fn cat(&self, gav: &str, repo: &str, sink: &mut ByteSink<'_>) -> Result<u64, ClientError> {
        let url = self.file_url(repo, &Self::parse(gav)?.artifact_path())?;
        let response = http::send(self.authorized(self.http.get(url))).await?;
        let size = http::stream_into(response, sink).await?;
        tracing::debug!(gav = %gav, repo = %repo, bytes = size, "Fetched from repository");
        Ok(size)
    }

    async fn upload(&self, gav: &str, repo: &str, data: tokio::fs::File, pom: bool) -> Result<(), ClientError> {
        let coordinate = Self::parse(gav)?;

        let url = self.file_url(repo, &coordinate.artifact_path())?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(data));
        http::send(self.authorized(self.http.put(url)).body(body)).await?;

        if pom {
            let url = self.file_url(repo, &coordinate.pom_path())?;
            http::send(
                self.authorized(self.http.put(url))
                    .header(reqwest::header::CONTENT_TYPE, "application/xml")
                    .body(coordinate.pom_xml()),
            )
            .await?;
        }

        tracing::info!(gav = %gav, repo = %repo, "Uploaded to repository");
        Ok(())
    }
}

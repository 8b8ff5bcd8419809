//! Remote collaborators of the mirror
//!
//! Each collaborator is an async trait so the mirroring pipeline can run
//! against the HTTP implementations in production and against in-memory
//! fakes in tests. A worker owns one `Clients` bundle for its whole life.

use async_trait::async_trait;
use dms_mirror_common::models::{Artifact, ArtifactInfo, CiTypeDms, DmsComponent, NewComponentRecord};
use dms_mirror_common::ClientError;
use std::sync::Arc;
use tokio::io::AsyncWrite;

use crate::settings::{DmsApiVersion, MirrorArgs};

pub mod dms;
pub mod http;
pub mod nexus;
pub mod pg;
pub mod queue;

pub use queue::FileLocation;

/// Writable byte sink used by downloads
pub type ByteSink<'a> = dyn AsyncWrite + Unpin + Send + 'a;

/// How artifact bytes are obtained from DMS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// DMS streams the artifact itself
    DirectDownload,
    /// DMS names a source coordinate inside an intermediate repository
    ViaRepository,
}

impl DmsApiVersion {
    /// Whether a detailed per-artifact lookup exists
    pub fn supports_artifact_info(self) -> bool {
        matches!(self, DmsApiVersion::V3)
    }

    pub fn transfer_strategy(self) -> TransferStrategy {
        match self {
            DmsApiVersion::V2 => TransferStrategy::ViaRepository,
            DmsApiVersion::V3 => TransferStrategy::DirectDownload,
        }
    }
}

/// Document-management service
#[async_trait]
pub trait DmsClient: Send + Sync {
    fn api_version(&self) -> DmsApiVersion;

    async fn get_components(&self) -> Result<Vec<DmsComponent>, ClientError>;

    /// Versions of a component, in DMS order
    async fn get_versions(&self, component: &str) -> Result<Vec<String>, ClientError>;

    /// Artifacts of one version, in DMS order
    async fn get_artifacts(&self, component: &str, version: &str) -> Result<Vec<Artifact>, ClientError>;

    /// Detailed lookup; only offered when `api_version().supports_artifact_info()`
    async fn get_artifact_info(
        &self,
        component: &str,
        version: &str,
        artifact_id: &str,
    ) -> Result<ArtifactInfo, ClientError>;

    /// Stream artifact bytes into `sink`; `TransferStrategy::DirectDownload` only
    async fn download_component(
        &self,
        component: &str,
        version: &str,
        artifact_id: &str,
        sink: &mut ByteSink<'_>,
    ) -> Result<u64, ClientError>;

    /// Source coordinate of an artifact; `TransferStrategy::ViaRepository` only
    async fn get_gav(
        &self,
        component: &str,
        version: &str,
        artifact_type: &str,
        name: Option<&str>,
        classifier: Option<&str>,
    ) -> Result<String, ClientError>;
}

/// Maven-style binary repository
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    async fn exists(&self, gav: &str, repo: &str) -> Result<bool, ClientError>;

    async fn cat(&self, gav: &str, repo: &str, sink: &mut ByteSink<'_>) -> Result<u64, ClientError>;

    /// Upload `data` (read from its current position) and, if `pom`, a descriptor
    async fn upload(&self, gav: &str, repo: &str, data: tokio::fs::File, pom: bool) -> Result<(), ClientError>;
}

/// Relational metadata store
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// `None` when the component is not registered
    async fn get_citypedms_by_dms_id(&self, component: &str) -> Result<Option<CiTypeDms>, ClientError>;

    async fn post_new_component(&self, record: &NewComponentRecord) -> Result<(), ClientError>;
}

/// Downstream indexing queue
#[async_trait]
pub trait RegistrationQueue: Send + Sync {
    async fn register_file(&self, location: &FileLocation, ci_type: &str, depth: u32) -> Result<(), ClientError>;
}

/// Client bundle owned by one worker
#[derive(Clone)]
pub struct Clients {
    pub dms: Arc<dyn DmsClient>,
    pub repository: Arc<dyn ArtifactRepository>,
    pub store: Arc<dyn MetadataStore>,
    pub queue: Arc<dyn RegistrationQueue>,
}

/// Builds a fresh `Clients` bundle for each worker
pub trait ClientFactory: Send + Sync {
    fn connect(&self) -> Result<Clients, ClientError>;
}

/// Factory for the HTTP implementations
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    args: MirrorArgs,
}

impl HttpClientFactory {
    pub fn new(args: MirrorArgs) -> Self {
        Self { args }
    }
}

impl ClientFactory for HttpClientFactory {
    fn connect(&self) -> Result<Clients, ClientError> {
        let args = &self.args;

        let dms = dms::HttpDmsClient::new(dms::DmsEndpoint {
            api_version: args.dms_api_version,
            root: http::required_url("DMS URL", args.dms_url.as_deref())?,
            crs_root: args.dms_crs_url.as_deref().map(http::parse_url).transpose()?,
            user: args.dms_user.clone(),
            password: args.dms_password.clone(),
            token: args.dms_token.clone(),
        })?;

        let repository = nexus::NexusClient::new(
            http::required_url("MVN URL", args.mvn_url.as_deref())?,
            http::Credentials::from_parts(args.mvn_user.clone(), args.mvn_password.clone()),
        )?;

        let store = pg::PgApiClient::new(
            http::required_url("PG URL", args.pg_url.as_deref())?,
            http::Credentials::from_parts(args.pg_user.clone(), args.pg_password.clone()),
        );

        let queue = queue::QueueClient::new(
            http::required_url("AMQP URL", args.amqp_url.as_deref())?,
            http::Credentials::from_parts(args.amqp_username.clone(), args.amqp_password.clone()),
            args.queue.clone(),
            args.priority,
        );

        Ok(Clients {
            dms: Arc::new(dms),
            repository: Arc::new(repository),
            store: Arc::new(store),
            queue: Arc::new(queue),
        })
    }
}

//! In-memory collaborators for integration tests
//!
//! One `FakeBackend` plays DMS, the Maven repository, the relational store
//! and the registration queue. Every call is appended to a shared journal
//! so tests can assert on what happened and in which order.

#![allow(dead_code)]

pub mod log_capture;

use async_trait::async_trait;
use dms_mirror::clients::{
    ArtifactRepository, ByteSink, ClientFactory, Clients, DmsClient, FileLocation, MetadataStore,
    RegistrationQueue,
};
use dms_mirror::mirror::SharedConfig;
use dms_mirror::settings::{DmsApiVersion, MirrorSettings};
use dms_mirror_common::config::{ComponentsConfig, GenericComponentTemplate};
use dms_mirror_common::models::{
    Artifact, ArtifactInfo, CiTypeDms, DmsComponent, NewComponentRecord,
};
use dms_mirror_common::{ClientError, RetryPolicy};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// One recorded collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetComponents,
    GetVersions(String),
    GetArtifacts(String, String),
    GetArtifactInfo(String),
    Download(String),
    GetGav(String),
    Exists(String),
    Cat(String),
    Upload { gav: String, repo: String, bytes: Vec<u8>, pom: bool },
    Register { coordinate: String, ci_type: String, depth: u32 },
    GetCiTypeDms(String),
    PostComponent(NewComponentRecord),
}

/// State of the fake world
#[derive(Default)]
pub struct World {
    pub components: Vec<DmsComponent>,
    pub versions: HashMap<String, Vec<String>>,
    /// Keyed by (component, version)
    pub artifacts: HashMap<(String, String), Vec<Artifact>>,
    /// Keyed by artifact id
    pub infos: HashMap<String, ArtifactInfo>,
    /// Keyed by artifact id
    pub downloads: HashMap<String, Vec<u8>>,
    /// Keyed by artifact type
    pub source_gavs: HashMap<String, String>,
    /// Files present in the repository, keyed by GAV
    pub repository: HashMap<String, Vec<u8>>,
    pub citypes: HashMap<String, CiTypeDms>,
    /// Components whose version listing fails
    pub failing_components: HashSet<String>,
    /// Upcoming artifact listings that fail with a connection error
    pub artifact_listing_outages: u32,
    pub calls: Vec<Call>,
}

#[derive(Clone)]
pub struct FakeBackend {
    pub api_version: DmsApiVersion,
    pub world: Arc<Mutex<World>>,
}

impl FakeBackend {
    pub fn new(api_version: DmsApiVersion) -> Self {
        Self {
            api_version,
            world: Arc::new(Mutex::new(World::default())),
        }
    }

    pub fn with(&self, setup: impl FnOnce(&mut World)) -> &Self {
        setup(&mut self.world.lock().unwrap());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.world.lock().unwrap().calls.clone()
    }

    pub fn uploads(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .collect()
    }

    pub fn registrations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Register { .. }))
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn clients(&self) -> Clients {
        let backend = Arc::new(self.clone());
        Clients {
            dms: backend.clone(),
            repository: backend.clone(),
            store: backend.clone(),
            queue: backend,
        }
    }

    fn record(&self, call: Call) {
        self.world.lock().unwrap().calls.push(call);
    }
}

impl ClientFactory for FakeBackend {
    fn connect(&self) -> Result<Clients, ClientError> {
        Ok(self.clients())
    }
}

#[async_trait]
impl DmsClient for FakeBackend {
    fn api_version(&self) -> DmsApiVersion {
        self.api_version
    }

    async fn get_components(&self) -> Result<Vec<DmsComponent>, ClientError> {
        self.record(Call::GetComponents);
        Ok(self.world.lock().unwrap().components.clone())
    }

    async fn get_versions(&self, component: &str) -> Result<Vec<String>, ClientError> {
        self.record(Call::GetVersions(component.to_string()));
        let world = self.world.lock().unwrap();
        if world.failing_components.contains(component) {
            return Err(ClientError::NotFound(format!("versions of {}", component)));
        }
        Ok(world.versions.get(component).cloned().unwrap_or_default())
    }

    async fn get_artifacts(&self, component: &str, version: &str) -> Result<Vec<Artifact>, ClientError> {
        self.record(Call::GetArtifacts(component.to_string(), version.to_string()));
        let mut world = self.world.lock().unwrap();
        if world.artifact_listing_outages > 0 {
            world.artifact_listing_outages -= 1;
            return Err(ClientError::Connection("connection reset by peer".into()));
        }
        Ok(world
            .artifacts
            .get(&(component.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_artifact_info(
        &self,
        _component: &str,
        _version: &str,
        artifact_id: &str,
    ) -> Result<ArtifactInfo, ClientError> {
        self.record(Call::GetArtifactInfo(artifact_id.to_string()));
        self.world
            .lock()
            .unwrap()
            .infos
            .get(artifact_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("artifact {}", artifact_id)))
    }

    async fn download_component(
        &self,
        _component: &str,
        _version: &str,
        artifact_id: &str,
        sink: &mut ByteSink<'_>,
    ) -> Result<u64, ClientError> {
        self.record(Call::Download(artifact_id.to_string()));
        let bytes = self
            .world
            .lock()
            .unwrap()
            .downloads
            .get(artifact_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("download {}", artifact_id)))?;
        sink.write_all(&bytes).await?;
        sink.flush().await?;
        Ok(bytes.len() as u64)
    }

    async fn get_gav(
        &self,
        _component: &str,
        _version: &str,
        artifact_type: &str,
        _name: Option<&str>,
        _classifier: Option<&str>,
    ) -> Result<String, ClientError> {
        self.record(Call::GetGav(artifact_type.to_string()));
        self.world
            .lock()
            .unwrap()
            .source_gavs
            .get(artifact_type)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("gav of {}", artifact_type)))
    }
}

#[async_trait]
impl ArtifactRepository for FakeBackend {
    async fn exists(&self, gav: &str, _repo: &str) -> Result<bool, ClientError> {
        self.record(Call::Exists(gav.to_string()));
        Ok(self.world.lock().unwrap().repository.contains_key(gav))
    }

    async fn cat(&self, gav: &str, _repo: &str, sink: &mut ByteSink<'_>) -> Result<u64, ClientError> {
        self.record(Call::Cat(gav.to_string()));
        let bytes = self
            .world
            .lock()
            .unwrap()
            .repository
            .get(gav)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(gav.to_string()))?;
        sink.write_all(&bytes).await?;
        sink.flush().await?;
        Ok(bytes.len() as u64)
    }

    async fn upload(&self, gav: &str, repo: &str, mut data: tokio::fs::File, pom: bool) -> Result<(), ClientError> {
        let mut bytes = Vec::new();
        data.read_to_end(&mut bytes).await?;

        let mut world = self.world.lock().unwrap();
        world.repository.insert(gav.to_string(), bytes.clone());
        world.calls.push(Call::Upload {
            gav: gav.to_string(),
            repo: repo.to_string(),
            bytes,
            pom,
        });
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for FakeBackend {
    async fn get_citypedms_by_dms_id(&self, component: &str) -> Result<Option<CiTypeDms>, ClientError> {
        self.record(Call::GetCiTypeDms(component.to_string()));
        Ok(self.world.lock().unwrap().citypes.get(component).cloned())
    }

    async fn post_new_component(&self, record: &NewComponentRecord) -> Result<(), ClientError> {
        let mut world = self.world.lock().unwrap();
        world.citypes.insert(
            record.dms_id.clone(),
            CiTypeDms {
                dms_id: Some(record.dms_id.clone()),
                ci_type_id: None,
            },
        );
        world.calls.push(Call::PostComponent(record.clone()));
        Ok(())
    }
}

#[async_trait]
impl RegistrationQueue for FakeBackend {
    async fn register_file(&self, location: &FileLocation, ci_type: &str, depth: u32) -> Result<(), ClientError> {
        self.record(Call::Register {
            coordinate: location.coordinate.clone(),
            ci_type: ci_type.to_string(),
            depth,
        });
        Ok(())
    }
}

/// Settings with instant retries
pub fn test_settings() -> MirrorSettings {
    MirrorSettings {
        retry: RetryPolicy::new(3, Duration::ZERO),
        ..MirrorSettings::default()
    }
}

pub fn shared_config(settings: MirrorSettings, components: Value, generic: Option<Value>) -> SharedConfig {
    let components: ComponentsConfig = serde_json::from_value(components).unwrap();
    let generic: Option<GenericComponentTemplate> = generic.map(|g| serde_json::from_value(g).unwrap());
    SharedConfig::new(settings, components, generic)
}

/// Artifact as reported by the newer DMS API
pub fn v3_artifact(artifact_type: &str, id: &str, file_name: &str) -> Artifact {
    Artifact {
        id: Some(id.to_string()),
        file_name: Some(file_name.to_string()),
        ..Artifact::new(artifact_type)
    }
}

/// Artifact as reported by the older DMS API
pub fn v2_artifact(artifact_type: &str, name: &str, packaging: &str, classifier: Option<&str>) -> Artifact {
    Artifact {
        name: Some(name.to_string()),
        packaging: Some(packaging.to_string()),
        classifier: classifier.map(str::to_string),
        ..Artifact::new(artifact_type)
    }
}

/// Position of the first call matching `predicate`
pub fn position(calls: &[Call], predicate: impl Fn(&Call) -> bool) -> Option<usize> {
    calls.iter().position(predicate)
}

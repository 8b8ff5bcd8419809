//! Mirroring pipeline
//!
//! A [`Mirror`] is one worker's context: the shared read-only configuration
//! plus the worker's own client bundle. Components, versions and artifacts
//! are processed sequentially inside one worker, in DMS order.

use dms_mirror_common::config::{ComponentConfig, ComponentsConfig, GenericComponentTemplate};
use dms_mirror_common::events::{DmsEvent, DmsEventKind};
use dms_mirror_common::models::Artifact;
use dms_mirror_common::{call_with_retries, sanitize_gav};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clients::{ClientFactory, Clients, FileLocation};
use crate::error::{MirrorError, MirrorResult};
use crate::settings::MirrorSettings;

pub mod driver;
pub mod provisioning;
pub mod resolver;
pub mod template;
pub mod transfer;

pub use driver::{ComponentOutcome, Driver, RunReport};
pub use provisioning::Provisioning;
pub use resolver::SubstitutionMap;
pub use template::GavTemplate;

/// Message-level depth of registration requests
const REGISTRATION_DEPTH: u32 = 0;

/// Read-only configuration shared by every worker
#[derive(Debug, Clone)]
pub struct SharedConfig {
    pub settings: Arc<MirrorSettings>,
    pub components: Arc<ComponentsConfig>,
    pub generic: Option<Arc<GenericComponentTemplate>>,
}

impl SharedConfig {
    pub fn new(
        settings: MirrorSettings,
        components: ComponentsConfig,
        generic: Option<GenericComponentTemplate>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            components: Arc::new(components),
            generic: generic.map(Arc::new),
        }
    }
}

/// Why an artifact was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DockerLayer,
    UnregisteredComponent,
    NoTemplate,
    /// Neither the detailed lookup nor the file name resolved the artifact
    LookupMiss,
}

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactAction {
    Skipped(SkipReason),
    /// Target exists, nothing done
    AlreadyMirrored { gav: String },
    /// Target exists, registration sent again
    Reregistered { gav: String },
    /// Bytes copied, then registered
    Mirrored { gav: String },
}

/// One worker's processing context
pub struct Mirror {
    shared: SharedConfig,
    clients: Clients,
    synthesized: Mutex<HashMap<String, Option<ComponentConfig>>>,
}

impl Mirror {
    pub fn new(shared: SharedConfig, clients: Clients) -> Self {
        Self {
            shared,
            clients,
            synthesized: Mutex::new(HashMap::new()),
        }
    }

    /// Build a context with a fresh client bundle
    pub fn connect(shared: SharedConfig, factory: &dyn ClientFactory) -> MirrorResult<Self> {
        let clients = factory.connect()?;
        Ok(Self::new(shared, clients))
    }

    pub fn settings(&self) -> &MirrorSettings {
        &self.shared.settings
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Mirror every version of a statically configured component
    pub async fn process_component(&self, component: &str) -> MirrorResult<()> {
        if let Some(config) = self.shared.components.get(component) {
            if !config.enabled {
                info!("Skipping [{}]: disabled in the configuration", component);
                return Ok(());
            }
            if config.has_deprecated_keys() {
                warn!("'componentId' and 'artifactType' parameters are deprecated and may be safely removed");
            }
        }

        info!("Processing component [{}]", component);
        let retry = &self.settings().retry;
        let dms = self.clients.dms.as_ref();
        let versions = call_with_retries(retry, "get_versions", || dms.get_versions(component)).await?;
        info!("[{}]: versions to process: [{}]", component, versions.len());

        for version in &versions {
            self.process_version(version, component).await?;
        }
        Ok(())
    }

    pub async fn process_version(&self, version: &str, component: &str) -> MirrorResult<()> {
        let retry = &self.settings().retry;
        let dms = self.clients.dms.as_ref();
        let artifacts =
            call_with_retries(retry, "get_artifacts", || dms.get_artifacts(component, version)).await?;
        info!("[{}:{}]: artifacts to process: [{}]", component, version, artifacts.len());

        for artifact in &artifacts {
            self.process_artifact(artifact, component, version).await?;
        }
        Ok(())
    }

    /// Decide whether one artifact is copied, re-registered or left alone
    pub async fn process_artifact(
        &self,
        artifact: &Artifact,
        component: &str,
        version: &str,
    ) -> MirrorResult<ArtifactAction> {
        if artifact.is_docker_layer() {
            info!("Skipping [{}:{}]: incompatible repositoryType", component, artifact.artifact_type);
            return Ok(ArtifactAction::Skipped(SkipReason::DockerLayer));
        }

        let artifact_type = artifact.artifact_type.as_str();
        info!(
            "Processing component:artifact_type:version = [{}:{}:{}]",
            component, artifact_type, version
        );

        let Some(config) = self.component_config(component).await? else {
            warn!("Component [{}] has not yet registered, skipping", component);
            return Ok(ArtifactAction::Skipped(SkipReason::UnregisteredComponent));
        };

        let Some(template) = config.gav_template(artifact_type) else {
            warn!(
                "Component [{}] has no GAV settings for artifact_type [{}], skipping",
                component, artifact_type
            );
            return Ok(ArtifactAction::Skipped(SkipReason::NoTemplate));
        };
        debug!("GAV template for [{}:{}:{}]: [{}]", component, artifact_type, version, template);

        let settings = self.settings();
        let template = GavTemplate::parse(&template)?;
        let Some(substitution) = resolver::resolve(
            self.clients.dms.as_ref(),
            &settings.retry,
            &settings.mvn_prefix,
            component,
            version,
            artifact,
        )
        .await?
        else {
            warn!("Skipping [{}:{}:{}]: artifact lookup miss", component, artifact_type, version);
            return Ok(ArtifactAction::Skipped(SkipReason::LookupMiss));
        };
        let gav = sanitize_gav(&template.render(|name| substitution.get(name))?);
        info!("Target GAV: [{}:{}:{}] ==> [{}]", component, artifact_type, version, gav);

        // only needed once something is registered
        let ci_type = || -> MirrorResult<String> {
            let ci_type = settings
                .static_ci_type(artifact_type)
                .or(config.ci_type.as_deref())
                .ok_or_else(|| MirrorError::MissingField(format!("ciType of component [{}]", component)))?;
            debug!("ci_type: [{}:{}:{}] ==> [{}]", component, artifact_type, version, ci_type);
            Ok(ci_type.to_string())
        };

        if self
            .clients
            .repository
            .exists(&gav, &settings.mvn_download_repo)
            .await?
        {
            info!("Already exists, skipping copying: [{}]", gav);
            if !settings.always_enqueue {
                return Ok(ArtifactAction::AlreadyMirrored { gav });
            }
            info!("Always enqueue set, registering [{}]", gav);
            self.register(&gav, &ci_type()?).await?;
            return Ok(ArtifactAction::Reregistered { gav });
        }

        let ci_type = ci_type()?;
        info!("Copying: [{}:{}:{}] ==> [{}]", component, artifact_type, version, gav);
        transfer::copy_artifact(&self.clients, settings, component, version, artifact, &gav).await?;
        info!("Registering: [{}] with ci_type [{}]", gav, ci_type);
        self.register(&gav, &ci_type).await?;

        Ok(ArtifactAction::Mirrored { gav })
    }

    async fn register(&self, gav: &str, ci_type: &str) -> MirrorResult<()> {
        self.clients
            .queue
            .register_file(&FileLocation::repository(gav), ci_type, REGISTRATION_DEPTH)
            .await?;
        Ok(())
    }

    /// Static configuration, else a configuration synthesized from the
    /// relational store and the generic template. Synthesis runs once per
    /// component for the life of this context.
    pub async fn component_config(&self, component: &str) -> MirrorResult<Option<ComponentConfig>> {
        if let Some(config) = self.shared.components.get(component) {
            return Ok(Some(config.clone()));
        }

        let mut cache = self.synthesized.lock().await;
        if let Some(cached) = cache.get(component) {
            return Ok(cached.clone());
        }

        let config = self.synthesize_config(component).await?;
        cache.insert(component.to_string(), config.clone());
        Ok(config)
    }

    async fn synthesize_config(&self, component: &str) -> MirrorResult<Option<ComponentConfig>> {
        let retry = &self.settings().retry;
        let store = self.clients.store.as_ref();

        let Some(record) =
            call_with_retries(retry, "get_citypedms_by_dms_id", || store.get_citypedms_by_dms_id(component)).await?
        else {
            warn!("Component [{}] not registered in config nor in database, skipping", component);
            return Ok(None);
        };

        let (Some(dms_id), Some(ci_type_id)) = (
            record.dms_id.filter(|v| !v.is_empty()),
            record.ci_type_id.filter(|v| !v.is_empty()),
        ) else {
            error!("Invalid relational-store record for component [{}]", component);
            return Ok(None);
        };

        let Some(generic) = self.shared.generic.as_ref() else {
            debug!("No generic GAV template configured, cannot synthesize [{}]", component);
            return Ok(None);
        };

        debug!("Component [{}] not registered in config, creating temporary one", dms_id);
        let dms = self.clients.dms.as_ref();
        let components = call_with_retries(retry, "get_components", || dms.get_components()).await?;
        let client_code = components
            .into_iter()
            .find(|c| c.id == dms_id)
            .and_then(|c| c.client_code);

        Ok(Some(generic.build(&ci_type_id, client_code.as_deref())))
    }

    /// Handle one webhook event
    pub async fn process_webhook(&self, event: &DmsEvent) -> MirrorResult<()> {
        let (component_version, artifacts) = match event {
            DmsEvent::PublishComponentVersion {
                component_version,
                artifacts,
            } => (component_version, artifacts),
            DmsEvent::RevokeComponentVersion(cv)
            | DmsEvent::RegisterComponentVersionArtifact(cv)
            | DmsEvent::DeleteComponentVersionArtifact(cv) => {
                let message = format!(
                    "Skipping [{}] since event type [{}] is not [{}]",
                    cv.component,
                    event.kind(),
                    DmsEventKind::PublishComponentVersion
                );
                error!("{}", message);
                return Err(MirrorError::Validation(message));
            }
        };

        let settings = self.settings();
        provisioning::ensure_registered(
            self.clients.store.as_ref(),
            &settings.retry,
            settings.auto_register && self.shared.generic.is_some(),
            component_version,
        )
        .await?;

        for artifact in artifacts {
            self.process_artifact(artifact, &component_version.component, &component_version.version)
                .await?;
        }
        Ok(())
    }
}

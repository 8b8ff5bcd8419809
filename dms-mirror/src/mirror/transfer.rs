//! Artifact transfer
//!
//! Bytes are buffered in an anonymous temporary file, then rewound and
//! uploaded together with a POM. Every download attempt starts from an
//! empty buffer.

use dms_mirror_common::models::Artifact;
use dms_mirror_common::{call_with_retries, ClientError};
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;
use tracing::{debug, info};

use crate::clients::{Clients, TransferStrategy};
use crate::error::{MirrorError, MirrorResult};
use crate::settings::MirrorSettings;

fn fresh_buffer() -> Result<File, ClientError> {
    Ok(File::from_std(tempfile::tempfile()?))
}

/// Copy one artifact into the upload repository at `target_gav`
pub async fn copy_artifact(
    clients: &Clients,
    settings: &MirrorSettings,
    component: &str,
    version: &str,
    artifact: &Artifact,
    target_gav: &str,
) -> MirrorResult<u64> {
    let dms = clients.dms.as_ref();
    let artifact_type = artifact.artifact_type.as_str();

    let (mut buffer, size) = match dms.api_version().transfer_strategy() {
        TransferStrategy::DirectDownload => {
            let id = artifact
                .id
                .as_deref()
                .ok_or_else(|| MirrorError::MissingField(format!("artifact id of [{}]", artifact_type)))?;
            info!("Downloading component: [{}:{}:{}]", component, version, artifact_type);

            call_with_retries(&settings.retry, "download_component", || async move {
                let mut buffer = fresh_buffer()?;
                let size = dms.download_component(component, version, id, &mut buffer).await?;
                Ok::<_, ClientError>((buffer, size))
            })
            .await?
        }
        TransferStrategy::ViaRepository => {
            debug!("Getting GAV from DMS: [{}:{}:{}]", component, version, artifact_type);
            let name = artifact.name.as_deref();
            let classifier = artifact.classifier.as_deref();
            let source_gav = call_with_retries(&settings.retry, "get_gav", || {
                dms.get_gav(component, version, artifact_type, name, classifier)
            })
            .await?;

            info!("Downloading source GAV: [{}]", source_gav);
            let mut buffer = fresh_buffer()?;
            let size = clients
                .repository
                .cat(&source_gav, &settings.mvn_download_repo, &mut buffer)
                .await?;
            (buffer, size)
        }
    };

    buffer.seek(SeekFrom::Start(0)).await?;
    info!(
        "Putting to [{}]: [{}:{}:{}] ==> [{}] ({} bytes)",
        settings.mvn_upload_repo, component, version, artifact_type, target_gav, size
    );
    clients
        .repository
        .upload(target_gav, &settings.mvn_upload_repo, buffer, true)
        .await?;
    debug!("Uploaded: [{}:{}:{}] ==> [{}]", component, version, artifact_type, target_gav);

    Ok(size)
}

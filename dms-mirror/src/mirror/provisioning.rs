//! Auto-provisioning of components first seen through a webhook

use dms_mirror_common::events::ComponentVersionRef;
use dms_mirror_common::{call_with_retries, RetryPolicy};
use tracing::{debug, info};

use crate::clients::MetadataStore;
use crate::error::MirrorResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioning {
    /// Auto-registration is off or there is no generic template
    Disabled,
    AlreadyRegistered,
    Registered,
}

/// Register the component of `component_version` in the relational store
/// unless it is already there.
pub async fn ensure_registered(
    store: &dyn MetadataStore,
    retry: &RetryPolicy,
    enabled: bool,
    component_version: &ComponentVersionRef,
) -> MirrorResult<Provisioning> {
    if !enabled {
        return Ok(Provisioning::Disabled);
    }

    let component = component_version.component.as_str();
    let existing = call_with_retries(retry, "get_citypedms_by_dms_id", || {
        store.get_citypedms_by_dms_id(component)
    })
    .await?;

    if existing.is_some() {
        debug!("Component [{}] already registered", component);
        return Ok(Provisioning::AlreadyRegistered);
    }

    let record = component_version.to_new_component_record();
    info!(
        "Registering new component [{}] as [{}], deliverable: {}",
        record.dms_id, record.name, record.is_deliverable
    );
    call_with_retries(retry, "post_new_component", || store.post_new_component(&record)).await?;

    Ok(Provisioning::Registered)
}

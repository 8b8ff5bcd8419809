//! Registration queue client
//!
//! Messages are published through the broker's HTTP management API to the
//! default exchange, routed straight to the destination queue.

use async_trait::async_trait;
use dms_mirror_common::ClientError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::http::{self, Credentials};
use super::RegistrationQueue;

/// Source system tag of coordinates living in the Maven repository
pub const REPOSITORY_SOURCE_TAG: &str = "NXS";

const DEFAULT_VHOST: &str = "/";
const DEFAULT_EXCHANGE: &str = "amq.default";

/// Where a registered file lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLocation {
    pub coordinate: String,
    pub source_system_tag: String,
    pub depth: Option<u32>,
}

impl FileLocation {
    /// Location of a coordinate in the Maven repository
    pub fn repository(coordinate: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.into(),
            source_system_tag: REPOSITORY_SOURCE_TAG.to_string(),
            depth: None,
        }
    }
}

/// Message consumed by the downstream indexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationMessage {
    pub operation: String,
    pub location: FileLocation,
    pub ci_type: String,
    pub depth: u32,
}

impl RegistrationMessage {
    pub fn register_file(location: &FileLocation, ci_type: &str, depth: u32) -> Self {
        Self {
            operation: "register_file".to_string(),
            location: location.clone(),
            ci_type: ci_type.to_string(),
            depth,
        }
    }
}

#[derive(Deserialize)]
struct PublishResponse {
    routed: bool,
}

pub struct QueueClient {
    root: Url,
    credentials: Option<Credentials>,
    queue: String,
    priority: u8,
}

impl QueueClient {
    pub fn new(root: Url, credentials: Option<Credentials>, queue: String, priority: u8) -> Self {
        Self {
            root,
            credentials,
            queue,
            priority,
        }
    }

    fn publish_url(&self) -> Result<Url, ClientError> {
        http::endpoint(
            &self.root,
            &["api", "exchanges", DEFAULT_VHOST, DEFAULT_EXCHANGE, "publish"],
        )
    }

    fn publish_body(&self, message: &RegistrationMessage) -> Result<serde_json::Value, ClientError> {
        let payload = serde_json::to_string(message).map_err(|e| ClientError::Parse(e.to_string()))?;
        Ok(json!({
            "properties": {
                "priority": self.priority,
                "delivery_mode": 2,
                "content_type": "application/json",
            },
            "routing_key": self.queue,
            "payload": payload,
            "payload_encoding": "string",
        }))
    }
}

#[async_trait]
impl RegistrationQueue for QueueClient {
    async fn register_file(&self, location: &FileLocation, ci_type: &str, depth: u32) -> Result<(), ClientError> {
        let message = RegistrationMessage::register_file(location, ci_type, depth);
        let body = self.publish_body(&message)?;

        let client = http::oneshot_client()?;
        let request = http::with_basic_auth(client.post(self.publish_url()?), self.credentials.as_ref()).json(&body);
        let response: PublishResponse = http::send_json(request).await?;

        if !response.routed {
            return Err(ClientError::Api {
                status: 200,
                message: format!("Message for [{}] not routed to queue [{}]", location.coordinate, self.queue),
            });
        }

        tracing::info!(
            coordinate = %location.coordinate,
            ci_type = %ci_type,
            queue = %self.queue,
            "Registration message published"
        );
        Ok(())
    }
}

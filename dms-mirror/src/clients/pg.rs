//! Relational metadata store client
//!
//! The store is reached through its REST front end. A fresh connection is
//! opened for every call and closed when the call completes.

use async_trait::async_trait;
use dms_mirror_common::models::{CiTypeDms, NewComponentRecord};
use dms_mirror_common::ClientError;
use reqwest::Url;

use super::http::{self, Credentials};
use super::MetadataStore;

pub struct PgApiClient {
    root: Url,
    credentials: Option<Credentials>,
}

impl PgApiClient {
    pub fn new(root: Url, credentials: Option<Credentials>) -> Self {
        Self { root, credentials }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut all = vec!["rest", "api"];
        all.extend_from_slice(segments);
        http::endpoint(&self.root, &all)
    }
}

#[async_trait]
impl MetadataStore for PgApiClient {
    async fn get_citypedms_by_dms_id(&self, component: &str) -> Result<Option<CiTypeDms>, ClientError> {
        let url = self.url(&["citypedms", component])?;
        let client = http::oneshot_client()?;
        let request = http::with_basic_auth(client.get(url), self.credentials.as_ref());

        match http::send_json::<CiTypeDms>(request).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn post_new_component(&self, record: &NewComponentRecord) -> Result<(), ClientError> {
        let url = self.url(&["components"])?;
        let client = http::oneshot_client()?;
        let request = http::with_basic_auth(client.post(url), self.credentials.as_ref()).json(record);

        http::send(request).await?;
        tracing::info!(dms_id = %record.dms_id, "Registered new component in relational store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let client = PgApiClient::new(Url::parse("http://pg.local/").unwrap(), None);
        assert_eq!(
            client.url(&["citypedms", "my comp"]).unwrap().as_str(),
            "http://pg.local/rest/api/citypedms/my%20comp"
        );
    }
}

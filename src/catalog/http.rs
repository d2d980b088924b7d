//! JSON-over-HTTP catalog client
//!
//! Single attempt per call, no retries. A 404 is reported as
//! [`CatalogError::NotFound`]; every other failure (transport, non-success
//! status, undecodable body) as [`CatalogError::Unavailable`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{CatalogClient, DatasetVersion, GroupDownload, ObjectGroup, ResourceKind};
use crate::auth::session::{create_http_client, CallMetadata};
use crate::config::CatalogConfig;
use crate::error::CatalogError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectGroupList {
    #[serde(default)]
    object_groups: Vec<ObjectGroup>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceRequest<'a> {
    resource: ResourceKind,
    resource_id: &'a str,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    resources: Vec<ResourceRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    #[serde(default)]
    links: Vec<GroupDownload>,
}

pub struct HttpCatalogClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = create_http_client(
            config.http_connect_timeout_secs,
            config.http_request_timeout_secs,
        )
        .map_err(|e| CatalogError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(config.base_url(), client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T, CatalogError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, what, "Catalog request failed");
            CatalogError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            tracing::error!(status = %status, what, "Catalog returned an error status");
            return Err(CatalogError::Unavailable(format!(
                "{} returned {}",
                what, status
            )));
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(error = %e, what, "Failed to decode catalog response");
            CatalogError::Unavailable(format!("invalid response for {}: {}", what, e))
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn current_version(
        &self,
        dataset_id: &str,
        metadata: &CallMetadata,
    ) -> Result<DatasetVersion, CatalogError> {
        let url = self.url(&format!(
            "/datasets/{}/versions/current",
            urlencoding::encode(dataset_id)
        ));
        let request = self.client.get(url).headers(metadata.headers().clone());
        self.send(request, &format!("dataset {}", dataset_id)).await
    }

    async fn object_groups_of(
        &self,
        dataset_version_id: &str,
        metadata: &CallMetadata,
    ) -> Result<Vec<ObjectGroup>, CatalogError> {
        let url = self.url(&format!(
            "/dataset-versions/{}/object-groups",
            urlencoding::encode(dataset_version_id)
        ));
        let request = self.client.get(url).headers(metadata.headers().clone());
        let list: ObjectGroupList = self
            .send(request, &format!("dataset version {}", dataset_version_id))
            .await?;
        Ok(list.object_groups)
    }

    async fn download_links_for(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        metadata: &CallMetadata,
    ) -> Result<Vec<GroupDownload>, CatalogError> {
        let body = DownloadRequest {
            resources: vec![ResourceRequest {
                resource: kind,
                resource_id,
            }],
        };
        let request = self
            .client
            .post(self.url("/downloads"))
            .headers(metadata.headers().clone())
            .json(&body);
        let response: DownloadResponse = self
            .send(request, &format!("downloads for {:?} {}", kind, resource_id))
            .await?;
        Ok(response.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credential::Credential;
    use crate::auth::session::{attach_to_request, TokenRole};
    use httpmock::prelude::*;

    fn metadata() -> CallMetadata {
        let credential = Credential {
            access_token: "user-token".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: None,
        };
        attach_to_request(&credential, TokenRole::UserApiToken).unwrap()
    }

    fn client(server: &MockServer) -> HttpCatalogClient {
        HttpCatalogClient::with_client(server.base_url(), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_current_version_sends_token_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/datasets/ds-bam/versions/current")
                    .header("x-user-api-token", "user-token");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"id":"v7","datasetId":"ds-bam"}"#);
            })
            .await;

        let version = client(&server)
            .current_version("ds-bam", &metadata())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            version,
            DatasetVersion {
                id: "v7".to_string(),
                dataset_id: "ds-bam".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_object_groups_of() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/dataset-versions/v7/object-groups");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"{"objectGroups":[{"id":"g1","name":"run1","objects":[{"id":"o1","filename":"run1.bam"}]},{"id":"g2","name":"empty"}]}"#,
                    );
            })
            .await;

        let groups = client(&server)
            .object_groups_of("v7", &metadata())
            .await
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].objects[0].filename, "run1.bam");
        assert!(groups[1].objects.is_empty());
    }

    #[tokio::test]
    async fn test_download_links_for_posts_resource_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/downloads")
                    .json_body(serde_json::json!({
                        "resources": [{"resource": "OBJECT_GROUP", "resourceId": "g1"}]
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .body(
                        r#"{"links":[{"objectGroup":{"id":"g1","name":"run1","objects":[{"id":"o1","filename":"run1.bam"},{"id":"o2","filename":"run1.bam.bai"}]},"links":["https://s3/a","https://s3/b"]}]}"#,
                    );
            })
            .await;

        let downloads = client(&server)
            .download_links_for(ResourceKind::ObjectGroup, "g1", &metadata())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].links, vec!["https://s3/a", "https://s3/b"]);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/datasets/missing/versions/current");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/datasets/broken/versions/current");
                then.status(503);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/datasets/garbled/versions/current");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("not json");
            })
            .await;
        let client = client(&server);

        assert!(matches!(
            client.current_version("missing", &metadata()).await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            client.current_version("broken", &metadata()).await,
            Err(CatalogError::Unavailable(_))
        ));
        assert!(matches!(
            client.current_version("garbled", &metadata()).await,
            Err(CatalogError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_unavailable() {
        let client = HttpCatalogClient::with_client("http://127.0.0.1:1", reqwest::Client::new());
        assert!(matches!(
            client.current_version("ds", &metadata()).await,
            Err(CatalogError::Unavailable(_))
        ));
    }
}

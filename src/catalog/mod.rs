//! Catalog service facade
//!
//! The catalog is the system of record for datasets, their immutable
//! versions, object groups, and presigned download links. Everything here is
//! consumed through [`CatalogClient`]; [`http::HttpCatalogClient`] is the
//! production implementation.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::session::CallMetadata;
use crate::error::CatalogError;

pub use http::HttpCatalogClient;

/// Immutable snapshot of a catalog dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetVersion {
    pub id: String,
    pub dataset_id: String,
}

/// A single catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogObject {
    pub id: String,
    pub filename: String,
}

/// Named cluster of related files, e.g. an alignment and its index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
}

/// Presigned links for one object group; `links[i]` belongs to `object_group.objects[i]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDownload {
    pub object_group: ObjectGroup,
    #[serde(default)]
    pub links: Vec<String>,
}

impl GroupDownload {
    /// Objects paired with their download link, in catalog order
    pub fn linked_objects(&self) -> impl Iterator<Item = (&CatalogObject, &str)> {
        if self.links.len() != self.object_group.objects.len() {
            tracing::warn!(
                group_id = %self.object_group.id,
                objects = self.object_group.objects.len(),
                links = self.links.len(),
                "Download link count does not match object count"
            );
        }
        self.object_group
            .objects
            .iter()
            .zip(self.links.iter().map(String::as_str))
    }
}

/// Resource a download request is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    DatasetVersion,
    ObjectGroup,
}

/// Typed access to the remote catalog; every call carries the caller's token
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn current_version(
        &self,
        dataset_id: &str,
        metadata: &CallMetadata,
    ) -> Result<DatasetVersion, CatalogError>;

    async fn object_groups_of(
        &self,
        dataset_version_id: &str,
        metadata: &CallMetadata,
    ) -> Result<Vec<ObjectGroup>, CatalogError>;

    async fn download_links_for(
        &self,
        kind: ResourceKind,
        resource_id: &str,
        metadata: &CallMetadata,
    ) -> Result<Vec<GroupDownload>, CatalogError>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory catalog used by assembler and router tests

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FakeCatalog {
        pub versions: HashMap<String, DatasetVersion>,
        pub groups: HashMap<String, Vec<ObjectGroup>>,
        pub downloads: HashMap<(ResourceKind, String), Vec<GroupDownload>>,
        /// Header values seen on each call, for asserting token propagation
        pub seen_tokens: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn record(&self, metadata: &CallMetadata) {
            let token = metadata
                .headers()
                .values()
                .next()
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            self.seen_tokens.lock().unwrap().push(token);
        }

        pub fn with_version(mut self, dataset_id: &str, version_id: &str) -> Self {
            self.versions.insert(
                dataset_id.to_string(),
                DatasetVersion {
                    id: version_id.to_string(),
                    dataset_id: dataset_id.to_string(),
                },
            );
            self
        }

        pub fn with_groups(mut self, version_id: &str, groups: Vec<ObjectGroup>) -> Self {
            self.groups.insert(version_id.to_string(), groups);
            self
        }

        pub fn with_download(
            mut self,
            kind: ResourceKind,
            resource_id: &str,
            downloads: Vec<GroupDownload>,
        ) -> Self {
            self.downloads
                .insert((kind, resource_id.to_string()), downloads);
            self
        }
    }

    pub fn group(id: &str, name: &str, filenames: &[&str]) -> ObjectGroup {
        ObjectGroup {
            id: id.to_string(),
            name: name.to_string(),
            objects: filenames
                .iter()
                .enumerate()
                .map(|(i, f)| CatalogObject {
                    id: format!("{}-obj-{}", id, i),
                    filename: f.to_string(),
                })
                .collect(),
        }
    }

    /// Download entry whose links are `https://s3.test/<filename>?sig`
    pub fn download(group: ObjectGroup) -> GroupDownload {
        let links = group
            .objects
            .iter()
            .map(|o| format!("https://s3.test/{}?sig", o.filename))
            .collect();
        GroupDownload {
            object_group: group,
            links,
        }
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn current_version(
            &self,
            dataset_id: &str,
            metadata: &CallMetadata,
        ) -> Result<DatasetVersion, CatalogError> {
            self.record(metadata);
            self.versions
                .get(dataset_id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(format!("dataset {}", dataset_id)))
        }

        async fn object_groups_of(
            &self,
            dataset_version_id: &str,
            metadata: &CallMetadata,
        ) -> Result<Vec<ObjectGroup>, CatalogError> {
            self.record(metadata);
            self.groups.get(dataset_version_id).cloned().ok_or_else(|| {
                CatalogError::NotFound(format!("dataset version {}", dataset_version_id))
            })
        }

        async fn download_links_for(
            &self,
            kind: ResourceKind,
            resource_id: &str,
            metadata: &CallMetadata,
        ) -> Result<Vec<GroupDownload>, CatalogError> {
            self.record(metadata);
            self.downloads
                .get(&(kind, resource_id.to_string()))
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(format!("{:?} {}", kind, resource_id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{download, group};
    use super::*;

    #[test]
    fn test_linked_objects_pairs_in_order() {
        let entry = download(group("g1", "run1", &["run1.bam", "run1.bam.bai"]));
        let pairs: Vec<(&str, &str)> = entry
            .linked_objects()
            .map(|(o, l)| (o.filename.as_str(), l))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("run1.bam", "https://s3.test/run1.bam?sig"),
                ("run1.bam.bai", "https://s3.test/run1.bam.bai?sig"),
            ]
        );
    }

    #[test]
    fn test_linked_objects_truncates_on_missing_links() {
        let mut entry = download(group("g1", "run1", &["run1.bam", "run1.bam.bai"]));
        entry.links.truncate(1);
        assert_eq!(entry.linked_objects().count(), 1);
    }

    #[test]
    fn test_resource_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ResourceKind::DatasetVersion).unwrap(),
            "\"DATASET_VERSION\""
        );
        assert_eq!(
            serde_json::to_string(&ResourceKind::ObjectGroup).unwrap(),
            "\"OBJECT_GROUP\""
        );
    }
}

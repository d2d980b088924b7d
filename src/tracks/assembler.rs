//! Builds igv.js records from catalog responses.
//!
//! Every catalog call made here carries the caller's credential, attached
//! under the configured [`TokenRole`].

use std::collections::BTreeMap;
use std::sync::Arc;

use super::model::{Browser, FileDescription, FileGroup, Reference, Track};
use super::{DatasetIds, TrackType};
use crate::auth::credential::Credential;
use crate::auth::session::{attach_to_request, CallMetadata, TokenRole};
use crate::catalog::{CatalogClient, DatasetVersion, GroupDownload, ResourceKind};
use crate::error::{CatalogError, GatewayError};

pub const ALIGNMENT_SUFFIX: &str = ".bam";
pub const ALIGNMENT_INDEX_SUFFIX: &str = ".bam.bai";
pub const SEQUENCE_INDEX_SUFFIX: &str = ".fai";
pub const COMPRESSED_SEQUENCE_INDEX_SUFFIX: &str = ".gzi";

/// Key under which listings collect every group
pub const ALL_GROUPS: &str = "ALL";

const TRACK_COLOR: &str = "rgb(0, 0, 150)";

pub type GroupListing = BTreeMap<String, Vec<FileGroup>>;

/// Alignment track for one object group
///
/// `.bam` supplies name and url, `.bam.bai` the index. Groups with fewer than
/// two objects still yield a (partial) track.
pub fn alignment_track(download: &GroupDownload) -> Track {
    let group = &download.object_group;
    if group.objects.len() < 2 {
        tracing::warn!(
            condition = "InsufficientObjects",
            group_id = %group.id,
            group_name = %group.name,
            objects = group.objects.len(),
            "Not enough objects in object group for bam file"
        );
    }

    let mut track = Track {
        color: Some(TRACK_COLOR.to_string()),
        autoscale: Some(true),
        track_type: Some("alignment".to_string()),
        format: Some("bam".to_string()),
        ..Track::default()
    };

    for (object, link) in download.linked_objects() {
        if object.filename.ends_with(ALIGNMENT_SUFFIX) {
            track.name = Some(object.filename.clone());
            track.url = Some(link.to_string());
        } else if object.filename.ends_with(ALIGNMENT_INDEX_SUFFIX) {
            track.index_url = Some(link.to_string());
        }
    }

    track
}

/// One wig track per object, in link order
pub fn signal_tracks_of(download: &GroupDownload) -> impl Iterator<Item = Track> + '_ {
    download.linked_objects().map(|(object, link)| Track {
        color: Some(TRACK_COLOR.to_string()),
        autoscale: Some(true),
        track_type: Some("wig".to_string()),
        name: Some(object.filename.clone()),
        url: Some(link.to_string()),
        ..Track::default()
    })
}

/// Display name shared by strand files: `sample_fwd` and `sample_rev` both map to `sample`
///
/// `None` when the filename has no `_`-delimited suffix.
pub fn signal_group_name(filename: &str) -> Option<&str> {
    filename.rsplit_once('_').map(|(stem, _)| stem)
}

/// `(sequence_url, index_url)` from the reference dataset's links
///
/// The index is the first `.fai` object and the sequence the first object that
/// is neither `.fai` nor a bgzip `.gzi` index, regardless of listing order.
fn reference_urls(downloads: &[GroupDownload]) -> Result<(String, String), CatalogError> {
    let mut sequence = None;
    let mut index = None;

    for (object, link) in downloads.iter().flat_map(GroupDownload::linked_objects) {
        if object.filename.ends_with(SEQUENCE_INDEX_SUFFIX) {
            index.get_or_insert_with(|| link.to_string());
        } else if object.filename.ends_with(COMPRESSED_SEQUENCE_INDEX_SUFFIX) {
            tracing::debug!(
                filename = %object.filename,
                "Skipping bgzip index in reference dataset"
            );
        } else {
            sequence.get_or_insert_with(|| link.to_string());
        }
    }

    match (sequence, index) {
        (Some(sequence), Some(index)) => Ok((sequence, index)),
        (None, _) => Err(CatalogError::NotFound(
            "reference dataset has no sequence file".to_string(),
        )),
        (_, None) => Err(CatalogError::NotFound(
            "reference dataset has no sequence index".to_string(),
        )),
    }
}

#[derive(Clone)]
pub struct TrackAssembler {
    catalog: Arc<dyn CatalogClient>,
    datasets: DatasetIds,
    token_role: TokenRole,
    reference_name: String,
}

impl TrackAssembler {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        datasets: DatasetIds,
        token_role: TokenRole,
        reference_name: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            datasets,
            token_role,
            reference_name: reference_name.into(),
        }
    }

    fn metadata(&self, credential: &Credential) -> Result<CallMetadata, GatewayError> {
        Ok(attach_to_request(credential, self.token_role)?)
    }

    async fn current_version(
        &self,
        track_type: TrackType,
        metadata: &CallMetadata,
    ) -> Result<DatasetVersion, CatalogError> {
        let dataset_id = self.datasets.dataset_id(track_type);
        let version = self.catalog.current_version(dataset_id, metadata).await?;
        tracing::debug!(
            track_type = %track_type,
            dataset_id = %dataset_id,
            version_id = %version.id,
            "Resolved current dataset version"
        );
        Ok(version)
    }

    async fn current_version_downloads(
        &self,
        track_type: TrackType,
        metadata: &CallMetadata,
    ) -> Result<Vec<GroupDownload>, CatalogError> {
        let version = self.current_version(track_type, metadata).await?;
        self.catalog
            .download_links_for(ResourceKind::DatasetVersion, &version.id, metadata)
            .await
    }

    /// Browser config for the reference genome with its annotation track
    pub async fn default_track_config(
        &self,
        credential: &Credential,
    ) -> Result<Browser, GatewayError> {
        let metadata = self.metadata(credential)?;

        let (reference_downloads, annotation_downloads) = tokio::try_join!(
            self.current_version_downloads(TrackType::ReferenceSequence, &metadata),
            self.current_version_downloads(TrackType::Annotation, &metadata),
        )?;

        let (fasta_url, index_url) = reference_urls(&reference_downloads)?;
        let annotation_url = annotation_downloads
            .iter()
            .flat_map(GroupDownload::linked_objects)
            .map(|(_, link)| link.to_string())
            .next()
            .ok_or_else(|| {
                CatalogError::NotFound("annotation dataset has no files".to_string())
            })?;

        let annotation = Track {
            track_type: Some("annotation".to_string()),
            format: Some("gff3".to_string()),
            name: Some("Annotation".to_string()),
            auto_height: Some(true),
            url: Some(annotation_url),
            ..Track::default()
        };

        Ok(Browser {
            id: self.reference_name.clone(),
            name: self.reference_name.clone(),
            locus: String::new(),
            reference: Reference {
                id: self.reference_name.clone(),
                name: self.reference_name.clone(),
                fasta_url,
                index_url,
                tracks: vec![annotation],
            },
            tracks: Vec::new(),
        })
    }

    /// Alignment tracks for an object group
    pub async fn alignment_tracks(
        &self,
        group_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Track>, GatewayError> {
        let metadata = self.metadata(credential)?;
        let downloads = self
            .catalog
            .download_links_for(ResourceKind::ObjectGroup, group_id, &metadata)
            .await?;

        Ok(downloads.iter().map(alignment_track).collect())
    }

    /// Signal (wig) tracks for an object group
    pub async fn signal_tracks(
        &self,
        group_id: &str,
        credential: &Credential,
    ) -> Result<Vec<Track>, GatewayError> {
        let metadata = self.metadata(credential)?;
        let downloads = self
            .catalog
            .download_links_for(ResourceKind::ObjectGroup, group_id, &metadata)
            .await?;

        Ok(downloads.iter().flat_map(signal_tracks_of).collect())
    }

    /// Non-empty alignment groups, named after their first file
    pub async fn alignment_list(
        &self,
        credential: &Credential,
    ) -> Result<GroupListing, GatewayError> {
        let metadata = self.metadata(credential)?;
        let version = self.current_version(TrackType::Alignment, &metadata).await?;
        let groups = self.catalog.object_groups_of(&version.id, &metadata).await?;

        let mut file_groups = Vec::with_capacity(groups.len());
        for group in groups {
            let Some(first) = group.objects.first() else {
                tracing::info!(
                    group_id = %group.id,
                    group_name = %group.name,
                    "ObjectGroup has no associated objects"
                );
                continue;
            };

            file_groups.push(FileGroup {
                group_id: group.id.clone(),
                group_name: first.filename.clone(),
                objects: Vec::new(),
            });
        }

        Ok(BTreeMap::from([(ALL_GROUPS.to_string(), file_groups)]))
    }

    /// Signal groups, named after the shared stem of their files
    pub async fn signal_list(&self, credential: &Credential) -> Result<GroupListing, GatewayError> {
        let metadata = self.metadata(credential)?;
        let version = self.current_version(TrackType::Signal, &metadata).await?;
        let groups = self.catalog.object_groups_of(&version.id, &metadata).await?;

        let file_groups = groups
            .into_iter()
            .map(|group| {
                let mut file_group = FileGroup {
                    group_id: group.id,
                    group_name: group.name,
                    objects: Vec::with_capacity(group.objects.len()),
                };
                // Last object wins if the stems disagree; unsuffixed names keep the catalog name
                for object in group.objects {
                    if let Some(stem) = signal_group_name(&object.filename) {
                        file_group.group_name = stem.to_string();
                    }
                    file_group.objects.push(FileDescription {
                        id: object.id,
                        name: object.filename,
                    });
                }
                file_group
            })
            .collect();

        Ok(BTreeMap::from([(ALL_GROUPS.to_string(), file_groups)]))
    }
}

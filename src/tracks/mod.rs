//! Catalog → genome browser translation
//!
//! [`TrackType`] names the logical role of a catalog dataset. Each role is
//! backed by exactly one dataset id, resolved through [`DatasetIds`].

pub mod assembler;
pub mod model;

use std::fmt;

pub use assembler::TrackAssembler;
pub use model::{Browser, FileDescription, FileGroup, GuideLine, Reference, Track};

/// Logical role of a catalog dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackType {
    /// Coverage signal (bigWig)
    Signal,
    /// Read alignments (BAM + BAI)
    Alignment,
    /// Reference genome sequence (FASTA + FAI)
    ReferenceSequence,
    /// Genome annotation (GFF3)
    Annotation,
}

impl TrackType {
    pub const ALL: [TrackType; 4] = [
        TrackType::Signal,
        TrackType::Alignment,
        TrackType::ReferenceSequence,
        TrackType::Annotation,
    ];
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackType::Signal => "BigWigs",
            TrackType::Alignment => "BAM",
            TrackType::ReferenceSequence => "FASTA",
            TrackType::Annotation => "GFF",
        };
        f.write_str(name)
    }
}

/// Catalog dataset id for every track type, fixed at startup
#[derive(Debug, Clone, Default)]
pub struct DatasetIds {
    pub signal: String,
    pub alignment: String,
    pub reference_sequence: String,
    pub annotation: String,
}

impl DatasetIds {
    pub fn dataset_id(&self, track_type: TrackType) -> &str {
        match track_type {
            TrackType::Signal => &self.signal,
            TrackType::Alignment => &self.alignment,
            TrackType::ReferenceSequence => &self.reference_sequence,
            TrackType::Annotation => &self.annotation,
        }
    }

    /// Track types with no dataset configured
    pub fn unset(&self) -> Vec<TrackType> {
        TrackType::ALL
            .into_iter()
            .filter(|t| self.dataset_id(*t).is_empty())
            .collect()
    }
}

//! igv.js view model
//!
//! Field names follow the igv.js browser/track configuration objects. Unset
//! optional fields are omitted from the JSON.

use serde::{Deserialize, Serialize};

/// Top-level igv.js browser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Browser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub locus: String,
    pub reference: Reference,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Reference genome: sequence, its index, and tracks bundled with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub name: String,
    #[serde(rename = "fastaURL")]
    pub fasta_url: String,
    #[serde(rename = "indexURL")]
    pub index_url: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// One data layer; which fields matter depends on `type`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "indexURL", skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub track_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    #[serde(rename = "autoHeight", skip_serializing_if = "Option::is_none")]
    pub auto_height: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guidelines: Vec<GuideLine>,
}

/// Horizontal reference line drawn on a wig track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dotted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
}

/// Selectable group in the browser page, backed by one catalog object group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileGroup {
    pub group_id: String,
    pub group_name: String,
    #[serde(default)]
    pub objects: Vec<FileDescription>,
}

/// Reference to one catalog object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescription {
    pub id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_omits_unset_fields() {
        let track = Track {
            name: Some("run1.bam".to_string()),
            url: Some("https://s3/run1.bam".to_string()),
            index_url: Some("https://s3/run1.bam.bai".to_string()),
            track_type: Some("alignment".to_string()),
            format: Some("bam".to_string()),
            ..Track::default()
        };

        assert_eq!(
            serde_json::to_value(&track).unwrap(),
            json!({
                "name": "run1.bam",
                "url": "https://s3/run1.bam",
                "indexURL": "https://s3/run1.bam.bai",
                "type": "alignment",
                "format": "bam"
            })
        );
    }

    #[test]
    fn test_wig_track_with_guidelines() {
        let track = Track {
            track_type: Some("wig".to_string()),
            autoscale: Some(true),
            guidelines: vec![GuideLine {
                color: Some("green".to_string()),
                dotted: Some(true),
                y: Some(0),
            }],
            ..Track::default()
        };

        assert_eq!(
            serde_json::to_value(&track).unwrap(),
            json!({
                "type": "wig",
                "autoscale": true,
                "guidelines": [{"color": "green", "dotted": true, "y": 0}]
            })
        );
    }

    #[test]
    fn test_reference_field_names() {
        let reference = Reference {
            id: "NC_002942".to_string(),
            name: "NC_002942".to_string(),
            fasta_url: "https://s3/ref.fasta".to_string(),
            index_url: "https://s3/ref.fasta.fai".to_string(),
            tracks: vec![],
        };
        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(value["fastaURL"], "https://s3/ref.fasta");
        assert_eq!(value["indexURL"], "https://s3/ref.fasta.fai");
    }
}

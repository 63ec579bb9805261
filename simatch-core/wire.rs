//! Transportable form of a feature set.
//!
//! Callers own storage and transport; this record is the agreed shape for
//! moving feature sets across process or network boundaries. Descriptor
//! bytes travel base64-encoded with the matrix shape alongside.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::{ElementType, FeatureSet, Keypoint};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSetRecord {
    pub keypoints_count: usize,
    pub keypoints: Vec<Keypoint>,
    /// Base64 of the flat descriptor bytes; `None` for an empty set
    pub descriptors: Option<String>,
    pub descriptors_shape: (usize, usize),
    pub element_type: ElementType,
    /// (height, width) of the image the features came from
    pub image_shape: (u32, u32),
}

impl FeatureSetRecord {
    pub fn from_set(set: &FeatureSet) -> Self {
        let (bytes, shape) = codec::encode(set.descriptors());
        Self {
            keypoints_count: set.len(),
            keypoints: set.keypoints().to_vec(),
            descriptors: if bytes.is_empty() { None } else { Some(STANDARD.encode(&bytes)) },
            descriptors_shape: shape,
            element_type: set.descriptors().element_type(),
            image_shape: set.source_shape(),
        }
    }

    /// Validate and rebuild the feature set this record describes.
    pub fn to_feature_set(&self) -> CoreResult<FeatureSet> {
        if self.keypoints.len() != self.keypoints_count {
            return Err(CoreError::KeypointCountMismatch {
                declared: self.keypoints_count,
                actual: self.keypoints.len(),
            });
        }
        let bytes = match &self.descriptors {
            Some(encoded) => STANDARD
                .decode(encoded)
                .map_err(|e| CoreError::InvalidEncoding(e.to_string()))?,
            None => Vec::new(),
        };
        let descriptors = codec::decode(&bytes, self.descriptors_shape, self.element_type)?;
        FeatureSet::new(self.keypoints.clone(), descriptors, self.image_shape)
    }
}

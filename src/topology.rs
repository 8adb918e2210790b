// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Landmark topology definitions and group selection.
//!
//! A [`Topology`] is an ordered list of named landmark groups (body pose, face,
//! hands, ...), each holding an ordered list of named points. Pose arrays store
//! points flattened in that order, so a point's flat index is the sum of the
//! sizes of all preceding groups plus its position inside its own group.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PoseError, Result};
use crate::sequence::PoseSequence;

/// Body pose group of the MediaPipe Holistic layout.
pub const POSE_LANDMARKS: &str = "POSE_LANDMARKS";
/// Face mesh group of the MediaPipe Holistic layout.
pub const FACE_LANDMARKS: &str = "FACE_LANDMARKS";
/// Left hand group of the MediaPipe Holistic layout.
pub const LEFT_HAND_LANDMARKS: &str = "LEFT_HAND_LANDMARKS";
/// Right hand group of the MediaPipe Holistic layout.
pub const RIGHT_HAND_LANDMARKS: &str = "RIGHT_HAND_LANDMARKS";

/// Body pose point names, in MediaPipe order.
pub const BODY_POINTS: [&str; 33] = [
    "NOSE",
    "LEFT_EYE_INNER",
    "LEFT_EYE",
    "LEFT_EYE_OUTER",
    "RIGHT_EYE_INNER",
    "RIGHT_EYE",
    "RIGHT_EYE_OUTER",
    "LEFT_EAR",
    "RIGHT_EAR",
    "MOUTH_LEFT",
    "MOUTH_RIGHT",
    "LEFT_SHOULDER",
    "RIGHT_SHOULDER",
    "LEFT_ELBOW",
    "RIGHT_ELBOW",
    "LEFT_WRIST",
    "RIGHT_WRIST",
    "LEFT_PINKY",
    "RIGHT_PINKY",
    "LEFT_INDEX",
    "RIGHT_INDEX",
    "LEFT_THUMB",
    "RIGHT_THUMB",
    "LEFT_HIP",
    "RIGHT_HIP",
    "LEFT_KNEE",
    "RIGHT_KNEE",
    "LEFT_ANKLE",
    "RIGHT_ANKLE",
    "LEFT_HEEL",
    "RIGHT_HEEL",
    "LEFT_FOOT_INDEX",
    "RIGHT_FOOT_INDEX",
];

/// Hand point names, in MediaPipe order.
pub const HAND_POINTS: [&str; 21] = [
    "WRIST",
    "THUMB_CMC",
    "THUMB_MCP",
    "THUMB_IP",
    "THUMB_TIP",
    "INDEX_FINGER_MCP",
    "INDEX_FINGER_PIP",
    "INDEX_FINGER_DIP",
    "INDEX_FINGER_TIP",
    "MIDDLE_FINGER_MCP",
    "MIDDLE_FINGER_PIP",
    "MIDDLE_FINGER_DIP",
    "MIDDLE_FINGER_TIP",
    "RING_FINGER_MCP",
    "RING_FINGER_PIP",
    "RING_FINGER_DIP",
    "RING_FINGER_TIP",
    "PINKY_MCP",
    "PINKY_PIP",
    "PINKY_DIP",
    "PINKY_TIP",
];

/// Number of face mesh points in the MediaPipe Holistic layout.
pub const FACE_POINT_COUNT: usize = 468;

/// Identity of a single landmark: its group name and point name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LandmarkId {
    /// Group the landmark belongs to (e.g. `POSE_LANDMARKS`).
    pub group: String,
    /// Point name inside the group (e.g. `RIGHT_SHOULDER`).
    pub point: String,
}

impl LandmarkId {
    /// Create a landmark identity from group and point names.
    pub fn new(group: impl Into<String>, point: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            point: point.into(),
        }
    }
}

impl std::fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.group, self.point)
    }
}

/// A named group of ordered landmark points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkGroup {
    /// Group name.
    pub name: String,
    /// Ordered point names.
    pub points: Vec<String>,
}

impl LandmarkGroup {
    /// Create a group from a name and an ordered list of point names.
    pub fn new<S: Into<String>>(name: impl Into<String>, points: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            points: points.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize)]
struct TopologyDescriptor {
    groups: Vec<LandmarkGroup>,
}

/// Ordered set of landmark groups describing how points are laid out in a pose array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    groups: Vec<LandmarkGroup>,
}

impl Topology {
    /// Create a topology from ordered groups.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Config`] if a group is empty, a group name repeats,
    /// or a point name repeats inside a group.
    pub fn new(groups: Vec<LandmarkGroup>) -> Result<Self> {
        let mut names = HashSet::new();
        for group in &groups {
            if group.points.is_empty() {
                return Err(PoseError::Config(format!("group '{}' has no points", group.name)));
            }
            if !names.insert(group.name.as_str()) {
                return Err(PoseError::Config(format!("duplicate group '{}'", group.name)));
            }
            let mut points = HashSet::new();
            for point in &group.points {
                if !points.insert(point.as_str()) {
                    return Err(PoseError::Config(format!(
                        "duplicate point '{point}' in group '{}'",
                        group.name
                    )));
                }
            }
        }
        Ok(Self { groups })
    }

    /// The MediaPipe Holistic layout: body pose, face mesh, left hand, right hand.
    #[must_use]
    pub fn holistic() -> Self {
        let face: Vec<String> = (0..FACE_POINT_COUNT).map(|i| i.to_string()).collect();
        Self {
            groups: vec![
                LandmarkGroup::new(POSE_LANDMARKS, BODY_POINTS),
                LandmarkGroup::new(FACE_LANDMARKS, face),
                LandmarkGroup::new(LEFT_HAND_LANDMARKS, HAND_POINTS),
                LandmarkGroup::new(RIGHT_HAND_LANDMARKS, HAND_POINTS),
            ],
        }
    }

    /// Parse a topology descriptor of the form `{"groups": [{"name": .., "points": [..]}]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the groups are invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: TopologyDescriptor = serde_json::from_str(json)?;
        Self::new(descriptor.groups)
    }

    /// Load a topology descriptor from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Ordered groups.
    #[must_use]
    pub fn groups(&self) -> &[LandmarkGroup] {
        &self.groups
    }

    /// Look up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&LandmarkGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Total number of points across all groups.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.groups.iter().map(|g| g.points.len()).sum()
    }

    /// Flat index of the first point of `group`.
    fn group_offset(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for group in &self.groups {
            if group.name == name {
                return Some(offset);
            }
            offset += group.points.len();
        }
        None
    }

    /// Flat point index of a landmark, or `None` if the topology does not contain it.
    #[must_use]
    pub fn point_index(&self, id: &LandmarkId) -> Option<usize> {
        let offset = self.group_offset(&id.group)?;
        let group = self.group(&id.group)?;
        let local = group.points.iter().position(|p| *p == id.point)?;
        Some(offset + local)
    }

    /// Select a subset of groups, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Topology`] if a requested group is not part of this
    /// topology, and [`PoseError::Config`] if a group is requested twice or the
    /// list is empty.
    pub fn select<S: AsRef<str>>(&self, groups: &[S]) -> Result<Selection> {
        if groups.is_empty() {
            return Err(PoseError::Config("no landmark groups selected".to_string()));
        }

        let mut selected = Vec::with_capacity(groups.len());
        let mut indices = Vec::new();
        for name in groups {
            let name = name.as_ref();
            let (Some(group), Some(offset)) = (self.group(name), self.group_offset(name)) else {
                return Err(PoseError::Topology(format!(
                    "required group '{name}' is absent from the raw topology"
                )));
            };
            if selected.iter().any(|g: &LandmarkGroup| g.name == name) {
                return Err(PoseError::Config(format!("group '{name}' selected twice")));
            }
            indices.extend(offset..offset + group.points.len());
            selected.push(group.clone());
        }

        Ok(Selection {
            source: self.clone(),
            topology: Self { groups: selected },
            indices,
        })
    }
}

/// A group selection over a raw topology.
///
/// Holds the selected topology and, for every selected point, its flat index in
/// the raw topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    source: Topology,
    topology: Topology,
    indices: Vec<usize>,
}

impl Selection {
    /// Topology of the selected output.
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Raw topology this selection reads from.
    #[must_use]
    pub const fn source(&self) -> &Topology {
        &self.source
    }

    /// Raw flat indices of the selected points, in output order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of points in the output.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.indices.len()
    }

    /// Check that a raw array with `points` points covers the raw topology.
    fn check_points(&self, points: usize) -> Result<()> {
        let expected = self.source.num_points();
        if points == expected {
            return Ok(());
        }
        if points < expected {
            let mut end = 0;
            for group in self.source.groups() {
                end += group.points.len();
                if end > points {
                    return Err(PoseError::Topology(format!(
                        "raw example has {points} points, missing landmarks of group '{}' (expected {expected})",
                        group.name
                    )));
                }
            }
        }
        Err(PoseError::Topology(format!(
            "raw example has {points} points, topology describes {expected}"
        )))
    }

    /// Keep only the selected points of raw coordinate and confidence arrays.
    ///
    /// # Arguments
    ///
    /// * `data` - Raw coordinates with shape (frames, points, dims).
    /// * `confidence` - Raw confidence with shape (frames, points).
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Topology`] if the raw point axis does not match the raw topology.
    pub fn apply(
        &self,
        data: ArrayView3<f32>,
        confidence: ArrayView2<f32>,
    ) -> Result<(Array3<f32>, Array2<f32>)> {
        self.check_points(data.shape()[1])?;
        self.check_points(confidence.shape()[1])?;
        Ok((
            data.select(Axis(1), &self.indices),
            confidence.select(Axis(1), &self.indices),
        ))
    }

    /// Apply the selection to a whole sequence.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::Topology`] if the sequence does not match the raw topology.
    pub fn apply_sequence(&self, sequence: &PoseSequence) -> Result<PoseSequence> {
        let (data, confidence) = self.apply(sequence.data().view(), sequence.confidence().view())?;
        PoseSequence::new(data, confidence, sequence.fps())
    }
}

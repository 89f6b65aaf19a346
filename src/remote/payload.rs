use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use crate::core::{Frame, Sequence};

/// Key under which the frame rows travel.
///
/// `sequence` is canonical. The others are names older backends expect and
/// are only emitted when configured; all of them are accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SequenceField {
    #[default]
    Sequence,
    Frames,
    Points,
    Sequences,
}

impl SequenceField {
    pub fn key(&self) -> &'static str {
        match self {
            SequenceField::Sequence => "sequence",
            SequenceField::Frames => "frames",
            SequenceField::Points => "points",
            SequenceField::Sequences => "sequences",
        }
    }
}

/// Labelled training example for the storage endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub label: String,
    #[serde(alias = "frames", alias = "points", alias = "sequences")]
    pub sequence: Vec<Vec<f32>>,
}

impl UploadRequest {
    pub fn new(label: impl Into<String>, sequence: &Sequence) -> Self {
        Self {
            label: label.into(),
            sequence: sequence.to_rows(),
        }
    }

    /// Body as sent on the wire under the given field name.
    pub fn to_json(&self, field: SequenceField) -> Value {
        let mut body = Map::new();
        body.insert("label".to_string(), json!(self.label));
        body.insert(field.key().to_string(), json!(self.sequence));
        Value::Object(body)
    }
}

/// Classification query, either a whole window or a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictRequest {
    Window { sequence: Vec<Vec<f32>> },
    Frame { points: Vec<f32> },
}

impl PredictRequest {
    pub fn window(sequence: &Sequence) -> Self {
        PredictRequest::Window {
            sequence: sequence.to_rows(),
        }
    }

    pub fn frame(frame: &Frame) -> Self {
        PredictRequest::Frame {
            points: frame.values().to_vec(),
        }
    }

    /// Collapse a sequence into the request shape the flow is configured for.
    pub fn from_sequence(sequence: &Sequence, single_frame: bool) -> Self {
        match (single_frame, sequence.frames().last()) {
            (true, Some(latest)) => Self::frame(latest),
            _ => Self::window(sequence),
        }
    }

    pub fn is_single_frame(&self) -> bool {
        matches!(self, PredictRequest::Frame { .. })
    }

    pub fn to_json(&self, field: SequenceField) -> Value {
        match self {
            PredictRequest::Window { sequence } => {
                let mut body = Map::new();
                body.insert(field.key().to_string(), json!(sequence));
                Value::Object(body)
            }
            PredictRequest::Frame { points } => json!({ "points": points }),
        }
    }

    /// Parse a request body using any of the known field names.
    ///
    /// A flat array of numbers is a single frame, an array of arrays a window.
    pub fn from_json(value: &Value) -> Option<Self> {
        let rows = ["sequence", "frames", "points", "sequences"]
            .iter()
            .find_map(|key| value.get(*key))?;

        if let Ok(sequence) = serde_json::from_value::<Vec<Vec<f32>>>(rows.clone()) {
            return Some(PredictRequest::Window { sequence });
        }
        serde_json::from_value::<Vec<f32>>(rows.clone())
            .ok()
            .map(|points| PredictRequest::Frame { points })
    }
}

/// Label plus confidence returned by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    #[serde(deserialize_with = "clamped_confidence")]
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: clamp_confidence(confidence),
        }
    }

    /// Confidence as a whole percentage for display.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn clamped_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let raw = f32::deserialize(deserializer)?;
    Ok(clamp_confidence(raw))
}

/// One stored example as listed by the dataset endpoint.
///
/// Only `label` is interpreted; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

use gesturelab::core::{Frame, Sequence};
use gesturelab::remote::{
    check_backend, BackendStatus, ClassificationResult, DatasetRecord, DatasetSummary,
    MockGestureService, PredictRequest, SequenceField, UploadRequest,
};
use serde_json::json;

fn sequence() -> Sequence {
    Sequence::new(
        vec![
            Frame::new(0, vec![0.5, 0.25, 0.75], 1),
            Frame::placeholder(1, 3),
        ],
        2,
    )
    .unwrap()
}

#[test]
fn test_upload_body_uses_canonical_field() {
    let request = UploadRequest::new("สวัสดี", &sequence());
    let body = request.to_json(SequenceField::Sequence);

    assert_eq!(
        body,
        json!({
            "label": "สวัสดี",
            "sequence": [[0.5, 0.25, 0.75], [0.0, 0.0, 0.0]]
        })
    );
}

#[test]
fn test_upload_body_with_legacy_field() {
    let request = UploadRequest::new("wave", &sequence());
    let body = request.to_json(SequenceField::Frames);

    assert!(body.get("sequence").is_none());
    assert_eq!(body["frames"].as_array().map(|rows| rows.len()), Some(2));
}

#[test]
fn test_upload_parses_any_field_name() {
    for key in ["sequence", "frames", "points", "sequences"] {
        let body = json!({ "label": "wave", key: [[1.0, 2.0, 3.0]] });
        let request: UploadRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.sequence, vec![vec![1.0, 2.0, 3.0]], "field {}", key);
    }
}

#[test]
fn test_predict_request_shapes() {
    let window = PredictRequest::from_sequence(&sequence(), false);
    assert!(!window.is_single_frame());
    assert_eq!(
        window.to_json(SequenceField::Sequence),
        json!({ "sequence": [[0.5, 0.25, 0.75], [0.0, 0.0, 0.0]] })
    );

    // single-frame queries carry the newest frame only
    let frame = PredictRequest::from_sequence(&sequence(), true);
    assert!(frame.is_single_frame());
    assert_eq!(
        frame.to_json(SequenceField::Sequence),
        json!({ "points": [0.0, 0.0, 0.0] })
    );
}

#[test]
fn test_predict_request_from_json() {
    let window = PredictRequest::from_json(&json!({ "frames": [[1.0], [2.0]] })).unwrap();
    assert_eq!(
        window,
        PredictRequest::Window {
            sequence: vec![vec![1.0], vec![2.0]]
        }
    );

    let frame = PredictRequest::from_json(&json!({ "points": [1.0, 2.0, 3.0] })).unwrap();
    assert_eq!(
        frame,
        PredictRequest::Frame {
            points: vec![1.0, 2.0, 3.0]
        }
    );

    assert!(PredictRequest::from_json(&json!({ "label": "x" })).is_none());
    assert!(PredictRequest::from_json(&json!({ "sequence": "nope" })).is_none());
}

#[test]
fn test_confidence_is_clamped() {
    let high: ClassificationResult =
        serde_json::from_value(json!({ "label": "a", "confidence": 1.7 })).unwrap();
    assert_eq!(high.confidence, 1.0);

    let low: ClassificationResult =
        serde_json::from_value(json!({ "label": "a", "confidence": -0.2 })).unwrap();
    assert_eq!(low.confidence, 0.0);

    assert_eq!(ClassificationResult::new("a", 0.876).confidence_percent(), 88);
    assert_eq!(ClassificationResult::new("a", f32::NAN).confidence, 0.0);
}

#[test]
fn test_classification_requires_label() {
    let parsed = serde_json::from_value::<ClassificationResult>(json!({ "confidence": 0.5 }));
    assert!(parsed.is_err());
}

#[test]
fn test_dataset_record_keeps_extra_fields() {
    let record: DatasetRecord =
        serde_json::from_value(json!({ "label": "wave", "id": 7, "frames": 60 })).unwrap();
    assert_eq!(record.label, "wave");
    assert_eq!(record.extra.get("id"), Some(&json!(7)));

    let back = serde_json::to_value(&record).unwrap();
    assert_eq!(back["frames"], json!(60));
}

#[test]
fn test_dataset_summary_counts_labels() {
    let records: Vec<DatasetRecord> = serde_json::from_value(json!([
        { "label": "wave" },
        { "label": "hello" },
        { "label": "wave" }
    ]))
    .unwrap();

    let summary = DatasetSummary::from_records(&records);
    assert_eq!(summary.total(), 3);
    assert_eq!(summary.count("wave"), 2);
    assert_eq!(summary.count("missing"), 0);
    assert_eq!(
        summary.labels().collect::<Vec<_>>(),
        vec![("hello", 1), ("wave", 2)]
    );
}

#[tokio::test]
async fn test_backend_status_follows_health() {
    let mock = MockGestureService::new();
    assert_eq!(check_backend(&mock).await, BackendStatus::Online);

    mock.set_online(false);
    assert_eq!(check_backend(&mock).await, BackendStatus::Offline);
    assert!(DatasetSummary::fetch(&mock).await.is_err());
}

#[tokio::test]
async fn test_dataset_fetch_includes_uploads() {
    use gesturelab::remote::GestureService;

    let mock = MockGestureService::new();
    mock.upload(UploadRequest::new("wave", &sequence())).await.unwrap();
    mock.upload(UploadRequest::new("wave", &sequence())).await.unwrap();

    let summary = DatasetSummary::fetch(&mock).await.unwrap();
    assert_eq!(summary.count("wave"), 2);
}

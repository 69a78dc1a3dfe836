//! 통합 테스트 -- 설정에서 스트림 처리까지 전체 흐름 검증
//!
//! 설정 로딩, 파일 기반 스트림 처리, 수집기 설정 렌더링을 함께 검증합니다.

use std::sync::Arc;

use fieldlift_core::config::FieldliftConfig;
use fieldlift_core::filter::{FilterCode, RecordFilter};
use fieldlift_core::record::{EventTime, LogEvent, Record};
use fieldlift_promoter::fluentbit::{
    DEFAULT_FUNCTION_NAME, render_filter_section, render_kafka_output, render_lua_script,
};
use fieldlift_promoter::{
    FieldPromoter, OnParseError, PromoterError, RecordProcessor, RecordProcessorBuilder,
    TopicRouter,
};
use serde_json::{Value, json};
use tokio::io::BufReader;

const POD: &str = "dy-7d8eeb3d4fb6da81d88da56280de7d42-5744dfc46c-dgsjf";

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("test record must be an object"),
    }
}

/// 기본 설정으로 파일을 처리하고 출력 파일을 검증
#[tokio::test]
async fn test_file_to_file_with_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.jsonl");
    let output_path = dir.path().join("output.jsonl");

    let input = [
        json!({"log": "a", "kubernetes": {"pod_name": POD, "namespace_name": "default"}}),
        json!({"log": "b"}),
        json!({"log": "c", "kubernetes": {"namespace_name": "kube-system"}}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n");
    tokio::fs::write(&input_path, input).await.unwrap();

    let processor = RecordProcessor::from_config(&FieldliftConfig::default()).unwrap();
    let reader = BufReader::new(tokio::fs::File::open(&input_path).await.unwrap());
    let writer = tokio::fs::File::create(&output_path).await.unwrap();
    let stats = processor.run(reader, writer).await.unwrap();

    let output = tokio::fs::read_to_string(&output_path).await.unwrap();
    let values: Vec<Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["topic_name"], json!(POD));
    assert_eq!(values[0]["kubernetes"]["pod_name"], json!(POD));
    assert_eq!(values[1]["topic_name"], json!("default-topic"));
    assert_eq!(values[2]["topic_name"], json!("default-topic"));
    assert_eq!(values[2]["kubernetes"]["namespace_name"], json!("kube-system"));

    assert_eq!(stats.records_emitted, 3);
    assert_eq!(stats.resolved, 1);
    assert_eq!(stats.fallback_total(), 2);
    let topics = stats.topics.unwrap();
    assert_eq!(topics.count(POD), 1);
    assert_eq!(topics.count("default-topic"), 2);
}

/// TOML 설정의 값이 처리 결과에 반영되는지 검증
#[tokio::test]
async fn test_custom_toml_config_drives_processing() {
    let toml = r#"
[promoter]
source = "$kubernetes['namespace_name']"
target_key = "route"
fallback = "unrouted"
empty_values = "keep"

[routing]
topics = ["unrouted", "default"]
topic_key = "route"
dynamic_topic = false
"#;
    let config = FieldliftConfig::parse(toml).unwrap();
    config.validate().unwrap();
    let processor = RecordProcessor::from_config(&config).unwrap();

    let input = concat!(
        r#"{"kubernetes":{"namespace_name":"default"}}"#,
        "\n",
        r#"{"kubernetes":{"namespace_name":"payments"}}"#,
        "\n",
        r#"{"kubernetes":{"namespace_name":""}}"#,
        "\n",
    );
    let mut out = Vec::new();
    let stats = processor.run(input.as_bytes(), &mut out).await.unwrap();
    let output = String::from_utf8(out).unwrap();
    let values: Vec<Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(values[0]["route"], json!("default"));
    assert_eq!(values[1]["route"], json!("payments"));
    // keep 정책: 빈 문자열도 그대로 복사
    assert_eq!(values[2]["route"], json!(""));

    // 정적 토픽 목록: payments와 빈 값은 기본 토픽으로
    let topics = stats.topics.unwrap();
    assert_eq!(topics.count("default"), 1);
    assert_eq!(topics.count("unrouted"), 2);
    assert_eq!(topics.defaulted(), 2);
}

/// fail 정책에서 라인 번호와 함께 중단
#[tokio::test]
async fn test_fail_policy_reports_line_number() {
    let mut config = FieldliftConfig::default();
    config.processor.on_parse_error = "fail".to_owned();
    let processor = RecordProcessor::from_config(&config).unwrap();
    assert_eq!(processor.on_parse_error(), OnParseError::Fail);

    let input = "{\"a\":1}\n{\"a\":2}\n\"just a string\"\n";
    let mut out = Vec::new();
    let err = processor.run(input.as_bytes(), &mut out).await.unwrap_err();
    assert!(matches!(err, PromoterError::Decode { line: 3, .. }));
    assert!(err.is_input_error());
}

/// 긴 라인은 건너뛰고 통계에 반영
#[tokio::test]
async fn test_too_long_line_is_skipped() {
    let mut config = FieldliftConfig::default();
    config.processor.max_line_length = 64;
    let processor = RecordProcessor::from_config(&config).unwrap();

    let long = format!("{{\"log\":\"{}\"}}", "x".repeat(100));
    let input = format!("{{\"log\":\"short\"}}\n{long}\n");
    let mut out = Vec::new();
    let stats = processor.run(input.as_bytes(), &mut out).await.unwrap();
    assert_eq!(stats.parse_errors, 1);
    assert_eq!(stats.records_emitted, 1);
}

/// 필터 hook 규약: 항상 코드 1과 원래 타임스탬프를 반환
#[test]
fn test_filter_hook_contract() {
    let promoter = FieldPromoter::from_config(&FieldliftConfig::default().promoter).unwrap();
    let ts = EventTime::new(1_700_000_000, 123_000_000);

    for rec in [
        json!({"kubernetes": {"pod_name": POD}}),
        json!({}),
        json!({"kubernetes": {}}),
    ] {
        let output = promoter.filter("kube.app", ts, record(rec));
        assert_eq!(output.code, FilterCode::Modified);
        assert_eq!(output.code.code(), 1);
        assert_eq!(output.timestamp, ts);
        assert!(output.record.contains_key("topic_name"));
    }
}

/// 여러 스레드에서 같은 필터를 동시에 사용
#[test]
fn test_concurrent_promotion_through_trait_object() {
    let filter: Arc<dyn RecordFilter> =
        Arc::new(FieldPromoter::from_config(&FieldliftConfig::default().promoter).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let filter = Arc::clone(&filter);
            std::thread::spawn(move || {
                let rec = record(json!({"kubernetes": {"pod_name": format!("pod-{i}")}}));
                let event = LogEvent::new("kube.app", EventTime::new(i, 0), rec);
                filter.apply(event).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let event = handle.join().unwrap();
        assert_eq!(event.record["topic_name"], json!(format!("pod-{i}")));
    }
}

/// 렌더링된 수집기 설정이 현재 설정과 일치
#[test]
fn test_rendered_collector_config_matches_rule() {
    let config = FieldliftConfig::default();
    let promoter = FieldPromoter::from_config(&config.promoter).unwrap();
    let router = TopicRouter::from_config(&config.routing).unwrap();

    let script = render_lua_script(&promoter, DEFAULT_FUNCTION_NAME).unwrap();
    assert!(script.contains("record[\"topic_name\"] = value"));
    assert!(script.contains("\"default-topic\""));

    let filter = render_filter_section(&config.processor.tag, "/scripts/p.lua", DEFAULT_FUNCTION_NAME);
    assert!(filter.contains("kube.*"));

    let output = render_kafka_output(&config.processor.tag, "kafka:9092", &router);
    assert!(output.contains("Topic_Key     topic_name"));
    assert!(output.contains("Dynamic_topic On"));
}

/// 빌더로 만든 처리기는 라우터 없이 동작
#[tokio::test]
async fn test_builder_without_router() {
    let promoter = FieldPromoter::from_config(&FieldliftConfig::default().promoter).unwrap();
    let processor = RecordProcessorBuilder::new(promoter).tag("app.logs").build();
    let mut out = Vec::new();
    let stats = processor
        .run("{\"kubernetes\":{\"pod_name\":\"p\"}}\n".as_bytes(), &mut out)
        .await
        .unwrap();
    assert!(stats.topics.is_none());
    assert_eq!(stats.resolved, 1);
}

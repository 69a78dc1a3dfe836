//! 토픽 라우팅
//!
//! Kafka 출력이 레코드마다 어떤 토픽을 선택할지 계산합니다.
//! 출력 플러그인의 `Topics`, `Topic_Key`, `Dynamic_topic` 옵션과 같은 규칙을 따릅니다.
//!
//! - `Topic_Key` 필드 값이 유효하면 그 값이 토픽이 됩니다.
//! - 필드가 없거나 비어 있으면 `Topics`의 첫 번째 토픽(기본 토픽)을 사용합니다.
//! - `Dynamic_topic`이 꺼져 있으면 `Topics` 목록에 있는 값만 허용합니다.
//!
//! 브로커에 연결하지 않으며 레코드를 변경하지도 않습니다.

use std::collections::BTreeMap;
use std::fmt;

use fieldlift_core::config::RoutingSection;
use fieldlift_core::metrics as m;
use fieldlift_core::record::Record;
use metrics::counter;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::PromoterError;

/// Kafka 토픽명 최대 길이
pub const MAX_TOPIC_LENGTH: usize = 249;

/// 라우팅 결정 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// 레코드 필드 값을 그대로 사용
    Field,
    /// 레코드 필드 값을 치환하여 사용
    Sanitized,
    /// 기본 토픽 사용
    Default,
}

impl RouteSource {
    /// 메트릭 레이블 등에 사용하는 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Sanitized => "sanitized",
            Self::Default => "default",
        }
    }
}

/// 라우팅 결정
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    /// 대상 토픽
    pub topic: String,
    /// 결정 출처
    pub source: RouteSource,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.topic, self.source.as_str())
    }
}

/// 토픽 라우터
#[derive(Debug, Clone)]
pub struct TopicRouter {
    /// 토픽 목록 (첫 번째가 기본 토픽)
    topics: Vec<String>,
    /// 토픽을 읽을 최상위 필드명
    topic_key: String,
    /// 목록에 없는 토픽 허용 여부
    dynamic_topic: bool,
    /// 허용되지 않는 문자 치환 여부
    sanitize: bool,
    /// 허용되지 않는 문자 패턴
    invalid_chars: Regex,
}

impl TopicRouter {
    /// 새 토픽 라우터를 생성합니다.
    ///
    /// 토픽 목록은 비어 있으면 안 되며, 각 토픽명은 Kafka 규칙을 만족해야 합니다.
    pub fn new(topics: Vec<String>, topic_key: impl Into<String>) -> Result<Self, PromoterError> {
        let invalid_chars = Regex::new(r"[^A-Za-z0-9._-]").map_err(|e| PromoterError::Config {
            field: "routing".to_owned(),
            reason: e.to_string(),
        })?;

        if topics.is_empty() {
            return Err(PromoterError::Config {
                field: "routing.topics".to_owned(),
                reason: "at least one topic is required".to_owned(),
            });
        }
        for topic in &topics {
            if !is_valid_topic(&invalid_chars, topic) {
                return Err(PromoterError::Config {
                    field: "routing.topics".to_owned(),
                    reason: format!(
                        "'{topic}' is not a valid topic name ([A-Za-z0-9._-], 1-{MAX_TOPIC_LENGTH} chars)"
                    ),
                });
            }
        }

        let topic_key = topic_key.into();
        if topic_key.is_empty() {
            return Err(PromoterError::Config {
                field: "routing.topic_key".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        Ok(Self {
            topics,
            topic_key,
            dynamic_topic: true,
            sanitize: true,
            invalid_chars,
        })
    }

    /// core 설정 섹션에서 라우터를 생성합니다.
    pub fn from_config(section: &RoutingSection) -> Result<Self, PromoterError> {
        Ok(Self::new(section.topics.clone(), section.topic_key.clone())?
            .with_dynamic_topic(section.dynamic_topic)
            .with_sanitize(section.sanitize))
    }

    /// 목록에 없는 토픽 허용 여부를 설정합니다.
    pub fn with_dynamic_topic(mut self, enabled: bool) -> Self {
        self.dynamic_topic = enabled;
        self
    }

    /// 허용되지 않는 문자 치환 여부를 설정합니다.
    pub fn with_sanitize(mut self, enabled: bool) -> Self {
        self.sanitize = enabled;
        self
    }

    /// 기본 토픽
    pub fn default_topic(&self) -> &str {
        // new()에서 비어 있지 않음을 보장
        &self.topics[0]
    }

    /// 토픽 목록
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// 토픽을 읽을 필드명
    pub fn topic_key(&self) -> &str {
        &self.topic_key
    }

    /// 동적 토픽 허용 여부
    pub fn dynamic_topic(&self) -> bool {
        self.dynamic_topic
    }

    /// 레코드의 대상 토픽을 결정합니다.
    pub fn route(&self, record: &Record) -> Route {
        let route = self.select(record);
        trace!(topic = %route.topic, source = route.source.as_str(), "record routed");
        counter!(m::ROUTER_RECORDS_ROUTED_TOTAL, m::LABEL_ROUTE_SOURCE => route.source.as_str())
            .increment(1);
        route
    }

    fn select(&self, record: &Record) -> Route {
        let candidate = match record.get(&self.topic_key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return self.default_route(),
        };

        let (topic, source) = if is_valid_topic(&self.invalid_chars, &candidate) {
            (candidate, RouteSource::Field)
        } else if self.sanitize {
            match self.sanitize_topic(&candidate) {
                Some(sanitized) => (sanitized, RouteSource::Sanitized),
                None => return self.default_route(),
            }
        } else {
            return self.default_route();
        };

        if !self.dynamic_topic && !self.topics.iter().any(|t| *t == topic) {
            return self.default_route();
        }

        Route { topic, source }
    }

    /// 허용되지 않는 문자를 `_`로 치환하고 최대 길이로 자릅니다.
    ///
    /// 결과가 `.` 또는 `..`이면 `None`입니다.
    pub fn sanitize_topic(&self, name: &str) -> Option<String> {
        let mut sanitized = self.invalid_chars.replace_all(name, "_").into_owned();
        // 치환 후에는 ASCII만 남으므로 바이트 단위로 잘라도 안전
        sanitized.truncate(MAX_TOPIC_LENGTH);
        if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
            return None;
        }
        Some(sanitized)
    }

    fn default_route(&self) -> Route {
        Route {
            topic: self.default_topic().to_owned(),
            source: RouteSource::Default,
        }
    }
}

fn is_valid_topic(invalid_chars: &Regex, name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TOPIC_LENGTH
        && name != "."
        && name != ".."
        && !invalid_chars.is_match(name)
}

/// 토픽별 레코드 수 집계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    /// 토픽별 레코드 수 (토픽명 순 정렬)
    counts: BTreeMap<String, u64>,
    /// 기본 토픽으로 떨어진 레코드 수
    defaulted: u64,
    /// 치환된 토픽명으로 라우팅된 레코드 수
    sanitized: u64,
}

impl TopicSummary {
    /// 빈 집계를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 라우팅 결정 하나를 집계에 반영합니다.
    pub fn record(&mut self, route: &Route) {
        *self.counts.entry(route.topic.clone()).or_insert(0) += 1;
        match route.source {
            RouteSource::Default => self.defaulted += 1,
            RouteSource::Sanitized => self.sanitized += 1,
            RouteSource::Field => {}
        }
    }

    /// 전체 레코드 수
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// 특정 토픽의 레코드 수
    pub fn count(&self, topic: &str) -> u64 {
        self.counts.get(topic).copied().unwrap_or(0)
    }

    /// 서로 다른 토픽 수
    pub fn topic_count(&self) -> usize {
        self.counts.len()
    }

    /// 기본 토픽으로 떨어진 레코드 수
    pub fn defaulted(&self) -> u64 {
        self.defaulted
    }

    /// 치환된 토픽명으로 라우팅된 레코드 수
    pub fn sanitized(&self) -> u64 {
        self.sanitized
    }

    /// 토픽명 순으로 `(토픽, 레코드 수)`를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

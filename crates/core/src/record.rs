//! 레코드 모델: 수집기가 넘겨주는 로그 이벤트의 기본 단위
//!
//! 로그 수집기의 스크립트 hook은 `(tag, timestamp, record)` 세 값을 전달합니다.
//! 이 모듈은 그 세 값을 [`LogEvent`]로 묶고, 타임스탬프를 [`EventTime`]으로,
//! 레코드를 JSON 맵([`Record`])으로 표현합니다.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// 로그 레코드
///
/// 문자열 키에서 JSON 값으로의 맵입니다. 값은 문자열, 숫자, 불리언, null,
/// 배열 또는 임의 깊이의 중첩 객체일 수 있습니다.
pub type Record = serde_json::Map<String, serde_json::Value>;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// 이벤트 시각 (Unix epoch 기준 초 + 나노초)
///
/// 수집기가 사용하는 해상도와 동일합니다. JSON으로는 `f64` 초 단위로 직렬화됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventTime {
    secs: i64,
    nanos: u32,
}

impl EventTime {
    /// 초와 나노초로 이벤트 시각을 생성합니다.
    ///
    /// `nanos`가 1초 이상이면 초 단위로 올림 처리합니다.
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self {
            secs: secs.saturating_add(i64::from(nanos / NANOS_PER_SEC)),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// 현재 시각을 반환합니다.
    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    /// `f64` 초 단위 값에서 이벤트 시각을 생성합니다.
    ///
    /// NaN이나 무한대는 거부합니다.
    pub fn from_f64(value: f64) -> Result<Self, ParseError> {
        if !value.is_finite() {
            return Err(ParseError::InvalidTimestamp(value.to_string()));
        }
        let secs = value.floor();
        let nanos = ((value - secs) * f64::from(NANOS_PER_SEC)).round() as u32;
        Ok(Self::new(secs as i64, nanos))
    }

    /// RFC 3339 문자열에서 이벤트 시각을 파싱합니다.
    pub fn parse_rfc3339(value: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(value)
            .map_err(|e| ParseError::InvalidTimestamp(format!("{value}: {e}")))?;
        Ok(Self::new(dt.timestamp(), dt.timestamp_subsec_nanos()))
    }

    /// 초 부분
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// 나노초 부분 (0..1_000_000_000)
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// `f64` 초 단위 값으로 변환합니다.
    pub fn as_f64(&self) -> f64 {
        self.secs as f64 + f64::from(self.nanos) / f64::from(NANOS_PER_SEC)
    }

    /// RFC 3339 문자열로 변환합니다. 표현할 수 없는 범위면 `None`입니다.
    pub fn to_rfc3339(&self) -> Option<String> {
        DateTime::<Utc>::from_timestamp(self.secs, self.nanos)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl From<SystemTime> for EventTime {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            // epoch 이전 시각
            Err(e) => {
                let d = e.duration();
                if d.subsec_nanos() == 0 {
                    Self::new(-(d.as_secs() as i64), 0)
                } else {
                    Self::new(
                        -(d.as_secs() as i64) - 1,
                        NANOS_PER_SEC - d.subsec_nanos(),
                    )
                }
            }
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}.{:09}", self.secs, self.nanos),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).map_err(serde::de::Error::custom)
    }
}

/// 로그 이벤트: 스크립트 hook에 전달되는 `(tag, timestamp, record)` 묶음
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// 라우팅 태그 (예: `kube.var.log.containers.app.log`)
    pub tag: String,
    /// 이벤트 시각
    pub timestamp: EventTime,
    /// 레코드 본문
    pub record: Record,
}

impl LogEvent {
    /// 새 로그 이벤트를 생성합니다.
    pub fn new(tag: impl Into<String>, timestamp: EventTime, record: Record) -> Self {
        Self {
            tag: tag.into(),
            timestamp,
            record,
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} fields)",
            self.timestamp,
            self.tag,
            self.record.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_nanos_overflow() {
        let t = EventTime::new(10, 1_500_000_000);
        assert_eq!(t.secs(), 11);
        assert_eq!(t.nanos(), 500_000_000);
    }

    #[test]
    fn from_f64_splits_fraction() {
        let t = EventTime::from_f64(1_705_320_000.25).unwrap();
        assert_eq!(t.secs(), 1_705_320_000);
        assert_eq!(t.nanos(), 250_000_000);
    }

    #[test]
    fn from_f64_rejects_nan_and_infinity() {
        assert!(EventTime::from_f64(f64::NAN).is_err());
        assert!(EventTime::from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn as_f64_matches_input_seconds() {
        let t = EventTime::new(1_705_320_000, 500_000_000);
        assert!((t.as_f64() - 1_705_320_000.5).abs() < 1e-6);
    }

    #[test]
    fn parse_rfc3339_with_offset() {
        let t = EventTime::parse_rfc3339("2024-01-15T12:00:00+09:00").unwrap();
        assert_eq!(t.secs(), 1_705_287_600);
        assert_eq!(t.nanos(), 0);
    }

    #[test]
    fn parse_rfc3339_rejects_garbage() {
        let err = EventTime::parse_rfc3339("yesterday").unwrap_err();
        assert!(matches!(err, ParseError::InvalidTimestamp(_)));
    }

    #[test]
    fn display_is_rfc3339_utc() {
        let t = EventTime::new(1_705_320_000, 0);
        assert_eq!(t.to_string(), "2024-01-15T12:00:00Z");
    }

    #[test]
    fn from_system_time_before_epoch() {
        let before = UNIX_EPOCH - std::time::Duration::from_millis(1500);
        let t = EventTime::from(before);
        assert_eq!(t.secs(), -2);
        assert_eq!(t.nanos(), 500_000_000);
    }

    #[test]
    fn serializes_as_float_seconds() {
        let t = EventTime::new(2, 500_000_000);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "2.5");
        let back: EventTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn log_event_display_contains_tag() {
        let mut record = Record::new();
        record.insert("log".to_owned(), serde_json::json!("hello"));
        let event = LogEvent::new("kube.app", EventTime::new(0, 0), record);
        let s = event.to_string();
        assert!(s.contains("kube.app"));
        assert!(s.contains("1 fields"));
    }
}

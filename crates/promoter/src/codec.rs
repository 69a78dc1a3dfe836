//! JSON 라인 코덱
//!
//! 한 줄에 하나의 레코드를 담은 JSON 라인 스트림을 [`LogEvent`]로 해석하고,
//! 처리된 이벤트를 원래 형식 그대로 다시 직렬화합니다.
//!
//! # 지원 형식
//! - 객체: `{"log": "...", "kubernetes": {...}}`
//! - 이벤트: `[1700000000.5, {"log": "..."}]`
//! - 메타데이터 포함 이벤트: `[[1700000000.5, {"k": "v"}], {"log": "..."}]`
//!
//! 객체 형식은 `time_key` 필드에서 타임스탬프를 읽고, 필드가 없거나
//! 해석할 수 없으면 현재 시각을 사용합니다. 타임스탬프 필드는 레코드에 남습니다.

use std::fmt;
use std::str::FromStr;

use fieldlift_core::config::ProcessorSection;
use fieldlift_core::record::{EventTime, LogEvent, Record};
use serde_json::Value;
use tracing::debug;

use crate::error::PromoterError;

/// 입력 레코드 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordFormat {
    /// 라인마다 첫 글자로 판별
    #[default]
    Auto,
    /// JSON 객체
    Object,
    /// `[timestamp, record]` 배열
    Event,
}

impl RecordFormat {
    /// 설정 파일 표기
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Object => "object",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordFormat {
    type Err = PromoterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "object" => Ok(Self::Object),
            "event" => Ok(Self::Event),
            other => Err(PromoterError::Config {
                field: "processor.format".to_owned(),
                reason: format!("unknown format '{other}', expected auto, object or event"),
            }),
        }
    }
}

/// 디코딩된 라인의 외형
///
/// 인코딩 시 같은 외형으로 되돌리기 위해 보관합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum Framing {
    /// JSON 객체
    Object,
    /// `[timestamp, record]`
    Event,
    /// `[[timestamp, metadata], record]`
    EventWithMetadata(Value),
}

/// 디코딩된 라인
#[derive(Debug, Clone)]
pub struct DecodedLine {
    /// 이벤트
    pub event: LogEvent,
    /// 원래 외형
    pub framing: Framing,
}

/// JSON 라인 코덱
#[derive(Debug, Clone)]
pub struct LineCodec {
    format: RecordFormat,
    time_key: String,
    max_line_length: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self {
            format: RecordFormat::Auto,
            time_key: "date".to_owned(),
            max_line_length: 1024 * 1024,
        }
    }
}

impl LineCodec {
    /// 지정한 형식으로 새 코덱을 생성합니다.
    pub fn new(format: RecordFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// core 설정 섹션에서 코덱을 생성합니다.
    pub fn from_config(section: &ProcessorSection) -> Result<Self, PromoterError> {
        Ok(Self {
            format: section.format.parse()?,
            time_key: section.time_key.clone(),
            max_line_length: section.max_line_length,
        })
    }

    /// 타임스탬프 필드명을 설정합니다. 빈 문자열이면 사용하지 않습니다.
    pub fn with_time_key(mut self, key: impl Into<String>) -> Self {
        self.time_key = key.into();
        self
    }

    /// 한 줄 최대 길이를 설정합니다.
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// 한 줄 최대 길이 (바이트)
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// 설정된 입력 형식
    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// 한 줄을 이벤트로 디코딩합니다.
    ///
    /// 반환하는 에러의 라인 번호는 0이며, 호출자가 [`PromoterError::at_line`]으로 채웁니다.
    pub fn decode(&self, line: &str, tag: &str) -> Result<DecodedLine, PromoterError> {
        if line.len() > self.max_line_length {
            return Err(PromoterError::LineTooLong {
                line: 0,
                len: line.len(),
                max: self.max_line_length,
            });
        }

        let trimmed = line.trim();
        let format = match self.format {
            RecordFormat::Auto => match trimmed.as_bytes().first() {
                Some(b'{') => RecordFormat::Object,
                Some(b'[') => RecordFormat::Event,
                _ => return Err(decode_error("expected a JSON object or event array")),
            },
            explicit => explicit,
        };

        let value: Value = serde_json::from_str(trimmed).map_err(|e| decode_error(e.to_string()))?;

        match format {
            RecordFormat::Event => Self::decode_event(value, tag),
            _ => self.decode_object(value, tag),
        }
    }

    fn decode_object(&self, value: Value, tag: &str) -> Result<DecodedLine, PromoterError> {
        let Value::Object(record) = value else {
            return Err(decode_error("expected JSON object at top level"));
        };
        let timestamp = self.timestamp_from_record(&record);
        Ok(DecodedLine {
            event: LogEvent::new(tag, timestamp, record),
            framing: Framing::Object,
        })
    }

    fn decode_event(value: Value, tag: &str) -> Result<DecodedLine, PromoterError> {
        let Value::Array(items) = value else {
            return Err(decode_error("expected [timestamp, record] array"));
        };
        let [header, body]: [Value; 2] = items
            .try_into()
            .map_err(|_| decode_error("event array must have exactly two elements"))?;

        let Value::Object(record) = body else {
            return Err(decode_error("event record must be a JSON object"));
        };

        let (ts, framing) = match header {
            Value::Array(parts) => {
                let [ts, metadata]: [Value; 2] = parts
                    .try_into()
                    .map_err(|_| decode_error("event header must be [timestamp, metadata]"))?;
                (ts, Framing::EventWithMetadata(metadata))
            }
            ts => (ts, Framing::Event),
        };

        let secs = ts
            .as_f64()
            .ok_or_else(|| decode_error("event timestamp must be a number"))?;
        let timestamp = EventTime::from_f64(secs).map_err(|e| decode_error(e.to_string()))?;

        Ok(DecodedLine {
            event: LogEvent::new(tag, timestamp, record),
            framing,
        })
    }

    fn timestamp_from_record(&self, record: &Record) -> EventTime {
        if self.time_key.is_empty() {
            return EventTime::now();
        }
        let parsed = match record.get(&self.time_key) {
            Some(Value::Number(n)) => n.as_f64().map(EventTime::from_f64),
            Some(Value::String(s)) => Some(EventTime::parse_rfc3339(s)),
            _ => None,
        };
        match parsed {
            Some(Ok(ts)) => ts,
            Some(Err(e)) => {
                debug!(time_key = %self.time_key, error = %e, "unparseable timestamp, using current time");
                EventTime::now()
            }
            None => EventTime::now(),
        }
    }

    /// 이벤트를 디코딩할 때의 외형으로 직렬화합니다 (개행 미포함).
    pub fn encode(&self, event: &LogEvent, framing: &Framing) -> Result<String, PromoterError> {
        let line = match framing {
            Framing::Object => serde_json::to_string(&event.record)?,
            Framing::Event => serde_json::to_string(&(&event.timestamp, &event.record))?,
            Framing::EventWithMetadata(metadata) => {
                serde_json::to_string(&((&event.timestamp, metadata), &event.record))?
            }
        };
        Ok(line)
    }
}

fn decode_error(reason: impl Into<String>) -> PromoterError {
    PromoterError::Decode {
        line: 0,
        reason: reason.into(),
    }
}

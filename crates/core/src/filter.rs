//! 필터 hook trait: 레코드 변환 확장 포인트 정의
//!
//! 로그 수집기의 스크립트 필터는 `(tag, timestamp, record)`를 받아
//! `(code, timestamp, record)`를 돌려줍니다. [`RecordFilter`]는 이 호출 규약을
//! 그대로 옮긴 trait이며, [`FilterCode`]는 반환 코드의 의미를 표현합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{EventTime, LogEvent, Record};

/// 필터 반환 코드
///
/// | 코드 | 의미 |
/// |------|------|
/// | -1   | 레코드 폐기 |
/// | 0    | 변경 없음 (반환된 레코드 무시) |
/// | 1    | 레코드와 타임스탬프 모두 반환값으로 교체 |
/// | 2    | 레코드만 교체, 원래 타임스탬프 유지 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCode {
    /// 레코드 폐기
    Drop,
    /// 변경 없음
    Unchanged,
    /// 레코드와 타임스탬프 교체
    Modified,
    /// 레코드만 교체
    ModifiedKeepTimestamp,
}

impl FilterCode {
    /// 수집기 규약의 숫자 코드를 반환합니다.
    pub fn code(self) -> i32 {
        match self {
            Self::Drop => -1,
            Self::Unchanged => 0,
            Self::Modified => 1,
            Self::ModifiedKeepTimestamp => 2,
        }
    }

    /// 숫자 코드에서 변환합니다. 규약에 없는 코드는 `None`입니다.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Drop),
            0 => Some(Self::Unchanged),
            1 => Some(Self::Modified),
            2 => Some(Self::ModifiedKeepTimestamp),
            _ => None,
        }
    }

    /// 레코드가 파이프라인에 남는지 여부
    pub fn keeps_record(self) -> bool {
        !matches!(self, Self::Drop)
    }
}

impl fmt::Display for FilterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drop => "drop",
            Self::Unchanged => "unchanged",
            Self::Modified => "modified",
            Self::ModifiedKeepTimestamp => "modified_keep_timestamp",
        };
        write!(f, "{name}({})", self.code())
    }
}

/// 필터 호출 결과: `(code, timestamp, record)`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    /// 반환 코드
    pub code: FilterCode,
    /// 반환 타임스탬프
    pub timestamp: EventTime,
    /// 반환 레코드
    pub record: Record,
}

impl FilterOutput {
    /// 반환 코드의 의미에 따라 최종 이벤트를 결정합니다.
    ///
    /// `original`은 필터에 전달되기 전의 이벤트입니다.
    /// 폐기 코드면 `None`을 반환합니다.
    pub fn resolve(self, original: LogEvent) -> Option<LogEvent> {
        match self.code {
            FilterCode::Drop => None,
            FilterCode::Unchanged => Some(original),
            FilterCode::Modified => Some(LogEvent {
                tag: original.tag,
                timestamp: self.timestamp,
                record: self.record,
            }),
            FilterCode::ModifiedKeepTimestamp => Some(LogEvent {
                tag: original.tag,
                timestamp: original.timestamp,
                record: self.record,
            }),
        }
    }

    /// 레코드 소유권을 필터에 넘긴 경우의 최종 이벤트를 결정합니다.
    ///
    /// 원본 레코드가 이미 필터로 이동했으므로 변경 없음 코드에서도
    /// 반환 레코드를 사용하고, 타임스탬프만 원본을 유지합니다.
    pub fn into_event(self, tag: impl Into<String>, original_timestamp: EventTime) -> Option<LogEvent> {
        let timestamp = match self.code {
            FilterCode::Drop => return None,
            FilterCode::Modified => self.timestamp,
            FilterCode::Unchanged | FilterCode::ModifiedKeepTimestamp => original_timestamp,
        };
        Some(LogEvent::new(tag, timestamp, self.record))
    }
}

/// 레코드 필터 trait
///
/// 새로운 레코드 변환을 추가하려면 이 trait을 구현합니다.
/// 구현체는 호출 간에 가변 상태를 공유하지 않아야 하며,
/// 여러 스레드에서 동시에 호출될 수 있습니다.
pub trait RecordFilter: Send + Sync {
    /// 필터 이름
    fn name(&self) -> &str;

    /// 레코드 하나를 변환합니다.
    fn filter(&self, tag: &str, timestamp: EventTime, record: Record) -> FilterOutput;

    /// 이벤트에 필터를 적용하고 반환 코드에 따라 최종 이벤트를 결정합니다.
    fn apply(&self, event: LogEvent) -> Option<LogEvent> {
        let output = self.filter(&event.tag, event.timestamp, event.record.clone());
        output.resolve(event)
    }
}

//! 필드 승격 필터
//!
//! 중첩 객체 안의 필드 하나를 레코드 최상위 필드로 복사합니다.
//! 원본 필드를 찾지 못하면 고정된 fallback 값을 기록하므로, 승격 후에는
//! 대상 필드가 항상 존재합니다. Kafka 출력의 `Topic_Key`처럼
//! 최상위 필드만 읽는 구성 요소가 중첩 필드 값을 사용할 수 있게 됩니다.
//!
//! # 보장
//! - 대상 필드 이외의 필드는 읽기만 하며 삭제하거나 변경하지 않습니다.
//! - 같은 설정으로 두 번 적용해도 결과가 같습니다.
//! - 누락된 필드는 에러가 아니라 fallback으로 처리됩니다.
//! - 항상 레코드 유지 코드(`1`)를 반환합니다.
//!
//! # 사용 예시
//! ```ignore
//! use fieldlift_promoter::{FieldPath, FieldPromoter};
//!
//! let promoter = FieldPromoter::new(
//!     "kubernetes.pod_name".parse::<FieldPath>()?,
//!     "topic_name",
//!     "default-topic",
//! )?;
//! let outcome = promoter.promote(&mut record);
//! ```

use std::fmt;
use std::str::FromStr;

use fieldlift_core::config::PromoterSection;
use fieldlift_core::filter::{FilterCode, FilterOutput, RecordFilter};
use fieldlift_core::metrics as m;
use fieldlift_core::record::{EventTime, Record};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::PromoterError;
use crate::path::{FieldPath, Lookup};

/// 빈 값 처리 정책
///
/// `null`은 정책과 무관하게 항상 값이 없는 것으로 취급합니다.
/// 숫자와 불리언은 항상 값이 있는 것으로 취급합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyValuePolicy {
    /// 빈 문자열, 빈 배열, 빈 객체를 값이 없는 것으로 보고 fallback 적용 (기본값)
    #[default]
    Fallback,
    /// 빈 문자열, 빈 배열, 빈 객체도 그대로 복사
    Keep,
}

impl EmptyValuePolicy {
    /// 정책 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Keep => "keep",
        }
    }

    /// 값이 이 정책에서 "비어 있음"으로 취급되는지 여부
    pub fn is_empty(self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => self == Self::Fallback && s.is_empty(),
            Value::Array(a) => self == Self::Fallback && a.is_empty(),
            Value::Object(o) => self == Self::Fallback && o.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }
}

impl FromStr for EmptyValuePolicy {
    type Err = PromoterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fallback" => Ok(Self::Fallback),
            "keep" => Ok(Self::Keep),
            other => Err(PromoterError::Config {
                field: "promoter.empty_values".to_owned(),
                reason: format!("unknown policy '{other}' (expected: fallback, keep)"),
            }),
        }
    }
}

/// fallback이 적용된 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// 부모 키가 없음
    MissingParent,
    /// 부모 값이 객체가 아님
    ParentNotObject,
    /// 자식 키가 없음
    MissingChild,
    /// 자식 값이 null 또는 비어 있음
    EmptyValue,
}

impl FallbackReason {
    /// 메트릭 레이블 등에 사용하는 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingParent => "missing_parent",
            Self::ParentNotObject => "parent_not_object",
            Self::MissingChild => "missing_child",
            Self::EmptyValue => "empty_value",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 승격 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// 원본 필드 값을 복사함
    Resolved,
    /// fallback 값을 기록함
    Fallback(FallbackReason),
}

impl Promotion {
    /// fallback이 적용되었는지 여부
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// 필드 승격 필터
///
/// 설정만 보관하는 불변 구조체이므로 `Arc`로 감싸 여러 스레드에서
/// 동시에 사용할 수 있습니다.
#[derive(Debug, Clone)]
pub struct FieldPromoter {
    /// 원본 필드 경로
    source: FieldPath,
    /// 최상위 대상 필드명
    target_key: String,
    /// fallback 값
    fallback: Value,
    /// 빈 값 처리 정책
    empty_policy: EmptyValuePolicy,
}

impl FieldPromoter {
    /// 새 필드 승격 필터를 생성합니다.
    ///
    /// 대상 필드명이 비어 있거나 원본 경로의 부모 키와 같으면 에러를 반환합니다.
    /// 부모 키와 같으면 대상 필드 기록이 원본 중첩 객체를 덮어쓰기 때문입니다.
    pub fn new(
        source: FieldPath,
        target_key: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Result<Self, PromoterError> {
        let target_key = target_key.into();
        if target_key.is_empty() {
            return Err(PromoterError::Config {
                field: "promoter.target_key".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if target_key == source.parent() {
            return Err(PromoterError::Config {
                field: "promoter.target_key".to_owned(),
                reason: format!(
                    "'{target_key}' would overwrite the source object '{}'",
                    source.parent()
                ),
            });
        }

        Ok(Self {
            source,
            target_key,
            fallback: Value::String(fallback.into()),
            empty_policy: EmptyValuePolicy::default(),
        })
    }

    /// core 설정 섹션에서 필드 승격 필터를 생성합니다.
    pub fn from_config(section: &PromoterSection) -> Result<Self, PromoterError> {
        let source: FieldPath = section.source.parse()?;
        let policy: EmptyValuePolicy = section.empty_values.parse()?;
        Ok(Self::new(source, section.target_key.clone(), section.fallback.clone())?
            .with_empty_policy(policy))
    }

    /// 빈 값 처리 정책을 설정합니다.
    pub fn with_empty_policy(mut self, policy: EmptyValuePolicy) -> Self {
        self.empty_policy = policy;
        self
    }

    /// 원본 필드 경로
    pub fn source(&self) -> &FieldPath {
        &self.source
    }

    /// 최상위 대상 필드명
    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// fallback 값
    pub fn fallback(&self) -> &Value {
        &self.fallback
    }

    /// fallback 값의 문자열 표현
    pub fn fallback_str(&self) -> &str {
        self.fallback.as_str().unwrap_or_default()
    }

    /// 빈 값 처리 정책
    pub fn empty_policy(&self) -> EmptyValuePolicy {
        self.empty_policy
    }

    /// 레코드에 승격을 적용합니다.
    ///
    /// 대상 필드 하나만 추가(또는 덮어쓰기)하며, 다른 필드는 건드리지 않습니다.
    pub fn promote(&self, record: &mut Record) -> Promotion {
        let (value, outcome) = match self.source.resolve(record) {
            Lookup::Found(value) if !self.empty_policy.is_empty(value) => {
                (value.clone(), Promotion::Resolved)
            }
            Lookup::Found(_) => (
                self.fallback.clone(),
                Promotion::Fallback(FallbackReason::EmptyValue),
            ),
            Lookup::MissingParent => (
                self.fallback.clone(),
                Promotion::Fallback(FallbackReason::MissingParent),
            ),
            Lookup::ParentNotObject => (
                self.fallback.clone(),
                Promotion::Fallback(FallbackReason::ParentNotObject),
            ),
            Lookup::MissingChild => (
                self.fallback.clone(),
                Promotion::Fallback(FallbackReason::MissingChild),
            ),
        };

        match outcome {
            Promotion::Resolved => {
                trace!(target_key = %self.target_key, source = %self.source, "field promoted");
                counter!(m::PROMOTER_RECORDS_TOTAL, m::LABEL_RESULT => "resolved").increment(1);
            }
            Promotion::Fallback(reason) => {
                debug!(
                    target_key = %self.target_key,
                    source = %self.source,
                    reason = reason.as_str(),
                    "source field unavailable, using fallback"
                );
                counter!(m::PROMOTER_RECORDS_TOTAL, m::LABEL_RESULT => "fallback").increment(1);
                counter!(m::PROMOTER_FALLBACKS_TOTAL, m::LABEL_REASON => reason.as_str())
                    .increment(1);
            }
        }

        record.insert(self.target_key.clone(), value);
        outcome
    }

    /// 필터 hook 규약으로 승격을 적용하고 결과도 함께 반환합니다.
    pub fn filter_with_outcome(
        &self,
        timestamp: EventTime,
        mut record: Record,
    ) -> (FilterOutput, Promotion) {
        let outcome = self.promote(&mut record);
        let output = FilterOutput {
            code: FilterCode::Modified,
            timestamp,
            record,
        };
        (output, outcome)
    }
}

impl RecordFilter for FieldPromoter {
    fn name(&self) -> &str {
        "field_promoter"
    }

    fn filter(&self, _tag: &str, timestamp: EventTime, record: Record) -> FilterOutput {
        self.filter_with_outcome(timestamp, record).0
    }
}

//! 필드 승격 크레이트 에러 타입
//!
//! [`PromoterError`]는 경로 해석, 설정 변환, 라인 디코딩, 스트림 I/O에서
//! 발생하는 에러를 표현합니다. 승격 연산 자체는 에러를 만들지 않습니다.
//! `From<PromoterError> for FieldliftError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use fieldlift_core::error::{ConfigError, FieldliftError, ParseError, ProcessError};

/// 필드 승격 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum PromoterError {
    /// 필드 경로 해석 실패
    #[error("invalid field path '{path}': {reason}")]
    InvalidPath {
        /// 입력 경로 문자열
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 라인 디코딩 실패
    #[error("decode error at line {line}: {reason}")]
    Decode {
        /// 1부터 시작하는 라인 번호 (알 수 없으면 0)
        line: u64,
        /// 실패 사유
        reason: String,
    },

    /// 라인 길이 초과
    #[error("line {line} too long: {len} bytes (max: {max})")]
    LineTooLong {
        /// 1부터 시작하는 라인 번호 (알 수 없으면 0)
        line: u64,
        /// 라인 길이
        len: usize,
        /// 최대 허용 길이
        max: usize,
    },

    /// 레코드 인코딩 실패
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PromoterError {
    /// 라인 번호를 채워 넣습니다.
    ///
    /// 코덱은 라인 번호를 모르므로 처리기가 호출 후 설정합니다.
    pub fn at_line(self, line_no: u64) -> Self {
        match self {
            Self::Decode { reason, .. } => Self::Decode {
                line: line_no,
                reason,
            },
            Self::LineTooLong { len, max, .. } => Self::LineTooLong {
                line: line_no,
                len,
                max,
            },
            other => other,
        }
    }

    /// 입력 데이터 문제로 인한 에러인지 여부
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::LineTooLong { .. })
    }
}

impl From<PromoterError> for FieldliftError {
    fn from(err: PromoterError) -> Self {
        match err {
            PromoterError::InvalidPath { path, reason } => {
                FieldliftError::Config(ConfigError::InvalidValue {
                    field: "promoter.source".to_owned(),
                    reason: format!("'{path}': {reason}"),
                })
            }
            PromoterError::Config { field, reason } => {
                FieldliftError::Config(ConfigError::InvalidValue { field, reason })
            }
            PromoterError::Decode { line, reason } => {
                FieldliftError::Parse(ParseError::Failed { line, reason })
            }
            PromoterError::LineTooLong { len, max, .. } => {
                FieldliftError::Parse(ParseError::TooLarge { size: len, max })
            }
            PromoterError::Encode(e) => {
                FieldliftError::Process(ProcessError::InitFailed(e.to_string()))
            }
            PromoterError::Io(e) => FieldliftError::Io(e),
        }
    }
}

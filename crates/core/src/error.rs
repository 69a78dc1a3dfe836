//! 에러 타입: 도메인별 에러 정의
//!
//! 필드 승격 자체는 실패하지 않습니다 (누락된 필드는 fallback으로 처리).
//! 여기 정의된 에러는 설정 로딩, 입력 해석, 스트림 처리 등 주변 계층의 에러입니다.

/// fieldlift 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FieldliftError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 입력 해석 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 스트림 처리 에러
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 입력 해석 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 지원하지 않는 형식
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// 해석 실패
    #[error("parse failed at line {line}: {reason}")]
    Failed { line: u64, reason: String },

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    /// 타임스탬프 해석 실패
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// 스트림 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// 처리기 초기화 실패
    #[error("processor init failed: {0}")]
    InitFailed(String),

    /// 처리 중단
    #[error("processing aborted at line {line}: {reason}")]
    Aborted { line: u64, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: FieldliftError = ConfigError::InvalidValue {
            field: "promoter.target_key".to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into();
        assert!(matches!(err, FieldliftError::Config(_)));
        assert!(err.to_string().contains("promoter.target_key"));
    }

    #[test]
    fn parse_error_display_includes_line() {
        let err = ParseError::Failed {
            line: 7,
            reason: "expected object".to_owned(),
        };
        assert_eq!(err.to_string(), "parse failed at line 7: expected object");
    }

    #[test]
    fn io_error_converts_to_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: FieldliftError = io.into();
        assert!(matches!(err, FieldliftError::Io(_)));
    }
}

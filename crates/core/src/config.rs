//! 설정 관리: fieldlift.toml 파싱 및 런타임 설정
//!
//! [`FieldliftConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`FIELDLIFT_PROMOTER_FALLBACK=default-topic` 형식)
//! 3. 설정 파일 (`fieldlift.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), fieldlift_core::error::FieldliftError> {
//! use fieldlift_core::config::FieldliftConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FieldliftConfig::load("fieldlift.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FieldliftConfig::parse("[promoter]\nfallback = \"unrouted\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FieldliftError};

/// 한 줄 최대 길이 상한 (64MB)
const MAX_LINE_LENGTH_LIMIT: usize = 64 * 1024 * 1024;

/// fieldlift 통합 설정
///
/// `fieldlift.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 구성 요소는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldliftConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 필드 승격 설정
    #[serde(default)]
    pub promoter: PromoterSection,
    /// 토픽 라우팅 설정
    #[serde(default)]
    pub routing: RoutingSection,
    /// 스트림 처리 설정
    #[serde(default)]
    pub processor: ProcessorSection,
}

impl FieldliftConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FieldliftError> {
        let config = Self::load_unvalidated(path).await?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일을 파싱하고 환경변수 오버라이드까지 적용합니다 (검증 없음).
    ///
    /// 호출자가 추가 오버라이드(CLI 인자 등)를 적용한 뒤 [`validate`](Self::validate)를
    /// 한 번 호출해야 합니다.
    pub async fn load_unvalidated(path: impl AsRef<Path>) -> Result<Self, FieldliftError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용한 설정을 반환합니다.
    ///
    /// 설정 파일 없이 실행할 때 사용합니다.
    pub fn from_env() -> Result<Self, FieldliftError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FieldliftError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FieldliftError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FieldliftError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FieldliftError> {
        toml::from_str(toml_str).map_err(|e| {
            FieldliftError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FIELDLIFT_{SECTION}_{FIELD}`
    /// 예: `FIELDLIFT_ROUTING_DYNAMIC_TOPIC=false`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FIELDLIFT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FIELDLIFT_GENERAL_LOG_FORMAT");

        // Promoter
        override_string(&mut self.promoter.source, "FIELDLIFT_PROMOTER_SOURCE");
        override_string(
            &mut self.promoter.target_key,
            "FIELDLIFT_PROMOTER_TARGET_KEY",
        );
        override_string(&mut self.promoter.fallback, "FIELDLIFT_PROMOTER_FALLBACK");
        override_string(
            &mut self.promoter.empty_values,
            "FIELDLIFT_PROMOTER_EMPTY_VALUES",
        );

        // Routing
        override_bool(&mut self.routing.enabled, "FIELDLIFT_ROUTING_ENABLED");
        override_csv(&mut self.routing.topics, "FIELDLIFT_ROUTING_TOPICS");
        override_string(&mut self.routing.topic_key, "FIELDLIFT_ROUTING_TOPIC_KEY");
        override_bool(
            &mut self.routing.dynamic_topic,
            "FIELDLIFT_ROUTING_DYNAMIC_TOPIC",
        );
        override_bool(&mut self.routing.sanitize, "FIELDLIFT_ROUTING_SANITIZE");

        // Processor
        override_string(&mut self.processor.tag, "FIELDLIFT_PROCESSOR_TAG");
        override_string(&mut self.processor.format, "FIELDLIFT_PROCESSOR_FORMAT");
        override_string(&mut self.processor.time_key, "FIELDLIFT_PROCESSOR_TIME_KEY");
        override_string(
            &mut self.processor.on_parse_error,
            "FIELDLIFT_PROCESSOR_ON_PARSE_ERROR",
        );
        override_usize(
            &mut self.processor.max_line_length,
            "FIELDLIFT_PROCESSOR_MAX_LINE_LENGTH",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 에러는 아니지만 의도와 다르게 동작할 수 있는 조합은 [`warnings`](Self::warnings)로
    /// 모아 `warn!`으로 기록합니다.
    pub fn validate(&self) -> Result<(), FieldliftError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        check_one_of("general.log_level", &self.general.log_level, &valid_levels)?;

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        check_one_of("general.log_format", &self.general.log_format, &valid_formats)?;

        // promoter 검증
        check_not_empty("promoter.source", &self.promoter.source)?;
        check_not_empty("promoter.target_key", &self.promoter.target_key)?;
        check_not_empty("promoter.fallback", &self.promoter.fallback)?;
        let valid_policies = ["fallback", "keep"];
        check_one_of(
            "promoter.empty_values",
            &self.promoter.empty_values,
            &valid_policies,
        )?;

        // routing 검증 (비활성화 상태면 건너뜀)
        if self.routing.enabled {
            if self.routing.topics.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "routing.topics".to_owned(),
                    reason: "at least one topic must be configured when routing is enabled"
                        .to_owned(),
                }
                .into());
            }
            if self.routing.topics.iter().any(|t| t.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "routing.topics".to_owned(),
                    reason: "topic names must not be empty".to_owned(),
                }
                .into());
            }
            check_not_empty("routing.topic_key", &self.routing.topic_key)?;
        }

        // processor 검증
        check_not_empty("processor.tag", &self.processor.tag)?;
        let valid_record_formats = ["auto", "object", "event"];
        check_one_of(
            "processor.format",
            &self.processor.format,
            &valid_record_formats,
        )?;
        let valid_error_policies = ["skip", "fail"];
        check_one_of(
            "processor.on_parse_error",
            &self.processor.on_parse_error,
            &valid_error_policies,
        )?;
        if self.processor.max_line_length == 0
            || self.processor.max_line_length > MAX_LINE_LENGTH_LIMIT
        {
            return Err(ConfigError::InvalidValue {
                field: "processor.max_line_length".to_owned(),
                reason: format!("must be 1-{}", MAX_LINE_LENGTH_LIMIT),
            }
            .into());
        }

        for warning in self.warnings() {
            warn!(warning = %warning, "suspicious configuration");
        }

        Ok(())
    }

    /// 유효하지만 의도와 다르게 동작할 가능성이 높은 설정 조합을 반환합니다.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        // 라우터가 승격 필드를 읽지 않으면 모든 레코드가 기본 토픽으로 감
        if self.routing.enabled && self.routing.topic_key != self.promoter.target_key {
            warnings.push(format!(
                "routing.topic_key '{}' differs from promoter.target_key '{}'; \
                 records will not be routed by the promoted field",
                self.routing.topic_key, self.promoter.target_key
            ));
        }
        warnings
    }
}

fn check_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), FieldliftError> {
    if !allowed.contains(&value) {
        return Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: format!("must be one of: {}", allowed.join(", ")),
        }
        .into());
    }
    Ok(())
}

fn check_not_empty(field: &str, value: &str) -> Result<(), FieldliftError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: "must not be empty".to_owned(),
        }
        .into());
    }
    Ok(())
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 필드 승격 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromoterSection {
    /// 승격할 중첩 필드 경로 (`parent.child` 또는 `$parent['child']`)
    pub source: String,
    /// 최상위에 기록할 필드명
    pub target_key: String,
    /// 원본 필드를 찾지 못했을 때 사용할 값
    pub fallback: String,
    /// 빈 값 처리 정책 (fallback, keep)
    pub empty_values: String,
}

impl Default for PromoterSection {
    fn default() -> Self {
        Self {
            source: "kubernetes.pod_name".to_owned(),
            target_key: "topic_name".to_owned(),
            fallback: "default-topic".to_owned(),
            empty_values: "fallback".to_owned(),
        }
    }
}

/// 토픽 라우팅 설정
///
/// Kafka 출력의 `Topics`, `Topic_Key`, `Dynamic_topic` 옵션에 대응합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    /// 활성화 여부
    pub enabled: bool,
    /// 토픽 목록 (첫 번째가 기본 토픽)
    pub topics: Vec<String>,
    /// 토픽을 읽을 최상위 필드명
    pub topic_key: String,
    /// 목록에 없는 토픽 허용 여부
    pub dynamic_topic: bool,
    /// 허용되지 않는 문자를 치환할지 여부
    pub sanitize: bool,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            topics: vec!["default-topic".to_owned()],
            topic_key: "topic_name".to_owned(),
            dynamic_topic: true,
            sanitize: true,
        }
    }
}

/// 스트림 처리 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorSection {
    /// 이벤트에 부여할 태그
    pub tag: String,
    /// 입력 레코드 형식 (auto, object, event)
    pub format: String,
    /// 객체 형식에서 타임스탬프를 읽을 필드명 (빈 문자열이면 사용 안 함)
    pub time_key: String,
    /// 해석 실패 시 정책 (skip, fail)
    pub on_parse_error: String,
    /// 한 줄 최대 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for ProcessorSection {
    fn default() -> Self {
        Self {
            tag: "kube.*".to_owned(),
            format: "auto".to_owned(),
            time_key: "date".to_owned(),
            on_parse_error: "skip".to_owned(),
            max_line_length: 1024 * 1024, // 1MB
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

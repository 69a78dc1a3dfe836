#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`path`]: 두 단계 필드 경로 (dot 표기, record accessor 표기)
//! - [`promoter`]: 중첩 필드 승격 필터 ([`RecordFilter`](fieldlift_core::filter::RecordFilter) 구현)
//! - [`routing`]: 승격된 필드 기반 Kafka 토픽 선택
//! - [`codec`]: JSON 라인 디코딩/인코딩 (객체, 이벤트 배열)
//! - [`processor`]: 비동기 라인 스트림 처리 및 통계
//! - [`fluentbit`]: 수집기용 Lua 스크립트 및 설정 섹션 렌더링
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! reader -> LineCodec -> FieldPromoter -> TopicRouter -> LineCodec -> writer
//!              |              |                |
//!        object/event    fallback 기록     Topics/Topic_Key
//! ```

pub mod codec;
pub mod error;
pub mod fluentbit;
pub mod path;
pub mod processor;
pub mod promoter;
pub mod routing;

// --- 주요 타입 re-export ---

// 승격 필터
pub use path::{FieldPath, Lookup};
pub use promoter::{EmptyValuePolicy, FallbackReason, FieldPromoter, Promotion};

// 라우팅
pub use routing::{Route, RouteSource, TopicRouter, TopicSummary};

// 스트림 처리
pub use codec::{DecodedLine, Framing, LineCodec, RecordFormat};
pub use processor::{
    OnParseError, ProcessStats, ProcessedEvent, RecordProcessor, RecordProcessorBuilder,
};

// 에러
pub use error::PromoterError;

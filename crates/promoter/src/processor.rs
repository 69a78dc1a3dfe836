//! 스트림 처리기 -- 라인 디코딩, 필드 승격, 토픽 라우팅, 인코딩의 전체 흐름을 관리합니다.
//!
//! # 내부 흐름
//! ```text
//! AsyncBufRead -> LineCodec::decode -> FieldPromoter -> TopicRouter -> LineCodec::encode -> AsyncWrite
//! ```
//!
//! 한 스트림은 순차적으로 처리되므로 출력 순서는 입력 순서와 같습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use fieldlift_core::config::FieldliftConfig;
use fieldlift_core::metrics as m;
use fieldlift_core::record::LogEvent;
use metrics::counter;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::codec::LineCodec;
use crate::error::PromoterError;
use crate::promoter::{FieldPromoter, Promotion};
use crate::routing::{Route, TopicRouter, TopicSummary};

/// 해석 실패 시 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnParseError {
    /// 경고 로그를 남기고 라인을 건너뜀
    #[default]
    Skip,
    /// 처리를 중단하고 에러 반환
    Fail,
}

impl OnParseError {
    /// 설정 파일 표기
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for OnParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnParseError {
    type Err = PromoterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(PromoterError::Config {
                field: "processor.on_parse_error".to_owned(),
                reason: format!("unknown policy '{other}', expected skip or fail"),
            }),
        }
    }
}

/// 이벤트 하나의 처리 결과
#[derive(Debug, Clone)]
pub struct ProcessedEvent {
    /// 최종 이벤트 (폐기되면 `None`)
    pub event: Option<LogEvent>,
    /// 승격 결과
    pub promotion: Promotion,
    /// 라우팅 결정 (라우터가 없거나 폐기되면 `None`)
    pub route: Option<Route>,
}

/// 스트림 처리 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStats {
    /// 읽은 비어 있지 않은 라인 수
    pub lines_read: u64,
    /// 출력한 레코드 수
    pub records_emitted: u64,
    /// 폐기된 레코드 수
    pub records_dropped: u64,
    /// 원본 필드 값을 승격한 레코드 수
    pub resolved: u64,
    /// 사유별 fallback 레코드 수
    pub fallbacks: BTreeMap<String, u64>,
    /// 해석 실패 라인 수
    pub parse_errors: u64,
    /// 토픽별 집계 (라우팅 비활성화 시 `None`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<TopicSummary>,
}

impl ProcessStats {
    /// fallback이 적용된 전체 레코드 수
    pub fn fallback_total(&self) -> u64 {
        self.fallbacks.values().sum()
    }

    fn observe(&mut self, processed: &ProcessedEvent) {
        match processed.promotion {
            Promotion::Resolved => self.resolved += 1,
            Promotion::Fallback(reason) => {
                *self.fallbacks.entry(reason.as_str().to_owned()).or_insert(0) += 1;
            }
        }
        if let (Some(summary), Some(route)) = (self.topics.as_mut(), processed.route.as_ref()) {
            summary.record(route);
        }
    }
}

/// 레코드 스트림 처리기
///
/// [`RecordProcessorBuilder`] 또는 [`RecordProcessor::from_config`]로 생성합니다.
///
/// # 사용 예시
/// ```ignore
/// use fieldlift_promoter::{RecordProcessor, RecordProcessorBuilder};
///
/// let processor = RecordProcessorBuilder::new(promoter)
///     .router(router)
///     .build();
/// let stats = processor.run(tokio::io::BufReader::new(stdin), stdout).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RecordProcessor {
    promoter: FieldPromoter,
    router: Option<TopicRouter>,
    codec: LineCodec,
    tag: String,
    on_parse_error: OnParseError,
}

impl RecordProcessor {
    /// 전체 설정에서 처리기를 생성합니다.
    ///
    /// `[routing] enabled = false`이면 라우터 없이 생성합니다.
    pub fn from_config(config: &FieldliftConfig) -> Result<Self, PromoterError> {
        let promoter = FieldPromoter::from_config(&config.promoter)?;
        let router = if config.routing.enabled {
            Some(TopicRouter::from_config(&config.routing)?)
        } else {
            None
        };
        let codec = LineCodec::from_config(&config.processor)?;
        let on_parse_error: OnParseError = config.processor.on_parse_error.parse()?;

        let mut builder = RecordProcessorBuilder::new(promoter)
            .codec(codec)
            .tag(config.processor.tag.clone())
            .on_parse_error(on_parse_error);
        if let Some(router) = router {
            builder = builder.router(router);
        }
        Ok(builder.build())
    }

    /// 필드 승격 필터
    pub fn promoter(&self) -> &FieldPromoter {
        &self.promoter
    }

    /// 토픽 라우터
    pub fn router(&self) -> Option<&TopicRouter> {
        self.router.as_ref()
    }

    /// 해석 실패 시 정책
    pub fn on_parse_error(&self) -> OnParseError {
        self.on_parse_error
    }

    /// 이벤트 하나에 필터 hook 규약대로 승격을 적용하고 라우팅합니다.
    pub fn process_event(&self, event: LogEvent) -> ProcessedEvent {
        let LogEvent {
            tag,
            timestamp,
            record,
        } = event;
        let (output, promotion) = self.promoter.filter_with_outcome(timestamp, record);
        let event = output.into_event(tag, timestamp);
        let route = match (&self.router, &event) {
            (Some(router), Some(event)) => Some(router.route(&event.record)),
            _ => None,
        };
        ProcessedEvent {
            event,
            promotion,
            route,
        }
    }

    /// 라인 스트림을 처리합니다.
    ///
    /// 빈 라인은 건너뜁니다. 해석에 실패한 라인은 정책에 따라 건너뛰거나
    /// 1부터 시작하는 라인 번호와 함께 에러를 반환합니다. 종료 시 출력을 flush합니다.
    ///
    /// 한 번에 최대 `max_line_length + 1` 바이트만 버퍼에 읽습니다. 더 긴 라인의
    /// 나머지는 버퍼에 쌓지 않고 다음 개행까지 버립니다.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<ProcessStats, PromoterError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut stats = ProcessStats {
            topics: self.router.as_ref().map(|_| TopicSummary::new()),
            ..ProcessStats::default()
        };
        let max = self.codec.max_line_length();
        let limit = (max as u64).saturating_add(1);
        let mut buf = Vec::new();
        let mut line_no: u64 = 0;

        loop {
            buf.clear();
            let read = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
            if read == 0 {
                break;
            }
            line_no += 1;

            if read as u64 == limit && buf.last() != Some(&b'\n') {
                let skipped = skip_rest_of_line(&mut reader).await?;
                // `\r\n` 직전에서 잘린 경우는 길이 제한 안에 있음
                let fits = skipped == 0 && buf.last() == Some(&b'\r');
                if !fits {
                    stats.lines_read += 1;
                    counter!(m::PROCESSOR_LINES_READ_TOTAL).increment(1);
                    let err = PromoterError::LineTooLong {
                        line: line_no,
                        len: trim_line_ending(&buf).len() + skipped,
                        max,
                    };
                    self.handle_parse_error(err, &mut stats)?;
                    continue;
                }
            }

            let raw = trim_line_ending(&buf);
            if raw.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            stats.lines_read += 1;
            counter!(m::PROCESSOR_LINES_READ_TOTAL).increment(1);

            let decoded = std::str::from_utf8(raw)
                .map_err(|e| PromoterError::Decode {
                    line: 0,
                    reason: format!("invalid utf-8: {e}"),
                })
                .and_then(|line| self.codec.decode(line, &self.tag));
            let decoded = match decoded {
                Ok(decoded) => decoded,
                Err(err) => {
                    self.handle_parse_error(err.at_line(line_no), &mut stats)?;
                    continue;
                }
            };

            let processed = self.process_event(decoded.event);
            stats.observe(&processed);

            match processed.event {
                Some(event) => {
                    let line = self.codec.encode(&event, &decoded.framing)?;
                    writer.write_all(line.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    stats.records_emitted += 1;
                    counter!(m::PROCESSOR_RECORDS_EMITTED_TOTAL).increment(1);
                }
                None => {
                    debug!(line = line_no, "record dropped by filter");
                    stats.records_dropped += 1;
                    counter!(m::PROCESSOR_RECORDS_DROPPED_TOTAL).increment(1);
                }
            }
        }

        writer.flush().await?;

        info!(
            lines = stats.lines_read,
            emitted = stats.records_emitted,
            resolved = stats.resolved,
            fallbacks = stats.fallback_total(),
            parse_errors = stats.parse_errors,
            "stream processed"
        );
        Ok(stats)
    }

    fn handle_parse_error(
        &self,
        err: PromoterError,
        stats: &mut ProcessStats,
    ) -> Result<(), PromoterError> {
        stats.parse_errors += 1;
        counter!(m::PROCESSOR_PARSE_ERRORS_TOTAL).increment(1);
        match self.on_parse_error {
            OnParseError::Skip => {
                warn!(error = %err, "skipping undecodable line");
                Ok(())
            }
            OnParseError::Fail => {
                error!(error = %err, "aborting on undecodable line");
                Err(err)
            }
        }
    }
}

/// 다음 개행(포함)까지 버퍼에 쌓지 않고 소비합니다. 버린 바이트 수(개행 제외)를 반환합니다.
async fn skip_rest_of_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<usize> {
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(idx) => {
                reader.consume(idx + 1);
                return Ok(skipped + idx);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

/// 스트림 처리기 빌더
pub struct RecordProcessorBuilder {
    promoter: FieldPromoter,
    router: Option<TopicRouter>,
    codec: LineCodec,
    tag: String,
    on_parse_error: OnParseError,
}

impl RecordProcessorBuilder {
    /// 필드 승격 필터로 새 빌더를 생성합니다.
    pub fn new(promoter: FieldPromoter) -> Self {
        Self {
            promoter,
            router: None,
            codec: LineCodec::default(),
            tag: "kube.*".to_owned(),
            on_parse_error: OnParseError::default(),
        }
    }

    /// 토픽 라우터를 설정합니다.
    pub fn router(mut self, router: TopicRouter) -> Self {
        self.router = Some(router);
        self
    }

    /// 라인 코덱을 설정합니다.
    pub fn codec(mut self, codec: LineCodec) -> Self {
        self.codec = codec;
        self
    }

    /// 이벤트 태그를 설정합니다.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// 해석 실패 시 정책을 설정합니다.
    pub fn on_parse_error(mut self, policy: OnParseError) -> Self {
        self.on_parse_error = policy;
        self
    }

    /// 처리기를 빌드합니다.
    pub fn build(self) -> RecordProcessor {
        RecordProcessor {
            promoter: self.promoter,
            router: self.router,
            codec: self.codec,
            tag: self.tag,
            on_parse_error: self.on_parse_error,
        }
    }
}

//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 구성 요소는 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! recorder가 설치되지 않은 경우 매크로 호출은 아무 동작도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `fieldlift_`
//! - 구성 요소명: `promoter_`, `router_`, `processor_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(fieldlift_core::metrics::PROMOTER_RECORDS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (resolved, fallback)
pub const LABEL_RESULT: &str = "result";

/// fallback 사유 레이블 키 (missing_parent, parent_not_object, missing_child, empty_value)
pub const LABEL_REASON: &str = "reason";

/// 라우팅 출처 레이블 키 (field, sanitized, default)
pub const LABEL_ROUTE_SOURCE: &str = "source";

// ─── Promoter 메트릭 ────────────────────────────────────────────────

/// Promoter: 처리된 레코드 수 (counter, label: result)
pub const PROMOTER_RECORDS_TOTAL: &str = "fieldlift_promoter_records_total";

/// Promoter: fallback 적용 수 (counter, label: reason)
pub const PROMOTER_FALLBACKS_TOTAL: &str = "fieldlift_promoter_fallbacks_total";

// ─── Router 메트릭 ──────────────────────────────────────────────────

/// Router: 라우팅된 레코드 수 (counter, label: source)
pub const ROUTER_RECORDS_ROUTED_TOTAL: &str = "fieldlift_router_records_routed_total";

// ─── Processor 메트릭 ───────────────────────────────────────────────

/// Processor: 읽은 라인 수 (counter)
pub const PROCESSOR_LINES_READ_TOTAL: &str = "fieldlift_processor_lines_read_total";

/// Processor: 출력된 레코드 수 (counter)
pub const PROCESSOR_RECORDS_EMITTED_TOTAL: &str = "fieldlift_processor_records_emitted_total";

/// Processor: 폐기된 레코드 수 (counter)
pub const PROCESSOR_RECORDS_DROPPED_TOTAL: &str = "fieldlift_processor_records_dropped_total";

/// Processor: 해석 실패 수 (counter)
pub const PROCESSOR_PARSE_ERRORS_TOTAL: &str = "fieldlift_processor_parse_errors_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// recorder 설치 직후 한 번 호출합니다.
/// `metrics::describe_counter!()`를 통해 메트릭 메타데이터를 설정합니다.
pub fn describe_all() {
    use metrics::describe_counter;

    describe_counter!(
        PROMOTER_RECORDS_TOTAL,
        "Total records passed through the field promoter"
    );
    describe_counter!(
        PROMOTER_FALLBACKS_TOTAL,
        "Total records that received the fallback value"
    );
    describe_counter!(
        ROUTER_RECORDS_ROUTED_TOTAL,
        "Total records assigned a destination topic"
    );
    describe_counter!(
        PROCESSOR_LINES_READ_TOTAL,
        "Total input lines read by the stream processor"
    );
    describe_counter!(
        PROCESSOR_RECORDS_EMITTED_TOTAL,
        "Total records written by the stream processor"
    );
    describe_counter!(
        PROCESSOR_RECORDS_DROPPED_TOTAL,
        "Total records dropped by a filter"
    );
    describe_counter!(
        PROCESSOR_PARSE_ERRORS_TOTAL,
        "Total input lines that could not be decoded"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[&str] = &[
        PROMOTER_RECORDS_TOTAL,
        PROMOTER_FALLBACKS_TOTAL,
        ROUTER_RECORDS_ROUTED_TOTAL,
        PROCESSOR_LINES_READ_TOTAL,
        PROCESSOR_RECORDS_EMITTED_TOTAL,
        PROCESSOR_RECORDS_DROPPED_TOTAL,
        PROCESSOR_PARSE_ERRORS_TOTAL,
    ];

    #[test]
    fn metric_names_follow_convention() {
        for name in ALL {
            assert!(name.starts_with("fieldlift_"), "{name} missing prefix");
            assert!(name.ends_with("_total"), "{name} is a counter");
        }
    }

    #[test]
    fn metric_names_are_unique() {
        let mut names: Vec<&str> = ALL.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn describe_all_without_recorder_is_noop() {
        describe_all();
    }
}

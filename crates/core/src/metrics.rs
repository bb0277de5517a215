//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logship_`
//! - 구성요소: 없음 (파이프라인), `sink_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logship_core::metrics::LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 라인 소스 레이블 키 (stdin, file:...)
pub const LABEL_SOURCE: &str = "source";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── 파이프라인 메트릭 ─────────────────────────────────────────────

/// 파이프라인: 읽은 전체 라인 수 (counter, label: source)
pub const LINES_READ_TOTAL: &str = "logship_lines_read_total";

/// 파이프라인: 패턴에 매칭되지 않은 라인 수 (counter)
pub const LINES_UNMATCHED_TOTAL: &str = "logship_lines_unmatched_total";

/// 파이프라인: 최대 길이를 넘어 잘린 필드 수 (counter)
pub const FIELDS_TRUNCATED_TOTAL: &str = "logship_fields_truncated_total";

/// 파이프라인: 싱크에 넘긴 오퍼레이션 수 (counter)
pub const OPERATIONS_DISPATCHED_TOTAL: &str = "logship_operations_dispatched_total";

// ─── 싱크 메트릭 ───────────────────────────────────────────────────

/// 싱크: 전송한 bulk 요청 수 (counter, label: result)
pub const SINK_BULK_REQUESTS_TOTAL: &str = "logship_sink_bulk_requests_total";

/// 싱크: 실패한 bulk 요청 수 (counter)
pub const SINK_BULK_FAILURES_TOTAL: &str = "logship_sink_bulk_failures_total";

/// 싱크: 백엔드가 거부한 개별 액션 수 (counter)
pub const SINK_ACTIONS_FAILED_TOTAL: &str = "logship_sink_actions_failed_total";

/// 싱크: 플러시 대기 중인 오퍼레이션 수 (gauge)
pub const SINK_QUEUE_DEPTH: &str = "logship_sink_queue_depth";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        LINES_READ_TOTAL,
        "Total number of raw lines read from the line source"
    );
    describe_counter!(
        LINES_UNMATCHED_TOTAL,
        "Total number of lines the extraction pattern did not match"
    );
    describe_counter!(
        FIELDS_TRUNCATED_TOTAL,
        "Total number of field values cut at the maximum field length"
    );
    describe_counter!(
        OPERATIONS_DISPATCHED_TOTAL,
        "Total number of index operations handed to the sink"
    );
    describe_counter!(
        SINK_BULK_REQUESTS_TOTAL,
        "Total number of bulk requests sent to the indexing backend"
    );
    describe_counter!(
        SINK_BULK_FAILURES_TOTAL,
        "Total number of bulk requests that failed to deliver"
    );
    describe_counter!(
        SINK_ACTIONS_FAILED_TOTAL,
        "Total number of individual actions rejected by the indexing backend"
    );
    describe_gauge!(
        SINK_QUEUE_DEPTH,
        "Current number of operations buffered in the sink awaiting flush"
    );
}

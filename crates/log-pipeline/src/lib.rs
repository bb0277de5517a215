//! logship 로그 파이프라인
//!
//! 비정형 로그 라인에서 정규식 패턴으로 필드를 추출하고, 타임스탬프와 시간 단위
//! 대상 인덱스를 붙여 배치 bulk 싱크로 전달합니다.
//!
//! # 모듈 구성
//!
//! - [`pattern`]: 패턴 레지스트리 (내장 패턴 + 자유 형식 패턴 해석)
//! - [`extractor`]: 라인 하나에서 이름 있는 그룹 필드 추출
//! - [`record`]: 레코드 생성 (필수 필드, 길이 제한, 대상 인덱스 이름)
//! - [`dispatcher`]: 직렬화, 싱크 전달, 종료 드레인
//! - [`source`]: 라인 소스 (stdin 리더, 파일 추적)
//! - [`sink`]: 배치 bulk 싱크 액터와 HTTP 전송
//! - [`buffer`]: 싱크 내부 오퍼레이션 버퍼
//! - [`output`]: 상세 추적 / 입력 에코 출력
//! - [`pipeline`]: 전체 루프 오케스트레이션
//! - [`config`]: 파이프라인 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! LineSource -> Extractor -> RecordBuilder -> Dispatcher -> BulkSink -> /_bulk
//!  stdin/file     Pattern     @timestamp       serialize     batch + timer
//!                             message          enqueue       close + ack
//!                             destination      drain grace
//! ```

pub mod buffer;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod output;
pub mod pattern;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod source;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder, PipelineReport, PipelineStats, StopReason};

// 설정
pub use config::{OutputMode, PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::{ErrorClass, LogPipelineError};

// 패턴
pub use pattern::{Pattern, PatternInfo, PatternRegistry, PatternSelection};

// 추출 / 레코드
pub use extractor::{extract, extract_match};
pub use record::{Clock, FixedClock, IndexTemplate, RecordBuilder, SystemClock};

// 디스패처
pub use dispatcher::{Dispatcher, DrainReport};

// 소스
pub use source::{FileFollower, FileFollowerConfig, ReaderSource, StartPosition};

// 싱크
pub use sink::{BulkSink, BulkSinkConfig, BulkSinkHandle, HttpBulkTransport};

// 버퍼
pub use buffer::OperationBuffer;

//! logship 공통 크레이트
//!
//! 파이프라인과 바이너리가 공유하는 도메인 타입, 외부 협력자 trait,
//! 에러 계층, 설정, 메트릭 이름을 정의합니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogshipError, PipelineError, SinkError, SourceError};

// 설정
pub use config::LogshipConfig;

// 외부 협력자 trait
pub use pipeline::{LineSource, Sink};

// 도메인 타입
pub use types::{FieldSet, IndexOperation, IndexRecord, OperationKind};

//! 에러 타입 -- 도메인별 에러 정의

/// logship 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogshipError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 라인 소스 에러
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// 싱크 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

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

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 패턴 해석 실패
    #[error("pattern error: {0}")]
    Pattern(String),

    /// 문서 직렬화 실패 (불변식 위반)
    #[error("document serialization failed: {0}")]
    Serialization(String),
}

/// 라인 소스 에러
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 소스 열기 실패 (예: 추적 대상 파일 없음)
    #[error("failed to open {source_name}: {reason}")]
    Open { source_name: String, reason: String },

    /// 읽기 실패
    #[error("failed to read from {source_name}: {reason}")]
    Read { source_name: String, reason: String },
}

/// 싱크 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 싱크가 이미 닫힘
    #[error("sink closed")]
    Closed,

    /// 배치 전송 실패
    #[error("bulk request failed: {0}")]
    Transport(String),

    /// 드레인 응답 없음
    #[error("drain acknowledgement lost: {0}")]
    DrainLost(String),
}

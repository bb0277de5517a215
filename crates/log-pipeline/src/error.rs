//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 패턴 해석부터 싱크 전달까지 파이프라인 내부에서 발생하는
//! 모든 에러를 표현합니다. `From<LogPipelineError> for LogshipError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logship_core::error::{ConfigError, LogshipError, PipelineError, SinkError, SourceError};

/// 에러 분류
///
/// 바이너리는 이 분류로 프로세스 종료 코드를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 패턴 설정 오류 (알 수 없는 이름, 빈 패턴, 컴파일 실패)
    Pattern,
    /// 그 외 설정 오류 (템플릿, 필드 값)
    Configuration,
    /// 라인 소스 열기 실패
    SourceOpen,
    /// 실행 중 실패 (읽기 오류, 싱크 오류, I/O)
    Runtime,
    /// 불변식 위반 (문서 직렬화 실패)
    Internal,
}

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 내장 패턴 테이블에 없는 식별자
    #[error("unknown named pattern: {0}")]
    UnknownPattern(String),

    /// 이름도 자유 형식 패턴도 주어지지 않음
    #[error("no pattern provided")]
    NoPattern,

    /// 패턴 컴파일 실패
    #[error("invalid pattern '{name}': {reason}")]
    InvalidPattern {
        /// 패턴 이름 (자유 형식이면 "custom")
        name: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 인덱스 이름 템플릿 해석 실패
    #[error("invalid index template '{template}': {reason}")]
    InvalidTemplate {
        /// 문제가 된 템플릿
        template: String,
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

    /// 필드 맵 → 문서 직렬화 실패
    ///
    /// 필드 맵은 항상 문자열 → 문자열이므로 발생하면 안 됩니다.
    /// 발생 시 해당 라인을 건너뛰지 않고 즉시 중단합니다.
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 라인 소스 에러
    #[error(transparent)]
    Source(#[from] SourceError),

    /// 싱크 에러
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// I/O 에러 (진단/에코 출력 등)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogPipelineError {
    /// 에러 분류를 반환합니다.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownPattern(_) | Self::NoPattern | Self::InvalidPattern { .. } => {
                ErrorClass::Pattern
            }
            Self::InvalidTemplate { .. } | Self::Config { .. } => ErrorClass::Configuration,
            Self::Source(SourceError::Open { .. }) => ErrorClass::SourceOpen,
            Self::Source(SourceError::Read { .. }) | Self::Sink(_) | Self::Io(_) => {
                ErrorClass::Runtime
            }
            Self::Serialization(_) => ErrorClass::Internal,
        }
    }
}

impl From<LogPipelineError> for LogshipError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Source(e) => LogshipError::Source(e),
            LogPipelineError::Sink(e) => LogshipError::Sink(e),
            LogPipelineError::Io(e) => LogshipError::Io(e),
            LogPipelineError::Serialization(e) => {
                LogshipError::Pipeline(PipelineError::Serialization(e.to_string()))
            }
            LogPipelineError::InvalidTemplate { template, reason } => {
                LogshipError::Config(ConfigError::InvalidValue {
                    field: "index.template".to_owned(),
                    reason: format!("'{template}': {reason}"),
                })
            }
            LogPipelineError::Config { field, reason } => {
                LogshipError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => LogshipError::Pipeline(PipelineError::Pattern(other.to_string())),
        }
    }
}

//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`LogshipConfig`]에서 파이프라인이 사용하는 값만
//! 골라낸 불변 설정입니다. 시작 시 한 번 만들어 각 구성요소에 값으로 넘기며,
//! 파이프라인 내부에서 전역 상태를 읽지 않습니다.
//!
//! # 사용 예시
//! ```
//! use logship_core::config::LogshipConfig;
//! use logship_pipeline::config::{OutputMode, PipelineConfig};
//!
//! let core_config = LogshipConfig::default();
//! let config = PipelineConfig::from_core(&core_config).with_output_mode(OutputMode::Verbose);
//! config.validate().unwrap();
//! ```

use std::time::Duration;

use logship_core::config::{DEFAULT_INDEX_TEMPLATE, LogshipConfig};
use logship_core::types::DOCUMENT_KIND;

use crate::error::LogPipelineError;
use crate::pattern::PatternSelection;

/// 단계별 출력 모드
///
/// 상세 추적과 입력 에코는 동시에 켤 수 없습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// 진단 출력 없음
    #[default]
    Quiet,
    /// 패턴, 원시 라인, 대상 인덱스, 필드 전체를 진단 스트림에 기록
    Verbose,
    /// 원시 라인을 표준 출력으로 그대로 에코
    Echo,
}

impl OutputMode {
    /// CLI 플래그 조합에서 모드를 만듭니다. 둘 다 켜져 있으면 에러입니다.
    pub fn from_flags(verbose: bool, echo: bool) -> Result<Self, LogPipelineError> {
        match (verbose, echo) {
            (true, true) => Err(LogPipelineError::Config {
                field: "output_mode".to_owned(),
                reason: "verbose and echo are mutually exclusive".to_owned(),
            }),
            (true, false) => Ok(Self::Verbose),
            (false, true) => Ok(Self::Echo),
            (false, false) => Ok(Self::Quiet),
        }
    }
}

/// 로그 파이프라인 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 추출 패턴 선택
    pub pattern: PatternSelection,
    /// strftime 형식의 대상 인덱스 템플릿
    pub index_template: String,
    /// bulk 액션의 문서 타입
    pub document_type: String,
    /// 단계별 출력 모드
    pub output_mode: OutputMode,
    /// 종료 시 드레인 유예 시간 (싱크 플러시 간격보다 길어야 함)
    pub drain_grace: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pattern: PatternSelection::default(),
            index_template: DEFAULT_INDEX_TEMPLATE.to_owned(),
            document_type: DOCUMENT_KIND.to_owned(),
            output_mode: OutputMode::Quiet,
            drain_grace: Duration::from_millis(2000),
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    ///
    /// 출력 모드는 설정 파일에 없으므로 기본값(`Quiet`)이 적용됩니다.
    pub fn from_core(core: &LogshipConfig) -> Self {
        Self {
            pattern: PatternSelection::from_config(&core.pattern),
            index_template: core.index.template.clone(),
            document_type: core.index.document_type.clone(),
            drain_grace: Duration::from_millis(core.sink.drain_grace_ms),
            ..Self::default()
        }
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 패턴 컴파일과 템플릿 해석은 파이프라인 빌드 시 수행됩니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        if self.index_template.is_empty() {
            return Err(LogPipelineError::Config {
                field: "index_template".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.document_type.is_empty() {
            return Err(LogPipelineError::Config {
                field: "document_type".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.drain_grace.is_zero() {
            return Err(LogPipelineError::Config {
                field: "drain_grace".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 패턴 선택을 설정합니다.
    pub fn pattern(mut self, pattern: PatternSelection) -> Self {
        self.config.pattern = pattern;
        self
    }

    /// 대상 인덱스 템플릿을 설정합니다.
    pub fn index_template(mut self, template: impl Into<String>) -> Self {
        self.config.index_template = template.into();
        self
    }

    /// 문서 타입을 설정합니다.
    pub fn document_type(mut self, document_type: impl Into<String>) -> Self {
        self.config.document_type = document_type.into();
        self
    }

    /// 출력 모드를 설정합니다.
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    /// 드레인 유예 시간을 설정합니다.
    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.config.drain_grace = grace;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

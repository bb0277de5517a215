//! 파이프라인 오케스트레이션 -- 라인 읽기부터 싱크 전달, 종료 드레인까지
//!
//! 라인 하나를 도착 순서대로 한 번에 하나씩 처리하는 단일 순차 루프입니다.
//! 싱크에 넘긴 오퍼레이션 순서는 입력 라인 순서와 같습니다.
//!
//! # 내부 흐름
//! ```text
//! LineSource -> Extractor -> RecordBuilder -> Dispatcher -> Sink (batch/flush)
//!                    \             \
//!                 StageOutput (verbose trace / echo)
//! ```
//!
//! # 종료
//! - 입력 종료 또는 외부 정지 요청: 드레인 후 정상 반환
//! - 읽기 실패: 진단 스트림에 보고, 드레인 후 에러 반환
//! - 직렬화 실패: 불변식 위반이므로 드레인 없이 즉시 에러 반환

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use logship_core::metrics as m;
use logship_core::pipeline::{LineSource, Sink};
use logship_core::types::FieldSet;

use crate::config::PipelineConfig;
use crate::dispatcher::{Dispatcher, DrainReport};
use crate::error::LogPipelineError;
use crate::extractor::extract_match;
use crate::output::StageOutput;
use crate::pattern::{Pattern, PatternRegistry};
use crate::record::{Clock, IndexTemplate, RecordBuilder, SystemClock};

/// 파이프라인 처리 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// 소스에서 읽은 라인 수
    pub lines_read: u64,
    /// 패턴이 매칭되지 않은 라인 수
    pub lines_unmatched: u64,
    /// 싱크에 넘긴 오퍼레이션 수
    pub operations_dispatched: u64,
}

/// 루프 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 라인 소스가 입력 종료를 알림
    EndOfInput,
    /// 외부 정지 요청 (SIGINT/SIGTERM)
    StopRequested,
}

/// 정상 종료 보고
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub stats: PipelineStats,
    pub drain: DrainReport,
    pub stopped_by: StopReason,
}

/// 로그 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use logship_pipeline::{LogPipelineBuilder, ReaderSource};
///
/// let pipeline = LogPipelineBuilder::new(sink).config(config).build()?;
/// let report = pipeline.run(ReaderSource::stdin(), shutdown_signal()).await?;
/// ```
pub struct LogPipeline<S: Sink> {
    /// 해석된 추출 패턴 (읽기 전용)
    pattern: Pattern,
    /// 레코드 빌더 (대상 인덱스 템플릿 포함)
    builder: RecordBuilder,
    /// 디스패처 (싱크 소유)
    dispatcher: Dispatcher<S>,
    /// 현재 시각 공급자
    clock: Arc<dyn Clock>,
    /// 단계별 출력
    output: StageOutput,
    /// 처리 통계
    stats: PipelineStats,
}

impl<S: Sink> LogPipeline<S> {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// 라인 하나를 추출 → 레코드 생성 → 디스패치합니다.
    ///
    /// 패턴 불일치는 에러가 아니며, 필수 필드만 가진 레코드가 만들어집니다.
    pub async fn process_line(&mut self, line: &str) -> Result<(), LogPipelineError> {
        self.output.raw_line(line)?;

        let extracted = match extract_match(&self.pattern, line) {
            Some(fields) => fields,
            None => {
                self.stats.lines_unmatched += 1;
                metrics::counter!(m::LINES_UNMATCHED_TOTAL).increment(1);
                tracing::trace!("line did not match pattern");
                FieldSet::new()
            }
        };

        let now = self.clock.now();
        let record = self.builder.build(line, extracted, &now);
        self.output.record(&record)?;

        self.dispatcher.dispatch(record).await?;
        self.stats.operations_dispatched = self.dispatcher.dispatched();
        Ok(())
    }

    /// 라인 소스가 끝나거나 `stop`이 완료될 때까지 실행한 뒤 드레인합니다.
    pub async fn run<L, F>(
        mut self,
        mut source: L,
        stop: F,
    ) -> Result<PipelineReport, LogPipelineError>
    where
        L: LineSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let source_name = source.name().to_owned();
        tracing::info!(
            source = source_name.as_str(),
            pattern = self.pattern.name(),
            "log pipeline started"
        );

        let outcome: Result<StopReason, LogPipelineError> = loop {
            let next = tokio::select! {
                biased;
                () = &mut stop => break Ok(StopReason::StopRequested),
                next = source.next_line() => next,
            };

            match next {
                Ok(Some(line)) => {
                    self.stats.lines_read += 1;
                    metrics::counter!(m::LINES_READ_TOTAL, m::LABEL_SOURCE => source_name.clone())
                        .increment(1);

                    match self.process_line(&line).await {
                        Ok(()) => {}
                        Err(e @ LogPipelineError::Serialization(_)) => {
                            tracing::error!(error = %e, "document serialization failed, aborting");
                            return Err(e);
                        }
                        Err(e) => break Err(e),
                    }
                }
                Ok(None) => break Ok(StopReason::EndOfInput),
                Err(e) => {
                    tracing::error!(
                        source = source_name.as_str(),
                        error = %e,
                        "line source failed"
                    );
                    break Err(e.into());
                }
            }
        };

        match &outcome {
            Ok(reason) => tracing::info!(
                ?reason,
                lines = self.stats.lines_read,
                unmatched = self.stats.lines_unmatched,
                "log pipeline stopping"
            ),
            Err(e) => tracing::error!(error = %e, "log pipeline stopping on error"),
        }

        let stats = self.stats;
        let drain = self.dispatcher.shutdown().await;

        outcome.map(|stopped_by| PipelineReport {
            stats,
            drain,
            stopped_by,
        })
    }
}

/// 로그 파이프라인 빌더
///
/// 패턴 해석, 템플릿 해석, 드레인 유예 시간 검증을 라인 처리 전에 모두 수행합니다.
pub struct LogPipelineBuilder<S: Sink> {
    config: PipelineConfig,
    sink: S,
    registry: PatternRegistry,
    clock: Arc<dyn Clock>,
    writers: Option<(Box<dyn Write + Send>, Box<dyn Write + Send>)>,
}

impl<S: Sink> LogPipelineBuilder<S> {
    /// 싱크로 새 빌더를 생성합니다.
    pub fn new(sink: S) -> Self {
        Self {
            config: PipelineConfig::default(),
            sink,
            registry: PatternRegistry::builtin(),
            clock: Arc::new(SystemClock),
            writers: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 패턴 레지스트리를 지정합니다.
    pub fn registry(mut self, registry: PatternRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 시계를 지정합니다.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 진단/에코 출력 대상을 지정합니다. 지정하지 않으면 stderr/stdout을 사용합니다.
    pub fn output_writers(
        mut self,
        diagnostics: Box<dyn Write + Send>,
        echo: Box<dyn Write + Send>,
    ) -> Self {
        self.writers = Some((diagnostics, echo));
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<LogPipeline<S>, LogPipelineError> {
        self.config.validate()?;

        let pattern = self.registry.resolve(&self.config.pattern)?;
        let template = IndexTemplate::new(self.config.index_template.as_str())?;
        let dispatcher = Dispatcher::new(
            self.sink,
            self.config.document_type.as_str(),
            self.config.drain_grace,
        )?;

        let mode = self.config.output_mode;
        let mut output = match self.writers {
            Some((diagnostics, echo)) => StageOutput::new(mode, diagnostics, echo),
            None => StageOutput::stdio(mode),
        };
        output.pattern(&pattern)?;

        tracing::info!(
            pattern = pattern.name(),
            template = template.as_str(),
            output = ?mode,
            grace_ms = self.config.drain_grace.as_millis() as u64,
            "log pipeline configured"
        );

        Ok(LogPipeline {
            pattern,
            builder: RecordBuilder::new(template),
            dispatcher,
            clock: self.clock,
            output,
            stats: PipelineStats::default(),
        })
    }
}

//! 디스패처 -- 레코드를 직렬화하여 싱크에 넘기고, 종료 드레인을 책임집니다.
//!
//! # 드레인 계약
//! 1. 유예 시간 마감(`now + grace`)을 정합니다. 유예 시간은 싱크의 플러시 간격보다 깁니다.
//! 2. 마감 안에서 싱크의 `close()` 완료 응답을 기다립니다.
//! 3. 응답 여부와 관계없이 마감 전에는 반환하지 않습니다.

use std::time::Duration;

use tokio::time::Instant;

use logship_core::metrics as m;
use logship_core::pipeline::Sink;
use logship_core::types::{IndexOperation, IndexRecord};

use crate::error::LogPipelineError;

/// 드레인 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// 싱크에 넘긴 오퍼레이션 수
    pub dispatched: u64,
    /// 싱크가 마감 안에 드레인 완료를 알렸는지 여부
    pub acknowledged: bool,
}

/// 허용되는 최대 드레인 유예 시간
pub const MAX_DRAIN_GRACE: Duration = Duration::from_secs(3600);

/// 디스패처
pub struct Dispatcher<S: Sink> {
    sink: S,
    document_kind: String,
    grace: Duration,
    dispatched: u64,
}

impl<S: Sink> Dispatcher<S> {
    /// 디스패처를 생성합니다.
    ///
    /// 유예 시간이 싱크의 플러시 간격 이하이면 설정 에러입니다.
    pub fn new(
        sink: S,
        document_kind: impl Into<String>,
        grace: Duration,
    ) -> Result<Self, LogPipelineError> {
        let flush_interval = sink.flush_interval();
        if grace <= flush_interval {
            return Err(LogPipelineError::Config {
                field: "drain_grace".to_owned(),
                reason: format!(
                    "must be longer than the sink flush interval ({}ms), got {}ms",
                    flush_interval.as_millis(),
                    grace.as_millis()
                ),
            });
        }
        if grace > MAX_DRAIN_GRACE {
            return Err(LogPipelineError::Config {
                field: "drain_grace".to_owned(),
                reason: format!(
                    "must be at most {}ms, got {}ms",
                    MAX_DRAIN_GRACE.as_millis(),
                    grace.as_millis()
                ),
            });
        }

        Ok(Self {
            sink,
            document_kind: document_kind.into(),
            grace,
            dispatched: 0,
        })
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// 지금까지 넘긴 오퍼레이션 수
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// 레코드를 `index` 오퍼레이션으로 만들어 싱크 큐에 넣습니다.
    ///
    /// 싱크 큐가 가득 차면 자리가 날 때까지 대기합니다.
    /// 직렬화 실패는 불변식 위반이므로 라인을 건너뛰지 않고 에러를 반환합니다.
    pub async fn dispatch(&mut self, record: IndexRecord) -> Result<(), LogPipelineError> {
        let document = serde_json::to_string(&record.fields)?;
        let op = IndexOperation::index(record.destination, document)
            .with_document_kind(self.document_kind.as_str());

        self.sink.enqueue(op).await?;
        self.dispatched += 1;
        metrics::counter!(m::OPERATIONS_DISPATCHED_TOTAL).increment(1);
        Ok(())
    }

    /// 드레인을 수행하고 싱크를 정리합니다.
    pub async fn shutdown(mut self) -> DrainReport {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.grace)
            .unwrap_or(started + MAX_DRAIN_GRACE);
        tracing::info!(
            dispatched = self.dispatched,
            grace_ms = self.grace.as_millis() as u64,
            "draining sink"
        );

        let acknowledged = match tokio::time::timeout_at(deadline, self.sink.close()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "sink reported a drain failure");
                false
            }
            Err(_) => {
                tracing::warn!("sink did not acknowledge drain within grace period");
                false
            }
        };

        tokio::time::sleep_until(deadline).await;

        tracing::info!(
            dispatched = self.dispatched,
            acknowledged,
            "drain complete"
        );
        DrainReport {
            dispatched: self.dispatched,
            acknowledged,
        }
    }
}

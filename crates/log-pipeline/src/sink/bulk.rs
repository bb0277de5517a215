//! 배치 bulk 싱크 액터
//!
//! [`BulkSink`]는 별도 태스크에서 오퍼레이션 버퍼를 소유하고, 핸들은 bounded 채널로
//! 명령을 보냅니다. 채널이 가득 차면 `enqueue`가 대기합니다.
//!
//! ```text
//! Dispatcher -> BulkSinkHandle --(mpsc, bounded)--> BulkSink task -> OperationBuffer
//!                                                        |  batch full / tick / close
//!                                                        v
//!                                                  BulkTransport::send
//! ```
//!
//! 닫기 명령은 같은 채널로 전달되므로, 그 전에 넣은 오퍼레이션이 모두 플러시된 뒤
//! `oneshot`으로 완료가 응답됩니다.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use logship_core::config::SinkConfig;
use logship_core::error::SinkError;
use logship_core::metrics as m;
use logship_core::pipeline::Sink;
use logship_core::types::IndexOperation;

use super::transport::{BulkTransport, encode_bulk_body};
use crate::buffer::OperationBuffer;

/// bulk 싱크 설정
#[derive(Debug, Clone)]
pub struct BulkSinkConfig {
    /// 타이머 플러시 간격
    pub flush_interval: Duration,
    /// 이 개수만큼 모이면 즉시 플러시
    pub max_batch_actions: usize,
    /// 입력 채널 용량
    pub queue_capacity: usize,
}

impl Default for BulkSinkConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_millis(1000),
            max_batch_actions: 1000,
            queue_capacity: 4096,
        }
    }
}

impl BulkSinkConfig {
    /// core의 `[sink]` 설정에서 생성합니다.
    pub fn from_core(core: &SinkConfig) -> Self {
        Self {
            flush_interval: Duration::from_millis(core.flush_interval_ms),
            max_batch_actions: core.max_batch_actions.max(1),
            queue_capacity: core.queue_capacity.max(1),
        }
    }
}

/// 싱크 수명 동안의 전송 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// 보낸 bulk 요청 수
    pub requests: u64,
    /// 백엔드가 받아들인 오퍼레이션 수
    pub delivered: u64,
    /// 전달되지 못한 오퍼레이션 수 (요청 실패 + 개별 액션 실패)
    pub failed: u64,
}

#[derive(Debug)]
enum SinkCommand {
    Enqueue(IndexOperation),
    Close(oneshot::Sender<FlushSummary>),
}

/// 싱크 액터
pub struct BulkSink<T: BulkTransport> {
    config: BulkSinkConfig,
    transport: T,
    buffer: OperationBuffer,
    rx: mpsc::Receiver<SinkCommand>,
    summary: FlushSummary,
}

impl<T: BulkTransport> BulkSink<T> {
    /// 싱크 태스크를 스폰하고 핸들을 반환합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    pub fn spawn(config: BulkSinkConfig, transport: T) -> BulkSinkHandle {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let flush_interval = config.flush_interval;
        let sink = Self {
            buffer: OperationBuffer::new(config.max_batch_actions.max(1)),
            config,
            transport,
            rx,
            summary: FlushSummary::default(),
        };
        let task = tokio::spawn(sink.run());

        BulkSinkHandle {
            tx: Some(tx),
            flush_interval,
            task: Some(task),
            summary: None,
        }
    }

    async fn run(mut self) {
        let period = self.config.flush_interval.max(Duration::from_millis(1));
        let now = Instant::now();
        let mut ticker = tokio::time::interval_at(now.checked_add(period).unwrap_or(now), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(
            flush_ms = period.as_millis() as u64,
            max_batch = self.config.max_batch_actions,
            "bulk sink started"
        );

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(SinkCommand::Enqueue(op)) => {
                        self.buffer.push(op);
                        if self.buffer.should_flush() {
                            self.flush("batch_full").await;
                        }
                    }
                    Some(SinkCommand::Close(ack)) => {
                        self.flush("close").await;
                        if ack.send(self.summary).is_err() {
                            tracing::debug!("close requester went away before acknowledgement");
                        }
                        break;
                    }
                    None => {
                        self.flush("handle_dropped").await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if !self.buffer.is_empty() {
                        self.flush("timer").await;
                    }
                }
            }
        }

        tracing::debug!(
            requests = self.summary.requests,
            delivered = self.summary.delivered,
            failed = self.summary.failed,
            "bulk sink stopped"
        );
    }

    async fn flush(&mut self, reason: &'static str) {
        if self.buffer.is_empty() {
            return;
        }
        let ops = self.buffer.drain_all();
        let actions = ops.len();
        let actions_u64 = actions as u64;

        let body = match encode_bulk_body(&ops) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, actions, "failed to encode bulk batch, dropped");
                self.summary.failed += actions_u64;
                return;
            }
        };

        self.summary.requests += 1;
        match self.transport.send(body, actions).await {
            Ok(response) => {
                metrics::counter!(m::SINK_BULK_REQUESTS_TOTAL, m::LABEL_RESULT => "success")
                    .increment(1);
                let failed = (response.failed_items as u64).min(actions_u64);
                if response.errors || failed > 0 {
                    tracing::warn!(actions, failed, reason, "bulk request had item failures");
                    metrics::counter!(m::SINK_ACTIONS_FAILED_TOTAL).increment(failed);
                } else {
                    tracing::debug!(actions, reason, "bulk batch flushed");
                }
                self.summary.delivered += actions_u64 - failed;
                self.summary.failed += failed;
            }
            Err(e) => {
                metrics::counter!(m::SINK_BULK_REQUESTS_TOTAL, m::LABEL_RESULT => "failure")
                    .increment(1);
                metrics::counter!(m::SINK_BULK_FAILURES_TOTAL).increment(1);
                tracing::warn!(error = %e, actions, reason, "bulk request failed, batch dropped");
                self.summary.failed += actions_u64;
            }
        }
    }
}

/// 싱크 핸들 -- core의 [`Sink`] trait 구현
pub struct BulkSinkHandle {
    tx: Option<mpsc::Sender<SinkCommand>>,
    flush_interval: Duration,
    task: Option<JoinHandle<()>>,
    summary: Option<FlushSummary>,
}

impl BulkSinkHandle {
    /// 닫기가 확인된 경우 전송 통계를 반환합니다.
    pub fn summary(&self) -> Option<FlushSummary> {
        self.summary
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

impl Sink for BulkSinkHandle {
    async fn enqueue(&mut self, op: IndexOperation) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Closed)?;
        tx.send(SinkCommand::Enqueue(op))
            .await
            .map_err(|_| SinkError::Closed)
    }

    fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(SinkCommand::Close(ack_tx))
            .await
            .map_err(|_| SinkError::DrainLost("sink task is not running".to_owned()))?;
        let summary = ack_rx
            .await
            .map_err(|_| SinkError::DrainLost("sink task dropped the acknowledgement".to_owned()))?;

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "bulk sink task ended abnormally");
            }
        }

        tracing::info!(
            requests = summary.requests,
            delivered = summary.delivered,
            failed = summary.failed,
            "bulk sink drained"
        );
        self.summary = Some(summary);
        Ok(())
    }
}

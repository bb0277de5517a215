//! 오퍼레이션 버퍼 -- bulk 싱크의 인메모리 배치 버퍼
//!
//! [`OperationBuffer`]는 싱크 액터가 소유하며, 배치 크기 또는 플러시 타이머에 따라
//! 한 번에 비워집니다. 입력 큐가 bounded 채널이므로 버퍼 자체는 드롭 정책이 없습니다.
//! 채널이 가득 차면 `enqueue`가 대기하는 것이 backpressure 경로입니다.

use logship_core::metrics as m;
use logship_core::types::IndexOperation;

/// 인메모리 오퍼레이션 버퍼
pub struct OperationBuffer {
    /// 버퍼 내부 저장소 (도착 순서 유지)
    buffer: Vec<IndexOperation>,
    /// 이 개수만큼 모이면 플러시
    batch_size: usize,
    /// 총 유입 오퍼레이션 카운터
    total_received: u64,
}

impl OperationBuffer {
    /// 새 버퍼를 생성합니다.
    pub fn new(batch_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(batch_size.min(10_000)),
            batch_size,
            total_received: 0,
        }
    }

    /// 오퍼레이션을 추가합니다.
    pub fn push(&mut self, op: IndexOperation) {
        self.total_received += 1;
        self.buffer.push(op);
        self.report_depth();
    }

    /// 버퍼의 모든 오퍼레이션을 도착 순서대로 꺼냅니다.
    pub fn drain_all(&mut self) -> Vec<IndexOperation> {
        let batch = std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.batch_size.min(10_000)),
        );
        self.report_depth();
        batch
    }

    /// 현재 버퍼에 저장된 오퍼레이션 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// 버퍼가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// 배치 크기를 반환합니다.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 총 유입 오퍼레이션 수를 반환합니다.
    pub fn total_received(&self) -> u64 {
        self.total_received
    }

    /// 배치 플러시 조건을 확인합니다.
    pub fn should_flush(&self) -> bool {
        self.buffer.len() >= self.batch_size
    }

    fn report_depth(&self) {
        metrics::gauge!(m::SINK_QUEUE_DEPTH).set(self.buffer.len() as f64);
    }
}

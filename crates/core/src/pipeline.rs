//! 파이프라인 trait -- 외부 협력자 경계 정의
//!
//! 코어 파이프라인은 라인 소스와 싱크를 구현체가 아닌 능력(capability)으로만 다룹니다.
//! stdin 리더와 파일 추적기는 [`LineSource`]를, 배치 인덱싱 클라이언트는 [`Sink`]를 구현합니다.

use std::future::Future;
use std::time::Duration;

use crate::error::{SinkError, SourceError};
use crate::types::IndexOperation;

/// 원시 라인 공급자
///
/// 라인 종결자가 제거된 텍스트 라인을 순서대로 반환합니다.
/// 입력이 끝나면 `Ok(None)`, 읽기 실패 시 `Err`를 반환합니다.
pub trait LineSource: Send {
    /// 소스 식별자 (예: `"stdin"`, `"file:/var/log/app.log"`)
    fn name(&self) -> &str;

    /// 다음 라인을 읽습니다.
    fn next_line(&mut self) -> impl Future<Output = Result<Option<String>, SourceError>> + Send;
}

/// 배치 인덱싱 싱크
///
/// # 구현 규칙
/// - `enqueue`는 오퍼레이션을 내부 큐에 넣는 데 필요한 만큼만 대기합니다.
///   큐가 가득 차면 대기할 수 있으며, 이것이 의도된 backpressure 경로입니다.
/// - 배치 구성과 플러시 타이밍은 싱크가 소유합니다.
/// - `close`는 큐에 남은 오퍼레이션을 플러시한 뒤 완료를 알립니다.
pub trait Sink: Send {
    /// 오퍼레이션을 싱크 큐에 넣습니다. 소유권이 싱크로 넘어갑니다.
    fn enqueue(&mut self, op: IndexOperation) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// 싱크의 타이머 플러시 간격
    fn flush_interval(&self) -> Duration;

    /// 남은 오퍼레이션을 모두 플러시하고 완료를 기다립니다.
    fn close(&mut self) -> impl Future<Output = Result<(), SinkError>> + Send;
}

//! 인덱싱 싱크
//!
//! - [`bulk`]: 배치/타이머 플러시/드레인 응답을 담당하는 싱크 액터
//! - [`transport`]: bulk NDJSON 인코딩과 HTTP 전송

pub mod bulk;
pub mod transport;

pub use bulk::{BulkSink, BulkSinkConfig, BulkSinkHandle, FlushSummary};
pub use transport::{BulkResponse, BulkTransport, HttpBulkTransport, encode_bulk_body};

//! bulk 전송 -- 배치를 NDJSON 본문으로 인코딩하여 인덱싱 백엔드로 보냅니다.
//!
//! 오퍼레이션마다 액션 라인과 문서 라인 두 줄이 붙습니다.
//!
//! ```text
//! {"index":{"_index":"logstash-20160218","_type":"legos"}}
//! {"@timestamp":"...","message":"..."}
//! ```
//!
//! 문서 ID는 지정하지 않습니다. 재시도는 하지 않습니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use logship_core::config::SinkConfig;
use logship_core::error::SinkError;
use logship_core::types::IndexOperation;

/// bulk 요청 한 번의 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkResponse {
    /// 백엔드가 하나 이상의 액션 실패를 보고했는지 여부
    pub errors: bool,
    /// 실패한 개별 액션 수
    pub failed_items: usize,
}

impl BulkResponse {
    /// bulk 응답 본문을 해석합니다.
    ///
    /// 본문이 bulk 응답 형식이 아니면 실패 없음으로 간주합니다.
    pub fn parse(body: &str) -> Self {
        #[derive(Deserialize)]
        struct ItemResult {
            #[serde(default)]
            status: u16,
            #[serde(default)]
            error: Option<serde_json::Value>,
        }

        #[derive(Deserialize)]
        struct RawResponse {
            #[serde(default)]
            errors: bool,
            #[serde(default)]
            items: Vec<HashMap<String, ItemResult>>,
        }

        match serde_json::from_str::<RawResponse>(body) {
            Ok(raw) => {
                let failed_items = raw
                    .items
                    .iter()
                    .flat_map(HashMap::values)
                    .filter(|item| item.error.is_some() || item.status >= 300)
                    .count();
                Self {
                    errors: raw.errors,
                    failed_items,
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "unrecognized bulk response body");
                Self::default()
            }
        }
    }
}

/// 인코딩된 배치 하나를 전송하는 능력
pub trait BulkTransport: Send + Sync + 'static {
    /// NDJSON 본문을 전송합니다. `actions`는 본문에 담긴 오퍼레이션 수입니다.
    fn send(
        &self,
        body: String,
        actions: usize,
    ) -> impl Future<Output = Result<BulkResponse, SinkError>> + Send;
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_type")]
    document_kind: &'a str,
}

/// 배치를 bulk NDJSON 본문으로 인코딩합니다. 각 줄은 `\n`으로 끝납니다.
pub fn encode_bulk_body(ops: &[IndexOperation]) -> Result<String, SinkError> {
    let mut body = String::new();
    for op in ops {
        let meta = ActionMeta {
            index: op.destination(),
            document_kind: op.document_kind(),
        };
        let mut action = serde_json::Map::with_capacity(1);
        action.insert(
            op.kind().as_str().to_owned(),
            serde_json::to_value(&meta)
                .map_err(|e| SinkError::Transport(format!("encode action line: {e}")))?,
        );
        let line = serde_json::to_string(&action)
            .map_err(|e| SinkError::Transport(format!("encode action line: {e}")))?;

        body.push_str(&line);
        body.push('\n');
        body.push_str(op.document());
        body.push('\n');
    }
    Ok(body)
}

/// 호스트 문자열을 bulk 엔드포인트 URL로 바꿉니다.
///
/// 스킴이 없으면 `http://`를 붙입니다.
pub fn bulk_endpoint(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}/_bulk")
    } else {
        format!("http://{host}/_bulk")
    }
}

/// reqwest 기반 HTTP bulk 전송
///
/// 요청마다 호스트를 라운드로빈으로 돌아가며 사용합니다.
#[derive(Debug)]
pub struct HttpBulkTransport {
    client: reqwest::Client,
    endpoints: Vec<String>,
    next: AtomicUsize,
}

impl HttpBulkTransport {
    pub fn new(hosts: &[String], request_timeout: Duration) -> Result<Self, SinkError> {
        let endpoints: Vec<String> = hosts
            .iter()
            .filter(|h| !h.trim().is_empty())
            .map(|h| bulk_endpoint(h))
            .collect();
        if endpoints.is_empty() {
            return Err(SinkError::Transport("no sink hosts configured".to_owned()));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SinkError::Transport(format!("build http client: {e}")))?;

        Ok(Self {
            client,
            endpoints,
            next: AtomicUsize::new(0),
        })
    }

    /// core의 `[sink]` 설정에서 전송기를 생성합니다.
    pub fn from_core(core: &SinkConfig) -> Result<Self, SinkError> {
        Self::new(&core.hosts, Duration::from_secs(core.request_timeout_secs))
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    fn next_endpoint(&self) -> &str {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[index]
    }
}

impl BulkTransport for HttpBulkTransport {
    async fn send(&self, body: String, actions: usize) -> Result<BulkResponse, SinkError> {
        let endpoint = self.next_endpoint();
        tracing::debug!(endpoint, actions, bytes = body.len(), "sending bulk request");

        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| SinkError::Transport(format!("{endpoint}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(format!("{endpoint}: read response: {e}")))?;

        if !status.is_success() {
            let snippet: String = text.chars().take(256).collect();
            return Err(SinkError::Transport(format!(
                "{endpoint}: status {status}: {snippet}"
            )));
        }

        Ok(BulkResponse::parse(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_writes_action_and_document_lines() {
        let ops = vec![
            IndexOperation::index("logstash-20160218", r#"{"message":"a"}"#),
            IndexOperation::index("logstash-20160219", r#"{"message":"b"}"#),
        ];
        let body = encode_bulk_body(&ops).unwrap();
        assert_eq!(
            body,
            concat!(
                r#"{"index":{"_index":"logstash-20160218","_type":"legos"}}"#,
                "\n",
                r#"{"message":"a"}"#,
                "\n",
                r#"{"index":{"_index":"logstash-20160219","_type":"legos"}}"#,
                "\n",
                r#"{"message":"b"}"#,
                "\n",
            )
        );
    }

    #[test]
    fn encode_has_no_document_id() {
        let ops = vec![IndexOperation::index("idx", "{}")];
        let body = encode_bulk_body(&ops).unwrap();
        assert!(!body.contains("_id"));
    }

    #[test]
    fn encode_empty_batch_is_empty() {
        assert!(encode_bulk_body(&[]).unwrap().is_empty());
    }

    #[test]
    fn endpoint_adds_scheme_and_path() {
        assert_eq!(bulk_endpoint("localhost:9200"), "http://localhost:9200/_bulk");
        assert_eq!(
            bulk_endpoint("https://es.example.com/"),
            "https://es.example.com/_bulk"
        );
    }

    #[test]
    fn transport_rotates_hosts() {
        let hosts = vec!["es1:9200".to_owned(), " ".to_owned(), "es2:9200".to_owned()];
        let transport = HttpBulkTransport::new(&hosts, Duration::from_secs(1)).unwrap();
        assert_eq!(transport.endpoints().len(), 2);
        assert_eq!(transport.next_endpoint(), "http://es1:9200/_bulk");
        assert_eq!(transport.next_endpoint(), "http://es2:9200/_bulk");
        assert_eq!(transport.next_endpoint(), "http://es1:9200/_bulk");
    }

    #[test]
    fn transport_requires_a_host() {
        let result = HttpBulkTransport::new(&[], Duration::from_secs(1));
        assert!(matches!(result, Err(SinkError::Transport(_))));
    }

    #[test]
    fn parse_counts_failed_items() {
        let body = r#"{"took":3,"errors":true,"items":[
            {"index":{"_index":"a","status":201}},
            {"index":{"_index":"a","status":400,"error":{"type":"mapper_parsing_exception"}}},
            {"index":{"_index":"a","status":429}}
        ]}"#;
        let response = BulkResponse::parse(body);
        assert!(response.errors);
        assert_eq!(response.failed_items, 2);
    }

    #[test]
    fn parse_success_and_garbage() {
        let ok = BulkResponse::parse(r#"{"took":1,"errors":false,"items":[{"index":{"status":201}}]}"#);
        assert_eq!(ok, BulkResponse::default());
        assert_eq!(BulkResponse::parse("not json"), BulkResponse::default());
    }
}

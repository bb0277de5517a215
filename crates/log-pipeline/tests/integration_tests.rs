//! 통합 테스트 -- 파이프라인 전체 흐름 검증
//!
//! 라인 소스에서 싱크 전달, 종료 드레인까지의 전체 파이프라인을 검증합니다.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::DateTime;
use tokio::sync::mpsc;
use tokio::time::Instant;

use logship_core::error::{SinkError, SourceError};
use logship_core::pipeline::{LineSource, Sink};
use logship_core::types::{FieldSet, IndexOperation};
use logship_pipeline::sink::{BulkResponse, BulkTransport};
use logship_pipeline::{
    BulkSink, BulkSinkConfig, ErrorClass, FixedClock, LogPipelineBuilder, LogPipelineError,
    OutputMode, PipelineConfig, PipelineConfigBuilder, PatternSelection, ReaderSource, StopReason,
};

const GLOG_LINE: &str = "I0618 10:05:22.123456 12345 server.go:42] request failed: timeout";
const ACCESS_LINE: &str = r#"1.2.3.4 - - [18/Feb/2016:10:05:22 +0000] "GET /x HTTP/1.1" 200 1090"#;

/// 받은 오퍼레이션을 기록하는 테스트 싱크
#[derive(Clone, Default)]
struct RecordingSink {
    ops: Arc<Mutex<Vec<IndexOperation>>>,
    closed: Arc<Mutex<bool>>,
}

impl RecordingSink {
    fn operations(&self) -> Vec<IndexOperation> {
        self.ops.lock().unwrap().clone()
    }

    fn documents(&self) -> Vec<FieldSet> {
        self.operations()
            .iter()
            .map(|op| serde_json::from_str(op.document()).unwrap())
            .collect()
    }

    fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

impl Sink for RecordingSink {
    async fn enqueue(&mut self, op: IndexOperation) -> Result<(), SinkError> {
        self.ops.lock().unwrap().push(op);
        Ok(())
    }

    fn flush_interval(&self) -> Duration {
        Duration::from_millis(100)
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// 몇 줄을 내보낸 뒤 읽기 실패를 반환하는 소스
struct FailingSource {
    lines: Vec<String>,
}

impl LineSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        if self.lines.is_empty() {
            return Err(SourceError::Read {
                source_name: "failing".to_owned(),
                reason: "device went away".to_owned(),
            });
        }
        Ok(Some(self.lines.remove(0)))
    }
}

/// 입력 종료를 알리지 않는 소스 (파일 추적과 같은 동작)
struct EndlessSource;

impl LineSource for EndlessSource {
    fn name(&self) -> &str {
        "endless"
    }

    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        std::future::pending().await
    }
}

/// 공유 버퍼 writer
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        DateTime::parse_from_rfc3339("2016-02-18T10:05:22.5+00:00").unwrap(),
    ))
}

fn config(pattern: PatternSelection) -> PipelineConfig {
    PipelineConfigBuilder::new()
        .pattern(pattern)
        .drain_grace(Duration::from_millis(500))
        .build()
        .unwrap()
}

fn builder<S: Sink>(sink: S, config: PipelineConfig) -> LogPipelineBuilder<S> {
    LogPipelineBuilder::new(sink)
        .config(config)
        .clock(clock())
        .output_writers(Box::new(io::sink()), Box::new(io::sink()))
}

async fn run_input(pattern: PatternSelection, input: &str) -> RecordingSink {
    let sink = RecordingSink::default();
    let pipeline = builder(sink.clone(), config(pattern)).build().unwrap();
    let report = pipeline
        .run(ReaderSource::new("test", input.as_bytes()), std::future::pending())
        .await
        .unwrap();
    assert_eq!(report.stopped_by, StopReason::EndOfInput);
    sink
}

#[tokio::test(start_paused = true)]
async fn test_glog_line_fields() {
    let sink = run_input(PatternSelection::Named("glog".to_owned()), GLOG_LINE).await;

    let docs = sink.documents();
    assert_eq!(docs.len(), 1);
    let doc = &docs[0];
    assert_eq!(doc.get("file"), Some("server.go"));
    assert_eq!(doc.get("msg"), Some("request failed: timeout"));
    assert_eq!(doc.get("msgcore"), Some("request failed:"));
    assert_eq!(doc.get("message"), Some(GLOG_LINE));
    assert_eq!(
        doc.get("@timestamp"),
        Some("2016-02-18T10:05:22.500000000+00:00")
    );
    assert_eq!(doc.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_non_matching_line_has_only_mandatory_fields() {
    let sink = run_input(
        PatternSelection::Named("glog".to_owned()),
        "not a matching line at all",
    )
    .await;

    let docs = sink.documents();
    assert_eq!(docs.len(), 1);
    let names: Vec<_> = docs[0].iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["@timestamp", "message"]);
    assert_eq!(docs[0].get("message"), Some("not a matching line at all"));
}

#[tokio::test(start_paused = true)]
async fn test_access_log_fields() {
    let sink = run_input(PatternSelection::Named("apache-access".to_owned()), ACCESS_LINE).await;

    let doc = &sink.documents()[0];
    assert_eq!(doc.get("remote"), Some("1.2.3.4"));
    assert_eq!(doc.get("method"), Some("GET"));
    assert_eq!(doc.get("path"), Some("/x"));
    assert_eq!(doc.get("code"), Some("200"));
    assert_eq!(doc.get("size"), Some("1090"));
    assert_eq!(doc.get("referer"), Some(""));
    assert_eq!(doc.get("agent"), Some(""));
}

#[tokio::test(start_paused = true)]
async fn test_operation_envelope() {
    let sink = run_input(PatternSelection::default(), GLOG_LINE).await;

    let ops = sink.operations();
    assert_eq!(ops[0].kind().as_str(), "index");
    assert_eq!(ops[0].destination(), "logstash-20160218");
    assert_eq!(ops[0].document_kind(), "legos");
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_order_matches_input_order() {
    let input: String = (0..50).map(|n| format!("line number {n}\n")).collect();
    let sink = run_input(PatternSelection::default(), &input).await;

    let messages: Vec<String> = sink
        .documents()
        .iter()
        .map(|doc| doc.get("message").unwrap().to_owned())
        .collect();
    let expected: Vec<String> = (0..50).map(|n| format!("line number {n}")).collect();
    assert_eq!(messages, expected);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_drain_grace() {
    let sink = RecordingSink::default();
    let pipeline = builder(sink.clone(), config(PatternSelection::default()))
        .build()
        .unwrap();

    let started = Instant::now();
    let report = pipeline
        .run(ReaderSource::new("test", GLOG_LINE.as_bytes()), std::future::pending())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(500));
    assert!(report.drain.acknowledged);
    assert_eq!(report.drain.dispatched, 1);
    assert_eq!(report.stats.lines_read, 1);
    assert!(sink.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_empty_input_still_drains() {
    let sink = RecordingSink::default();
    let pipeline = builder(sink.clone(), config(PatternSelection::default()))
        .build()
        .unwrap();

    let started = Instant::now();
    let report = pipeline
        .run(ReaderSource::new("test", &b""[..]), std::future::pending())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(report.drain.dispatched, 0);
    assert!(sink.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_stop_request_ends_endless_source() {
    let sink = RecordingSink::default();
    let pipeline = builder(sink.clone(), config(PatternSelection::default()))
        .build()
        .unwrap();

    let report = pipeline
        .run(EndlessSource, tokio::time::sleep(Duration::from_secs(3)))
        .await
        .unwrap();

    assert_eq!(report.stopped_by, StopReason::StopRequested);
    assert!(sink.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_read_error_is_surfaced_after_drain() {
    let sink = RecordingSink::default();
    let pipeline = builder(sink.clone(), config(PatternSelection::default()))
        .build()
        .unwrap();

    let source = FailingSource {
        lines: vec!["first".to_owned(), "second".to_owned()],
    };
    let err = pipeline
        .run(source, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LogPipelineError::Source(SourceError::Read { .. })
    ));
    assert_eq!(err.class(), ErrorClass::Runtime);
    assert_eq!(sink.operations().len(), 2);
    assert!(sink.is_closed());
}

#[test]
fn test_missing_pattern_is_rejected_before_processing() {
    let sink = RecordingSink::default();
    let err = builder(sink, config(PatternSelection::Freeform(String::new())))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, LogPipelineError::NoPattern));
    assert_eq!(err.class(), ErrorClass::Pattern);
}

#[tokio::test(start_paused = true)]
async fn test_verbose_trace_output() {
    let diag = SharedBuf::default();
    let echo = SharedBuf::default();
    let config = PipelineConfigBuilder::new()
        .pattern(PatternSelection::Named("glog".to_owned()))
        .output_mode(OutputMode::Verbose)
        .drain_grace(Duration::from_millis(500))
        .build()
        .unwrap();

    let pipeline = LogPipelineBuilder::new(RecordingSink::default())
        .config(config)
        .clock(clock())
        .output_writers(Box::new(diag.clone()), Box::new(echo.clone()))
        .build()
        .unwrap();
    pipeline
        .run(ReaderSource::new("test", GLOG_LINE.as_bytes()), std::future::pending())
        .await
        .unwrap();

    let trace = diag.contents();
    assert!(trace.contains("using pattern glog"));
    assert!(trace.contains(&format!("line: {GLOG_LINE:?}")));
    assert!(trace.contains("index: logstash-20160218"));
    assert!(trace.contains("  file: \"server.go\""));
    assert!(echo.contents().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_echo_output() {
    let diag = SharedBuf::default();
    let echo = SharedBuf::default();
    let config = PipelineConfigBuilder::new()
        .output_mode(OutputMode::Echo)
        .drain_grace(Duration::from_millis(500))
        .build()
        .unwrap();

    let pipeline = LogPipelineBuilder::new(RecordingSink::default())
        .config(config)
        .clock(clock())
        .output_writers(Box::new(diag.clone()), Box::new(echo.clone()))
        .build()
        .unwrap();
    pipeline
        .run(
            ReaderSource::new("test", "a\r\nb\n".as_bytes()),
            std::future::pending(),
        )
        .await
        .unwrap();

    assert_eq!(echo.contents(), "a\nb\n");
    assert!(diag.contents().is_empty());
}

/// 받은 bulk 본문을 채널로 넘기는 전송기
struct ChannelTransport(mpsc::UnboundedSender<String>);

impl BulkTransport for ChannelTransport {
    async fn send(&self, body: String, _actions: usize) -> Result<BulkResponse, SinkError> {
        let _ = self.0.send(body);
        Ok(BulkResponse::default())
    }
}

#[tokio::test(start_paused = true)]
async fn test_bulk_sink_end_to_end() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = BulkSink::spawn(
        BulkSinkConfig {
            flush_interval: Duration::from_millis(200),
            max_batch_actions: 1000,
            queue_capacity: 8,
        },
        ChannelTransport(tx),
    );

    let pipeline = builder(sink, config(PatternSelection::Named("glog".to_owned())))
        .build()
        .unwrap();
    let input = format!("{GLOG_LINE}\nnot a matching line at all\n");
    let report = pipeline
        .run(ReaderSource::new("test", input.as_bytes()), std::future::pending())
        .await
        .unwrap();
    assert!(report.drain.acknowledged);

    let mut bodies = Vec::new();
    while let Ok(body) = rx.try_recv() {
        bodies.push(body);
    }
    let body = bodies.concat();
    let lines: Vec<_> = body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        r#"{"index":{"_index":"logstash-20160218","_type":"legos"}}"#
    );
    let first: FieldSet = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(first.get("file"), Some("server.go"));
    let second: FieldSet = serde_json::from_str(lines[3]).unwrap();
    assert_eq!(second.len(), 2);
}

#[test]
fn test_pipeline_config_from_core_config() {
    let core = logship_core::LogshipConfig::parse(
        r#"
[pattern]
name = "error-log"

[index]
template = "errors-%Y.%m"

[sink]
flush_interval_ms = 200
drain_grace_ms = 400
"#,
    )
    .unwrap();

    let config = PipelineConfig::from_core(&core);
    assert_eq!(config.pattern, PatternSelection::Named("error-log".to_owned()));
    assert_eq!(config.index_template, "errors-%Y.%m");
    assert_eq!(config.drain_grace, Duration::from_millis(400));
}

//! 설정 관리 -- logship.toml 파싱 및 런타임 설정
//!
//! [`LogshipConfig`]는 모든 구성요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGSHIP_SINK_HOSTS=es1:9200,es2:9200` 형식)
//! 3. 설정 파일 (`logship.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logship_core::error::LogshipError> {
//! use logship_core::config::LogshipConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogshipConfig::load("logship.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogshipConfig::parse("[index]\ntemplate = \"app-%Y.%m\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LogshipError};

/// 구조화 로그(glog) 라인 패턴. 자유 형식 패턴의 기본값입니다.
///
/// `I0618 10:05:22.123456 12345 server.go:42] request failed: timeout`
pub const DEFAULT_REGEXP: &str =
    r"^\S+ \S+\s+\d+ (?P<file>[^\s:]+):\d+\] (?P<msg>(?P<msgcore>.*?:)?.*)$";

/// 기본 인덱스 이름 템플릿 (하루에 인덱스 하나)
pub const DEFAULT_INDEX_TEMPLATE: &str = "logstash-%Y%m%d";

const MAX_BATCH_ACTIONS: usize = 100_000;
/// 드레인 유예 시간과 플러시 간격의 상한 (1시간)
const MAX_INTERVAL_MS: u64 = 3_600_000;

/// logship 통합 설정
///
/// `logship.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogshipConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 추출 패턴 선택
    #[serde(default)]
    pub pattern: PatternConfig,
    /// 대상 인덱스 설정
    #[serde(default)]
    pub index: IndexConfig,
    /// bulk 싱크 설정
    #[serde(default)]
    pub sink: SinkConfig,
    /// 라인 소스 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 메트릭 익스포터 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl LogshipConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogshipError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogshipError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogshipError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogshipError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogshipError> {
        toml::from_str(toml_str).map_err(|e| {
            LogshipError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSHIP_{SECTION}_{FIELD}`
    /// 예: `LOGSHIP_INDEX_TEMPLATE=app-%Y.%m.%d`
    ///
    /// 숫자나 불리언으로 해석할 수 없는 값은 [`ConfigError::InvalidValue`]로 보고됩니다.
    /// `LOGSHIP_PATTERN_REGEXP`는 하위 계층의 패턴 이름을 지우고,
    /// `LOGSHIP_PATTERN_NAME`이 함께 있으면 이름이 이깁니다.
    pub fn apply_env_overrides(&mut self) -> Result<(), LogshipError> {
        // General
        override_string(&mut self.general.log_level, "LOGSHIP_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSHIP_GENERAL_LOG_FORMAT");

        // Pattern
        if let Ok(regexp) = std::env::var("LOGSHIP_PATTERN_REGEXP") {
            self.pattern.regexp = regexp;
            self.pattern.name.clear();
        }
        override_string(&mut self.pattern.name, "LOGSHIP_PATTERN_NAME");

        // Index
        override_string(&mut self.index.template, "LOGSHIP_INDEX_TEMPLATE");
        override_string(&mut self.index.document_type, "LOGSHIP_INDEX_DOCUMENT_TYPE");

        // Sink
        override_csv(&mut self.sink.hosts, "LOGSHIP_SINK_HOSTS");
        override_parsed(
            &mut self.sink.flush_interval_ms,
            "LOGSHIP_SINK_FLUSH_INTERVAL_MS",
        )?;
        override_parsed(
            &mut self.sink.max_batch_actions,
            "LOGSHIP_SINK_MAX_BATCH_ACTIONS",
        )?;
        override_parsed(&mut self.sink.queue_capacity, "LOGSHIP_SINK_QUEUE_CAPACITY")?;
        override_parsed(
            &mut self.sink.request_timeout_secs,
            "LOGSHIP_SINK_REQUEST_TIMEOUT_SECS",
        )?;
        override_parsed(&mut self.sink.drain_grace_ms, "LOGSHIP_SINK_DRAIN_GRACE_MS")?;

        // Source
        override_parsed(
            &mut self.source.poll_interval_ms,
            "LOGSHIP_SOURCE_POLL_INTERVAL_MS",
        )?;

        // Metrics
        override_parsed(&mut self.metrics.enabled, "LOGSHIP_METRICS_ENABLED")?;
        override_string(&mut self.metrics.listen_addr, "LOGSHIP_METRICS_LISTEN_ADDR");
        override_parsed(&mut self.metrics.port, "LOGSHIP_METRICS_PORT")?;
        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 패턴 컴파일과 템플릿 해석은 파이프라인 크레이트가 라인 처리 전에 검증합니다.
    pub fn validate(&self) -> Result<(), LogshipError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.index.template.is_empty() {
            return Err(invalid("index.template", "must not be empty"));
        }

        if self.index.document_type.is_empty() {
            return Err(invalid("index.document_type", "must not be empty"));
        }

        if self.sink.hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(invalid("sink.hosts", "at least one host must be configured"));
        }

        if self.sink.flush_interval_ms == 0 || self.sink.flush_interval_ms > MAX_INTERVAL_MS {
            return Err(invalid(
                "sink.flush_interval_ms",
                format!("must be 1-{MAX_INTERVAL_MS}"),
            ));
        }

        if self.sink.drain_grace_ms > MAX_INTERVAL_MS {
            return Err(invalid(
                "sink.drain_grace_ms",
                format!("must be at most {MAX_INTERVAL_MS}"),
            ));
        }

        // 드레인 유예 시간은 플러시 간격보다 반드시 길어야 함
        if self.sink.drain_grace_ms <= self.sink.flush_interval_ms {
            return Err(invalid(
                "sink.drain_grace_ms",
                format!(
                    "must be greater than sink.flush_interval_ms ({})",
                    self.sink.flush_interval_ms
                ),
            ));
        }

        if self.sink.max_batch_actions == 0 || self.sink.max_batch_actions > MAX_BATCH_ACTIONS {
            return Err(invalid(
                "sink.max_batch_actions",
                format!("must be 1-{MAX_BATCH_ACTIONS}"),
            ));
        }

        if self.sink.queue_capacity == 0 {
            return Err(invalid("sink.queue_capacity", "must be greater than 0"));
        }

        if self.sink.request_timeout_secs == 0 {
            return Err(invalid("sink.request_timeout_secs", "must be greater than 0"));
        }

        if self.source.poll_interval_ms == 0 || self.source.poll_interval_ms > MAX_INTERVAL_MS {
            return Err(invalid(
                "source.poll_interval_ms",
                format!("must be 1-{MAX_INTERVAL_MS}"),
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be non-zero when metrics are enabled"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> LogshipError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 추출 패턴 선택
///
/// `name`이 비어있지 않으면 내장 패턴을 이름으로 찾고,
/// 비어있으면 `regexp`를 자유 형식 패턴으로 사용합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// 내장 패턴 식별자
    pub name: String,
    /// 자유 형식 정규식
    pub regexp: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            regexp: DEFAULT_REGEXP.to_owned(),
        }
    }
}

/// 대상 인덱스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// strftime 형식의 인덱스 이름 템플릿
    pub template: String,
    /// bulk 액션의 문서 타입
    pub document_type: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_INDEX_TEMPLATE.to_owned(),
            document_type: crate::types::DOCUMENT_KIND.to_owned(),
        }
    }
}

/// bulk 싱크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// 인덱싱 백엔드 주소 목록 (`host:port` 또는 URL)
    pub hosts: Vec<String>,
    /// 타이머 플러시 간격 (밀리초)
    pub flush_interval_ms: u64,
    /// 이 개수만큼 모이면 즉시 플러시
    pub max_batch_actions: usize,
    /// 싱크 입력 큐 용량
    pub queue_capacity: usize,
    /// bulk 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 종료 시 드레인 유예 시간 (밀리초)
    pub drain_grace_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:9200".to_owned()],
            flush_interval_ms: 1000,
            max_batch_actions: 1000,
            queue_capacity: 4096,
            request_timeout_secs: 30,
            drain_grace_ms: 2000,
        }
    }
}

/// 라인 소스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 파일 추적 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
        }
    }
}

/// 메트릭 익스포터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리스닝 주소
    pub listen_addr: String,
    /// 리스닝 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) -> Result<(), LogshipError> {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.trim().parse().map_err(|_| {
            invalid(
                env_key,
                format!("cannot parse '{val}' as {}", std::any::type_name::<T>()),
            )
        })?;
    }
    Ok(())
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

//! 레코드 생성 -- 원시 라인 + 추출 필드 + 현재 시각 → [`IndexRecord`]
//!
//! - `@timestamp`: 나노초 정밀도, 고정 오프셋 RFC 3339 (UTC로 정규화하지 않음)
//! - `message`: 원시 라인
//! - 추출 필드가 필수 필드와 이름이 같으면 추출 값이 덮어씁니다.
//! - 모든 값은 [`MAX_FIELD_CHARS`] 문자를 넘으면 잘리고 `...`이 붙습니다.
//! - 대상 인덱스 이름은 `@timestamp`와 같은 시각으로 한 번만 계산됩니다.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat, TimeZone};

use logship_core::metrics as m;
use logship_core::types::{FieldSet, IndexRecord, MESSAGE_FIELD, TIMESTAMP_FIELD};

use crate::error::LogPipelineError;

/// 필드 값의 최대 문자 수
pub const MAX_FIELD_CHARS: usize = 30_000;

/// 잘린 값 뒤에 붙는 접미어
pub const TRUNCATION_SUFFIX: &str = "...";

/// 현재 시각 공급자
///
/// 테스트에서 고정 시각을 주입할 수 있도록 분리되어 있습니다.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// 로컬 시간대의 시스템 시계
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// 고정 시각을 반환하는 시계
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// 값이 [`MAX_FIELD_CHARS`] 문자를 넘으면 정확히 그만큼 남기고 접미어를 붙입니다.
///
/// 길이는 바이트가 아닌 문자 단위로 셉니다.
pub fn truncate_value(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_FIELD_CHARS) {
        Some((cut, _)) => {
            let mut truncated = String::with_capacity(cut + TRUNCATION_SUFFIX.len());
            truncated.push_str(&value[..cut]);
            truncated.push_str(TRUNCATION_SUFFIX);
            Cow::Owned(truncated)
        }
        None => Cow::Borrowed(value),
    }
}

/// `@timestamp` 필드 값 형식
pub fn format_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.to_rfc3339_opts(SecondsFormat::Nanos, false)
}

/// strftime 형식의 대상 인덱스 이름 템플릿
///
/// 생성 시 한 번 해석되며, 해석할 수 없는 지정자가 있으면 거부됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTemplate {
    template: String,
}

impl IndexTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, LogPipelineError> {
        let template = template.into();
        let invalid = |reason: &str| LogPipelineError::InvalidTemplate {
            template: template.clone(),
            reason: reason.to_owned(),
        };

        if template.is_empty() {
            return Err(invalid("template must not be empty"));
        }
        if StrftimeItems::new(&template).any(|item| matches!(item, Item::Error)) {
            return Err(invalid("unrecognized format specifier"));
        }

        // 시간대 정보가 필요한 지정자 등 실제 포맷 실패를 미리 걸러냄
        let probe = Local::now().fixed_offset();
        let mut rendered = String::new();
        if write!(rendered, "{}", probe.format(&template)).is_err() {
            return Err(invalid("template cannot be rendered"));
        }
        if rendered.is_empty() {
            return Err(invalid("template renders to an empty name"));
        }

        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// 주어진 시각의 대상 인덱스 이름. 같은 시각이면 항상 같은 이름입니다.
    pub fn render(&self, now: &DateTime<FixedOffset>) -> String {
        now.format(&self.template).to_string()
    }
}

/// 레코드 빌더
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    template: IndexTemplate,
}

impl RecordBuilder {
    pub fn new(template: IndexTemplate) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &IndexTemplate {
        &self.template
    }

    /// 필수 필드를 먼저 넣고, 추출 필드를 그 위에 병합합니다.
    pub fn build(
        &self,
        raw_line: &str,
        extracted: FieldSet,
        now: &DateTime<FixedOffset>,
    ) -> IndexRecord {
        let mut truncated = 0u64;
        let mut bounded = |value: &str| -> String {
            match truncate_value(value) {
                Cow::Borrowed(v) => v.to_owned(),
                Cow::Owned(v) => {
                    truncated += 1;
                    v
                }
            }
        };

        let mut fields = FieldSet::new();
        fields.insert(TIMESTAMP_FIELD, bounded(&format_timestamp(now)));
        fields.insert(MESSAGE_FIELD, bounded(raw_line));
        for (name, value) in extracted {
            let value = bounded(&value);
            fields.insert(name, value);
        }

        if truncated > 0 {
            metrics::counter!(m::FIELDS_TRUNCATED_TOTAL).increment(truncated);
            tracing::debug!(truncated, "field values exceeded maximum length");
        }

        IndexRecord {
            destination: self.template.render(now),
            fields,
        }
    }
}

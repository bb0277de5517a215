//! 패턴 레지스트리 -- 추출 패턴 선택과 컴파일
//!
//! 설정은 내장 패턴 식별자 또는 자유 형식 정규식 중 하나를 지정하며,
//! [`PatternRegistry::resolve`]가 이를 정확히 하나의 [`Pattern`]으로 해석합니다.
//!
//! 모든 해석 실패는 라인 처리 전에 보고되는 치명적 설정 에러입니다.
//!
//! # 사용 예시
//! ```
//! use logship_pipeline::pattern::{PatternRegistry, PatternSelection};
//!
//! let registry = PatternRegistry::builtin();
//! let pattern = registry
//!     .resolve(&PatternSelection::Named("apache-access".to_owned()))
//!     .unwrap();
//! assert!(pattern.field_names().any(|name| name == "remote"));
//! ```

mod builtin;

use std::collections::HashMap;

use regex::Regex;
use regex_syntax::ast;
use serde::Serialize;

use logship_core::config::PatternConfig;
use logship_core::types::{MESSAGE_FIELD, TIMESTAMP_FIELD};

use crate::error::LogPipelineError;
use builtin::BUILTIN_PATTERNS;

/// 자유 형식 패턴의 표시 이름
pub const CUSTOM_PATTERN_NAME: &str = "custom";

/// 컴파일된 추출 패턴
///
/// 위치 0 그룹은 전체 매치이며 필드가 되지 않습니다.
/// 시작 후에는 읽기 전용으로만 사용됩니다.
#[derive(Debug, Clone)]
pub struct Pattern {
    name: String,
    source: String,
    regex: Regex,
    /// 위치별 원래 그룹 이름. 이름 없는 그룹과 위치 0은 `None`
    group_names: Vec<Option<String>>,
}

impl Pattern {
    /// 정규식을 컴파일합니다.
    ///
    /// 같은 이름의 그룹이 여러 번 나오면 내부 별칭으로 바꿔 컴파일하고,
    /// 원래 이름은 위치별 테이블에 보존합니다.
    pub fn compile(name: impl Into<String>, source: &str) -> Result<Self, LogPipelineError> {
        let name = name.into();
        let invalid = |reason: String| LogPipelineError::InvalidPattern {
            name: name.clone(),
            reason,
        };

        let (rewritten, aliases) =
            alias_duplicate_groups(source).map_err(|e| invalid(e.to_string()))?;
        let regex = Regex::new(&rewritten).map_err(|e| invalid(e.to_string()))?;
        let group_names = regex
            .capture_names()
            .map(|group| {
                group.filter(|n| !n.is_empty()).map(|n| {
                    aliases
                        .get(n)
                        .cloned()
                        .unwrap_or_else(|| n.to_owned())
                })
            })
            .collect();

        Ok(Self {
            name,
            source: source.to_owned(),
            regex,
            group_names,
        })
    }

    /// 패턴 이름 (내장 식별자 또는 "custom")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 정규식 원문
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// 캡처 위치별 원래 그룹 이름 (위치 0 포함)
    pub fn group_names(&self) -> &[Option<String>] {
        &self.group_names
    }

    /// 위치 순서대로 이름 있는 그룹의 이름을 반환합니다.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.group_names.iter().flatten().map(String::as_str)
    }

    /// 필수 필드(`@timestamp`, `message`)를 덮어쓰는 그룹 이름 목록
    pub fn shadowed_reserved_fields(&self) -> Vec<&str> {
        let mut shadowed: Vec<&str> = self
            .field_names()
            .filter(|name| *name == TIMESTAMP_FIELD || *name == MESSAGE_FIELD)
            .collect();
        shadowed.dedup();
        shadowed
    }
}

/// 중복된 그룹 이름을 고유한 별칭으로 바꿉니다.
///
/// 파서가 보고하는 중복 위치를 하나씩 고쳐 다시 파싱하며,
/// `별칭 -> 원래 이름` 테이블을 함께 반환합니다.
fn alias_duplicate_groups(source: &str) -> Result<(String, HashMap<String, String>), ast::Error> {
    let mut rewritten = source.to_owned();
    let mut aliases = HashMap::new();

    loop {
        let err = match ast::parse::Parser::new().parse(&rewritten) {
            Ok(_) => return Ok((rewritten, aliases)),
            Err(err) => err,
        };
        if !matches!(err.kind(), ast::ErrorKind::GroupNameDuplicate { .. }) {
            return Err(err);
        }

        let range = err.span().start.offset..err.span().end.offset;
        let original = match rewritten.get(range.clone()) {
            Some(found) if is_group_name(found) => found.to_owned(),
            _ => return Err(err),
        };

        let mut counter = aliases.len();
        let alias = loop {
            let candidate = format!("logship_dup_{counter}");
            if !rewritten.contains(&candidate) {
                break candidate;
            }
            counter += 1;
        };
        rewritten.replace_range(range, &alias);
        aliases.insert(alias, original);
    }
}

fn is_group_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

/// 패턴 선택 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSelection {
    /// 내장 패턴 식별자
    Named(String),
    /// 자유 형식 정규식
    Freeform(String),
}

impl PatternSelection {
    /// 설정에서 선택을 만듭니다. 이름이 비어있지 않으면 이름이 우선합니다.
    pub fn from_config(config: &PatternConfig) -> Self {
        let name = config.name.trim();
        if name.is_empty() {
            Self::Freeform(config.regexp.clone())
        } else {
            Self::Named(name.to_owned())
        }
    }
}

impl Default for PatternSelection {
    fn default() -> Self {
        Self::from_config(&PatternConfig::default())
    }
}

/// 진단 출력용 내장 패턴 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternInfo {
    /// 식별자
    pub id: String,
    /// 설명
    pub description: String,
    /// 정규식 원문
    pub pattern: String,
}

/// 내장 패턴 테이블
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    entries: Vec<PatternInfo>,
}

impl PatternRegistry {
    /// 내장 패턴으로 레지스트리를 생성합니다.
    pub fn builtin() -> Self {
        let entries = BUILTIN_PATTERNS
            .iter()
            .map(|b| PatternInfo {
                id: b.id.to_owned(),
                description: b.description.to_owned(),
                pattern: b.source.to_owned(),
            })
            .collect();
        Self { entries }
    }

    /// 모든 내장 항목을 반환합니다. 컴파일하지 않으며 부수효과가 없습니다.
    pub fn list(&self) -> &[PatternInfo] {
        &self.entries
    }

    /// 식별자로 내장 항목을 찾습니다.
    pub fn lookup(&self, id: &str) -> Option<&PatternInfo> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// 선택 요청을 컴파일된 패턴 하나로 해석합니다.
    pub fn resolve(&self, selection: &PatternSelection) -> Result<Pattern, LogPipelineError> {
        let pattern = match selection {
            PatternSelection::Named(id) => {
                let info = self
                    .lookup(id)
                    .ok_or_else(|| LogPipelineError::UnknownPattern(id.clone()))?;
                Pattern::compile(info.id.as_str(), &info.pattern)?
            }
            PatternSelection::Freeform(source) => {
                if source.is_empty() {
                    return Err(LogPipelineError::NoPattern);
                }
                Pattern::compile(CUSTOM_PATTERN_NAME, source)?
            }
        };

        let shadowed = pattern.shadowed_reserved_fields();
        if !shadowed.is_empty() {
            tracing::warn!(
                pattern = pattern.name(),
                fields = ?shadowed,
                "pattern groups overwrite reserved fields; extracted values win"
            );
        }

        tracing::debug!(
            pattern = pattern.name(),
            fields = pattern.field_names().count(),
            "resolved extraction pattern"
        );
        Ok(pattern)
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 한 라인이 파이프라인을 한 번 통과하는 동안 생성되는 값 객체들입니다.
//! `FieldSet` → `IndexRecord` → `IndexOperation` 순서로 만들어지고,
//! `IndexOperation`이 싱크에 넘어가면 파이프라인은 더 이상 참조를 갖지 않습니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 필수 타임스탬프 필드 이름
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// 필수 원문 메시지 필드 이름
pub const MESSAGE_FIELD: &str = "message";

/// 인덱싱 백엔드로 전달되는 문서 타입
pub const DOCUMENT_KIND: &str = "legos";

/// 필드 이름 → 필드 값 매핑
///
/// 키는 유일하며 순서는 의미가 없습니다. 직렬화 결과를 안정적으로
/// 유지하기 위해 내부적으로 `BTreeMap`을 사용합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet {
    fields: BTreeMap<String, String>,
}

impl FieldSet {
    /// 빈 필드 세트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드를 삽입합니다. 같은 이름이 있으면 덮어쓰고 이전 값을 반환합니다.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }

    /// 필드 값을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 필드 이름 순서로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FieldSet {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// 인덱싱 대상 레코드
///
/// `destination`은 레코드 생성 시 한 번만 계산되며 이후 다시 계산되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// 시간 단위로 나뉜 대상 인덱스 이름
    pub destination: String,
    /// 문서 필드
    pub fields: FieldSet,
}

/// 싱크 오퍼레이션 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// 문서 인덱싱 (ID는 백엔드가 부여)
    Index,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 싱크에 넘겨지는 단위 작업
///
/// 생성 이후 변경되지 않습니다. 문서 ID는 지정하지 않으므로
/// 같은 라인을 재전송하면 백엔드에 중복 문서가 생깁니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOperation {
    kind: OperationKind,
    destination: String,
    document_kind: String,
    document: String,
}

impl IndexOperation {
    /// 직렬화된 문서로 `index` 오퍼레이션을 생성합니다.
    pub fn index(destination: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Index,
            destination: destination.into(),
            document_kind: DOCUMENT_KIND.to_owned(),
            document: document.into(),
        }
    }

    /// 문서 타입을 지정합니다.
    pub fn with_document_kind(mut self, document_kind: impl Into<String>) -> Self {
        self.document_kind = document_kind.into();
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn document_kind(&self) -> &str {
        &self.document_kind
    }

    /// 직렬화된 JSON 문서
    pub fn document(&self) -> &str {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_set_insert_overwrites() {
        let mut fields = FieldSet::new();
        assert!(fields.insert("msg", "first").is_none());
        assert_eq!(fields.insert("msg", "second").as_deref(), Some("first"));
        assert_eq!(fields.get("msg"), Some("second"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn field_set_serializes_as_flat_object() {
        let mut fields = FieldSet::new();
        fields.insert(MESSAGE_FIELD, "hello");
        fields.insert("level", "");
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"level":"","message":"hello"}"#);
    }

    #[test]
    fn index_operation_defaults_to_legos() {
        let op = IndexOperation::index("logstash-20160218", "{}");
        assert_eq!(op.kind(), OperationKind::Index);
        assert_eq!(op.document_kind(), DOCUMENT_KIND);
        assert_eq!(op.destination(), "logstash-20160218");
        assert_eq!(op.kind().to_string(), "index");
    }

    #[test]
    fn index_operation_custom_document_kind() {
        let op = IndexOperation::index("idx", "{}").with_document_kind("_doc");
        assert_eq!(op.document_kind(), "_doc");
    }
}

//! 라인 추출기 -- 패턴을 라인 하나에 적용하여 필드를 뽑아냅니다.
//!
//! 반환되는 필드 세트는 부분 결과입니다. 필수 필드(`@timestamp`, `message`)는
//! [`RecordBuilder`](crate::record::RecordBuilder)가 병합합니다.
//! 캡처된 문자열은 정규화하지 않고 그대로 복사합니다.

use logship_core::types::FieldSet;

use crate::pattern::Pattern;

/// 패턴이 라인에 매칭되면 이름 있는 그룹의 필드를, 아니면 `None`을 반환합니다.
///
/// - 매치에 참여하지 않은 그룹은 빈 문자열이 됩니다.
/// - 이름 없는 그룹은 무시됩니다.
/// - 같은 이름이 여러 번 나오면 위치상 뒤의 그룹이 이깁니다.
pub fn extract_match(pattern: &Pattern, line: &str) -> Option<FieldSet> {
    let captures = pattern.regex().captures(line)?;

    let mut fields = FieldSet::new();
    for (index, name) in pattern.group_names().iter().enumerate().skip(1) {
        let Some(name) = name else {
            continue;
        };
        let value = captures.get(index).map_or("", |m| m.as_str());
        fields.insert(name, value);
    }
    Some(fields)
}

/// 매칭되지 않으면 빈 필드 세트를 반환하는 [`extract_match`]
pub fn extract(pattern: &Pattern, line: &str) -> FieldSet {
    extract_match(pattern, line).unwrap_or_default()
}

//! 내장 추출 패턴 테이블
//!
//! 각 항목은 고정된 정규식이며, 필드 이름은 기존 인덱스와의 호환을 위해
//! 바꾸지 않습니다.

use logship_core::config::DEFAULT_REGEXP;

/// 내장 패턴 정의
#[derive(Debug, Clone, Copy)]
pub(crate) struct BuiltinPattern {
    pub(crate) id: &'static str,
    pub(crate) description: &'static str,
    pub(crate) source: &'static str,
}

/// HTTP 접근 로그 (common / combined, 선택적 `vhost:port` 접두어)
///
/// `1.2.3.4 - - [18/Feb/2016:10:05:22 +0000] "GET /x HTTP/1.1" 200 1090`
const APACHE_ACCESS: &str = concat!(
    r#"^(?:(?P<host>\S+:\d+) )?(?P<remote>\S+) \S+ (?P<user>\S+) \[[^\]]*\] "#,
    r#""(?P<method>\S+)(?: +(?P<path>[^ "]*)(?: +[^"]*)?)?" "#,
    r#"(?P<code>\d{3}|-) (?P<size>\d+|-)"#,
    r#"(?: "(?P<referer>[^"]*)" "(?P<agent>[^"]*)")?\s*$"#,
);

/// 심각도 태그가 붙은 에러 로그 (apache error_log, nginx error.log)
///
/// `[Wed Oct 11 14:32:52 2000] [error] [client 127.0.0.1] client denied`
const ERROR_LOG: &str =
    r"^(?:\[[^\]]*\] |\S+ \S+ )?\[(?:[a-z_]+:)?(?P<level>[A-Za-z]+\d*)\] (?P<msg>.*)$";

/// 라인 단위 애플리케이션 로그 (심각도 표식 + 메시지)
///
/// `WARN: disk almost full`, `[ERROR] connection reset`
const APPLOG: &str = concat!(
    r"^\[?(?P<level>(?i:TRACE|DEBUG|INFO|NOTICE|WARN(?:ING)?|ERROR|CRIT(?:ICAL)?|FATAL|PANIC))",
    r"\]?:?\s*(?P<msg>.*)$",
);

pub(crate) const BUILTIN_PATTERNS: &[BuiltinPattern] = &[
    BuiltinPattern {
        id: "glog",
        description: "structured log line: severity+date time thread file:line] message",
        source: DEFAULT_REGEXP,
    },
    BuiltinPattern {
        id: "apache-access",
        description: "HTTP access log (common/combined, optional vhost prefix)",
        source: APACHE_ACCESS,
    },
    BuiltinPattern {
        id: "error-log",
        description: "error log with a bracketed severity level",
        source: ERROR_LOG,
    },
    BuiltinPattern {
        id: "applog",
        description: "application log line starting with a severity marker",
        source: APPLOG,
    },
];

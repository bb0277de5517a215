//! 라인 소스 -- 원시 텍스트 라인 공급자
//!
//! # 소스
//! - [`ReaderSource`]: 임의의 비동기 리더 (표준 입력 포함). EOF에서 입력 종료.
//! - [`FileFollower`]: 자라나는 파일 추적 (`tail -f`). 로테이션을 감지하며 입력 종료가 없습니다.
//!
//! 두 소스 모두 core의 [`LineSource`] trait을 구현하므로 같은 파이프라인이
//! 대화형 입력과 파일 추적을 모두 처리합니다.
//!
//! 라인 종결자(`\n`, `\r\n`)는 제거되고, 빈 라인은 건너뛰며,
//! 잘못된 UTF-8은 대체 문자로 바꿉니다.

pub mod file;

pub use file::{FileFollower, FileFollowerConfig, StartPosition};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use logship_core::error::SourceError;
use logship_core::pipeline::LineSource;

/// 표준 입력 소스 이름
pub const STDIN_SOURCE_NAME: &str = "stdin";

/// 라인 종결자를 제거하고 UTF-8로 디코드합니다.
pub(crate) fn decode_line(mut bytes: &[u8]) -> String {
    if let [rest @ .., b'\n'] = bytes {
        bytes = rest;
    }
    if let [rest @ .., b'\r'] = bytes {
        bytes = rest;
    }
    String::from_utf8_lossy(bytes).into_owned()
}

/// 비동기 리더 기반 라인 소스
pub struct ReaderSource<R> {
    name: String,
    reader: R,
    buf: Vec<u8>,
}

impl<R> ReaderSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
            buf: Vec::with_capacity(1024),
        }
    }
}

impl ReaderSource<BufReader<Stdin>> {
    /// 표준 입력 소스를 생성합니다.
    pub fn stdin() -> Self {
        Self::new(STDIN_SOURCE_NAME, BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineSource for ReaderSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(|e| SourceError::Read {
                    source_name: self.name.clone(),
                    reason: e.to_string(),
                })?;

            if read == 0 {
                return Ok(None);
            }

            let line = decode_line(&self.buf);
            if line.is_empty() {
                continue;
            }
            return Ok(Some(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect<R: AsyncBufRead + Unpin + Send>(mut source: ReaderSource<R>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn decode_strips_terminators() {
        assert_eq!(decode_line(b"abc\n"), "abc");
        assert_eq!(decode_line(b"abc\r\n"), "abc");
        assert_eq!(decode_line(b"abc"), "abc");
        assert_eq!(decode_line(b"a\rb\n"), "a\rb");
    }

    #[test]
    fn decode_replaces_invalid_utf8() {
        assert_eq!(decode_line(b"ok \xff\n"), "ok \u{fffd}");
    }

    #[tokio::test]
    async fn reads_lines_in_order_and_skips_empty() {
        let input: &[u8] = b"first\r\n\nsecond\nthird";
        let lines = collect(ReaderSource::new("test", input)).await;
        assert_eq!(lines, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn empty_input_is_immediate_end() {
        let input: &[u8] = b"";
        let mut source = ReaderSource::new("test", input);
        assert!(source.next_line().await.unwrap().is_none());
        assert!(source.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stdin_source_name() {
        let source = ReaderSource::stdin();
        assert_eq!(source.name(), STDIN_SOURCE_NAME);
    }
}

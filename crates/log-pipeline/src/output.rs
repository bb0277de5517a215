//! 단계별 사람이 읽는 출력
//!
//! [`OutputMode::Verbose`]는 진단 스트림(stderr)에 각 단계의 결과를,
//! [`OutputMode::Echo`]는 표준 출력에 원시 라인을 씁니다. 두 스트림은 섞이지 않습니다.
//! tracing 로그와는 별개의 출력입니다.

use std::io::{self, Write};

use logship_core::types::IndexRecord;

use crate::config::OutputMode;
use crate::pattern::Pattern;

/// 단계별 출력기
pub struct StageOutput {
    mode: OutputMode,
    diagnostics: Box<dyn Write + Send>,
    echo: Box<dyn Write + Send>,
}

impl StageOutput {
    /// 진단은 stderr, 에코는 stdout으로 쓰는 출력기를 생성합니다.
    pub fn stdio(mode: OutputMode) -> Self {
        Self::new(mode, Box::new(io::stderr()), Box::new(io::stdout()))
    }

    pub fn new(
        mode: OutputMode,
        diagnostics: Box<dyn Write + Send>,
        echo: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            mode,
            diagnostics,
            echo,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// 해석된 패턴 (시작 시 한 번)
    pub fn pattern(&mut self, pattern: &Pattern) -> io::Result<()> {
        if self.mode == OutputMode::Verbose {
            writeln!(
                self.diagnostics,
                "using pattern {}: {:?}",
                pattern.name(),
                pattern.source()
            )?;
        }
        Ok(())
    }

    /// 원시 라인
    pub fn raw_line(&mut self, line: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Verbose => writeln!(self.diagnostics, "line: {line:?}"),
            OutputMode::Echo => {
                writeln!(self.echo, "{line}")?;
                self.echo.flush()
            }
            OutputMode::Quiet => Ok(()),
        }
    }

    /// 대상 인덱스와 필드 전체 (필드 이름 순)
    pub fn record(&mut self, record: &IndexRecord) -> io::Result<()> {
        if self.mode != OutputMode::Verbose {
            return Ok(());
        }
        writeln!(self.diagnostics, "index: {}", record.destination)?;
        writeln!(self.diagnostics, "fields:")?;
        for (name, value) in record.fields.iter() {
            writeln!(self.diagnostics, "  {name}: {value:?}")?;
        }
        self.diagnostics.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logship_core::types::FieldSet;
    use std::sync::{Arc, Mutex};

    /// 테스트용 공유 버퍼 writer
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

    fn output(mode: OutputMode) -> (StageOutput, SharedBuf, SharedBuf) {
        let diag = SharedBuf::default();
        let echo = SharedBuf::default();
        let out = StageOutput::new(mode, Box::new(diag.clone()), Box::new(echo.clone()));
        (out, diag, echo)
    }

    fn sample_record() -> IndexRecord {
        let mut fields = FieldSet::new();
        fields.insert("message", "hi \"there\"");
        fields.insert("level", "info");
        IndexRecord {
            destination: "logstash-20160218".to_owned(),
            fields,
        }
    }

    #[test]
    fn verbose_traces_every_stage_to_diagnostics() {
        let (mut out, diag, echo) = output(OutputMode::Verbose);
        let pattern = Pattern::compile("custom", r"(?P<level>\w+)").unwrap();
        out.pattern(&pattern).unwrap();
        out.raw_line("hi \"there\"").unwrap();
        out.record(&sample_record()).unwrap();

        let text = diag.contents();
        assert!(text.contains("using pattern custom"));
        assert!(text.contains(r#"line: "hi \"there\"""#));
        assert!(text.contains("index: logstash-20160218"));
        assert!(text.contains("fields:\n  level: \"info\"\n  message:"));
        assert!(echo.contents().is_empty());
    }

    #[test]
    fn echo_writes_raw_line_only_to_stdout() {
        let (mut out, diag, echo) = output(OutputMode::Echo);
        out.raw_line("plain line").unwrap();
        out.record(&sample_record()).unwrap();
        assert_eq!(echo.contents(), "plain line\n");
        assert!(diag.contents().is_empty());
    }

    #[test]
    fn quiet_writes_nothing() {
        let (mut out, diag, echo) = output(OutputMode::Quiet);
        out.raw_line("x").unwrap();
        out.record(&sample_record()).unwrap();
        assert!(diag.contents().is_empty());
        assert!(echo.contents().is_empty());
    }
}

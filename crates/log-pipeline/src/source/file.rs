//! 파일 추적 라인 소스
//!
//! 로그 파일 끝을 주기적으로 폴링하며 새로 추가된 라인을 반환합니다.
//! `tail -F`와 유사하게 동작합니다.
//!
//! # 로테이션 감지
//! - inode 변경 감지 (logrotate의 rename + create)
//! - 파일 크기 축소 감지 (truncation, copytruncate)
//! - 파일이 잠시 사라지면 다시 나타날 때까지 대기
//!
//! 로테이션 시 이전 파일에 남아있던 미완성 라인은 그대로 한 라인으로 내보내고,
//! 새 파일은 처음부터 읽습니다.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use logship_core::config::SourceConfig;
use logship_core::error::SourceError;
use logship_core::pipeline::LineSource;

use super::decode_line;

/// 추적 시작 위치
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartPosition {
    /// 파일 처음부터
    Beginning,
    /// 현재 파일 끝부터 (새로 추가되는 라인만)
    #[default]
    End,
}

/// 파일 추적 설정
#[derive(Debug, Clone)]
pub struct FileFollowerConfig {
    /// 추적할 파일 경로
    pub path: PathBuf,
    /// 파일 상태 체크 주기
    pub poll_interval: Duration,
    /// 시작 위치
    pub start_at: StartPosition,
}

impl FileFollowerConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: Duration::from_millis(250),
            start_at: StartPosition::End,
        }
    }

    /// core의 `[source]` 설정에서 폴링 주기를 가져옵니다.
    pub fn from_core(path: impl Into<PathBuf>, core: &SourceConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(core.poll_interval_ms),
            ..Self::new(path)
        }
    }

    pub fn start_at(mut self, start_at: StartPosition) -> Self {
        self.start_at = start_at;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// 파일 식별자 (Unix에서는 inode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity(Option<u64>);

impl FileIdentity {
    #[cfg(unix)]
    fn of(meta: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self(Some(meta.ino()))
    }

    #[cfg(not(unix))]
    fn of(_meta: &std::fs::Metadata) -> Self {
        Self(None)
    }
}

/// 폴링 시점의 파일 상태
#[derive(Debug, PartialEq, Eq)]
enum FileChange {
    /// 변경 없음 (새 데이터 대기)
    Unchanged,
    /// 다른 파일로 교체됨
    Replaced,
    /// 크기가 읽은 위치보다 작아짐
    Truncated,
    /// 경로에 파일이 없음
    Missing,
}

/// 파일 추적 라인 소스
///
/// 입력 종료(`Ok(None)`)를 반환하지 않습니다. 외부 정지 요청으로만 끝납니다.
pub struct FileFollower {
    name: String,
    config: FileFollowerConfig,
    reader: BufReader<File>,
    identity: FileIdentity,
    /// 현재 파일에서 읽은 바이트 위치
    offset: u64,
    /// 종결자를 아직 만나지 못한 라인 조각
    pending: Vec<u8>,
    /// 파일이 사라진 상태를 이미 보고했는지 여부
    missing_reported: bool,
}

impl FileFollower {
    /// 파일을 열고 시작 위치로 이동합니다.
    ///
    /// 파일이 없거나 읽을 수 없으면 [`SourceError::Open`]을 반환합니다.
    pub async fn open(config: FileFollowerConfig) -> Result<Self, SourceError> {
        let name = format!("file:{}", config.path.display());
        let open_err = |e: std::io::Error| SourceError::Open {
            source_name: name.clone(),
            reason: e.to_string(),
        };

        let mut file = File::open(&config.path).await.map_err(open_err)?;
        let meta = file.metadata().await.map_err(open_err)?;
        if meta.is_dir() {
            return Err(SourceError::Open {
                source_name: name.clone(),
                reason: "path is a directory".to_owned(),
            });
        }

        let offset = match config.start_at {
            StartPosition::Beginning => 0,
            StartPosition::End => meta.len(),
        };
        file.seek(SeekFrom::Start(offset)).await.map_err(open_err)?;

        tracing::info!(
            source = name.as_str(),
            offset,
            poll_ms = config.poll_interval.as_millis() as u64,
            "following file"
        );

        Ok(Self {
            name,
            identity: FileIdentity::of(&meta),
            reader: BufReader::new(file),
            offset,
            pending: Vec::new(),
            missing_reported: false,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn read_err(&self, e: std::io::Error) -> SourceError {
        SourceError::Read {
            source_name: self.name.clone(),
            reason: e.to_string(),
        }
    }

    async fn check_change(&mut self) -> Result<FileChange, SourceError> {
        let meta = match tokio::fs::metadata(&self.config.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileChange::Missing),
            Err(e) => return Err(self.read_err(e)),
        };

        // 삭제 후 재생성된 파일은 같은 inode를 받을 수 있음
        if self.missing_reported
            || FileIdentity::of(&meta) != self.identity
            || self.handle_unlinked().await
        {
            Ok(FileChange::Replaced)
        } else if meta.len() < self.offset {
            Ok(FileChange::Truncated)
        } else {
            Ok(FileChange::Unchanged)
        }
    }

    /// 열려 있는 핸들의 파일이 경로에서 삭제되었는지 확인합니다.
    #[cfg(unix)]
    async fn handle_unlinked(&self) -> bool {
        use std::os::unix::fs::MetadataExt;
        self.reader
            .get_ref()
            .metadata()
            .await
            .is_ok_and(|meta| meta.nlink() == 0)
    }

    #[cfg(not(unix))]
    async fn handle_unlinked(&self) -> bool {
        false
    }

    /// 경로를 다시 열어 처음부터 읽습니다. 파일이 없으면 `false`를 반환합니다.
    async fn reopen(&mut self) -> Result<bool, SourceError> {
        let file = match File::open(&self.config.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(self.read_err(e)),
        };
        let meta = file.metadata().await.map_err(|e| self.read_err(e))?;

        self.identity = FileIdentity::of(&meta);
        self.reader = BufReader::new(file);
        self.offset = 0;
        Ok(true)
    }

    fn take_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = decode_line(&self.pending);
        self.pending.clear();
        (!line.is_empty()).then_some(line)
    }
}

impl LineSource for FileFollower {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            let read = match self.reader.read_until(b'\n', &mut self.pending).await {
                Ok(n) => n,
                Err(e) => return Err(self.read_err(e)),
            };
            self.offset += read as u64;

            if self.pending.ends_with(b"\n") {
                match self.take_pending() {
                    Some(line) => return Ok(Some(line)),
                    None => continue,
                }
            }
            if read > 0 {
                continue;
            }

            // EOF: 새 데이터가 없으므로 파일 상태 확인
            match self.check_change().await? {
                FileChange::Unchanged => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                FileChange::Missing => {
                    if !self.missing_reported {
                        tracing::warn!(
                            source = self.name.as_str(),
                            "followed file disappeared, waiting"
                        );
                        self.missing_reported = true;
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                }
                change @ (FileChange::Replaced | FileChange::Truncated) => {
                    let partial = self.take_pending();
                    if self.reopen().await? {
                        self.missing_reported = false;
                        tracing::info!(
                            source = self.name.as_str(),
                            ?change,
                            "file rotated, reopened"
                        );
                    }
                    if let Some(line) = partial {
                        return Ok(Some(line));
                    }
                }
            }
        }
    }
}

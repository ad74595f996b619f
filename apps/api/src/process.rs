//! # プロセス制御
//!
//! `start` で PID ファイルを書き出し、`stop` でそのプロセスに SIGINT を送って終了を待つ。
//!
//! ```text
//! $ apiscaffold start   # ./app.pid を作成してサーブ
//! $ apiscaffold stop    # ./app.pid のプロセスに SIGINT、終了まで 20ms 間隔で確認（最大 5 秒）
//! ```
//!
//! シグナルの送信と生存確認は `kill` コマンドで行う。

use std::{
   io,
   path::{Path, PathBuf},
   time::Duration,
};

use thiserror::Error;
use tokio::{process::Command, time::Instant};

/// PID ファイル名（作業ディレクトリに作成する）
pub const PID_FILE: &str = "app.pid";

/// 停止を待つ最大時間
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// 生存確認の間隔
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// プロセス制御エラー
#[derive(Debug, Error)]
pub enum ProcessError {
   #[error("PID ファイル {path} の操作に失敗しました: {source}")]
   PidFile {
      path:   PathBuf,
      #[source]
      source: io::Error,
   },

   #[error("PID ファイルの内容が不正です: {0:?}")]
   InvalidPid(String),

   #[error("プロセス {0} は実行されていません")]
   NotRunning(u32),

   #[error("シグナルの送信に失敗しました: {0}")]
   Signal(#[source] io::Error),

   #[error("プロセス {pid} が {timeout:?} 以内に停止しませんでした")]
   StopTimeout { pid: u32, timeout: Duration },
}

/// PID ファイル
#[derive(Debug, Clone)]
pub struct PidFile {
   path: PathBuf,
}

impl PidFile {
   /// `dir` 直下の [`PID_FILE`]
   pub fn in_dir(dir: impl AsRef<Path>) -> Self {
      Self {
         path: dir.as_ref().join(PID_FILE),
      }
   }

   pub fn path(&self) -> &Path {
      &self.path
   }

   /// 現在のプロセスの PID を書き出す
   pub fn write_current(&self) -> Result<(), ProcessError> {
      self.write(std::process::id())
   }

   pub fn write(&self, pid: u32) -> Result<(), ProcessError> {
      std::fs::write(&self.path, pid.to_string()).map_err(|source| self.error(source))
   }

   pub fn read(&self) -> Result<u32, ProcessError> {
      let content = std::fs::read_to_string(&self.path).map_err(|source| self.error(source))?;
      let content = content.trim();
      content
         .parse()
         .map_err(|_| ProcessError::InvalidPid(content.to_string()))
   }

   /// PID ファイルを削除する（存在しなければ何もしない）
   pub fn remove(&self) -> Result<(), ProcessError> {
      match std::fs::remove_file(&self.path) {
         Ok(()) => Ok(()),
         Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
         Err(source) => Err(self.error(source)),
      }
   }

   fn error(&self, source: io::Error) -> ProcessError {
      ProcessError::PidFile {
         path: self.path.clone(),
         source,
      }
   }
}

/// PID ファイルのプロセスを停止する
pub async fn stop(pid_file: &PidFile) -> Result<u32, ProcessError> {
   stop_with(pid_file, STOP_TIMEOUT, STOP_POLL_INTERVAL).await
}

/// SIGINT を送り、`timeout` まで `poll` 間隔で終了を確認する
///
/// 停止したプロセスの PID を返す。停止後に PID ファイルが残っていれば削除する。
pub async fn stop_with(
   pid_file: &PidFile,
   timeout: Duration,
   poll: Duration,
) -> Result<u32, ProcessError> {
   let pid = pid_file.read()?;

   if !kill(pid, "-INT").await? {
      pid_file.remove()?;
      return Err(ProcessError::NotRunning(pid));
   }
   tracing::info!(pid, "SIGINT を送信しました");

   let deadline = Instant::now() + timeout;
   while is_alive(pid).await? {
      if Instant::now() >= deadline {
         return Err(ProcessError::StopTimeout { pid, timeout });
      }
      tokio::time::sleep(poll).await;
   }

   pid_file.remove()?;
   tracing::info!(pid, "プロセスが停止しました");
   Ok(pid)
}

/// プロセスが存在するか（`kill -0`）
pub async fn is_alive(pid: u32) -> Result<bool, ProcessError> {
   kill(pid, "-0").await
}

/// `kill <signal> <pid>` を実行し、成功したかを返す
async fn kill(pid: u32, signal: &str) -> Result<bool, ProcessError> {
   let status = Command::new("kill")
      .arg(signal)
      .arg(pid.to_string())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .status()
      .await
      .map_err(ProcessError::Signal)?;
   Ok(status.success())
}

//! # apiscaffold
//!
//! ## 使い方
//!
//! ```bash
//! apiscaffold start   # config.yaml を読み込んでサーバーを起動（./app.pid を作成）
//! apiscaffold stop    # ./app.pid のサーバーを停止
//! ```
//!
//! 設定は `./config.yaml` または `./config/config.yaml`。
//! `APP_` 接頭辞の環境変数で上書きできる（例: `APP_PORT=9090`）。

use apiscaffold_api::{
   app_builder::{AppDeps, build_app},
   config::AppConfig,
   process::{self, PidFile},
   server,
};
use apiscaffold_infra::{Database, redis::RedisClient};
use apiscaffold_shared::{Logger, observability::init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルがあれば読み込む（無くてもエラーにしない）
   dotenvy::dotenv().ok();

   match std::env::args().nth(1).as_deref() {
      Some("start") => start().await,
      Some("stop") => {
         let pid = process::stop(&PidFile::in_dir(".")).await?;
         println!("stopped (pid {pid})");
         Ok(())
      }
      Some(other) => anyhow::bail!("未知のコマンドです: {other}（start | stop）"),
      None => {
         println!("Welcome to apiscaffold! Run `apiscaffold start` or `apiscaffold stop`.");
         Ok(())
      }
   }
}

async fn start() -> anyhow::Result<()> {
   let config = AppConfig::load()?;
   init_tracing(&config.log)?;
   tracing::info!(name = %config.name, mode = ?config.mode, "設定を読み込みました");

   let db = Database::connect(&config.mysql).await?;
   let redis = if config.redis.is_enabled() {
      Some(RedisClient::connect(&config.redis).await?)
   } else {
      tracing::info!("Redis は無効です");
      None
   };

   let deps = AppDeps {
      db: db.clone(),
      redis,
      logger: Logger::new(config.name.clone()),
   };
   let app = build_app(&config, deps);

   let listener = TcpListener::bind(config.bind_addr()).await?;
   let pid_file = PidFile::in_dir(".");
   pid_file.write_current()?;
   tracing::info!(addr = %listener.local_addr()?, pid = std::process::id(), "サーバーが起動しました");

   let served = server::run(listener, app, server::shutdown_signal()).await;

   if let Err(e) = pid_file.remove() {
      tracing::warn!(error = %e, "PID ファイルの削除に失敗しました");
   }
   db.close().await;
   served?;
   Ok(())
}

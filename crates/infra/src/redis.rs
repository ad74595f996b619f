//! # Redis 接続管理
//!
//! ## 設計方針
//!
//! - **ConnectionManager**: 自動再接続機能を持つ接続マネージャを使用し、clone して共有する
//! - **起動時の疎通確認**: 接続直後に `PING` を送り、失敗したら起動を中断する
//! - **キー接頭辞**: プロジェクト共通の接頭辞を [`RedisClient::key`] で付与する
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use redis::AsyncCommands;
//!
//! let client = RedisClient::connect(&config.redis).await?;
//! let mut conn = client.connection();
//! conn.set_ex::<_, _, ()>(client.key("greeting"), "hello", 60).await?;
//! ```

use std::sync::Arc;

use redis::{Client, aio::ConnectionManager};
use serde::Deserialize;

use crate::error::InfraError;

/// Redis 設定（`config.yaml` の `redis` セクション）
///
/// `addr` が空の場合 Redis は無効。
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// `host:port`
    pub addr:     String,
    pub password: String,
    pub db:       i64,
    /// キー接頭辞（例: `"app:"`）
    pub prefix:   String,
}

impl RedisConfig {
    /// Redis を使用する設定か
    pub fn is_enabled(&self) -> bool {
        !self.addr.trim().is_empty()
    }

    /// 接続 URL（`redis://[:password@]host:port/db`）
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}/{}", self.addr, self.db)
        } else {
            format!(
                "redis://:{}@{}/{}",
                urlencoding::encode(&self.password),
                self.addr,
                self.db
            )
        }
    }
}

/// 接頭辞付きの Redis クライアント
///
/// clone は接続マネージャを共有する。
#[derive(Clone)]
pub struct RedisClient {
    conn:   ConnectionManager,
    prefix: Arc<str>,
}

impl RedisClient {
    /// 接続し、`PING` で疎通を確認する
    pub async fn connect(config: &RedisConfig) -> Result<Self, InfraError> {
        let client = Client::open(config.url())?;
        let conn = ConnectionManager::new(client).await?;
        let redis = Self {
            conn,
            prefix: Arc::from(config.prefix.as_str()),
        };
        redis.ping().await?;
        tracing::info!(addr = %config.addr, db = config.db, "Redis に接続しました");
        Ok(redis)
    }

    /// 接頭辞を付けたキー
    pub fn key(&self, key: &str) -> String {
        prefixed(&self.prefix, key)
    }

    /// 接続マネージャ（clone して使う）
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// 疎通確認
    pub async fn ping(&self) -> Result<(), InfraError> {
        let mut conn = self.connection();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn prefixed(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

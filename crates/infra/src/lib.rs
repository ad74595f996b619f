//! # apiscaffold インフラ層
//!
//! MySQL・Redis との接続と、リポジトリの実装を提供する。
//!
//! ## 責務
//!
//! - **データベース接続**: MySQL の source / replica 接続プール管理とトランザクション
//! - **リクエストコンテキスト**: トランザクション・シャードサフィックス・期限の引き回し
//! - **シャーディング**: 時刻・剰余キーからのテーブル名サフィックス算出
//! - **リポジトリ実装**: [`BaseRepository`] と具象リポジトリ
//! - **キャッシュ接続**: Redis への接続管理
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → shared
//!   ↘            ↗
//!     ──────────
//! ```
//!
//! ## モジュール構成
//!
//! - [`db`] - MySQL 読み書き分離の接続管理、トランザクション
//! - [`context`] - リクエストコンテキスト
//! - [`shard`] - シャード戦略とサフィックス算出
//! - [`repository`] - リポジトリ実装
//! - [`model`] - 永続化モデル
//! - [`redis`] - Redis 接続管理
//! - [`error`] - インフラ層エラー定義

pub mod context;
pub mod db;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod model;
pub mod redis;
pub mod repository;
pub mod shard;

pub use context::RequestContext;
pub use db::{Database, DbHandle, MysqlConfig, TransactionManager, TxHandle};
pub use error::{InfraError, InfraErrorKind};
pub use repository::BaseRepository;
pub use shard::{ShardKey, ShardStrategy};

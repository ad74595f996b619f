//! # apiscaffold API サーバー
//!
//! MySQL（読み書き分離・テーブルシャーディング）と Redis を使う Web サービスの雛形。
//!
//! ## 構成
//!
//! ```text
//! HTTP ─▶ middleware ─▶ handler ─▶ usecase ─▶ repository (infra) ─▶ MySQL
//!          (RequestContext)                    BaseRepository
//! ```
//!
//! ## モジュール構成
//!
//! - [`config`] - アプリケーション設定（`config.yaml` + 環境変数）
//! - [`error`] - API エラー定義と HTTP レスポンスへの変換
//! - [`handler`] - HTTP リクエストハンドラ
//! - [`usecase`] - アプリケーションロジック
//! - [`middleware`] - リクエストコンテキストの付与
//! - [`app_builder`] - 依存の組み立てとルーター構築
//! - [`server`] - サーバー起動と Graceful shutdown
//! - [`process`] - PID ファイルによる起動・停止

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod process;
pub mod server;
pub mod usecase;

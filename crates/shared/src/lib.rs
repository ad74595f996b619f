//! # apiscaffold 共有ユーティリティ
//!
//! infra / api の両方から使われる、ビジネスロジックを含まないユーティリティ。
//!
//! - [`trace`]: Trace ID とリクエスト単位のトレースコンテキスト
//! - [`observability`]: ログ設定、トレーシング初期化、コンポーネントロガー
//! - [`health`]: ヘルスチェックのレスポンス型
//! - [`message_response`]: `{"message": ...}` 形式のエラーボディ
//! - [`datetime`]: 日時の serde ヘルパー

pub mod datetime;
pub mod health;
pub mod message_response;
pub mod observability;
pub mod trace;

pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
pub use message_response::MessageResponse;
pub use observability::Logger;
pub use trace::{TraceContext, TraceId};

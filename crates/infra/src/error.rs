//! # インフラ層エラー定義
//!
//! データベース、Redis、シャーディング設定で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: sqlx::Error, redis::RedisError などをラップ
//! - **入力エラーと設定エラーの区別**: シャードキーの不備は `InvalidArgument`、
//!   設定テキストの不備は `InvalidConfiguration`
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::InvalidArgument(msg) => { /* 400 */ }
///     _ => { /* 500 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// データベースエラー
    ///
    /// 接続失敗、クエリ実行失敗、トランザクション開始失敗など。
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// Redis エラー
    #[error("Redis エラー: {0}")]
    Redis(#[source] redis::RedisError),

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 呼び出し側の引数が不正
    ///
    /// シャード戦略に合わないシャードキー、modulus の base が 0 など。
    #[error("引数エラー: {0}")]
    InvalidArgument(String),

    /// 設定値が不正
    ///
    /// 未知のシャード戦略文字列、DSN の形式不正、接続先リストが空など。
    #[error("設定エラー: {0}")]
    InvalidConfiguration(String),

    /// コンテキストの期限切れ
    #[error("コンテキストの期限を超過しました")]
    DeadlineExceeded,

    /// 完了済みのトランザクションを操作した
    #[error("トランザクションは既に完了しています")]
    TransactionClosed,

    /// トランザクションの接続が別の箇所で使用中
    ///
    /// [`DbConnection`](crate::db::DbConnection) を保持したままコミットや
    /// 接続の再取得を行った場合。
    #[error("トランザクションは別の接続で使用中です")]
    TransactionBusy,

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 呼び出し側の入力に起因するエラーか
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, InfraErrorKind::InvalidArgument(_))
    }

    /// InfraError を分解して InfraErrorKind と SpanTrace を取り出す
    pub fn into_parts(self) -> (InfraErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    /// InfraErrorKind と SpanTrace から InfraError を組み立てる
    pub fn from_parts(kind: InfraErrorKind, span_trace: SpanTrace) -> Self {
        Self { kind, span_trace }
    }

    fn capture(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// 引数エラーを生成する
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::InvalidArgument(msg.into()))
    }

    /// 設定エラーを生成する
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::InvalidConfiguration(msg.into()))
    }

    /// 期限切れエラーを生成する
    pub fn deadline_exceeded() -> Self {
        Self::capture(InfraErrorKind::DeadlineExceeded)
    }

    /// 完了済みトランザクションのエラーを生成する
    pub fn transaction_closed() -> Self {
        Self::capture(InfraErrorKind::TransactionClosed)
    }

    /// 使用中トランザクションのエラーを生成する
    pub fn transaction_busy() -> Self {
        Self::capture(InfraErrorKind::TransactionBusy)
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::capture(InfraErrorKind::Unexpected(msg.into()))
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self::capture(InfraErrorKind::Database(source))
    }
}

impl From<redis::RedisError> for InfraError {
    fn from(source: redis::RedisError) -> Self {
        Self::capture(InfraErrorKind::Redis(source))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::capture(InfraErrorKind::Serialization(source))
    }
}

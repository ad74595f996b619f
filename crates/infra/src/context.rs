//! # リクエストコンテキスト
//!
//! 1 つの呼び出しチェーンでリポジトリ呼び出しに引き回す不変の値。
//!
//! - トレースコンテキスト（ログの `trace_id` / `span`）
//! - 実行中のトランザクション（高々 1 つ）
//! - シャードサフィックス（高々 1 つ）
//! - 期限（接続取得と [`RequestContext::bounded`] で包んだ処理に適用）
//!
//! `with_*` は自身を変更せず、値を差し替えた新しいコンテキストを返す。
//! グローバル変数やタスクローカルは使わない。

use std::time::Duration;

use apiscaffold_shared::trace::{TraceContext, TraceId};
use tokio::time::Instant;

use crate::{db::TxHandle, error::InfraError};

/// リクエストスコープのコンテキスト
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    trace:        TraceContext,
    transaction:  Option<TxHandle>,
    shard_suffix: Option<String>,
    deadline:     Option<Instant>,
}

impl RequestContext {
    /// トレースコンテキストからコンテキストを作成する
    pub fn new(trace: TraceContext) -> Self {
        Self {
            trace,
            ..Self::default()
        }
    }

    /// 新しい Trace ID でコンテキストを作成する（バッチ・テスト用）
    pub fn background() -> Self {
        Self::new(TraceContext::new(TraceId::new()))
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    /// 実行中のトランザクション
    pub fn transaction(&self) -> Option<&TxHandle> {
        self.transaction.as_ref()
    }

    /// シャードサフィックス
    pub fn shard_suffix(&self) -> Option<&str> {
        self.shard_suffix.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// トランザクションを差し替えたコンテキストを返す
    pub fn with_transaction(&self, tx: TxHandle) -> Self {
        Self {
            transaction: Some(tx),
            ..self.clone()
        }
    }

    /// シャードサフィックスを差し替えたコンテキストを返す
    pub fn with_shard_suffix(&self, suffix: impl Into<String>) -> Self {
        Self {
            shard_suffix: Some(suffix.into()),
            ..self.clone()
        }
    }

    /// 期限を設定したコンテキストを返す
    ///
    /// 既存の期限の方が早い場合はそちらを維持する。
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// 現在時刻からのタイムアウトを設定したコンテキストを返す
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// 期限内に処理を完了させる
    ///
    /// 期限が無い場合はそのまま待つ。超過時は処理をキャンセルして `DeadlineExceeded`。
    pub async fn bounded<F, T>(&self, fut: F) -> Result<T, InfraError>
    where
        F: Future<Output = Result<T, InfraError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| InfraError::deadline_exceeded())?,
            None => fut.await,
        }
    }
}

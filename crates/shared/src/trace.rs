//! # リクエスト追跡用の Trace ID
//!
//! 1 つのリクエスト（呼び出しチェーン）で出力されるログを束ねるための識別子と、
//! ログ 1 行ごとに採番される span 番号を保持するコンテキスト。
//!
//! ## 設計判断
//!
//! - **Newtype パターン**: `String` をラップし、他の文字列型との取り違えを防ぐ
//! - **UUID v7 採用**: タイムスタンプを含むため時系列でソート可能
//! - **span 番号はトレース単位**: [`TraceContext`] を clone しても同じカウンタを共有するため、
//!   派生したコンテキストから出力したログも 1, 2, 3... と連番になる
//!
//! ## 使用例
//!
//! ```rust
//! use apiscaffold_shared::trace::{TraceContext, TraceId};
//!
//! // 外部から受け取った値で作成（例: `x-request-id` ヘッダ）
//! let trace = TraceContext::new(TraceId::from_string("req-123"));
//!
//! assert_eq!(trace.next_span(), 1);
//! assert_eq!(trace.clone().next_span(), 2);
//! ```

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// リクエスト追跡用の一意識別子
///
/// HTTP ヘッダ `x-request-id` として伝播させることを想定。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

impl TraceId {
    /// 新しい Trace ID を生成する
    ///
    /// UUID v7 を使用するため、生成順にソート可能。
    ///
    /// ```rust
    /// use apiscaffold_shared::trace::TraceId;
    ///
    /// let id = TraceId::new();
    /// assert!(!id.as_str().is_empty());
    /// ```
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// 文字列から Trace ID を作成する
    ///
    /// 空文字列の場合は新しい ID を生成する。
    pub fn from_string(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            return Self::new();
        }
        Self(s)
    }

    /// 内部の文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// トレースコンテキスト
///
/// Trace ID と、ログ出力ごとに増加する span カウンタの組。
/// clone はカウンタを共有する（同一トレースの中で連番を保つ）。
#[derive(Debug, Clone, Default)]
pub struct TraceContext {
    trace_id: TraceId,
    span_seq: Arc<AtomicU64>,
}

impl TraceContext {
    /// 指定した Trace ID でコンテキストを作成する
    pub fn new(trace_id: TraceId) -> Self {
        Self {
            trace_id,
            span_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Trace ID を取得する
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// 次の span 番号を採番する（1 始まり）
    pub fn next_span(&self) -> u64 {
        self.span_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

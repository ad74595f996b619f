//! # リクエストコンテキスト付与ミドルウェア
//!
//! ## 仕組み
//!
//! 1. `SetRequestIdLayer` がクライアント提供の `x-request-id` を使うか、UUID v7 を生成する
//! 2. [`make_request_span`] が `TraceLayer` のスパンに `trace_id` を記録する
//! 3. [`attach_request_context`] が同じ ID を Trace ID とする
//!    [`RequestContext`] をリクエスト extensions に格納する
//!
//! ハンドラは `Extension<RequestContext>` で受け取り、リポジトリまで引き回す。

use apiscaffold_infra::RequestContext;
use apiscaffold_shared::trace::{TraceContext, TraceId};
use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tower_http::request_id::RequestId;

/// `SetRequestIdLayer` が設定した Request ID を取り出す
fn request_id<B>(request: &Request<B>) -> Option<&str> {
   request
      .extensions()
      .get::<RequestId>()
      .and_then(|id| id.header_value().to_str().ok())
}

/// `TraceLayer` 用のリクエストスパン
pub fn make_request_span<B>(request: &Request<B>) -> tracing::Span {
   tracing::info_span!(
      "request",
      method = %request.method(),
      uri = %request.uri(),
      trace_id = request_id(request).unwrap_or("-"),
   )
}

/// Request ID を Trace ID とする [`RequestContext`] を extensions に格納する
///
/// Request ID が無い場合（レイヤー未適用のテスト等）は新しい Trace ID を採番する。
pub async fn attach_request_context(mut request: Request<Body>, next: Next) -> Response {
   let trace_id = request_id(&request).map_or_else(TraceId::new, TraceId::from_string);
   let ctx = RequestContext::new(TraceContext::new(trace_id));
   request.extensions_mut().insert(ctx);

   next.run(request).await
}

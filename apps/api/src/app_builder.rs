//! # アプリケーション構築
//!
//! 依存（リポジトリ・State）の組み立てとルーター構築を担当する。
//! `main.rs` は設定読み込み・接続確立とサーバー起動に集中する。

use std::sync::Arc;

use apiscaffold_infra::{
   BaseRepository,
   Database,
   redis::RedisClient,
   repository::{HELLO_WORLD_TABLE, MySqlHelloRepository},
};
use apiscaffold_shared::{Logger, observability::MakeTraceId};
use axum::{Router, middleware::from_fn, routing::get};
use tower_http::{
   request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
   trace::TraceLayer,
};

use crate::{
   config::{AppConfig, RunMode},
   handler::{HelloState, ReadinessState, health_check, hello, readiness_check},
   middleware::{attach_request_context, make_request_span},
   usecase::HelloUseCase,
};

/// 登録するルート（メソッド, パス）
pub const ROUTES: [(&str, &str); 3] = [
   ("GET", "/health"),
   ("GET", "/health/ready"),
   ("GET", "/v1/api/hello/{name}"),
];

/// 起動時に確立した外部接続
#[derive(Debug, Clone)]
pub struct AppDeps {
   pub db:     Database,
   /// Redis が無効な場合は `None`
   pub redis:  Option<RedisClient>,
   pub logger: Logger,
}

/// ルーターを構築する
pub fn build_app(config: &AppConfig, deps: AppDeps) -> Router {
   let hello_repo = MySqlHelloRepository::with_base(
      BaseRepository::builder(deps.db.clone())
         .table_name(HELLO_WORLD_TABLE)
         .shard_strategy(config.shard_strategy)
         .build(),
      &deps.logger,
   );
   let hello_state = Arc::new(HelloState {
      usecase: HelloUseCase::new(Arc::new(hello_repo)),
   });
   let readiness_state = Arc::new(ReadinessState::new(deps.db, deps.redis));

   if config.mode == RunMode::Debug {
      for (method, path) in ROUTES {
         tracing::debug!(%method, %path, "ルートを登録しました");
      }
   }

   Router::new()
      .route("/health", get(health_check))
      .merge(
         Router::new()
            .route("/health/ready", get(readiness_check))
            .with_state(readiness_state),
      )
      .merge(
         Router::new()
            .route("/v1/api/hello/{name}", get(hello))
            .with_state(hello_state),
      )
      // レイヤー順序（下に書いたものが外側）
      // 1. SetRequestIdLayer（最外）: x-request-id を採用、無ければ UUID v7 を生成
      // 2. TraceLayer: trace_id 付きのリクエストスパン
      // 3. PropagateRequestIdLayer: レスポンスヘッダに x-request-id をコピー
      // 4. attach_request_context: RequestContext を extensions に格納
      .layer(from_fn(attach_request_context))
      .layer(PropagateRequestIdLayer::x_request_id())
      .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
      .layer(SetRequestIdLayer::x_request_id(MakeTraceId))
}

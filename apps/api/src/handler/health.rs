//! # ヘルスチェックハンドラ
//!
//! - `/health` - Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready` - Readiness Check（MySQL source / replica と Redis の接続状態を確認）

use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use apiscaffold_infra::{Database, InfraError, redis::RedisClient};
use apiscaffold_shared::{CheckStatus, HealthResponse, ReadinessResponse};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// 依存先ごとのチェックのタイムアウト
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness Check
pub async fn health_check() -> Json<HealthResponse> {
   Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}

/// Readiness Check 用の State
pub struct ReadinessState {
   pub db:      Database,
   /// Redis が無効な場合は `None`（チェック対象外）
   pub redis:   Option<RedisClient>,
   pub timeout: Duration,
}

impl ReadinessState {
   pub fn new(db: Database, redis: Option<RedisClient>) -> Self {
      Self {
         db,
         redis,
         timeout: READINESS_TIMEOUT,
      }
   }
}

/// Readiness Check
///
/// 依存先を並行してチェックする。全チェック OK → 200、1 つでも失敗 → 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ReadinessState>>) -> impl IntoResponse {
   let redis = async {
      match &state.redis {
         Some(redis) => Some(check("redis", state.timeout, redis.ping()).await),
         None => None,
      }
   };
   let (source, replica, redis) = tokio::join!(
      check("mysql_source", state.timeout, state.db.ping()),
      check("mysql_replica", state.timeout, state.db.ping_replica()),
      redis,
   );

   let mut checks = BTreeMap::new();
   checks.insert("mysql_source".to_string(), source);
   checks.insert("mysql_replica".to_string(), replica);
   if let Some(redis) = redis {
      checks.insert("redis".to_string(), redis);
   }

   let response = ReadinessResponse::from_checks(checks);
   let http_status = if response.is_ready() {
      StatusCode::OK
   } else {
      StatusCode::SERVICE_UNAVAILABLE
   };

   (http_status, Json(response))
}

async fn check<F>(name: &str, timeout: Duration, probe: F) -> CheckStatus
where
   F: Future<Output = Result<(), InfraError>>,
{
   match tokio::time::timeout(timeout, probe).await {
      Ok(Ok(())) => CheckStatus::Ok,
      Ok(Err(e)) => {
         tracing::warn!(check = name, error = %e, "readiness check failed");
         CheckStatus::Error
      }
      Err(_) => {
         tracing::warn!(check = name, "readiness check timed out");
         CheckStatus::Error
      }
   }
}

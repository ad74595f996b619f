//! # Hello ハンドラ
//!
//! ```text
//! GET /v1/api/hello/{name}
//! ```
//!
//! | 結果 | ステータス | ボディ |
//! |------|-----------|--------|
//! | 成功 | 200 | `{"msg": "hello <name>"}` |
//! | `name` の束縛失敗・空白のみ | 400 | `{"message": "参数错误"}` |
//! | ユースケースのエラー | 500 | `{"message": "内部错误"}` |

use std::sync::Arc;

use apiscaffold_infra::RequestContext;
use axum::{
   Extension,
   Json,
   extract::{Path, State, rejection::PathRejection},
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, usecase::HelloUseCase};

/// Hello ハンドラの State
pub struct HelloState {
   pub usecase: HelloUseCase,
}

/// Hello レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct HelloResponse {
   pub msg: String,
}

/// `GET /v1/api/hello/{name}`
#[tracing::instrument(skip_all)]
pub async fn hello(
   State(state): State<Arc<HelloState>>,
   Extension(ctx): Extension<RequestContext>,
   path: Result<Path<String>, PathRejection>,
) -> Result<Json<HelloResponse>, ApiError> {
   let Path(name) = path?;
   let name = name.trim();
   if name.is_empty() {
      return Err(ApiError::BadRequest("name が空です".to_string()));
   }

   let msg = state.usecase.hello(&ctx, name).await?;
   Ok(Json(HelloResponse { msg }))
}

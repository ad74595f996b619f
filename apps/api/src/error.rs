//! # API エラーハンドリング
//!
//! ハンドラのエラーを HTTP レスポンスに変換する。
//!
//! ## レスポンス形式
//!
//! | エラー | ステータス | ボディ |
//! |--------|-----------|--------|
//! | [`ApiError::BadRequest`] | 400 | `{"message": "参数错误"}` |
//! | [`ApiError::Internal`] | 500 | `{"message": "内部错误"}` |
//!
//! 内部エラーの詳細はクライアントに返さず、サーバーログにのみ出力する。

use apiscaffold_infra::InfraError;
use apiscaffold_shared::MessageResponse;
use axum::{
   Json,
   extract::rejection::PathRejection,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use thiserror::Error;

/// API 層で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
   /// パスパラメータの束縛・検証に失敗した（400 Bad Request）
   #[error("不正なリクエスト: {0}")]
   BadRequest(String),

   /// 予期しないエラー（500 Internal Server Error）
   #[error("内部エラー")]
   Internal(#[from] anyhow::Error),
}

impl From<InfraError> for ApiError {
   fn from(err: InfraError) -> Self {
      if err.is_invalid_argument() {
         Self::BadRequest(err.to_string())
      } else {
         Self::Internal(err.into())
      }
   }
}

impl From<PathRejection> for ApiError {
   fn from(rejection: PathRejection) -> Self {
      Self::BadRequest(rejection.body_text())
   }
}

impl IntoResponse for ApiError {
   fn into_response(self) -> Response {
      match self {
         ApiError::BadRequest(detail) => {
            tracing::debug!(%detail, "不正なリクエスト");
            (StatusCode::BAD_REQUEST, Json(MessageResponse::bad_request())).into_response()
         }
         ApiError::Internal(err) => {
            tracing::error!(error = ?err, "内部エラーが発生しました");
            (
               StatusCode::INTERNAL_SERVER_ERROR,
               Json(MessageResponse::internal_error()),
            )
               .into_response()
         }
      }
   }
}

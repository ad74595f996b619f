//! # メッセージレスポンス
//!
//! エラー時に返す `{"message": "..."}` 形式のボディ。
//! axum の `IntoResponse` 変換は各アプリの責務（shared に axum 依存を入れない）。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
   pub message: String,
}

impl MessageResponse {
   pub fn new(message: impl Into<String>) -> Self {
      Self {
         message: message.into(),
      }
   }

   /// 400 パラメータエラー
   pub fn bad_request() -> Self {
      Self::new("参数错误")
   }

   /// 500 内部エラー
   ///
   /// 内部情報を漏らさないため固定文言。
   pub fn internal_error() -> Self {
      Self::new("内部错误")
   }
}

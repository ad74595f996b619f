//! # 永続化モデル
//!
//! `hello_world` テーブルの行。NULL 許容の列は `Option<T>` で表し、
//! JSON では `null` として出力する。日時は `"YYYY-MM-DD HH:MM:SS"` 形式。

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// `mystruct` 列に JSON で格納する値
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MyStruct {
    pub name: String,
    pub age:  i32,
}

/// `hello_world` テーブルの行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HelloWorld {
    pub id:          u64,
    pub name:        Option<String>,
    #[serde(with = "apiscaffold_shared::datetime::option")]
    pub create_time: Option<NaiveDateTime>,
    pub age:         Option<i32>,
    #[sqlx(rename = "mystruct")]
    #[serde(rename = "mystruct")]
    pub my_struct:   Option<Json<MyStruct>>,
}

/// 挿入する行
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewHelloWorld {
    pub name:        Option<String>,
    pub create_time: Option<NaiveDateTime>,
    pub age:         Option<i32>,
    pub my_struct:   Option<MyStruct>,
}

/// 更新する列
///
/// `None` の列は更新しない。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HelloWorldChanges {
    pub name:      Option<String>,
    pub age:       Option<i32>,
    pub my_struct: Option<MyStruct>,
}

impl HelloWorldChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.my_struct.is_none()
    }
}

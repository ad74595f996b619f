//! テスト共通フィクスチャ
//!
//! DB を使用する統合テストで共通利用するヘルパー。

// 各テストファイルが独立したクレートとしてコンパイルされるため、
// 使用しない関数に dead_code 警告が出る。モジュール全体で抑制する。
#![allow(dead_code)]

use apiscaffold_infra::{
    Database,
    RequestContext,
    model::{MyStruct, NewHelloWorld},
};
use apiscaffold_shared::{Logger, TraceContext, TraceId};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

/// テスト用 DB（source / replica に同じプールを使う）
pub fn database(pool: &MySqlPool) -> Database {
    Database::from_pools(vec![pool.clone()], vec![pool.clone()]).unwrap()
}

pub fn logger() -> Logger {
    Logger::new("apiscaffold-test")
}

pub fn ctx() -> RequestContext {
    RequestContext::new(TraceContext::new(TraceId::new()))
}

/// テストで使う固定時刻
pub fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

pub fn new_row(name: &str) -> NewHelloWorld {
    NewHelloWorld {
        name:        Some(name.to_string()),
        create_time: Some(test_now()),
        age:         Some(20),
        my_struct:   Some(MyStruct {
            name: format!("{name}-inner"),
            age:  1,
        }),
    }
}

/// テーブルの行数
pub async fn count_rows(pool: &MySqlPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

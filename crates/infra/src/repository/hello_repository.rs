//! # HelloRepository
//!
//! `hello_world` テーブルを扱うリポジトリ。
//!
//! ## 設計方針
//!
//! - **BaseRepository 経由**: 全クエリは `get_db(ctx)`（参照系は `get_read_db(ctx)`）で得た接続と
//!   `table_name(ctx)` で得たテーブル名を使う
//! - **動的テーブル名**: シャーディングでテーブル名が変わるため、
//!   コンパイル時検証付きの `query!` ではなく `query_as` を使う
//! - **期限**: クエリは `ctx.bounded` で包み、コンテキストの期限を超えたらキャンセルする

use apiscaffold_shared::observability::Logger;
use async_trait::async_trait;
use sqlx::{MySql, QueryBuilder, types::Json};

use crate::{
    context::RequestContext,
    db::Database,
    error::InfraError,
    model::{HelloWorld, HelloWorldChanges, NewHelloWorld},
    repository::BaseRepository,
    shard::ShardStrategy,
};

/// 論理テーブル名
pub const HELLO_WORLD_TABLE: &str = "hello_world";

/// 挨拶の接頭辞
const GREETING: &str = "hello ";

/// HelloRepository トレイト
#[async_trait]
pub trait HelloRepository: Send + Sync {
    /// 挨拶文の接頭辞を返す
    async fn greeting(&self, ctx: &RequestContext) -> Result<String, InfraError>;

    /// ID で行を検索する
    async fn find_by_id(
        &self,
        ctx: &RequestContext,
        id: u64,
    ) -> Result<Option<HelloWorld>, InfraError>;

    /// 行を挿入し、採番された ID を返す
    async fn insert(&self, ctx: &RequestContext, row: &NewHelloWorld) -> Result<u64, InfraError>;

    /// 指定した列を更新し、影響を受けた行数を返す
    async fn update(
        &self,
        ctx: &RequestContext,
        id: u64,
        changes: &HelloWorldChanges,
    ) -> Result<u64, InfraError>;
}

/// MySQL 実装の HelloRepository
#[derive(Debug, Clone)]
pub struct MySqlHelloRepository {
    base:   BaseRepository,
    logger: Logger,
}

impl MySqlHelloRepository {
    /// シャーディングしないリポジトリを作成する
    pub fn new(db: Database, logger: &Logger) -> Self {
        Self::with_base(
            BaseRepository::builder(db)
                .table_name(HELLO_WORLD_TABLE)
                .shard_strategy(ShardStrategy::None)
                .build(),
            logger,
        )
    }

    /// 構築済みの BaseRepository を使うリポジトリを作成する
    pub fn with_base(base: BaseRepository, logger: &Logger) -> Self {
        Self {
            base,
            logger: logger.named("HelloRepository"),
        }
    }

    pub fn base(&self) -> &BaseRepository {
        &self.base
    }
}

#[async_trait]
impl HelloRepository for MySqlHelloRepository {
    async fn greeting(&self, ctx: &RequestContext) -> Result<String, InfraError> {
        self.logger.info(ctx.trace(), "hello");
        Ok(GREETING.to_string())
    }

    async fn find_by_id(
        &self,
        ctx: &RequestContext,
        id: u64,
    ) -> Result<Option<HelloWorld>, InfraError> {
        let sql = format!(
            "SELECT id, name, create_time, age, mystruct FROM {} WHERE id = ?",
            self.base.table_name(ctx)
        );
        let mut conn = self.base.get_read_db(ctx).acquire().await?;

        ctx.bounded(async {
            let row = sqlx::query_as::<_, HelloWorld>(&sql)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
            Ok::<_, InfraError>(row)
        })
        .await
    }

    async fn insert(&self, ctx: &RequestContext, row: &NewHelloWorld) -> Result<u64, InfraError> {
        let sql = format!(
            "INSERT INTO {} (name, create_time, age, mystruct) VALUES (?, ?, ?, ?)",
            self.base.table_name(ctx)
        );
        let mut conn = self.base.get_db(ctx).acquire().await?;

        let id = ctx
            .bounded(async {
                let result = sqlx::query(&sql)
                    .bind(&row.name)
                    .bind(row.create_time)
                    .bind(row.age)
                    .bind(row.my_struct.as_ref().map(Json))
                    .execute(&mut *conn)
                    .await?;
                Ok::<_, InfraError>(result.last_insert_id())
            })
            .await?;

        self.logger
            .debug(ctx.trace(), format_args!("{HELLO_WORLD_TABLE} に id={id} を挿入しました"));
        Ok(id)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: u64,
        changes: &HelloWorldChanges,
    ) -> Result<u64, InfraError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut builder =
            QueryBuilder::<MySql>::new(format!("UPDATE {} SET ", self.base.table_name(ctx)));
        {
            let mut columns = builder.separated(", ");
            if let Some(name) = &changes.name {
                columns.push("name = ").push_bind_unseparated(name);
            }
            if let Some(age) = changes.age {
                columns.push("age = ").push_bind_unseparated(age);
            }
            if let Some(my_struct) = &changes.my_struct {
                columns
                    .push("mystruct = ")
                    .push_bind_unseparated(Json(my_struct));
            }
        }
        builder.push(" WHERE id = ").push_bind(id);

        let mut conn = self.base.get_db(ctx).acquire().await?;
        ctx.bounded(async {
            let result = builder.build().execute(&mut *conn).await?;
            Ok::<_, InfraError>(result.rows_affected())
        })
        .await
    }
}

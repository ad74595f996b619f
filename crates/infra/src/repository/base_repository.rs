//! # BaseRepository
//!
//! 全ての具象リポジトリが利用する、接続先とテーブル名の解決を担う共通部品。
//!
//! ## 設計方針
//!
//! - **読み書き分離**: [`write`](BaseRepository::write) は source、
//!   [`read`](BaseRepository::read) は replica に向ける
//! - **トランザクション優先**: コンテキストにトランザクションがあれば、
//!   [`get_db`](BaseRepository::get_db) / [`get_read_db`](BaseRepository::get_read_db)
//!   は無条件にそれを返す
//! - **シャード解決**: [`set_suffix`](BaseRepository::set_suffix) でサフィックスを
//!   コンテキストに載せ、[`table_name`](BaseRepository::table_name) で物理テーブル名を得る
//! - **不変**: 起動時に一度だけ構築し、リクエスト間で共有する
//!
//! ## 使用例
//!
//! ```rust,ignore
//! let repo = BaseRepository::builder(db)
//!     .table_name("orders")
//!     .shard_strategy(ShardStrategy::Modulus)
//!     .build();
//!
//! let ctx = repo.set_suffix(&ctx, Some(ShardKey::modulus(17, 5)))?;
//! assert_eq!(repo.table_name(&ctx), "orders_2");
//! ```

use std::{fmt, sync::Arc};

use crate::{
    context::RequestContext,
    db::{Database, DbHandle, Route, TransactionManager, TxHandle},
    error::InfraError,
    shard::{DefaultShardSuffix, ShardKey, ShardStrategy, ShardSuffixFunctions},
};

/// 接続先・テーブル名解決のファサード
#[derive(Clone)]
pub struct BaseRepository {
    db:              Database,
    table_name:      String,
    shard_strategy:  ShardStrategy,
    shard_functions: Arc<dyn ShardSuffixFunctions>,
    tx_manager:      Arc<dyn TransactionManager>,
}

impl BaseRepository {
    /// ビルダーを作成する
    pub fn builder(db: Database) -> BaseRepositoryBuilder {
        BaseRepositoryBuilder {
            db,
            table_name: String::new(),
            shard_strategy: ShardStrategy::default(),
            shard_functions: None,
            tx_manager: None,
        }
    }

    /// 論理テーブル名
    pub fn logical_table_name(&self) -> &str {
        &self.table_name
    }

    pub fn shard_strategy(&self) -> ShardStrategy {
        self.shard_strategy
    }

    /// 書き込み用（source）のハンドル
    pub fn write(&self, ctx: &RequestContext) -> DbHandle {
        DbHandle::pool(self.db.source().clone(), Route::Primary, ctx.deadline())
    }

    /// 読み取り用（replica）のハンドル
    ///
    /// レプリケーション遅延があるため、直前の書き込みが見える保証はない。
    pub fn read(&self, ctx: &RequestContext) -> DbHandle {
        DbHandle::pool(self.db.replica().clone(), Route::Replica, ctx.deadline())
    }

    /// トランザクションを載せたコンテキストを返す
    ///
    /// `existing` が `None` なら source でトランザクションを開始し、
    /// `Some` ならそれをそのまま採用する。コミット・ロールバックは呼び出し側の責務。
    pub async fn start_trans(
        &self,
        ctx: &RequestContext,
        existing: Option<TxHandle>,
    ) -> Result<RequestContext, InfraError> {
        let tx = match existing {
            Some(tx) => tx,
            None => ctx.bounded(self.tx_manager.begin()).await?,
        };
        Ok(ctx.with_transaction(tx))
    }

    /// 既定のハンドル
    ///
    /// コンテキストにトランザクションがあればそれを、無ければ source を返す。
    pub fn get_db(&self, ctx: &RequestContext) -> DbHandle {
        match ctx.transaction() {
            Some(tx) => DbHandle::transaction(tx.clone(), ctx.deadline()),
            None => self.write(ctx),
        }
    }

    /// 読み取り用の既定ハンドル
    ///
    /// コンテキストにトランザクションがあればそれを、無ければ replica を返す。
    /// 参照系クエリは [`get_db`](Self::get_db) ではなくこちらを使う。
    pub fn get_read_db(&self, ctx: &RequestContext) -> DbHandle {
        match ctx.transaction() {
            Some(tx) => DbHandle::transaction(tx.clone(), ctx.deadline()),
            None => self.read(ctx),
        }
    }

    /// シャードキーからサフィックスを算出し、コンテキストに載せて返す
    ///
    /// - `none`: コンテキストをそのまま返す
    /// - `day` / `week` / `month`: 時刻キーが必要
    /// - `modulus`: 剰余キーが必要（`base` は非 0）
    ///
    /// キーが戦略に合わない場合は `InvalidArgument`。入力のコンテキストは変更しない。
    pub fn set_suffix(
        &self,
        ctx: &RequestContext,
        key: Option<ShardKey>,
    ) -> Result<RequestContext, InfraError> {
        let functions = self.shard_functions.as_ref();
        let suffix = match (self.shard_strategy, key) {
            (ShardStrategy::None, _) => return Ok(ctx.clone()),
            (ShardStrategy::Day, Some(ShardKey::Time(at))) => functions.day(&at),
            (ShardStrategy::Week, Some(ShardKey::Time(at))) => functions.week(&at),
            (ShardStrategy::Month, Some(ShardKey::Time(at))) => functions.month(&at),
            (ShardStrategy::Modulus, Some(ShardKey::Modulus { base: 0, .. })) => {
                return Err(InfraError::invalid_argument(
                    "modulus シャーディングの base に 0 は指定できません",
                ));
            }
            (ShardStrategy::Modulus, Some(ShardKey::Modulus { value, base })) => {
                functions.modulus(value, base)
            }
            (strategy, key) => {
                let expected = if strategy.is_time_based() {
                    "時刻"
                } else {
                    "剰余"
                };
                return Err(InfraError::invalid_argument(format!(
                    "{strategy} シャーディングには{expected}キーが必要です（受け取ったキー: {key:?}）"
                )));
            }
        };
        Ok(ctx.with_shard_suffix(suffix))
    }

    /// 物理テーブル名
    ///
    /// `none` なら論理テーブル名、それ以外は `<table>_<suffix>`。
    /// サフィックスはコンテキストから読む（未設定なら空）ため、先に
    /// [`set_suffix`](Self::set_suffix) を呼んでおくこと。
    pub fn table_name(&self, ctx: &RequestContext) -> String {
        match self.shard_strategy {
            ShardStrategy::None => self.table_name.clone(),
            _ => format!(
                "{}_{}",
                self.table_name,
                ctx.shard_suffix().unwrap_or_default()
            ),
        }
    }
}

impl fmt::Debug for BaseRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseRepository")
            .field("table_name", &self.table_name)
            .field("shard_strategy", &self.shard_strategy)
            .finish_non_exhaustive()
    }
}

/// [`BaseRepository`] のビルダー
pub struct BaseRepositoryBuilder {
    db:              Database,
    table_name:      String,
    shard_strategy:  ShardStrategy,
    shard_functions: Option<Arc<dyn ShardSuffixFunctions>>,
    tx_manager:      Option<Arc<dyn TransactionManager>>,
}

impl BaseRepositoryBuilder {
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn shard_strategy(mut self, strategy: ShardStrategy) -> Self {
        self.shard_strategy = strategy;
        self
    }

    /// サフィックス算出関数を差し替える（既定は [`DefaultShardSuffix`]）
    pub fn shard_functions(mut self, functions: Arc<dyn ShardSuffixFunctions>) -> Self {
        self.shard_functions = Some(functions);
        self
    }

    /// トランザクションの開始方法を差し替える（既定は `Database` の source）
    pub fn transaction_manager(mut self, manager: Arc<dyn TransactionManager>) -> Self {
        self.tx_manager = Some(manager);
        self
    }

    pub fn build(self) -> BaseRepository {
        let tx_manager = self
            .tx_manager
            .unwrap_or_else(|| Arc::new(self.db.clone()) as Arc<dyn TransactionManager>);
        BaseRepository {
            db: self.db,
            table_name: self.table_name,
            shard_strategy: self.shard_strategy,
            shard_functions: self
                .shard_functions
                .unwrap_or_else(|| Arc::new(DefaultShardSuffix) as Arc<dyn ShardSuffixFunctions>),
            tx_manager,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

    use super::*;
    use crate::{error::InfraErrorKind, mock::MockTransactionManager};

    fn lazy_database() -> Database {
        let pool = || MySqlPoolOptions::new().connect_lazy_with(MySqlConnectOptions::new());
        Database::from_pools(vec![pool()], vec![pool()]).unwrap()
    }

    fn repo(strategy: ShardStrategy) -> BaseRepository {
        BaseRepository::builder(lazy_database())
            .table_name("orders")
            .shard_strategy(strategy)
            .build()
    }

    fn time_key(y: i32, m: u32, d: u32) -> ShardKey {
        let offset = FixedOffset::east_opt(0).unwrap();
        ShardKey::Time(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_local_timezone(offset)
                .unwrap(),
        )
    }

    // ===== 読み書き分離 =====

    #[tokio::test]
    async fn test_writeはsourceにreadはreplicaに向く() {
        let repo = repo(ShardStrategy::None);
        let ctx = RequestContext::background();

        assert_eq!(repo.write(&ctx).route(), Route::Primary);
        assert_eq!(repo.read(&ctx).route(), Route::Replica);
    }

    #[tokio::test]
    async fn test_get_dbはトランザクションが無ければsourceを返す() {
        let repo = repo(ShardStrategy::None);

        let handle = repo.get_db(&RequestContext::background());

        assert_eq!(handle.route(), Route::Primary);
        assert!(handle.transaction_handle().is_none());
    }

    #[tokio::test]
    async fn test_get_dbはトランザクションがあれば無条件にそれを返す() {
        let repo = repo(ShardStrategy::Modulus);
        let tx = TxHandle::mock();
        let ctx = RequestContext::background()
            .with_shard_suffix("1")
            .with_transaction(tx.clone());

        let handle = repo.get_db(&ctx);

        assert_eq!(handle.route(), Route::Transaction);
        assert!(handle.transaction_handle().unwrap().same_as(&tx));
    }

    #[tokio::test]
    async fn test_get_read_dbはトランザクションが無ければreplicaを返す() {
        let repo = repo(ShardStrategy::None);

        let handle = repo.get_read_db(&RequestContext::background());

        assert_eq!(handle.route(), Route::Replica);
        assert!(handle.transaction_handle().is_none());
    }

    #[tokio::test]
    async fn test_get_read_dbもトランザクションがあればそれを返す() {
        let repo = repo(ShardStrategy::None);
        let tx = TxHandle::mock();
        let ctx = RequestContext::background().with_transaction(tx.clone());

        let handle = repo.get_read_db(&ctx);

        assert_eq!(handle.route(), Route::Transaction);
        assert!(handle.transaction_handle().unwrap().same_as(&tx));
    }

    #[tokio::test]
    async fn test_ハンドルはコンテキストの期限を引き継ぐ() {
        let repo = repo(ShardStrategy::None);
        let ctx = RequestContext::background().with_timeout(std::time::Duration::from_secs(3));

        assert_eq!(repo.get_db(&ctx).deadline(), ctx.deadline());
        assert_eq!(repo.read(&ctx).deadline(), ctx.deadline());
    }

    // ===== start_trans =====

    #[tokio::test]
    async fn test_start_transは既存が無ければトランザクションを1つだけ開始する() {
        let manager = Arc::new(MockTransactionManager::new());
        let repo = BaseRepository::builder(lazy_database())
            .table_name("orders")
            .transaction_manager(manager.clone())
            .build();
        let ctx = RequestContext::background();

        let tx_ctx = repo.start_trans(&ctx, None).await.unwrap();

        assert_eq!(manager.begin_count(), 1);
        let tx = tx_ctx.transaction().unwrap();
        assert!(repo.get_db(&tx_ctx).transaction_handle().unwrap().same_as(tx));
        assert!(ctx.transaction().is_none());
    }

    #[tokio::test]
    async fn test_start_transは既存のトランザクションをそのまま採用する() {
        let manager = Arc::new(MockTransactionManager::new());
        let repo = BaseRepository::builder(lazy_database())
            .transaction_manager(manager.clone())
            .build();
        let existing = TxHandle::mock();

        let tx_ctx = repo
            .start_trans(&RequestContext::background(), Some(existing.clone()))
            .await
            .unwrap();

        assert_eq!(manager.begin_count(), 0);
        assert!(tx_ctx.transaction().unwrap().same_as(&existing));
        assert!(existing.is_open().await);
    }

    #[tokio::test]
    async fn test_start_transは開始失敗をそのまま返す() {
        let manager = Arc::new(MockTransactionManager::failing());
        let repo = BaseRepository::builder(lazy_database())
            .transaction_manager(manager.clone())
            .build();

        let err = repo
            .start_trans(&RequestContext::background(), None)
            .await
            .unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::Database(_)));
        assert_eq!(manager.begin_count(), 1);
    }

    // ===== set_suffix / table_name =====

    #[tokio::test]
    async fn test_modulusは17と5でサフィックス2になる() {
        let repo = repo(ShardStrategy::Modulus);

        let ctx = repo
            .set_suffix(&RequestContext::background(), Some(ShardKey::modulus(17, 5)))
            .unwrap();

        assert_eq!(ctx.shard_suffix(), Some("2"));
        assert_eq!(repo.table_name(&ctx), "orders_2");
    }

    #[tokio::test]
    async fn test_noneはキーに関わらずテーブル名をそのまま返す() {
        let repo = repo(ShardStrategy::None);
        let base = RequestContext::background().with_shard_suffix("ignored");

        let ctx = repo.set_suffix(&base, Some(ShardKey::modulus(1, 2))).unwrap();
        assert_eq!(ctx.shard_suffix(), Some("ignored"));
        assert_eq!(repo.table_name(&ctx), "orders");

        let ctx = repo.set_suffix(&base, None).unwrap();
        assert_eq!(repo.table_name(&ctx), "orders");
    }

    #[rstest]
    #[case(ShardStrategy::Day, "orders_20240317")]
    #[case(ShardStrategy::Week, "orders_20240311w")]
    #[case(ShardStrategy::Month, "orders_202403")]
    #[tokio::test]
    async fn test_時刻戦略はそれぞれの関数でサフィックスを作る(
        #[case] strategy: ShardStrategy,
        #[case] expected: &str,
    ) {
        let repo = repo(strategy);

        let ctx = repo
            .set_suffix(&RequestContext::background(), Some(time_key(2024, 3, 17)))
            .unwrap();

        assert_eq!(repo.table_name(&ctx), expected);
    }

    #[rstest]
    #[case(ShardStrategy::Day, None)]
    #[case(ShardStrategy::Week, Some(ShardKey::modulus(1, 2)))]
    #[case(ShardStrategy::Month, None)]
    #[case(ShardStrategy::Modulus, None)]
    #[case(ShardStrategy::Modulus, Some(time_key(2024, 1, 1)))]
    #[case(ShardStrategy::Modulus, Some(ShardKey::modulus(5, 0)))]
    #[tokio::test]
    async fn test_戦略に合わないキーはinvalid_argumentで入力コンテキストを変更しない(
        #[case] strategy: ShardStrategy,
        #[case] key: Option<ShardKey>,
    ) {
        let repo = repo(strategy);
        let ctx = RequestContext::background().with_shard_suffix("keep");

        let err = repo.set_suffix(&ctx, key).unwrap_err();

        assert!(err.is_invalid_argument());
        assert_eq!(ctx.shard_suffix(), Some("keep"));
    }

    #[tokio::test]
    async fn test_サフィックス未設定の場合はアンダースコアで終わる() {
        let repo = repo(ShardStrategy::Day);
        assert_eq!(repo.table_name(&RequestContext::background()), "orders_");
    }

    #[tokio::test]
    async fn test_サフィックス関数を差し替えられる() {
        struct Padded;
        impl ShardSuffixFunctions for Padded {
            fn modulus(&self, value: i64, base: i64) -> String {
                format!("{:03}", value % base)
            }
        }

        let repo = BaseRepository::builder(lazy_database())
            .table_name("orders")
            .shard_strategy(ShardStrategy::Modulus)
            .shard_functions(Arc::new(Padded))
            .build();

        let ctx = repo
            .set_suffix(&RequestContext::background(), Some(ShardKey::modulus(17, 5)))
            .unwrap();

        assert_eq!(repo.table_name(&ctx), "orders_002");
    }
}

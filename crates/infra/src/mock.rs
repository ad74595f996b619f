//! # テスト用モック
//!
//! ユースケース・ハンドラのテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! apiscaffold-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{
   Arc,
   Mutex,
   atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
   context::RequestContext,
   db::{TransactionManager, TxHandle},
   error::InfraError,
   model::{HelloWorld, HelloWorldChanges, NewHelloWorld},
   repository::HelloRepository,
};

// ===== MockTransactionManager =====

/// `begin` の呼び出し回数を数える TransactionManager
#[derive(Debug, Default)]
pub struct MockTransactionManager {
   begins:  AtomicUsize,
   failing: bool,
}

impl MockTransactionManager {
   pub fn new() -> Self {
      Self::default()
   }

   /// `begin` が常に失敗するモック
   pub fn failing() -> Self {
      Self {
         begins:  AtomicUsize::new(0),
         failing: true,
      }
   }

   /// `begin` が呼ばれた回数
   pub fn begin_count(&self) -> usize {
      self.begins.load(Ordering::SeqCst)
   }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
   async fn begin(&self) -> Result<TxHandle, InfraError> {
      self.begins.fetch_add(1, Ordering::SeqCst);
      if self.failing {
         return Err(sqlx::Error::PoolTimedOut.into());
      }
      Ok(TxHandle::mock())
   }
}

// ===== MockHelloRepository =====

#[derive(Clone, Default)]
pub struct MockHelloRepository {
   rows:    Arc<Mutex<Vec<HelloWorld>>>,
   failing: bool,
}

impl MockHelloRepository {
   pub fn new() -> Self {
      Self::default()
   }

   /// 全操作が失敗するモック
   pub fn failing() -> Self {
      Self {
         rows:    Arc::default(),
         failing: true,
      }
   }

   pub fn rows(&self) -> Vec<HelloWorld> {
      self.rows.lock().unwrap().clone()
   }

   fn check(&self) -> Result<(), InfraError> {
      if self.failing {
         return Err(InfraError::unexpected("mock failure"));
      }
      Ok(())
   }
}

#[async_trait]
impl HelloRepository for MockHelloRepository {
   async fn greeting(&self, _ctx: &RequestContext) -> Result<String, InfraError> {
      self.check()?;
      Ok("hello ".to_string())
   }

   async fn find_by_id(
      &self,
      _ctx: &RequestContext,
      id: u64,
   ) -> Result<Option<HelloWorld>, InfraError> {
      self.check()?;
      Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
   }

   async fn insert(&self, _ctx: &RequestContext, row: &NewHelloWorld) -> Result<u64, InfraError> {
      self.check()?;
      let mut rows = self.rows.lock().unwrap();
      let id = rows.len() as u64 + 1;
      rows.push(HelloWorld {
         id,
         name: row.name.clone(),
         create_time: row.create_time,
         age: row.age,
         my_struct: row.my_struct.clone().map(sqlx::types::Json),
      });
      Ok(id)
   }

   async fn update(
      &self,
      _ctx: &RequestContext,
      id: u64,
      changes: &HelloWorldChanges,
   ) -> Result<u64, InfraError> {
      self.check()?;
      let mut rows = self.rows.lock().unwrap();
      let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
         return Ok(0);
      };
      if let Some(name) = &changes.name {
         row.name = Some(name.clone());
      }
      if let Some(age) = changes.age {
         row.age = Some(age);
      }
      if let Some(my_struct) = &changes.my_struct {
         row.my_struct = Some(sqlx::types::Json(my_struct.clone()));
      }
      Ok(1)
   }
}

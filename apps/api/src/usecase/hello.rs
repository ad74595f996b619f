//! # Hello ユースケース

use std::sync::Arc;

use apiscaffold_infra::{InfraError, RequestContext, repository::HelloRepository};

/// 挨拶文を組み立てるユースケース
#[derive(Clone)]
pub struct HelloUseCase {
   repo: Arc<dyn HelloRepository>,
}

impl HelloUseCase {
   pub fn new(repo: Arc<dyn HelloRepository>) -> Self {
      Self { repo }
   }

   /// リポジトリの挨拶文に `name` を連結する
   pub async fn hello(&self, ctx: &RequestContext, name: &str) -> Result<String, InfraError> {
      let greeting = self.repo.greeting(ctx).await?;
      Ok(format!("{greeting}{name}"))
   }
}

#[cfg(test)]
mod tests {
   use apiscaffold_infra::mock::MockHelloRepository;
   use pretty_assertions::assert_eq;

   use super::*;

   #[tokio::test]
   async fn test_helloは挨拶文と名前を連結する() {
      let sut = HelloUseCase::new(Arc::new(MockHelloRepository::new()));

      let msg = sut.hello(&RequestContext::background(), "world").await.unwrap();

      assert_eq!(msg, "hello world");
   }

   #[tokio::test]
   async fn test_リポジトリのエラーをそのまま返す() {
      let sut = HelloUseCase::new(Arc::new(MockHelloRepository::failing()));

      let result = sut.hello(&RequestContext::background(), "world").await;

      assert!(result.is_err());
   }
}

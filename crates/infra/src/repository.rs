//! # リポジトリ実装
//!
//! - [`BaseRepository`]: 読み書き分離・トランザクション・シャーディングの解決
//! - [`HelloRepository`]: `hello_world` テーブル

pub mod base_repository;
pub mod hello_repository;

pub use base_repository::{BaseRepository, BaseRepositoryBuilder};
pub use hello_repository::{HELLO_WORLD_TABLE, HelloRepository, MySqlHelloRepository};

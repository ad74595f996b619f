//! # ユースケース層
//!
//! ハンドラから呼ばれるアプリケーションロジック。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリを `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは入出力の変換に留め、ロジックはユースケースに集約

pub mod hello;

pub use hello::HelloUseCase;

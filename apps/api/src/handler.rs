//! # HTTP ハンドラ
//!
//! - [`hello`] - 挨拶 API
//! - [`health`] - ヘルスチェック

pub mod health;
pub mod hello;

pub use health::{ReadinessState, health_check, readiness_check};
pub use hello::{HelloResponse, HelloState, hello};

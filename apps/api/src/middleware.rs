//! # ミドルウェア
//!
//! - [`request_context`] - Request ID から [`RequestContext`](apiscaffold_infra::RequestContext) を組み立てる

pub mod request_context;

pub use request_context::{attach_request_context, make_request_span};

//! # ヘルスチェック共通型
//!
//! `/health`（Liveness）と `/health/ready`（Readiness）で返すレスポンス型。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// ヘルスチェックレスポンス
///
/// ```
/// use apiscaffold_shared::HealthResponse;
///
/// let response = HealthResponse::healthy("0.1.0");
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 稼働状態（`"healthy"` 固定）
    pub status:  String,
    /// アプリケーションバージョン（Cargo.toml から取得）
    pub version: String,
}

impl HealthResponse {
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status:  "healthy".to_string(),
            version: version.into(),
        }
    }
}

/// 個別チェックの結果ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// チェック成功
    Ok,
    /// チェック失敗
    Error,
}

/// Readiness 全体のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// 全依存先が利用可能
    Ready,
    /// 一部の依存先が利用不可
    NotReady,
}

/// Readiness Check レスポンス
///
/// `checks` のキーは依存先名（`mysql_source`, `mysql_replica`, `redis`）。
/// 出力順を安定させるため `BTreeMap` を使う。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// 全体のステータス
    pub status: ReadinessStatus,
    /// 個別チェック結果
    pub checks: BTreeMap<String, CheckStatus>,
}

impl ReadinessResponse {
    /// 個別チェック結果から全体のステータスを導出する
    ///
    /// 1 つでも `Error` があれば `NotReady`。
    pub fn from_checks(checks: BTreeMap<String, CheckStatus>) -> Self {
        let status = if checks.values().all(|s| *s == CheckStatus::Ok) {
            ReadinessStatus::Ready
        } else {
            ReadinessStatus::NotReady
        };
        Self { status, checks }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ReadinessStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_health_responseのserializeで正しいjson形状にする() {
        let json = serde_json::to_value(HealthResponse::healthy("0.1.0")).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": "healthy",
                "version": "0.1.0"
            })
        );
    }

    #[test]
    fn test_全チェック成功ならready() {
        let checks = BTreeMap::from([
            ("mysql_source".to_string(), CheckStatus::Ok),
            ("mysql_replica".to_string(), CheckStatus::Ok),
        ]);

        let response = ReadinessResponse::from_checks(checks);

        assert!(response.is_ready());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["checks"]["mysql_source"], "ok");
    }

    #[test]
    fn test_一つでも失敗ならnot_ready() {
        let checks = BTreeMap::from([
            ("mysql_source".to_string(), CheckStatus::Ok),
            ("redis".to_string(), CheckStatus::Error),
        ]);

        let response = ReadinessResponse::from_checks(checks);

        assert_eq!(response.status, ReadinessStatus::NotReady);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "not_ready");
        assert_eq!(json["checks"]["redis"], "error");
    }
}

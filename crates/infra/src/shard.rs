//! # テーブルシャーディング
//!
//! 時刻または数値のキーからテーブル名サフィックスを算出する。
//!
//! | 戦略 | キー | サフィックス例 |
//! |------|------|----------------|
//! | `none` | 不要 | （なし） |
//! | `day` | 時刻 | `20240315` |
//! | `week` | 時刻 | `20240311w`（その週の月曜日） |
//! | `month` | 時刻 | `202403` |
//! | `modulus` | `(value, base)` | `value % base` |
//!
//! サフィックスの算出は [`ShardSuffixFunctions`] の既定実装で行い、
//! リポジトリ構築時に差し替えられる。

use chrono::{DateTime, Datelike, Days, FixedOffset, TimeZone};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::InfraError;

/// シャード戦略
///
/// リポジトリ構築時に固定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ShardStrategy {
    /// シャーディングしない
    #[default]
    None,
    /// 日単位
    Day,
    /// 週単位（月曜始まり）
    Week,
    /// 月単位
    Month,
    /// 剰余
    Modulus,
}

impl ShardStrategy {
    /// 設定テキストからシャード戦略を読み取る
    ///
    /// 未知の文字列は `InvalidConfiguration`。
    pub fn parse(s: &str) -> Result<Self, InfraError> {
        s.trim()
            .parse()
            .map_err(|_| InfraError::invalid_configuration(format!("未知のシャード戦略: {s:?}")))
    }

    /// 時刻キーを要求する戦略か
    pub fn is_time_based(self) -> bool {
        matches!(self, Self::Day | Self::Week | Self::Month)
    }
}

/// シャードキー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardKey {
    /// 時刻キー（day / week / month）
    ///
    /// 日付の境界はこの時刻自身のオフセットで判定する。
    Time(DateTime<FixedOffset>),
    /// 剰余キー（modulus）
    Modulus { value: i64, base: i64 },
}

impl ShardKey {
    /// 任意のタイムゾーンの時刻からキーを作る
    pub fn time<Tz: TimeZone>(at: DateTime<Tz>) -> Self {
        Self::Time(at.fixed_offset())
    }

    pub fn modulus(value: i64, base: i64) -> Self {
        Self::Modulus { value, base }
    }
}

/// サフィックス算出関数のテーブル
///
/// 既定実装を持つため、差し替えたい関数だけを実装すればよい。
///
/// ```rust
/// use apiscaffold_infra::shard::ShardSuffixFunctions;
///
/// struct PaddedModulus;
///
/// impl ShardSuffixFunctions for PaddedModulus {
///     fn modulus(&self, value: i64, base: i64) -> String {
///         format!("{:02}", value.wrapping_rem(base))
///     }
/// }
///
/// assert_eq!(PaddedModulus.modulus(17, 5), "02");
/// ```
pub trait ShardSuffixFunctions: Send + Sync {
    /// `YYYYMMDD`
    fn day(&self, at: &DateTime<FixedOffset>) -> String {
        at.format("%Y%m%d").to_string()
    }

    /// その週の月曜日の `YYYYMMDD` に `w` を付けたもの（日曜日は週の 7 日目）
    fn week(&self, at: &DateTime<FixedOffset>) -> String {
        let date = at.date_naive();
        let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
        format!("{}w", monday.format("%Y%m%d"))
    }

    /// `YYYYMM`
    fn month(&self, at: &DateTime<FixedOffset>) -> String {
        at.format("%Y%m").to_string()
    }

    /// `value % base` の 10 進表記（`base` は非 0 であること）
    fn modulus(&self, value: i64, base: i64) -> String {
        value.wrapping_rem(base).to_string()
    }
}

/// 既定のサフィックス算出関数
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultShardSuffix;

impl ShardSuffixFunctions for DefaultShardSuffix {}

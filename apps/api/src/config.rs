//! # アプリケーション設定
//!
//! `config.yaml` と環境変数から設定を読み込む。
//!
//! ## 読み込み順序
//!
//! 1. `./config.yaml`、無ければ `./config/config.yaml`
//! 2. `APP_` 接頭辞の環境変数（階層は `__` で区切る。例: `APP_PORT`、`APP_MYSQL__LOG`）
//!
//! 後に読んだものが優先される。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use apiscaffold_api::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("{}:{}", config.host, config.port);
//! ```

use std::path::{Path, PathBuf};

use apiscaffold_infra::{MysqlConfig, ShardStrategy, redis::RedisConfig};
use apiscaffold_shared::observability::{LogConfig, parse_level};
use config::{Config, Environment, File, FileFormat, Map};
use serde::Deserialize;
use thiserror::Error;

/// 設定ファイル名
pub const CONFIG_FILE: &str = "config.yaml";

/// 設定ファイルを探すディレクトリ（先頭から順に探す）
const SEARCH_DIRS: [&str; 2] = [".", "./config"];

/// 環境変数の接頭辞
const ENV_PREFIX: &str = "APP";

/// 実行モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
   /// 起動時に登録済みルートをログ出力する
   Debug,
   #[default]
   Release,
   Test,
}

/// アプリケーション設定
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
   /// アプリケーション名（ログの `app` フィールド）
   #[serde(default = "default_name")]
   pub name:           String,
   /// バインドアドレス
   #[serde(default = "default_host")]
   pub host:           String,
   /// ポート番号
   #[serde(default = "default_port")]
   pub port:           u16,
   #[serde(default)]
   pub mode:           RunMode,
   #[serde(default)]
   pub log:            LogConfig,
   pub mysql:          MysqlConfig,
   #[serde(default)]
   pub redis:          RedisConfig,
   /// `mysql.shard_strategy` を読み込み時に解釈したもの（未設定なら `none`）
   #[serde(skip)]
   pub shard_strategy: ShardStrategy,
}

fn default_name() -> String {
   "apiscaffold".to_string()
}

fn default_host() -> String {
   "0.0.0.0".to_string()
}

fn default_port() -> u16 {
   8080
}

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
   #[error("設定ファイル {CONFIG_FILE} が見つかりません（探索先: {searched:?}）")]
   NotFound { searched: Vec<PathBuf> },

   #[error("設定の読み込みに失敗しました: {0}")]
   Load(#[from] config::ConfigError),

   #[error("設定が不正です: {0}")]
   Invalid(String),
}

impl AppConfig {
   /// カレントディレクトリを起点に設定を読み込む
   pub fn load() -> Result<Self, ConfigError> {
      Self::load_from(Path::new("."), None)
   }

   /// `base` を起点に設定ファイルを探して読み込む
   ///
   /// `env` を渡した場合はプロセスの環境変数の代わりに使う（テスト用）。
   pub fn load_from(base: &Path, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
      let path = find_config_file(base)?;

      let mut config: Self = Config::builder()
         .add_source(File::from(path.as_path()).format(FileFormat::Yaml))
         .add_source(
            Environment::with_prefix(ENV_PREFIX)
               .prefix_separator("_")
               .separator("__")
               .try_parsing(true)
               .list_separator(",")
               .with_list_parse_key("mysql.master")
               .with_list_parse_key("mysql.slave")
               .source(env),
         )
         .build()?
         .try_deserialize()?;

      config.shard_strategy = config.validate()?;
      tracing::debug!(path = %path.display(), "設定を読み込みました");
      Ok(config)
   }

   /// 起動前に検出できる設定の誤りを確認し、シャード戦略を解釈して返す
   pub fn validate(&self) -> Result<ShardStrategy, ConfigError> {
      if self.mysql.master.is_empty() {
         return Err(ConfigError::Invalid("mysql.master が空です".to_string()));
      }
      if self.mysql.slave.is_empty() {
         return Err(ConfigError::Invalid("mysql.slave が空です".to_string()));
      }
      parse_level(&self.log.level).map_err(|e| ConfigError::Invalid(e.to_string()))?;
      match &self.mysql.shard_strategy {
         Some(strategy) => {
            ShardStrategy::parse(strategy).map_err(|e| ConfigError::Invalid(e.to_string()))
         }
         None => Ok(ShardStrategy::None),
      }
   }

   /// `host:port`
   pub fn bind_addr(&self) -> String {
      format!("{}:{}", self.host, self.port)
   }
}

fn find_config_file(base: &Path) -> Result<PathBuf, ConfigError> {
   let candidates: Vec<PathBuf> = SEARCH_DIRS
      .iter()
      .map(|dir| base.join(dir).join(CONFIG_FILE))
      .collect();

   candidates
      .iter()
      .find(|path| path.is_file())
      .cloned()
      .ok_or(ConfigError::NotFound {
         searched: candidates,
      })
}

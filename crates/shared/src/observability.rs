//! # Observability 基盤
//!
//! トレーシング初期化、ログ出力先の設定、Trace ID 付きのコンポーネントロガーを提供する。
//!
//! - 出力形式は `log.format`（`json` / `text`）で切り替える
//! - 出力先は `log.mode`（`command` = 標準出力 / `file` = 日次ローテーションファイル）
//! - `RUST_LOG` が設定されている場合は `log.level` より優先する

use std::{fmt, sync::Arc};

use serde::Deserialize;
use thiserror::Error;

use crate::trace::TraceContext;

/// Request ID ヘッダ名（Trace ID として扱う）
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ログ出力形式
///
/// 値が不正な場合は [`Pretty`](LogFormat::Pretty) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum LogFormat {
    /// JSON 形式（本番環境向け）
    Json,
    /// 人間が読みやすいテキスト形式（開発環境向け）
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする
    ///
    /// 不正な値の場合は [`Pretty`](LogFormat::Pretty) にフォールバックし、
    /// stderr に警告を出力する。
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "text" | "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown log.format={other:?}, falling back to text");
                Self::Pretty
            }
        }
    }
}

impl From<String> for LogFormat {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// ログ出力先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum LogMode {
    /// 標準出力
    #[default]
    Command,
    /// ファイル（日次ローテーション）
    File,
}

impl From<String> for LogMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "file" => Self::File,
            _ => Self::Command,
        }
    }
}

/// ログ設定（`config.yaml` の `log` セクション）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// ログレベル（`trace` / `debug` / `info` / `warn` / `error`）
    pub level:     String,
    /// 出力形式
    pub format:    LogFormat,
    /// 出力先
    pub mode:      LogMode,
    /// ファイル出力先ディレクトリ（`mode = file` の場合）
    pub path:      String,
    /// ファイル名の接頭辞（`<file_name>_output.<日付>` で出力される）
    pub file_name: String,
    /// ローテーション済みファイルの保持日数
    pub max_age:   usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level:     "info".to_string(),
            format:    LogFormat::default(),
            mode:      LogMode::default(),
            path:      "./logs".to_string(),
            file_name: "app".to_string(),
            max_age:   7,
        }
    }
}

/// トレーシング初期化エラー
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// ログレベルの指定が不正
    #[error("無効なログレベル: {0}")]
    InvalidLevel(String),

    /// ログファイルの作成に失敗
    #[cfg(feature = "observability")]
    #[error("ログファイルの初期化に失敗しました: {0}")]
    FileAppender(#[from] tracing_appender::rolling::InitError),

    /// グローバル subscriber の設定に失敗（二重初期化など）
    #[error("トレーシングの初期化に失敗しました: {0}")]
    Init(String),
}

/// ログレベル文字列を検証する
pub fn parse_level(level: &str) -> Result<tracing::level_filters::LevelFilter, ObservabilityError> {
    level
        .parse()
        .map_err(|_| ObservabilityError::InvalidLevel(level.to_string()))
}

/// トレーシングを初期化する
///
/// JSON モードでは `timestamp`, `level`, `target`, `message` がトップレベルに出力され、
/// 現在のスパン（`request` スパンの `trace_id` など）が `span` フィールドに含まれる。
/// `tracing_error::ErrorLayer` も登録し、`InfraError` の SpanTrace を有効にする。
///
/// `mode = file` のローテーションは日次のみで、`max_age` 個のファイルを保持する。
/// ファイルサイズによるローテーションは行わない。
#[cfg(feature = "observability")]
pub fn init_tracing(config: &LogConfig) -> Result<(), ObservabilityError> {
    use tracing_subscriber::{
        EnvFilter,
        Layer as _,
        fmt::writer::BoxMakeWriter,
        layer::SubscriberExt,
        util::SubscriberInitExt,
    };

    let level = parse_level(&config.level)?;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let (writer, ansi) = match config.mode {
        LogMode::Command => (BoxMakeWriter::new(std::io::stdout), true),
        LogMode::File => (BoxMakeWriter::new(file_appender(config)?), false),
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .map_err(|e| ObservabilityError::Init(e.to_string()))
}

/// `<path>/<file_name>_output.<日付>` に書き込む日次ローテーションの appender
#[cfg(feature = "observability")]
fn file_appender(
    config: &LogConfig,
) -> Result<tracing_appender::rolling::RollingFileAppender, ObservabilityError> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("{}_output", config.file_name))
        .max_log_files(config.max_age.max(1))
        .build(&config.path)?;
    Ok(appender)
}

/// Trace ID を UUID v7 で生成する `MakeRequestId` 実装
///
/// `SetRequestIdLayer` と組み合わせ、`x-request-id` が無いリクエストに ID を付与する。
#[cfg(feature = "observability")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTraceId;

#[cfg(feature = "observability")]
impl tower_http::request_id::MakeRequestId for MakeTraceId {
    fn make_request_id<B>(
        &mut self,
        _request: &http::Request<B>,
    ) -> Option<tower_http::request_id::RequestId> {
        let id = crate::trace::TraceId::new();
        http::HeaderValue::from_str(id.as_str())
            .ok()
            .map(tower_http::request_id::RequestId::new)
    }
}

// =============================================================================
// Logger
// =============================================================================

/// コンポーネントロガー
///
/// `app` と `caller`（呼び出し元コンポーネント名）を固定フィールドとして持ち、
/// 出力のたびに [`TraceContext`] から `trace_id` と `span` 番号を付与する。
///
/// ```rust
/// use apiscaffold_shared::{observability::Logger, trace::TraceContext};
///
/// let logger = Logger::new("apiscaffold").named("HelloRepository");
/// let trace = TraceContext::default();
/// logger.info(&trace, "hello");
/// ```
#[derive(Debug, Clone)]
pub struct Logger {
    app:    Arc<str>,
    caller: Option<Arc<str>>,
}

macro_rules! emit {
    ($level:ident, $logger:expr, $trace:expr, $message:expr) => {
        tracing::$level!(
            app = %$logger.app,
            caller = $logger.caller(),
            trace_id = %$trace.trace_id(),
            span = $trace.next_span(),
            "{}",
            $message
        )
    };
}

impl Logger {
    /// アプリケーション名を付与したロガーを作成する
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app:    Arc::from(app.into()),
            caller: None,
        }
    }

    /// 呼び出し元コンポーネント名を付与した子ロガーを作成する
    pub fn named(&self, caller: impl Into<String>) -> Self {
        Self {
            app:    self.app.clone(),
            caller: Some(Arc::from(caller.into())),
        }
    }

    /// アプリケーション名
    pub fn app(&self) -> &str {
        &self.app
    }

    /// 呼び出し元コンポーネント名（未設定は `-`）
    pub fn caller(&self) -> &str {
        self.caller.as_deref().unwrap_or("-")
    }

    pub fn debug(&self, trace: &TraceContext, message: impl fmt::Display) {
        emit!(debug, self, trace, message);
    }

    pub fn info(&self, trace: &TraceContext, message: impl fmt::Display) {
        emit!(info, self, trace, message);
    }

    pub fn warn(&self, trace: &TraceContext, message: impl fmt::Display) {
        emit!(warn, self, trace, message);
    }

    pub fn error(&self, trace: &TraceContext, message: impl fmt::Display) {
        emit!(error, self, trace, message);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::trace::TraceId;

    #[cfg(feature = "observability")]
    #[test]
    fn test_file_appenderは日付付きのファイルに書き込む() {
        use std::io::Write as _;

        let dir = tempfile::TempDir::new().unwrap();
        let config = LogConfig {
            mode:      LogMode::File,
            path:      dir.path().display().to_string(),
            file_name: "hello".to_string(),
            max_age:   0,
            ..LogConfig::default()
        };

        let mut appender = file_appender(&config).unwrap();
        appender.write_all(b"{\"message\":\"hello\"}\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("hello_output."), "{names:?}");
    }

    // ===== LogFormat / LogMode =====

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("text", LogFormat::Pretty)]
    #[case("pretty", LogFormat::Pretty)]
    #[case("JSON", LogFormat::Pretty)]
    #[case("", LogFormat::Pretty)]
    fn test_log_formatのparse(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::parse(input), expected);
    }

    #[rstest]
    #[case("file", LogMode::File)]
    #[case("command", LogMode::Command)]
    #[case("console", LogMode::Command)]
    fn test_log_modeの変換(#[case] input: &str, #[case] expected: LogMode) {
        assert_eq!(LogMode::from(input.to_string()), expected);
    }

    #[test]
    fn test_log_configは未指定フィールドをデフォルトで補う() {
        let config: LogConfig = serde_json::from_value(serde_json::json!({
            "level": "debug",
            "format": "json"
        }))
        .unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.mode, LogMode::Command);
        assert_eq!(config.file_name, "app");
        assert_eq!(config.max_age, 7);
    }

    #[rstest]
    #[case("trace")]
    #[case("debug")]
    #[case("info")]
    #[case("warn")]
    #[case("error")]
    fn test_parse_levelは正しいレベルを受け入れる(#[case] level: &str) {
        assert!(parse_level(level).is_ok());
    }

    #[test]
    fn test_parse_levelは不正なレベルを拒否する() {
        let err = parse_level("verbose").unwrap_err();
        assert!(matches!(err, ObservabilityError::InvalidLevel(l) if l == "verbose"));
    }

    // ===== Logger =====

    #[derive(Clone, Default)]
    struct CaptureLayer {
        events: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    }

    #[derive(Default)]
    struct FieldVisitor {
        fields: Vec<(String, String)>,
    }

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }

        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = FieldVisitor::default();
            event.record(&mut visitor);
            self.events.lock().unwrap().push(visitor.fields);
        }
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_loggerはtrace_idとspan連番とcallerを出力する() {
        let capture = CaptureLayer::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let logger = Logger::new("apiscaffold").named("HelloRepository");
        let trace = TraceContext::new(TraceId::from_string("trace-abc"));

        logger.info(&trace, "hello");
        logger.warn(&trace.clone(), "again");

        let events = capture.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(field(&events[0], "trace_id"), Some("trace-abc"));
        assert_eq!(field(&events[0], "span"), Some("1"));
        assert_eq!(field(&events[0], "caller"), Some("HelloRepository"));
        assert_eq!(field(&events[0], "app"), Some("apiscaffold"));
        assert_eq!(field(&events[1], "span"), Some("2"));
    }

    #[test]
    fn test_named未設定のcallerはハイフン() {
        let logger = Logger::new("apiscaffold");
        assert_eq!(logger.caller(), "-");
        assert_eq!(logger.named("X").app(), "apiscaffold");
    }
}

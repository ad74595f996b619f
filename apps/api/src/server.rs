//! # サーバーライフサイクル
//!
//! HTTP サーバーを起動し、シャットダウンシグナルを受けたら Graceful shutdown する。
//! 処理中のリクエストは [`SHUTDOWN_GRACE`] まで待ち、それを超えたら打ち切る。

use std::{
   future::{Future, IntoFuture},
   io,
   sync::Arc,
   time::Duration,
};

use axum::Router;
use tokio::{net::TcpListener, sync::Notify};

/// シャットダウン時に処理中のリクエストを待つ時間
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// SIGINT（Ctrl+C）または SIGTERM を待つ
pub async fn shutdown_signal() {
   let ctrl_c = async {
      if let Err(e) = tokio::signal::ctrl_c().await {
         tracing::error!(error = %e, "SIGINT ハンドラの登録に失敗しました");
         std::future::pending::<()>().await;
      }
   };

   #[cfg(unix)]
   let terminate = async {
      use tokio::signal::unix::{SignalKind, signal};

      match signal(SignalKind::terminate()) {
         Ok(mut sigterm) => {
            sigterm.recv().await;
         }
         Err(e) => {
            tracing::error!(error = %e, "SIGTERM ハンドラの登録に失敗しました");
            std::future::pending::<()>().await;
         }
      }
   };

   #[cfg(not(unix))]
   let terminate = std::future::pending::<()>();

   tokio::select! {
      () = ctrl_c => {},
      () = terminate => {},
   }
   tracing::info!("シャットダウンシグナルを受信しました");
}

/// `shutdown` が完了するまでサーブする
pub async fn run<F>(listener: TcpListener, app: Router, shutdown: F) -> io::Result<()>
where
   F: Future<Output = ()> + Send + 'static,
{
   run_with_grace(listener, app, shutdown, SHUTDOWN_GRACE).await
}

/// `shutdown` 完了後、処理中のリクエストを最大 `grace` だけ待って終了する
pub async fn run_with_grace<F>(
   listener: TcpListener,
   app: Router,
   shutdown: F,
   grace: Duration,
) -> io::Result<()>
where
   F: Future<Output = ()> + Send + 'static,
{
   let started = Arc::new(Notify::new());
   let notify = started.clone();
   let signal = async move {
      shutdown.await;
      notify.notify_one();
   };

   let server = axum::serve(listener, app)
      .with_graceful_shutdown(signal)
      .into_future();

   tokio::select! {
      result = server => {
         tracing::info!("サーバーを停止しました");
         result
      }
      () = async {
         started.notified().await;
         tokio::time::sleep(grace).await;
      } => {
         tracing::warn!(grace_ms = grace.as_millis() as u64, "Graceful shutdown がタイムアウトしました");
         Ok(())
      }
   }
}

#[cfg(test)]
mod tests {
   use axum::routing::get;
   use tokio::{
      io::{AsyncReadExt, AsyncWriteExt},
      net::TcpStream,
      sync::oneshot,
      time::Instant,
   };

   use super::*;

   fn app() -> Router {
      Router::new()
         .route("/ping", get(|| async { "pong" }))
         .route(
            "/slow",
            get(|| async {
               tokio::time::sleep(Duration::from_secs(30)).await;
               "late"
            }),
         )
   }

   async fn send(addr: std::net::SocketAddr, path: &str) -> TcpStream {
      let mut stream = TcpStream::connect(addr).await.unwrap();
      let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
      stream.write_all(request.as_bytes()).await.unwrap();
      stream
   }

   #[tokio::test]
   async fn test_リクエストを処理しシャットダウンで停止する() {
      let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
      let addr = listener.local_addr().unwrap();
      let (tx, rx) = oneshot::channel::<()>();
      let server = tokio::spawn(run(listener, app(), async {
         let _ = rx.await;
      }));

      let mut stream = send(addr, "/ping").await;
      let mut response = String::new();
      stream.read_to_string(&mut response).await.unwrap();
      assert!(response.starts_with("HTTP/1.1 200"), "{response}");
      assert!(response.ends_with("pong"));

      tx.send(()).unwrap();
      let result = tokio::time::timeout(Duration::from_secs(5), server).await;
      assert!(matches!(result, Ok(Ok(Ok(())))));
   }

   #[tokio::test]
   async fn test_処理中のリクエストが残っていても猶予時間で打ち切る() {
      let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
      let addr = listener.local_addr().unwrap();
      let (tx, rx) = oneshot::channel::<()>();
      let grace = Duration::from_millis(200);
      let server = tokio::spawn(run_with_grace(
         listener,
         app(),
         async {
            let _ = rx.await;
         },
         grace,
      ));

      let _slow = send(addr, "/slow").await;
      tokio::time::sleep(Duration::from_millis(100)).await;

      let started = Instant::now();
      tx.send(()).unwrap();
      let result = tokio::time::timeout(Duration::from_secs(5), server).await;

      assert!(matches!(result, Ok(Ok(Ok(())))));
      assert!(started.elapsed() >= grace);
   }
}

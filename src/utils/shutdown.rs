use std::future::Future;

/// 立即註冊 Ctrl-C / SIGTERM，回傳在收到任一訊號時完成的 future。
///
/// 註冊發生在呼叫當下而不是第一次 poll，第一個週期進行中收到的訊號
/// 會被保留，等週期結束後才讓迴圈停下。
#[cfg(unix)]
pub fn install_shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => tracing::info!("Received Ctrl-C"),
            _ = terminate.recv() => tracing::info!("Received SIGTERM"),
        }
    })
}

#[cfg(windows)]
pub fn install_shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
        tracing::info!("Received Ctrl-C");
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_before_first_poll_is_not_lost() {
        let shutdown = install_shutdown_signal().unwrap();

        // 還沒 await 之前就送出 SIGTERM
        let status = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .unwrap();
    }
}

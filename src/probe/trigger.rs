use crate::core::error::PingError;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 停止要求を出す側。何度呼んでも最初の1回だけが意味を持つ
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// ランループが持つ受信側
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// 停止要求が出るまで待つ。待ち始める前に出された要求もここで拾う
    pub async fn stopped(&mut self) {
        let waited = self.rx.wait_for(|stopped| *stopped).await.map(|_| ());
        if waited.is_err() {
            // 送信側がすべて破棄された場合、停止要求はもう来ない
            std::future::pending::<()>().await;
        }
    }
}

/// Ctrl+C を待ち受け、受け取ったら停止要求を出すタスクを起動する
pub fn spawn_interrupt_listener(handle: StopHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("割り込みを受信しました。統計を出力して終了します");
                handle.stop();
            }
            Err(e) => error!("{}", PingError::Signal(e.to_string())),
        }
    })
}

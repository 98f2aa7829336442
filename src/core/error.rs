use thiserror::Error;

#[derive(Error, Debug)]
pub enum PingError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("名前解決エラー: {0}")]
    Resolve(String),

    #[error("rawソケットの作成に失敗しました (root権限が必要です): {0}")]
    SocketCreation(#[source] std::io::Error),

    #[error("パケットの送信に失敗しました: {0}")]
    Send(#[source] std::io::Error),

    #[error("パケットの受信に失敗しました: {0}")]
    Receive(#[source] std::io::Error),

    #[error("シグナルハンドラーのエラー: {0}")]
    Signal(String),
}

pub type PingResult<T> = Result<T, PingError>;

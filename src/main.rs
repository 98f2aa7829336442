use log::{error, info};

mod core;
mod network;
mod probe;
mod setup_logger;

use crate::core::{Configuration, PingError, PingResult};
use crate::network::{resolve_ipv4, RawIcmpSocket};
use crate::probe::report;
use crate::probe::{
    spawn_interrupt_listener, stop_channel, PingStatistics, ProbeSettings, Prober, RunLoop, RunSettings,
};
use crate::setup_logger::setup_logger;

#[tokio::main]
async fn main() -> Result<(), PingError> {
    let config = Configuration::from_env(std::env::args().nth(1)).map_err(|e| {
        eprintln!("使用法: echo-probe <ホスト名>");
        e
    })?;

    setup_logger(&config.output.log_level, config.output.verbose)
        .map_err(|e| PingError::Config(format!("ロガーのセットアップに失敗しました: {}", e)))?;

    run(config).await.map_err(|e| {
        error!("{}", e);
        e
    })
}

async fn run(config: Configuration) -> PingResult<()> {
    let destination = resolve_ipv4(&config.target.hostname).await?;

    // rawソケットが作れない場合はプローブを送る前に終了する
    let socket = RawIcmpSocket::new(config.probe.ttl)?;

    // 同じホスト上の他のpingと区別するための識別子
    let identifier = std::process::id() as u16;
    info!("識別子 0x{:04x} で {} ({}) への送信を開始します", identifier, config.target.hostname, destination);

    println!(
        "{}",
        report::startup_line(
            &config.target.hostname,
            destination,
            config.probe.payload_size(),
            identifier,
            config.output.verbose,
        )
    );

    let (handle, signal) = stop_channel();
    let listener = spawn_interrupt_listener(handle);

    let prober = Prober::new(socket, destination, ProbeSettings::from_config(&config.probe, identifier));
    let run_loop = RunLoop::new(
        prober,
        RunSettings {
            interval: config.probe.interval(),
            count: config.probe.count,
            verbose: config.output.verbose,
        },
        PingStatistics::new(config.target.hostname.clone()),
        signal,
    );

    // ランループが返した後なので統計はもう更新されない
    let outcome = run_loop.run().await;
    listener.abort();

    println!();
    for line in report::summary_lines(&outcome.statistics.finalize(), outcome.elapsed) {
        println!("{}", line);
    }

    Ok(())
}

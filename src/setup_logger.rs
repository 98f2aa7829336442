use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;
use std::str::FromStr;

/// ロガーを初期化する。出力はpingの結果行と混ざらないように標準エラーへ
pub fn setup_logger(level: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut level = LevelFilter::from_str(level)?;
    if verbose {
        level = level.max(LevelFilter::Debug);
    }

    Builder::new()
        .filter_level(level)
        // タイムスタンプ付きのフォーマット
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .try_init()?;

    Ok(())
}

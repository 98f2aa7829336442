use crate::core::error::{PingError, PingResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// ICMPヘッダーの長さ (type, code, checksum, identifier, sequence)
pub const ICMP_HEADER_LEN: usize = 8;
/// IPv4で送れるICMPメッセージの最大長 (65535 - IPヘッダー20バイト - 8)
pub const MAX_PACKET_SIZE: usize = 65507;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub target: TargetConfig,
    pub probe: ProbeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub hostname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Noneの場合はシグナルを受けるまで送り続ける
    pub count: Option<u64>,
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub poll_ms: u64,
    /// ICMPメッセージ全体のバイト数 (ヘッダー込み)
    pub packet_size: usize,
    pub ttl: Option<u32>,
    pub validate_checksum: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub verbose: bool,
    pub log_level: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            count: None,
            interval_ms: 1000,
            timeout_ms: 300,
            poll_ms: 100,
            packet_size: 64,
            ttl: None,
            validate_checksum: false,
        }
    }
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_wait(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn payload_size(&self) -> usize {
        self.packet_size - ICMP_HEADER_LEN
    }
}

impl Configuration {
    /// `.env` と環境変数から設定を読み込む。ホスト名はコマンドライン引数が優先される
    pub fn from_env(target_arg: Option<String>) -> PingResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(target_arg, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(target_arg: Option<String>, lookup: F) -> PingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hostname = target_arg
            .or_else(|| lookup("PING_TARGET"))
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| PingError::Config("ホスト名が指定されていません".to_string()))?;

        let defaults = ProbeConfig::default();
        let probe = ProbeConfig {
            count: parse_optional(&lookup, "PING_COUNT")?,
            interval_ms: parse_or(&lookup, "PING_INTERVAL_MS", defaults.interval_ms)?,
            timeout_ms: parse_or(&lookup, "PING_TIMEOUT_MS", defaults.timeout_ms)?,
            poll_ms: parse_or(&lookup, "PING_POLL_MS", defaults.poll_ms)?,
            packet_size: parse_or(&lookup, "PING_PACKET_SIZE", defaults.packet_size)?,
            ttl: parse_optional(&lookup, "PING_TTL")?,
            validate_checksum: parse_or(&lookup, "PING_VALIDATE_CHECKSUM", defaults.validate_checksum)?,
        };

        if probe.packet_size < ICMP_HEADER_LEN || probe.packet_size > MAX_PACKET_SIZE {
            return Err(PingError::Config(format!(
                "PING_PACKET_SIZEは{}から{}の範囲で指定してください: {}",
                ICMP_HEADER_LEN, MAX_PACKET_SIZE, probe.packet_size
            )));
        }
        if probe.poll_ms == 0 || probe.timeout_ms == 0 {
            return Err(PingError::Config(
                "PING_TIMEOUT_MSとPING_POLL_MSは1以上を指定してください".to_string(),
            ));
        }
        if probe.count == Some(0) {
            return Err(PingError::Config("PING_COUNTは1以上を指定してください".to_string()));
        }

        Ok(Configuration {
            target: TargetConfig { hostname },
            probe,
            output: OutputConfig {
                verbose: parse_or(&lookup, "PING_VERBOSE", false)?,
                log_level: lookup("PING_LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
            },
        })
    }
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> PingResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PingError::Config(format!("{}の値が不正です ({}): {}", key, raw, e))),
        None => Ok(None),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> PingResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

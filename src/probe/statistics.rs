use serde::Serialize;

/// 送受信数とRTTの累積値。ランループだけが更新する
#[derive(Debug, Clone)]
pub struct PingStatistics {
    transmitted: u64,
    received: u64,
    min_rtt: f64,
    max_rtt: f64,
    sum_rtt: f64,
    sum_rtt_squared: f64,
    target_hostname: String,
}

/// 表示用の集計結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub target_hostname: String,
    pub transmitted: u64,
    pub received: u64,
    pub loss_percent: f64,
    /// 1つも受信していない場合はNone
    pub rtt: Option<RttSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RttSummary {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub stddev: f64,
}

impl PingStatistics {
    pub fn new(target_hostname: impl Into<String>) -> Self {
        Self {
            transmitted: 0,
            received: 0,
            min_rtt: f64::INFINITY,
            max_rtt: 0.0,
            sum_rtt: 0.0,
            sum_rtt_squared: 0.0,
            target_hostname: target_hostname.into(),
        }
    }

    pub fn record_transmit(&mut self) {
        self.transmitted += 1;
    }

    /// 一致した応答のRTT (ミリ秒) を加える
    pub fn update(&mut self, rtt: f64) {
        self.received += 1;
        self.sum_rtt += rtt;
        self.sum_rtt_squared += rtt * rtt;
        self.min_rtt = self.min_rtt.min(rtt);
        self.max_rtt = self.max_rtt.max(rtt);
    }

    pub fn transmitted(&self) -> u64 {
        self.transmitted
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn finalize(&self) -> Summary {
        let loss_percent = if self.transmitted > 0 {
            (self.transmitted - self.received.min(self.transmitted)) as f64 * 100.0
                / self.transmitted as f64
        } else {
            0.0
        };

        let rtt = (self.received > 0).then(|| {
            let count = self.received as f64;
            let avg = self.sum_rtt / count;
            // 丸め誤差で負になることがある
            let variance = (self.sum_rtt_squared / count - avg * avg).max(0.0);
            RttSummary {
                min: self.min_rtt,
                avg,
                max: self.max_rtt,
                stddev: variance.sqrt(),
            }
        });

        Summary {
            target_hostname: self.target_hostname.clone(),
            transmitted: self.transmitted,
            received: self.received,
            loss_percent,
            rtt,
        }
    }
}

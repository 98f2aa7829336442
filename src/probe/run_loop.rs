use crate::network::socket::EchoSocket;
use crate::probe::cycle::{ProbeOutcome, Prober};
use crate::probe::report;
use crate::probe::statistics::PingStatistics;
use crate::probe::trigger::StopSignal;
use log::{debug, warn};
use std::time::Duration;
use tokio::time::Instant;

pub const FIRST_SEQUENCE: u16 = 1;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub interval: Duration,
    /// Noneの場合は停止要求まで続ける
    pub count: Option<u64>,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Probing,
    Pacing { cycle_started: Instant },
    Stopped,
}

/// ランループの終了時に引き渡される結果
#[derive(Debug)]
pub struct RunReport {
    pub statistics: PingStatistics,
    pub elapsed: Duration,
}

/// 一定間隔でプローブを繰り返す。統計はこのループだけが更新する
pub struct RunLoop<S> {
    prober: Prober<S>,
    settings: RunSettings,
    statistics: PingStatistics,
    stop: StopSignal,
    next_sequence: u16,
    cycles: u64,
}

impl<S: EchoSocket> RunLoop<S> {
    pub fn new(prober: Prober<S>, settings: RunSettings, statistics: PingStatistics, stop: StopSignal) -> Self {
        Self {
            prober,
            settings,
            statistics,
            stop,
            next_sequence: FIRST_SEQUENCE,
            cycles: 0,
        }
    }

    /// Stoppedに達するまで回し、統計を返す
    pub async fn run(mut self) -> RunReport {
        let started = Instant::now();
        let mut state = LoopState::Probing;

        while state != LoopState::Stopped {
            state = match state {
                LoopState::Probing => self.probe_once().await,
                LoopState::Pacing { cycle_started } => self.pace(cycle_started).await,
                LoopState::Stopped => LoopState::Stopped,
            };
        }

        debug!(
            "ランループを終了しました: {}サイクル, 送信{} 受信{}",
            self.cycles,
            self.statistics.transmitted(),
            self.statistics.received()
        );
        RunReport {
            statistics: self.statistics,
            elapsed: started.elapsed(),
        }
    }

    fn count_reached(&self) -> bool {
        self.settings.count.is_some_and(|count| self.cycles >= count)
    }

    async fn probe_once(&mut self) -> LoopState {
        if self.stop.is_stopped() || self.count_reached() {
            return LoopState::Stopped;
        }

        let cycle_started = Instant::now();
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.cycles += 1;
        self.statistics.record_transmit();

        let record = match self.prober.send(sequence).await {
            Ok(record) => record,
            Err(e) => {
                warn!("icmp_seq={}: {}", sequence, e);
                return LoopState::Pacing { cycle_started };
            }
        };

        // 統計の更新は select! の外で行うので、途中で打ち切っても状態は壊れない
        let outcome = tokio::select! {
            outcome = self.prober.await_reply(&record) => outcome,
            _ = self.stop.stopped() => {
                debug!("icmp_seq={} の応答待ち中に停止要求を受けました", sequence);
                return LoopState::Stopped;
            }
        };

        if let ProbeOutcome::Matched { rtt, .. } = &outcome {
            self.statistics.update(*rtt);
        }
        if let Some(line) = report::outcome_line(sequence, &outcome, self.settings.verbose) {
            println!("{}", line);
        }

        LoopState::Pacing { cycle_started }
    }

    async fn pace(&mut self, cycle_started: Instant) -> LoopState {
        if self.count_reached() {
            return LoopState::Stopped;
        }

        let remaining = self.settings.interval.saturating_sub(cycle_started.elapsed());
        tokio::select! {
            _ = tokio::time::sleep(remaining) => LoopState::Probing,
            _ = self.stop.stopped() => LoopState::Stopped,
        }
    }
}

use crate::probe::cycle::ProbeOutcome;
use crate::probe::statistics::Summary;
use std::net::Ipv4Addr;
use std::time::Duration;

pub fn startup_line(
    hostname: &str,
    address: Ipv4Addr,
    payload_size: usize,
    identifier: u16,
    verbose: bool,
) -> String {
    let mut line = format!(
        "PING {} ({}) {}({}) bytes of data.",
        hostname,
        address,
        payload_size,
        payload_size + 8 + 20
    );
    if verbose {
        line.push_str(&format!(" id=0x{:04x}", identifier));
    }
    line
}

/// 1サイクルの結果行。表示しない場合はNone
pub fn outcome_line(sequence: u16, outcome: &ProbeOutcome, verbose: bool) -> Option<String> {
    match outcome {
        ProbeOutcome::Matched { rtt, bytes, source, ttl } => Some(format!(
            "{} bytes from {}: icmp_seq={} ttl={} time={:.3} ms",
            bytes, source, sequence, ttl, rtt
        )),
        ProbeOutcome::Unreachable { source, reason } => {
            Some(format!("From {} icmp_seq={} {}", source, sequence, reason))
        }
        ProbeOutcome::TimeExceeded { source } if verbose => {
            Some(format!("From {} icmp_seq={} Time to live exceeded", source, sequence))
        }
        ProbeOutcome::ForeignReply { source, identifier } if verbose => Some(format!(
            "Foreign reply from {}: id=0x{:04x} icmp_seq={}",
            source, identifier, sequence
        )),
        ProbeOutcome::TimedOut if verbose => Some(format!("Request timeout for icmp_seq {}", sequence)),
        _ => None,
    }
}

pub fn summary_lines(summary: &Summary, elapsed: Duration) -> Vec<String> {
    let mut lines = vec![
        format!("--- {} ping statistics ---", summary.target_hostname),
        format!(
            "{} packets transmitted, {} received, {}% packet loss, time {}ms",
            summary.transmitted,
            summary.received,
            format_percent(summary.loss_percent),
            elapsed.as_millis()
        ),
    ];

    if let Some(rtt) = &summary.rtt {
        lines.push(format!(
            "rtt min/avg/max/stddev = {:.3}/{:.3}/{:.3}/{:.3} ms",
            rtt.min, rtt.avg, rtt.max, rtt.stddev
        ));
    }
    lines
}

fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{:.1}", value)
    }
}

pub mod cycle;
pub mod report;
pub mod run_loop;
pub mod statistics;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use cycle::{ProbeSettings, Prober};
pub use run_loop::{RunLoop, RunSettings};
pub use statistics::PingStatistics;
pub use trigger::{spawn_interrupt_listener, stop_channel};

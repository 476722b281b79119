use sonoprobe_core::UpdateReport;
use std::collections::VecDeque;
use std::time::Duration;

/// Format time in microseconds to the most appropriate unit (µs, ms, or s)
pub fn format_time_auto(time_us: u64) -> String {
    let time_us_f = time_us as f64;

    if time_us < 1_000 {
        format!("{:.2} µs", time_us_f)
    } else if time_us < 1_000_000 {
        format!("{:.2} ms", time_us_f / 1_000.0)
    } else {
        format!("{:.2} s", time_us_f / 1_000_000.0)
    }
}

/// Timing of one `SonoProbeWorld::update` call
#[derive(Debug, Clone, Copy)]
pub struct UpdateTiming {
    pub elapsed_us: u64,
    pub report: UpdateReport,
}

/// Rolling history of update timings
pub struct UpdateProfiler {
    history: VecDeque<UpdateTiming>,
    capacity: usize,
    frames: u64,
    total_queries: u64,
    total_scans: u64,
    worst: Option<UpdateTiming>,
}

impl UpdateProfiler {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            frames: 0,
            total_queries: 0,
            total_scans: 0,
            worst: None,
        }
    }

    pub fn record(&mut self, elapsed: Duration, report: UpdateReport) {
        let timing = UpdateTiming {
            elapsed_us: elapsed.as_micros() as u64,
            report,
        };
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(timing);

        self.frames += 1;
        self.total_queries += report.queries as u64;
        self.total_scans += report.scans as u64;
        if self.worst.is_none_or(|worst| timing.elapsed_us > worst.elapsed_us) {
            self.worst = Some(timing);
        }
    }

    /// Mean update time over the retained history
    pub fn average_us(&self) -> u64 {
        if self.history.is_empty() {
            return 0;
        }
        self.history.iter().map(|t| t.elapsed_us).sum::<u64>() / self.history.len() as u64
    }

    pub fn log_summary(&self, frame_budget: Duration) {
        let Some(worst) = self.worst else {
            log::info!("No frames recorded");
            return;
        };
        let budget_us = frame_budget.as_micros() as u64;
        let average = self.average_us();

        log::info!("=== Update profile over {} frames ===", self.frames);
        log::info!(
            "Average: {} ({:.2}% of frame budget {})",
            format_time_auto(average),
            average as f64 / budget_us.max(1) as f64 * 100.0,
            format_time_auto(budget_us)
        );
        log::info!(
            "Worst: {} ({} scans, {} queries)",
            format_time_auto(worst.elapsed_us),
            worst.report.scans,
            worst.report.queries
        );
        log::info!(
            "Scans: {}, queries: {} ({:.1} per frame)",
            self.total_scans,
            self.total_queries,
            self.total_queries as f64 / self.frames.max(1) as f64
        );

        if worst.elapsed_us > budget_us / 10 {
            log::warn!("Worst update used more than 10% of the frame budget");
        }
    }
}

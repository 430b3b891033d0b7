#![allow(unused)]
use std::cell::RefCell;
use std::time::Duration;

/// Per-solve breakdown of where the relaxation loop spends its time.
#[derive(Default, Clone)]
pub struct TimingStats {
    pub sweep_times: Vec<Duration>,
    pub clamp_times: Vec<Duration>,
    pub total_time: Duration,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "timing")]
    pub fn print_summary(&self) {
        if self.sweep_times.is_empty() {
            return;
        }

        let total_sweep: Duration = self.sweep_times.iter().sum();
        let total_clamp: Duration = self.clamp_times.iter().sum();
        let overhead = self.total_time.saturating_sub(total_sweep + total_clamp);
        let n = self.sweep_times.len() as f64;

        println!("\n{}", "=".repeat(60));
        println!("{:^60}", "RELAXATION TIMING SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Total solver time:             {:.3}s",
            self.total_time.as_secs_f64()
        );
        println!("{}", "-".repeat(60));
        println!("Component breakdown:");
        println!(
            "  Relaxation sweep:          {:>9.3}ms  (avg: {:>9.3}us)",
            total_sweep.as_secs_f64() * 1000.0,
            total_sweep.as_secs_f64() * 1e6 / n
        );
        println!(
            "  Boundary clamp:            {:>9.3}ms  (avg: {:>9.3}us)",
            total_clamp.as_secs_f64() * 1000.0,
            total_clamp.as_secs_f64() * 1e6 / self.clamp_times.len().max(1) as f64
        );
        println!("{}", "=".repeat(60));
        println!(
            "Overhead/Other:                {:>9.3}ms",
            overhead.as_secs_f64() * 1000.0
        );
        println!("Iterations:                    {}\n", self.sweep_times.len());
    }

    #[cfg(not(feature = "timing"))]
    pub fn print_summary(&self) {}
}

#[cfg(feature = "timing")]
thread_local! {
    static TIMING_STATS: RefCell<TimingStats> = RefCell::new(TimingStats::new());
}

#[cfg(feature = "timing")]
pub fn reset_timing() {
    TIMING_STATS.with(|stats| {
        *stats.borrow_mut() = TimingStats::new();
    });
}

#[cfg(not(feature = "timing"))]
pub fn reset_timing() {}

#[cfg(feature = "timing")]
pub fn record_sweep<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = std::time::Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    TIMING_STATS.with(|stats| {
        stats.borrow_mut().sweep_times.push(elapsed);
    });
    result
}

#[cfg(not(feature = "timing"))]
pub fn record_sweep<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn record_clamp<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = std::time::Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    TIMING_STATS.with(|stats| {
        stats.borrow_mut().clamp_times.push(elapsed);
    });
    result
}

#[cfg(not(feature = "timing"))]
pub fn record_clamp<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn finalize_and_print(total_time: Duration) {
    let stats = TIMING_STATS.with(|stats| {
        let mut s = stats.borrow_mut();
        s.total_time = total_time;
        s.clone()
    });
    stats.print_summary();
}

#[cfg(not(feature = "timing"))]
pub fn finalize_and_print(_total_time: Duration) {}

//! Process resource metrics for the `/stats` report.

use sysinfo::System;

/// A point-in-time snapshot of this process's memory and the host's CPU
/// load averages.
#[derive(Debug, Clone)]
pub struct SystemStats {
    /// Resident set size, bytes.
    pub memory_rss: u64,
    /// Virtual memory size, bytes.
    pub memory_virtual: u64,
    /// Load averages over 1, 5 and 15 minutes.
    pub load_1m: f64,
    pub load_5m: f64,
    pub load_15m: f64,
}

impl SystemStats {
    /// Sample the current process. Memory figures fall back to zero if the
    /// process can't be inspected; load averages come from the host.
    pub fn sample() -> Self {
        let sys = System::new_all();
        let (memory_rss, memory_virtual) = sysinfo::get_current_pid()
            .ok()
            .and_then(|pid| sys.process(pid))
            .map(|p| (p.memory(), p.virtual_memory()))
            .unwrap_or((0, 0));

        let load = System::load_average();

        Self {
            memory_rss,
            memory_virtual,
            load_1m: load.one,
            load_5m: load.five,
            load_15m: load.fifteen,
        }
    }

    /// Render the snapshot as the Markdown block appended to `/stats`.
    pub fn format_report(&self) -> String {
        format!(
            "*System Statistics*:\n\
             *Memory Usage*:\n\
             - RSS: {} MB\n\
             - Virtual: {} MB\n\
             \n\
             *CPU Load*:\n\
             - 1m: {:.2}\n\
             - 5m: {:.2}\n\
             - 15m: {:.2}",
            format_mb(self.memory_rss),
            format_mb(self.memory_virtual),
            self.load_1m,
            self.load_5m,
            self.load_15m,
        )
    }
}

fn format_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}

//! Step statistics

/// Counters for a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounters {
    /// Bodies integrated this step
    pub bodies_integrated: u32,
    /// Contacts resolved this step
    pub contacts: u32,
    /// Bodies that fractured this step
    pub fractures: u32,
    /// Threshold breaches with no fragments to break into
    pub skipped_fractures: u32,
}

/// Running statistics across all steps
#[derive(Debug, Default)]
pub struct StepStats {
    last: TickCounters,
    total_ticks: u64,
    total_contacts: u64,
    total_fractures: u64,
    live_bodies: u32,
}

impl StepStats {
    /// Create a new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished step
    pub fn record_tick(&mut self, counters: TickCounters, live_bodies: u32) {
        self.last = counters;
        self.total_ticks += 1;
        self.total_contacts += u64::from(counters.contacts);
        self.total_fractures += u64::from(counters.fractures);
        self.live_bodies = live_bodies;
    }

    /// Counters of the most recent step
    pub fn last_tick(&self) -> TickCounters {
        self.last
    }

    /// Steps taken so far
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Contacts resolved so far
    pub fn total_contacts(&self) -> u64 {
        self.total_contacts
    }

    /// Fractures so far
    pub fn total_fractures(&self) -> u64 {
        self.total_fractures
    }

    /// Bodies alive after the most recent step
    pub fn live_bodies(&self) -> u32 {
        self.live_bodies
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "Tick {} | Bodies: {} | Contacts: {} (total {}) | Fractures: {}",
            self.total_ticks,
            self.live_bodies,
            self.last.contacts,
            self.total_contacts,
            self.total_fractures
        )
    }
}

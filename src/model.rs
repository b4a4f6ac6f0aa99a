#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetrics {
    pub workers: usize,
    pub busy_workers: usize,
    pub queued_tasks: usize,
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl PoolMetrics {
    pub fn idle_workers(&self) -> usize {
        self.workers.saturating_sub(self.busy_workers)
    }

    pub fn utilization(&self) -> f64 {
        if self.workers == 0 {
            return 0.0;
        }
        self.busy_workers as f64 / self.workers as f64
    }

    /// Доля результатов со статусом `Success`
    pub fn success_rate(&self) -> f64 {
        let total = self.succeeded + self.failed;
        if total == 0 {
            return 1.0;
        }
        self.succeeded as f64 / total as f64
    }
}

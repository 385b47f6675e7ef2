// In-memory sliding window of composite samples, bounded by age and by count.

use crate::models::CompositeSample;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SampleWindow {
    window_ms: i64,
    max_samples: usize,
    samples: VecDeque<CompositeSample>,
}

impl SampleWindow {
    pub fn new(window_ms: i64, max_samples: usize) -> Self {
        Self {
            window_ms,
            max_samples: max_samples.max(1),
            samples: VecDeque::with_capacity(max_samples.max(1)),
        }
    }

    /// Appends a sample keeping `taken_at_ms` ascending, then trims relative to `now_ms`.
    pub fn push(&mut self, sample: CompositeSample, now_ms: i64) {
        match self.samples.back() {
            Some(last) if last.taken_at_ms > sample.taken_at_ms => {
                let idx = self
                    .samples
                    .partition_point(|s| s.taken_at_ms <= sample.taken_at_ms);
                self.samples.insert(idx, sample);
            }
            _ => self.samples.push_back(sample),
        }
        self.trim(now_ms);
    }

    /// Drops samples older than the window, then the oldest ones beyond the count cap.
    fn trim(&mut self, now_ms: i64) {
        let cutoff = now_ms - self.window_ms;
        while self
            .samples
            .front()
            .is_some_and(|s| s.taken_at_ms < cutoff)
        {
            self.samples.pop_front();
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&CompositeSample> {
        self.samples.back()
    }

    /// Owned copy of the buffer, oldest first.
    pub fn snapshot(&self) -> Vec<CompositeSample> {
        self.samples.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(at: i64) -> CompositeSample {
        CompositeSample {
            taken_at_ms: at,
            cpu_usage_percent: Some(1.0),
            cpu_temp_c: None,
            memory_usage_percent: None,
            memory_used_bytes: None,
            memory_total_bytes: None,
            disk_usage_percent: None,
            disk_used_bytes: None,
            disk_total_bytes: None,
        }
    }

    #[test]
    fn trims_by_age() {
        let mut w = SampleWindow::new(300_000, 100);
        for at in (0..=600_000).step_by(5_000) {
            w.push(sample(at), at);
        }
        let oldest = w.snapshot()[0].taken_at_ms;
        assert_eq!(oldest, 300_000);
        assert_eq!(w.latest().map(|s| s.taken_at_ms), Some(600_000));
    }

    #[test]
    fn trims_by_count() {
        let mut w = SampleWindow::new(i64::MAX / 2, 5);
        for at in 0..20 {
            w.push(sample(at), at);
        }
        assert_eq!(w.snapshot().len(), 5);
        assert_eq!(w.snapshot()[0].taken_at_ms, 15);
    }

    #[test]
    fn out_of_order_push_stays_sorted() {
        let mut w = SampleWindow::new(300_000, 10);
        w.push(sample(1_000), 1_000);
        w.push(sample(3_000), 3_000);
        w.push(sample(2_000), 3_000);
        let ats: Vec<i64> = w.snapshot().iter().map(|s| s.taken_at_ms).collect();
        assert_eq!(ats, vec![1_000, 2_000, 3_000]);
    }
}

//! Delays driving the simulated timelines.

use std::time::Duration;

/// Every delay used by the simulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTiming {
    /// Pause before each 20% progress step of an upload.
    pub upload_step: Duration,
    /// Time spent in `indexed` before a document is `ready`.
    pub index_delay: Duration,
    /// Simulated payment verification.
    pub verify_delay: Duration,
    /// Time the success state is shown before the agent is activated.
    pub success_delay: Duration,
    /// From activation to the first incoming call.
    pub call_ring_delay: Duration,
    /// From the incoming call to the answered entry.
    pub call_answer_delay: Duration,
    /// From the answered entry to the call ending.
    pub call_end_delay: Duration,
}

impl Default for SimulationTiming {
    fn default() -> Self {
        Self {
            upload_step: Duration::from_millis(500),
            index_delay: Duration::from_millis(1500),
            verify_delay: Duration::from_millis(2000),
            success_delay: Duration::from_millis(1500),
            call_ring_delay: Duration::from_secs(5),
            call_answer_delay: Duration::from_secs(2),
            call_end_delay: Duration::from_secs(3),
        }
    }
}

impl SimulationTiming {
    /// Multiply every delay by `factor`. Non-finite or negative factors are treated as zero.
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        let scale = |d: Duration| d.mul_f64(factor);
        Self {
            upload_step: scale(self.upload_step),
            index_delay: scale(self.index_delay),
            verify_delay: scale(self.verify_delay),
            success_delay: scale(self.success_delay),
            call_ring_delay: scale(self.call_ring_delay),
            call_answer_delay: scale(self.call_answer_delay),
            call_end_delay: scale(self.call_end_delay),
        }
    }

    /// Total length of one upload run.
    pub fn upload_total(&self) -> Duration {
        self.upload_step * 6 + self.index_delay
    }

    /// Time from activation request to the activated state.
    pub fn activation_total(&self) -> Duration {
        self.verify_delay + self.success_delay
    }

    /// Time from activation to the end of the scripted call.
    pub fn call_total(&self) -> Duration {
        self.call_ring_delay + self.call_answer_delay + self.call_end_delay
    }
}

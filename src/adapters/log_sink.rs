//! Log-based publisher adapter.
//!
//! Implements [`Publisher`] by writing every property update to the log.
//! Used by the host simulator; a real bus client implements the same trait.

use log::info;

use crate::app::ports::Publisher;

/// Adapter that logs every publication.
#[derive(Debug, Default)]
pub struct LogPublisher {
    published: u32,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of updates published so far.
    pub fn published(&self) -> u32 {
        self.published
    }
}

impl Publisher for LogPublisher {
    fn publish(&mut self, topic: &str, payload: &str) {
        self.published = self.published.wrapping_add(1);
        if payload.is_empty() {
            info!("PUB | {} deleted", topic);
        } else {
            info!("PUB | {} = {}", topic, payload);
        }
    }
}

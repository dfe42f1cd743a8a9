//! Analytics sink implementations

mod buffered;
mod noop;

pub use buffered::BufferedAnalytics;
pub use noop::NoopAnalytics;

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::analytics::{Analytics, KeyVerificationEvent};

    /// Records publish calls for assertions.
    #[derive(Debug, Default)]
    pub struct CountingAnalytics {
        published: AtomicU32,
        last_event: Mutex<Option<KeyVerificationEvent>>,
    }

    impl CountingAnalytics {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn published(&self) -> u32 {
            self.published.load(Ordering::SeqCst)
        }

        pub fn last_event(&self) -> Option<KeyVerificationEvent> {
            self.last_event.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Analytics for CountingAnalytics {
        async fn publish_key_verification_event(&self, event: KeyVerificationEvent) {
            self.published.fetch_add(1, Ordering::SeqCst);
            *self.last_event.lock().unwrap() = Some(event);
        }
    }
}

//! User interrupt signal shared between a caller and running forecasts.

use crate::error::{ForecastError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag.
///
/// Clones share the same flag: triggering any clone interrupts every
/// computation polling another.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [`ForecastError::Cancelled`] once triggered.
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            Err(ForecastError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let observer = interrupt.clone();
        assert!(observer.check().is_ok());

        interrupt.trigger();
        assert!(observer.is_triggered());
        assert_eq!(observer.check(), Err(ForecastError::Cancelled));
    }
}

use crate::error::Result;
use crate::gpio::OutputPin;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// CRT power relay.
///
/// Each operation returns the pin level read back after the write, so callers
/// report what the hardware actually holds. Operations are serialized, so two
/// concurrent toggles always flip the relay twice.
pub struct CrtPower {
    pin: Arc<dyn OutputPin>,
    lock: Mutex<()>,
}

impl CrtPower {
    #[must_use]
    pub fn new(pin: Arc<dyn OutputPin>) -> Self {
        Self {
            pin,
            lock: Mutex::new(()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the pin cannot be written or read back.
    pub fn switch_on(&self) -> Result<bool> {
        let _guard = self.lock.lock();
        self.set(true)
    }

    /// # Errors
    ///
    /// Returns an error if the pin cannot be written or read back.
    pub fn switch_off(&self) -> Result<bool> {
        let _guard = self.lock.lock();
        self.set(false)
    }

    /// # Errors
    ///
    /// Returns an error if the pin cannot be read or written.
    pub fn toggle(&self) -> Result<bool> {
        let _guard = self.lock.lock();
        let current = self.pin.read()?;
        self.set(!current)
    }

    /// # Errors
    ///
    /// Returns an error if the pin cannot be read.
    pub fn is_on(&self) -> Result<bool> {
        self.pin.read()
    }

    /// Callers hold `lock`.
    fn set(&self, on: bool) -> Result<bool> {
        self.pin.write(on)?;
        let state = self.pin.read()?;
        info!("CRT power {}", if state { "on" } else { "off" });
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::tests::MemoryPin;

    #[test]
    fn test_switch_and_toggle() {
        let crt = CrtPower::new(Arc::new(MemoryPin::default()));

        assert!(!crt.is_on().unwrap());
        assert!(crt.switch_on().unwrap());
        assert!(crt.switch_on().unwrap());
        assert!(!crt.toggle().unwrap());
        assert!(crt.toggle().unwrap());
        assert!(!crt.switch_off().unwrap());
        assert!(!crt.is_on().unwrap());
    }

    #[test]
    fn test_concurrent_toggles_all_apply() {
        let pin = Arc::new(MemoryPin::default());
        let crt = Arc::new(CrtPower::new(pin.clone()));

        // 8 threads x 25 toggles: an even total ends where it started
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let crt = crt.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        crt.toggle().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(!crt.is_on().unwrap());
        assert!(!pin.level.load(std::sync::atomic::Ordering::SeqCst));
    }
}

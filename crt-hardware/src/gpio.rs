//! GPIO output pins driven through the sysfs interface.

use crate::error::{HardwareError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default sysfs GPIO class directory
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// A digital output pin.
pub trait OutputPin: Send + Sync {
    /// BCM pin number
    fn number(&self) -> u32;

    /// Drive the pin high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be written.
    fn write(&self, high: bool) -> Result<()>;

    /// Read back the current level.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be read.
    fn read(&self) -> Result<bool>;
}

/// Output pin backed by `/sys/class/gpio/gpioN`
#[derive(Debug)]
pub struct SysfsPin {
    pin: u32,
    pin_dir: PathBuf,
}

impl SysfsPin {
    /// Export `pin` under the default sysfs root and configure it as an output.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be exported or configured.
    pub fn new(pin: u32) -> Result<Self> {
        Self::with_root(pin, Path::new(SYSFS_GPIO_ROOT))
    }

    /// Same as [`SysfsPin::new`] with an explicit sysfs root.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be exported or configured.
    pub fn with_root(pin: u32, root: &Path) -> Result<Self> {
        let pin_dir = root.join(format!("gpio{pin}"));
        let gpio_err = |source| HardwareError::Gpio { pin, source };

        if !pin_dir.exists() {
            debug!("Exporting GPIO {}", pin);
            fs::write(root.join("export"), pin.to_string()).map_err(gpio_err)?;
        }

        // Writing "out" would reset the level to low; keep whatever state the pin
        // is already in across service restarts.
        let direction = fs::read_to_string(pin_dir.join("direction")).unwrap_or_default();
        if direction.trim() != "out" {
            fs::write(pin_dir.join("direction"), "out").map_err(gpio_err)?;
        }

        Ok(Self { pin, pin_dir })
    }
}

impl OutputPin for SysfsPin {
    fn number(&self) -> u32 {
        self.pin
    }

    fn write(&self, high: bool) -> Result<()> {
        debug!("Setting GPIO {} to {}", self.pin, high);
        fs::write(self.pin_dir.join("value"), if high { "1" } else { "0" }).map_err(|source| {
            HardwareError::Gpio {
                pin: self.pin,
                source,
            }
        })
    }

    fn read(&self) -> Result<bool> {
        let raw = fs::read_to_string(self.pin_dir.join("value")).map_err(|source| {
            HardwareError::Gpio {
                pin: self.pin,
                source,
            }
        })?;

        match raw.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(HardwareError::InvalidPinValue {
                pin: self.pin,
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory pin for exercising controllers
    #[derive(Debug, Default)]
    pub(crate) struct MemoryPin {
        pub(crate) level: AtomicBool,
        pub(crate) fail: AtomicBool,
    }

    impl OutputPin for MemoryPin {
        fn number(&self) -> u32 {
            0
        }

        fn write(&self, high: bool) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(HardwareError::Gpio {
                    pin: 0,
                    source: std::io::Error::other("write failed"),
                });
            }
            self.level.store(high, Ordering::SeqCst);
            Ok(())
        }

        fn read(&self) -> Result<bool> {
            Ok(self.level.load(Ordering::SeqCst))
        }
    }

    fn fake_sysfs(name: &str, pin: u32) -> PathBuf {
        let root = std::env::temp_dir().join(format!("crt-gpio-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let pin_dir = root.join(format!("gpio{pin}"));
        fs::create_dir_all(&pin_dir).unwrap();
        fs::write(root.join("export"), "").unwrap();
        fs::write(pin_dir.join("direction"), "in\n").unwrap();
        fs::write(pin_dir.join("value"), "0\n").unwrap();
        root
    }

    #[test]
    fn test_sysfs_pin_sets_direction_and_value() {
        let root = fake_sysfs("write", 18);
        let pin = SysfsPin::with_root(18, &root).unwrap();

        assert_eq!(
            fs::read_to_string(root.join("gpio18/direction")).unwrap(),
            "out"
        );
        assert!(!pin.read().unwrap());

        pin.write(true).unwrap();
        assert_eq!(fs::read_to_string(root.join("gpio18/value")).unwrap(), "1");
        assert!(pin.read().unwrap());

        pin.write(false).unwrap();
        assert!(!pin.read().unwrap());
        assert_eq!(pin.number(), 18);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_sysfs_pin_rejects_garbage_value() {
        let root = fake_sysfs("garbage", 26);
        let pin = SysfsPin::with_root(26, &root).unwrap();
        fs::write(root.join("gpio26/value"), "x").unwrap();

        assert!(matches!(
            pin.read(),
            Err(HardwareError::InvalidPinValue { pin: 26, .. })
        ));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_sysfs_pin_missing_root_fails() {
        let root = std::env::temp_dir().join(format!("crt-gpio-missing-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        assert!(matches!(
            SysfsPin::with_root(5, &root),
            Err(HardwareError::Gpio { pin: 5, .. })
        ));
    }
}

use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

/// Compute device an engine is loaded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Metal,
    Cpu,
}

impl Device {
    /// Preference order used when no device is requested.
    const PREFERENCE: [Device; 3] = [Device::Cuda, Device::Metal, Device::Cpu];

    /// Pick the device to load on. An unavailable preference silently falls
    /// back to the first available device in `PREFERENCE` order; CPU is always
    /// available.
    pub fn resolve(preferred: Option<Device>) -> Device {
        if let Some(device) = preferred {
            if device.is_available() {
                return device;
            }
        }
        Self::PREFERENCE
            .into_iter()
            .find(|d| d.is_available())
            .unwrap_or(Device::Cpu)
    }

    pub fn is_available(self) -> bool {
        match self {
            Device::Cuda => Path::new("/proc/driver/nvidia/version").exists(),
            Device::Metal => cfg!(target_os = "macos"),
            Device::Cpu => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Metal => "metal",
            Device::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cuda" | "gpu" => Ok(Device::Cuda),
            "metal" | "mps" => Ok(Device::Metal),
            "cpu" => Ok(Device::Cpu),
            other => Err(anyhow::anyhow!(
                "unknown device '{other}' (expected cuda, metal or cpu)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device() {
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda);
        assert_eq!("MPS".parse::<Device>().unwrap(), Device::Metal);
        assert_eq!(" cpu ".parse::<Device>().unwrap(), Device::Cpu);
        assert!("tpu".parse::<Device>().is_err());
    }

    #[test]
    fn test_cpu_always_resolves() {
        assert_eq!(Device::resolve(Some(Device::Cpu)), Device::Cpu);
    }

    #[test]
    fn test_resolve_returns_available_device() {
        for preferred in [None, Some(Device::Cuda), Some(Device::Metal)] {
            assert!(Device::resolve(preferred).is_available());
        }
    }
}

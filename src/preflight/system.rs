//! Host checks.
//!
//! Frequency scaling, virtualization and background load all add latency
//! noise that the distinguisher has to overcome. None of them invalidates a
//! run, so every warning here is informational.

use serde::{Deserialize, Serialize};

/// Warning from host checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SystemWarning {
    /// CPU frequency scaling is not set to performance mode.
    CpuGovernorNotPerformance {
        /// Current governor setting.
        current: String,
    },

    /// Running under a hypervisor.
    VirtualMachineDetected,

    /// One-minute load average above the threshold.
    HighSystemLoad {
        /// Current load average.
        load_average: f64,
        /// Threshold exceeded.
        threshold: f64,
    },
}

impl SystemWarning {
    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            SystemWarning::CpuGovernorNotPerformance { current } => format!(
                "CPU frequency governor is '{}'; 'performance' gives steadier probe latencies",
                current
            ),
            SystemWarning::VirtualMachineDetected => {
                "Running in a virtual machine; hypervisor scheduling adds latency jitter".to_string()
            }
            SystemWarning::HighSystemLoad {
                load_average,
                threshold,
            } => format!(
                "High system load: {:.2} (threshold {:.2}); competing work adds latency jitter",
                load_average, threshold
            ),
        }
    }
}

/// Perform all host checks. Returns an empty list on unsupported platforms.
pub fn system_check() -> Vec<SystemWarning> {
    #[allow(unused_mut)]
    let mut warnings = Vec::new();

    #[cfg(target_os = "linux")]
    {
        warnings.extend(check_cpu_governor_linux());
        warnings.extend(check_vm_detection_linux());
        warnings.extend(check_load_linux());
    }

    warnings
}

#[cfg(target_os = "linux")]
fn check_cpu_governor_linux() -> Option<SystemWarning> {
    let governor =
        std::fs::read_to_string("/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor").ok()?;
    let governor = governor.trim().to_lowercase();
    (governor != "performance").then_some(SystemWarning::CpuGovernorNotPerformance {
        current: governor,
    })
}

#[cfg(target_os = "linux")]
fn check_vm_detection_linux() -> Option<SystemWarning> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    cpuinfo
        .to_lowercase()
        .contains("hypervisor")
        .then_some(SystemWarning::VirtualMachineDetected)
}

#[cfg(target_os = "linux")]
fn check_load_linux() -> Option<SystemWarning> {
    let loadavg = std::fs::read_to_string("/proc/loadavg").ok()?;
    let load = loadavg
        .split_whitespace()
        .next()
        .and_then(|val| val.parse::<f64>().ok())?;

    let threshold = std::thread::available_parallelism()
        .map(|n| n.get() as f64)
        .unwrap_or(1.0);
    (load > threshold).then_some(SystemWarning::HighSystemLoad {
        load_average: load,
        threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_check_runs() {
        let _warnings = system_check();
    }

    #[test]
    fn test_warning_descriptions() {
        let desc = SystemWarning::CpuGovernorNotPerformance {
            current: "powersave".to_string(),
        }
        .description();
        assert!(desc.contains("powersave"));

        let desc = SystemWarning::HighSystemLoad {
            load_average: 2.5,
            threshold: 1.0,
        }
        .description();
        assert!(desc.contains("2.50"));

        assert!(SystemWarning::VirtualMachineDetected
            .description()
            .contains("virtual machine"));
    }
}

//! Resource-pressure probes consulted by the archiver between flushes

use std::fmt;

/// How close the process is to its memory high-water mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PressureLevel {
    Normal,
    /// Above the high-water mark
    Elevated,
    /// Above one and a half times the high-water mark
    Critical,
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Source of memory-pressure signals
///
/// The archiver samples the probe after every flush. When pressure is
/// elevated it calls [`ResourceProbe::relieve`] and samples again; if the
/// pressure persists it pauses before accepting more work.
pub trait ResourceProbe: Send + Sync {
    /// Current pressure level
    fn pressure(&self) -> PressureLevel;

    /// Runs a collection hook if one exists
    ///
    /// Returns false when there is nothing to invoke.
    fn relieve(&self) -> bool {
        false
    }
}

/// A probe that never reports pressure
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPressure;

impl ResourceProbe for NoPressure {
    fn pressure(&self) -> PressureLevel {
        PressureLevel::Normal
    }
}

/// Reads resident set size from `/proc/self/status`
///
/// On platforms without procfs the probe always reports
/// [`PressureLevel::Normal`]. There is no collector to run, so `relieve`
/// keeps the default.
#[derive(Debug, Clone)]
pub struct ProcessMemoryProbe {
    high_water_bytes: u64,
}

impl ProcessMemoryProbe {
    /// Creates a probe with a high-water mark in megabytes
    pub fn new(high_water_mb: u64) -> Self {
        Self {
            high_water_bytes: high_water_mb.saturating_mul(1024 * 1024),
        }
    }

    /// Resident memory in bytes, if the platform reports it
    pub fn resident_bytes() -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }

    /// Maps a resident size onto a pressure level
    pub fn level_for(&self, resident: u64) -> PressureLevel {
        if resident > self.high_water_bytes.saturating_add(self.high_water_bytes / 2) {
            PressureLevel::Critical
        } else if resident > self.high_water_bytes {
            PressureLevel::Elevated
        } else {
            PressureLevel::Normal
        }
    }
}

impl ResourceProbe for ProcessMemoryProbe {
    fn pressure(&self) -> PressureLevel {
        match Self::resident_bytes() {
            Some(resident) => self.level_for(resident),
            None => PressureLevel::Normal,
        }
    }
}

/// Extracts `VmRSS` (reported in kB) from a procfs status file
fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

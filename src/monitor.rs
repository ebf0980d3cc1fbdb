//! Host resource monitoring.
//!
//! Samples CPU and memory usage for health reporting. Consumed by
//! [`BridgeManager::health`](crate::BridgeManager::health) for status
//! output only; nothing in the connection lifecycle depends on it.

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::System;

// ============================================================================
// ResourceThresholds
// ============================================================================

/// Warning thresholds for resource alerts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceThresholds {
    /// CPU usage warning threshold, percent.
    pub cpu_percent: f32,

    /// Memory usage warning threshold, percent.
    pub memory_percent: f32,
}

impl Default for ResourceThresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 85.0,
        }
    }
}

// ============================================================================
// SystemResources
// ============================================================================

/// One host resource sample.
#[derive(Debug, Clone, Serialize)]
pub struct SystemResources {
    /// Global CPU usage, percent.
    pub cpu_percent: f32,

    /// Total memory in bytes.
    pub memory_total: u64,

    /// Used memory in bytes.
    pub memory_used: u64,

    /// Available memory in bytes.
    pub memory_available: u64,

    /// Used memory as a share of total, percent.
    pub memory_percent: f32,

    /// Sample time.
    pub sampled_at: DateTime<Utc>,
}

// ============================================================================
// Alerts
// ============================================================================

/// Which resource tripped a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// CPU usage.
    Cpu,
    /// Memory usage.
    Memory,
}

/// One threshold warning.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceAlert {
    /// Resource that tripped.
    pub kind: AlertKind,

    /// Human-readable description.
    pub message: String,
}

/// Overall verdict of a threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Everything under thresholds.
    Ok,
    /// At least one threshold tripped.
    Warning,
}

/// Resource sample plus threshold verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    /// The underlying sample.
    pub resources: SystemResources,

    /// Threshold warnings, possibly empty.
    pub alerts: Vec<ResourceAlert>,

    /// Overall verdict.
    pub status: HealthStatus,
}

// ============================================================================
// ResourceMonitor
// ============================================================================

/// Samples host CPU/memory usage.
pub struct ResourceMonitor {
    /// System information gatherer.
    system: Mutex<System>,

    /// Alert thresholds.
    thresholds: ResourceThresholds,
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceMonitor {
    /// Creates a monitor with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_thresholds(ResourceThresholds::default())
    }

    /// Creates a monitor with custom thresholds.
    #[must_use]
    pub fn with_thresholds(thresholds: ResourceThresholds) -> Self {
        Self {
            system: Mutex::new(System::new()),
            thresholds,
        }
    }

    /// Takes one resource sample.
    #[must_use]
    pub fn sample(&self) -> SystemResources {
        let mut system = self.system.lock();
        system.refresh_cpu();
        system.refresh_memory();

        let memory_total = system.total_memory();
        let memory_used = system.used_memory();
        let memory_percent = if memory_total > 0 {
            (memory_used as f64 / memory_total as f64 * 100.0) as f32
        } else {
            0.0
        };

        SystemResources {
            cpu_percent: system.global_cpu_info().cpu_usage(),
            memory_total,
            memory_used,
            memory_available: system.available_memory(),
            memory_percent,
            sampled_at: Utc::now(),
        }
    }

    /// Samples and checks against the configured thresholds.
    #[must_use]
    pub fn check_thresholds(&self) -> ResourceReport {
        assess(self.sample(), &self.thresholds)
    }
}

/// Threshold assessment over a sample.
fn assess(resources: SystemResources, thresholds: &ResourceThresholds) -> ResourceReport {
    let mut alerts = Vec::new();

    if resources.cpu_percent > thresholds.cpu_percent {
        alerts.push(ResourceAlert {
            kind: AlertKind::Cpu,
            message: format!("CPU usage high: {:.1}%", resources.cpu_percent),
        });
    }
    if resources.memory_percent > thresholds.memory_percent {
        alerts.push(ResourceAlert {
            kind: AlertKind::Memory,
            message: format!("Memory usage high: {:.1}%", resources.memory_percent),
        });
    }

    let status = if alerts.is_empty() {
        HealthStatus::Ok
    } else {
        HealthStatus::Warning
    };

    ResourceReport {
        resources,
        alerts,
        status,
    }
}

// ============================================================================
// Tests
// ============================================================================

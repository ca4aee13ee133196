//! Host metrics collection

use serde::{Deserialize, Serialize};
use sysinfo::{Disks, System};

/// Host resource usage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostMetrics {
    /// CPU usage percentage (0-100)
    pub cpu_usage: f32,

    /// Memory usage in bytes
    pub memory_used: u64,

    /// Total memory in bytes
    pub memory_total: u64,

    /// Memory usage percentage
    pub memory_percent: f32,

    /// Disk usage in bytes
    pub disk_used: u64,

    /// Total disk space in bytes
    pub disk_total: u64,

    /// Disk usage percentage
    pub disk_percent: f32,

    /// System uptime in seconds
    pub uptime_secs: u64,

    /// Hostname
    pub hostname: String,
}

fn percent(used: u64, total: u64) -> f32 {
    if total > 0 {
        (used as f32 / total as f32) * 100.0
    } else {
        0.0
    }
}

/// Collect host metrics. Blocking; call from `spawn_blocking`.
pub fn collect_metrics() -> HostMetrics {
    let mut sys = System::new_all();
    sys.refresh_all();

    let disks = Disks::new_with_refreshed_list();

    let (disk_used, disk_total) = disks.iter().fold((0u64, 0u64), |(used, total), disk| {
        (
            used + (disk.total_space() - disk.available_space()),
            total + disk.total_space(),
        )
    });

    let memory_used = sys.used_memory();
    let memory_total = sys.total_memory();

    HostMetrics {
        cpu_usage: sys.global_cpu_usage(),
        memory_used,
        memory_total,
        memory_percent: percent(memory_used, memory_total),
        disk_used,
        disk_total,
        disk_percent: percent(disk_used, disk_total),
        uptime_secs: System::uptime(),
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
    }
}

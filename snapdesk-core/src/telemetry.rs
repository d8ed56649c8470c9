//! Point-in-time machine telemetry for the info command.

/// One snapshot of the host machine. Collected fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineInfo {
    pub host_name: String,
    /// Aggregate over all cores, 0..=100.
    pub cpu_usage_percent: f32,
    pub used_ram_mb: u64,
    pub total_ram_mb: u64,
    pub uptime: std::time::Duration,
}

/// The machine's hostname, or a placeholder when the OS won't say.
#[must_use]
pub fn host_name() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_owned())
}

/// Collect a fresh snapshot.
///
/// Blocks for [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`]: CPU load is a delta
/// between two samples, a single read would always report zero.
#[must_use]
pub fn collect() -> MachineInfo {
    let mut sys = sysinfo::System::new();
    sys.refresh_cpu_usage();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    const MIB: u64 = 1024 * 1024;
    MachineInfo {
        host_name: host_name(),
        cpu_usage_percent: sys.global_cpu_usage(),
        used_ram_mb: sys.used_memory() / MIB,
        total_ram_mb: sys.total_memory() / MIB,
        uptime: std::time::Duration::from_secs(sysinfo::System::uptime()),
    }
}

/// Render an uptime as "D days, H hours, M minutes, S seconds".
#[must_use]
pub fn format_uptime(uptime: std::time::Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{} days, {} hours, {} minutes, {} seconds",
        secs / 86_400,
        (secs / 3_600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

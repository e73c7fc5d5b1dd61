use std::time::Instant;

/// One poll result: the value to graph plus the full record behind it.
#[derive(Clone, Debug)]
pub struct Sample {
    pub taken_at: Instant,
    pub plot: f64,
    pub reading: Reading,
}

impl Sample {
    pub fn new(plot: f64, reading: Reading) -> Self {
        Self {
            taken_at: Instant::now(),
            plot,
            reading,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Reading {
    Cpu(CpuStats),
    Memory(MemoryStats),
    Disk(Vec<DiskStats>),
    Gpu(Vec<GpuStats>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CpuStats {
    pub global_usage: f32,
    pub per_core_usage: Vec<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryStats {
    pub fn usage_percent(&self) -> f32 {
        percent(self.used_bytes, self.total_bytes)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DiskStats {
    pub name: String,
    pub mount_point: String,
    pub file_system: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl DiskStats {
    pub fn usage_percent(&self) -> f32 {
        percent(self.used_bytes, self.total_bytes)
    }

    /// Short pane label: `root` for `/`, otherwise the last path segment.
    pub fn label(&self) -> &str {
        if self.mount_point == "/" {
            return "root";
        }
        self.mount_point
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(self.mount_point.as_str())
    }
}

/// A GPU as reported by its vendor tool. Tools report `[N/A]` freely, so every
/// measurement is optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuStats {
    pub index: usize,
    pub name: String,
    pub utilization_pct: Option<f32>,
    pub temperature_c: Option<f32>,
    pub fan_pct: Option<f32>,
    pub power_draw_w: Option<f32>,
    pub power_limit_w: Option<f32>,
    pub memory_used_mib: Option<u64>,
    pub memory_total_mib: Option<u64>,
    pub compute_mode: Option<String>,
}

fn percent(part: u64, total: u64) -> f32 {
    if total > 0 {
        (part as f64 / total as f64 * 100.0) as f32
    } else {
        0.0
    }
}

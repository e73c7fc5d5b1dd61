use super::SampleSource;
use crate::error::SampleError;
use crate::model::{CpuStats, Reading, Sample};
use sysinfo::System;

pub fn collect(sys: &System) -> Result<CpuStats, SampleError> {
    let cpus = sys.cpus();
    if cpus.is_empty() {
        return Err(SampleError::unavailable("cpu", "no cpus reported"));
    }
    Ok(CpuStats {
        global_usage: sys.global_cpu_usage(),
        per_core_usage: cpus.iter().map(|c| c.cpu_usage()).collect(),
    })
}

/// Global CPU utilisation, 0-100.
pub struct CpuSource {
    sys: System,
}

impl CpuSource {
    pub fn new() -> Self {
        let mut sys = System::new();
        // usage is a delta between refreshes, so prime the first one here
        sys.refresh_cpu_usage();
        Self { sys }
    }
}

impl Default for CpuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for CpuSource {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        self.sys.refresh_cpu_usage();
        let stats = collect(&self.sys)?;
        let plot = f64::from(stats.global_usage.clamp(0.0, 100.0));
        Ok(Sample::new(plot, Reading::Cpu(stats)))
    }
}

use super::SampleSource;
use crate::error::SampleError;
use crate::model::{MemoryStats, Reading, Sample};
use sysinfo::System;

pub fn collect(sys: &System) -> Result<MemoryStats, SampleError> {
    let total = sys.total_memory();
    if total == 0 {
        return Err(SampleError::unavailable("memory", "total memory reported as zero"));
    }
    Ok(MemoryStats {
        total_bytes: total,
        used_bytes: sys.used_memory(),
        free_bytes: sys.free_memory(),
        available_bytes: sys.available_memory(),
    })
}

/// Which memory figure a [`MemorySource`] graphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemorySeries {
    Used,
    Free,
}

pub struct MemorySource {
    sys: System,
    series: MemorySeries,
}

impl MemorySource {
    pub fn new(series: MemorySeries) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self { sys, series }
    }

    pub fn used() -> Self {
        Self::new(MemorySeries::Used)
    }

    pub fn free() -> Self {
        Self::new(MemorySeries::Free)
    }

    pub fn series(&self) -> MemorySeries {
        self.series
    }

    /// Physical memory at construction; the upper bound of the graph.
    pub fn total_bytes(&self) -> u64 {
        self.sys.total_memory()
    }
}

impl SampleSource for MemorySource {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        self.sys.refresh_memory();
        let stats = collect(&self.sys)?;
        let plot = match self.series {
            MemorySeries::Used => stats.used_bytes,
            MemorySeries::Free => stats.free_bytes,
        };
        Ok(Sample::new(plot as f64, Reading::Memory(stats)))
    }
}

mod command;
pub mod macmon;
pub mod nvidia;

pub use command::run_tool;

use super::{Arch, Os, Platform, SampleSource};
use crate::error::SampleError;
use crate::model::{GpuStats, Reading, Sample};
use std::time::Duration;
use tracing::info;

/// Vendor tool that reports GPU statistics on this platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuBackend {
    NvidiaSmi,
    Macmon,
}

impl GpuBackend {
    pub fn select(platform: &Platform) -> Result<Self, SampleError> {
        match (&platform.os, &platform.arch) {
            (Os::Linux, Arch::X86_64) => Ok(Self::NvidiaSmi),
            (Os::MacOs, Arch::Aarch64) => Ok(Self::Macmon),
            _ => Err(SampleError::UnsupportedPlatform {
                os: platform.os_name().to_string(),
                arch: platform.arch_name().to_string(),
            }),
        }
    }

    pub fn tool(self) -> &'static str {
        match self {
            Self::NvidiaSmi => nvidia::TOOL,
            Self::Macmon => macmon::TOOL,
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::NvidiaSmi => nvidia::INSTALL_HINT,
            Self::Macmon => macmon::INSTALL_HINT,
        }
    }
}

/// GPU statistics from the platform's vendor tool, one process per sample.
pub struct GpuSource {
    backend: Result<GpuBackend, SampleError>,
    interval: Duration,
    timeout: Duration,
}

impl GpuSource {
    /// Picks the backend once; an unsupported platform is reported by [`SampleSource::probe`].
    pub fn new(platform: &Platform, interval: Duration, timeout: Duration) -> Self {
        Self {
            backend: GpuBackend::select(platform),
            interval,
            timeout,
        }
    }

    pub fn backend(&self) -> Option<GpuBackend> {
        self.backend.as_ref().ok().copied()
    }

    fn require_backend(&self) -> Result<GpuBackend, SampleError> {
        self.backend.clone()
    }
}

impl SampleSource for GpuSource {
    fn requires_probe(&self) -> bool {
        true
    }

    async fn probe(&mut self) -> Result<(), SampleError> {
        let backend = self.require_backend()?;
        let tool = backend.tool();
        match backend {
            GpuBackend::NvidiaSmi => {
                let out = run_tool(tool, &[], self.timeout, Some(backend.hint())).await;
                nvidia::check_probe(out)?;
            }
            GpuBackend::Macmon => {
                run_tool(tool, &["--version"], self.timeout, Some(backend.hint())).await?;
            }
        }
        info!(tool, "gpu tool available");
        Ok(())
    }

    async fn sample(&mut self) -> Result<Sample, SampleError> {
        let backend = self.require_backend()?;
        let tool = backend.tool();
        let gpus = match backend {
            GpuBackend::NvidiaSmi => {
                let out = run_tool(tool, &nvidia::QUERY_ARGS, self.timeout, Some(backend.hint())).await?;
                nvidia::parse_query(&out)?
            }
            GpuBackend::Macmon => {
                let args = macmon::pipe_args(self.interval.as_millis() as u64 / 2);
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                let out = run_tool(tool, &args, self.timeout, Some(backend.hint())).await?;
                vec![macmon::parse_pipe(&out)?]
            }
        };
        let plot = mean_utilization(&gpus)?;
        Ok(Sample::new(plot, Reading::Gpu(gpus)))
    }
}

/// Mean utilisation over the devices that report one.
fn mean_utilization(gpus: &[GpuStats]) -> Result<f64, SampleError> {
    let utilization: Vec<f32> = gpus.iter().filter_map(|g| g.utilization_pct).collect();
    if utilization.is_empty() {
        return Err(SampleError::unavailable("gpu", "no device reports utilization"));
    }
    Ok(f64::from(utilization.iter().sum::<f32>()) / utilization.len() as f64)
}

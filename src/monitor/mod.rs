mod cpu;
mod disk;
pub mod gpu;
mod host;
mod memory;
mod platform;

pub use cpu::CpuSource;
pub use disk::{is_pseudo_mount, DiskSource};
pub use gpu::{GpuBackend, GpuSource};
pub use host::HostInfo;
pub use memory::{MemorySeries, MemorySource};
pub use platform::{Arch, Os, Platform};

use crate::error::SampleError;
use crate::model::Sample;
use std::future::Future;

/// A provider of one metric, polled by a [`crate::poller::Poller`].
pub trait SampleSource: Send + 'static {
    /// Whether [`SampleSource::probe`] must succeed before sampling starts.
    fn requires_probe(&self) -> bool {
        false
    }

    /// One-time capability check, e.g. whether a vendor tool is installed.
    fn probe(&mut self) -> impl Future<Output = Result<(), SampleError>> + Send {
        async { Ok(()) }
    }

    fn sample(&mut self) -> impl Future<Output = Result<Sample, SampleError>> + Send;
}

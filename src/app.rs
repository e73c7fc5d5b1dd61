use crate::config::{Config, PaneConfig};
use crate::error::GraphError;
use crate::monitor::{CpuSource, DiskSource, GpuSource, HostInfo, MemorySource, Platform, SampleSource};
use crate::poller::{Diagnostic, Poller, PollerHandle, PollerLinks, PollerReport};
use crate::stream::StreamBuffer;
use crate::ui::dashboard::Screen;
use crate::ui::presenter;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{info, warn};

const PERCENT: (f64, f64) = (0.0, 100.0);

/// Owns every poller of the dashboard from mount to unmount.
pub struct App {
    host: HostInfo,
    cpu: PollerHandle,
    memory_used: PollerHandle,
    memory_free: PollerHandle,
    disk: PollerHandle,
    gpu: Option<PollerHandle>,
    redraw: Arc<Notify>,
    diagnostics: mpsc::UnboundedReceiver<Diagnostic>,
    notes: Vec<String>,
}

impl App {
    /// Spawns one poller per graph. Must be called inside a tokio runtime.
    pub fn mount(config: &Config) -> Result<Self, GraphError> {
        let host = HostInfo::collect();
        let platform = host.platform.clone();
        Self::mount_with(config, host, platform)
    }

    pub fn mount_with(config: &Config, host: HostInfo, platform: Platform) -> Result<Self, GraphError> {
        let (links, diagnostics) = PollerLinks::new();
        let redraw = links.redraw.clone();

        let cpu = spawn("CPU", CpuSource::new(), config.cpu, PERCENT, &links)?;

        let used = MemorySource::used();
        let free = MemorySource::free();
        let total = used.total_bytes().max(1) as f64;
        let memory_used = spawn("Memory used", used, config.memory, (0.0, total), &links)?;
        let memory_free = spawn("Memory free", free, config.memory, (0.0, total), &links)?;

        let disk = spawn("Disk", DiskSource::new(platform.clone()), config.disk, PERCENT, &links)?;

        let gpu = if config.gpu.enabled {
            let source = GpuSource::new(&platform, config.gpu.interval(), config.gpu.timeout());
            let pane = config.gpu.pane();
            let buffer = StreamBuffer::new(pane.width, pane.height, PERCENT.0, PERCENT.1)?;
            let jitter = config.gpu.jitter_for(std::process::id());
            let poller = Poller::new("GPU", source, buffer, pane.interval(), links.clone())
                .with_start_delay(jitter);
            Some(poller.spawn())
        } else {
            None
        };

        info!(%platform, gpu = config.gpu.enabled, "dashboard mounted");
        Ok(Self {
            host,
            cpu,
            memory_used,
            memory_free,
            disk,
            gpu,
            redraw,
            diagnostics,
            notes: Vec::new(),
        })
    }

    /// Signalled whenever any poller publishes a new frame.
    pub fn redraw(&self) -> Arc<Notify> {
        self.redraw.clone()
    }

    /// Moves pending diagnostics into the notes shown in the footer.
    pub fn drain_diagnostics(&mut self) -> usize {
        let mut count = 0;
        while let Ok(diagnostic) = self.diagnostics.try_recv() {
            self.notes.push(format!("{}: {}", diagnostic.pane, diagnostic.message));
            count += 1;
        }
        count
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn screen(&self) -> Screen {
        Screen {
            cpu: presenter::cpu_view(&self.cpu.frame()),
            gpu: self.gpu.as_ref().map(|gpu| presenter::gpu_view(&gpu.frame())),
            host: presenter::host_view(&self.host),
            memory: presenter::memory_view(&self.memory_used.frame(), &self.memory_free.frame()),
            disk: presenter::disk_view(&self.disk.frame()),
            notes: self.notes.clone(),
        }
    }

    /// Cancels every poller and waits for all of them to finish.
    pub async fn unmount(self) -> Vec<PollerReport> {
        let handles = [
            Some(self.cpu),
            Some(self.memory_used),
            Some(self.memory_free),
            Some(self.disk),
            self.gpu,
        ];
        let handles: Vec<PollerHandle> = handles.into_iter().flatten().collect();
        for handle in &handles {
            handle.cancel();
        }

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = handle.name().to_string();
            match handle.shutdown().await {
                Ok(report) => reports.push(report),
                Err(err) => warn!(pane = %name, error = %err, "poller task failed"),
            }
        }
        info!(pollers = reports.len(), "dashboard unmounted");
        reports
    }
}

fn spawn<S: SampleSource>(
    name: &str,
    source: S,
    pane: PaneConfig,
    (min, max): (f64, f64),
    links: &PollerLinks,
) -> Result<PollerHandle, GraphError> {
    let buffer = StreamBuffer::new(pane.width, pane.height, min, max)?;
    Ok(Poller::new(name, source, buffer, pane.interval(), links.clone()).spawn())
}

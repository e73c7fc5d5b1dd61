use crate::model::{GpuStats, Reading};
use crate::monitor::HostInfo;
use crate::poller::{PaneFrame, PollerState};

const GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Warning,
    Error,
}

/// Display-ready text for one pane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaneView {
    pub title: String,
    pub lines: Vec<String>,
    pub tone: Tone,
}

impl PaneView {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            tone: Tone::Normal,
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.lines.push(message.into());
        if self.tone == Tone::Normal {
            self.tone = Tone::Warning;
        }
    }
}

pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / GB)
}

/// Writes `text` over the start of `line`, keeping its width in characters.
pub fn overlay(line: &str, text: &str) -> String {
    let width = line.chars().count();
    let head: String = text.chars().take(width).collect();
    let taken = head.chars().count();
    head.chars().chain(line.chars().skip(taken)).collect()
}

/// A stopped pane shows its diagnostic instead of a graph.
fn stopped(frame: &PaneFrame, view: &mut PaneView) -> bool {
    match &frame.diagnostic {
        Some(message) => {
            view.lines.push(message.clone());
            view.tone = Tone::Error;
            true
        }
        None => false,
    }
}

fn status(frame: &PaneFrame, view: &mut PaneView) {
    if frame.state == PollerState::Probing {
        view.warn("probing...");
    }
    if let Some(err) = &frame.last_error {
        view.warn(format!("last sample failed: {err}"));
    }
}

pub fn cpu_view(frame: &PaneFrame) -> PaneView {
    let mut view = PaneView::new("CPU");
    if stopped(frame, &mut view) {
        return view;
    }
    let mut lines = frame.grid.lines().to_vec();
    if let (Some(Reading::Cpu(cpu)), Some(first)) = (&frame.latest, lines.first_mut()) {
        *first = overlay(first, &format!(" CPU Usage {:.1}% ", cpu.global_usage));
    }
    view.lines = lines;
    status(frame, &mut view);
    view
}

/// Memory totals with one graph for used and one for free memory.
pub fn memory_view(used: &PaneFrame, free: &PaneFrame) -> PaneView {
    let mut view = PaneView::new("Memory");
    let stats = [used, free].into_iter().find_map(|f| match &f.latest {
        Some(Reading::Memory(stats)) => Some(stats),
        _ => None,
    });
    let Some(stats) = stats else {
        let used_stopped = stopped(used, &mut view);
        let free_stopped = stopped(free, &mut view);
        if !used_stopped && !free_stopped {
            view.lines.push("waiting for first sample".to_string());
            status(used, &mut view);
        }
        return view;
    };

    view.lines.push(format!("Total: {}", format_gb(stats.total_bytes)));
    view.lines.push(format!("Used: {}", format_gb(stats.used_bytes)));
    if !stopped(used, &mut view) {
        view.lines.extend_from_slice(used.grid.lines());
    }
    view.lines.push(format!("Free: {}", format_gb(stats.free_bytes)));
    if !stopped(free, &mut view) {
        view.lines.extend_from_slice(free.grid.lines());
    }
    status(used, &mut view);
    status(free, &mut view);
    view
}

pub fn disk_view(frame: &PaneFrame) -> PaneView {
    let mut view = PaneView::new("Disk");
    if stopped(frame, &mut view) {
        return view;
    }
    if let Some(Reading::Disk(disks)) = &frame.latest {
        for disk in disks {
            view.lines.push(format!(
                "{}  {} / {}",
                disk.label(),
                format_gb(disk.free_bytes),
                format_gb(disk.total_bytes)
            ));
        }
    }
    view.lines.extend_from_slice(frame.grid.lines());
    status(frame, &mut view);
    view
}

pub fn gpu_view(frame: &PaneFrame) -> PaneView {
    let mut view = PaneView::new("GPU");
    if stopped(frame, &mut view) {
        return view;
    }
    if let Some(Reading::Gpu(gpus)) = &frame.latest {
        view.lines.extend(gpus.iter().map(gpu_line));
    }
    view.lines.extend_from_slice(frame.grid.lines());
    status(frame, &mut view);
    view
}

fn gpu_line(gpu: &GpuStats) -> String {
    let mut parts = vec![format!("{}: {}", gpu.index, gpu.name)];
    if let Some(util) = gpu.utilization_pct {
        parts.push(format!("{util:.0}%"));
    }
    if let Some(temp) = gpu.temperature_c {
        parts.push(format!("{temp:.0}C"));
    }
    if let Some(fan) = gpu.fan_pct {
        parts.push(format!("fan {fan:.0}%"));
    }
    match (gpu.power_draw_w, gpu.power_limit_w) {
        (Some(draw), Some(limit)) => parts.push(format!("{draw:.0}/{limit:.0}W")),
        (Some(draw), None) => parts.push(format!("{draw:.1}W")),
        _ => {}
    }
    match (gpu.memory_used_mib, gpu.memory_total_mib) {
        (Some(used), Some(total)) => parts.push(format!("{used}/{total} MiB")),
        (Some(used), None) => parts.push(format!("{used} MiB")),
        _ => {}
    }
    parts.join("  ")
}

pub fn host_view(host: &HostInfo) -> PaneView {
    let mut view = PaneView::new("Host");
    view.lines = host.lines();
    view
}

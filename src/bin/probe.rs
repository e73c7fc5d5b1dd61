use std::error::Error;
use std::time::Duration;
use term_state_monitor::config::Config;
use term_state_monitor::logging::{init_logging, LogOutput};
use term_state_monitor::monitor::{
    CpuSource, DiskSource, GpuSource, HostInfo, MemorySource, SampleSource,
};
use term_state_monitor::model::Reading;
use term_state_monitor::ui::presenter::format_gb;

/// Prints what each source reports once, e.g. to find out why the GPU pane is empty.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging(LogOutput::Stderr);
    let config = Config::load();
    let host = HostInfo::collect();
    for line in host.lines() {
        println!("{line}");
    }
    println!();

    let mut cpu = CpuSource::new();
    // cpu usage needs two refreshes some time apart
    tokio::time::sleep(Duration::from_millis(250)).await;
    report("cpu", &mut cpu).await;
    report("memory", &mut MemorySource::used()).await;
    report("disk", &mut DiskSource::new(host.platform.clone())).await;

    let mut gpu = GpuSource::new(&host.platform, config.gpu.interval(), config.gpu.timeout());
    match gpu.backend() {
        Some(backend) => println!("gpu backend: {}", backend.tool()),
        None => println!("gpu backend: none"),
    }
    match gpu.probe().await {
        Ok(()) => report("gpu", &mut gpu).await,
        Err(err) => println!("gpu: {}", err.diagnostic()),
    }
    Ok(())
}

async fn report<S: SampleSource>(name: &str, source: &mut S) {
    match source.sample().await {
        Ok(sample) => {
            println!("{name}: plot {:.2}", sample.plot);
            for line in describe(&sample.reading) {
                println!("  {line}");
            }
        }
        Err(err) => println!("{name}: {}", err.diagnostic()),
    }
}

fn describe(reading: &Reading) -> Vec<String> {
    match reading {
        Reading::Cpu(cpu) => vec![format!(
            "{:.1}% over {} cores",
            cpu.global_usage,
            cpu.per_core_usage.len()
        )],
        Reading::Memory(mem) => vec![format!(
            "used {} / total {} ({:.0}%)",
            format_gb(mem.used_bytes),
            format_gb(mem.total_bytes),
            mem.usage_percent()
        )],
        Reading::Disk(disks) => disks
            .iter()
            .map(|d| {
                format!(
                    "{} on {} ({}): {} free of {}",
                    d.label(),
                    d.mount_point,
                    d.file_system,
                    format_gb(d.free_bytes),
                    format_gb(d.total_bytes)
                )
            })
            .collect(),
        Reading::Gpu(gpus) => gpus
            .iter()
            .map(|g| {
                format!(
                    "{}: {} util {:?}% temp {:?}C mem {:?}/{:?} MiB",
                    g.index,
                    g.name,
                    g.utilization_pct,
                    g.temperature_c,
                    g.memory_used_mib,
                    g.memory_total_mib
                )
            })
            .collect(),
    }
}

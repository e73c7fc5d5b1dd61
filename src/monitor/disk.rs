use super::{Os, Platform, SampleSource};
use crate::error::SampleError;
use crate::model::{DiskStats, Reading, Sample};
use std::collections::HashSet;
use sysinfo::Disks;

const LINUX_PSEUDO_FS: &[&str] = &[
    "proc",
    "sysfs",
    "tmpfs",
    "devtmpfs",
    "devpts",
    "overlay",
    "squashfs",
    "cgroup",
    "cgroup2",
    "securityfs",
    "debugfs",
    "tracefs",
    "mqueue",
    "hugetlbfs",
    "fusectl",
    "configfs",
    "pstore",
    "bpf",
    "autofs",
    "ramfs",
    "nsfs",
];

const LINUX_PSEUDO_PREFIXES: &[&str] = &["/proc", "/sys", "/dev", "/run", "/snap"];

const MACOS_PSEUDO_PREFIXES: &[&str] = &["/System/Volumes/", "/private/var/vm"];

/// Whether a mount is an OS-internal volume that should not be shown.
pub fn is_pseudo_mount(platform: &Platform, mount_point: &str, file_system: &str) -> bool {
    match platform.os {
        Os::Linux => {
            LINUX_PSEUDO_FS.contains(&file_system)
                || LINUX_PSEUDO_PREFIXES
                    .iter()
                    .any(|p| mount_point == *p || mount_point.starts_with(&format!("{p}/")))
        }
        Os::MacOs => MACOS_PSEUDO_PREFIXES
            .iter()
            .any(|p| mount_point.starts_with(p)),
        Os::Other(_) => false,
    }
}

pub fn collect(disks: &Disks, platform: &Platform) -> Vec<DiskStats> {
    let mut seen = HashSet::new();
    let mut stats: Vec<DiskStats> = disks
        .iter()
        .filter_map(|d| {
            let mount_point = d.mount_point().to_string_lossy().to_string();
            let file_system = d.file_system().to_string_lossy().to_string();
            if is_pseudo_mount(platform, &mount_point, &file_system) {
                return None;
            }
            if !seen.insert(mount_point.clone()) {
                return None;
            }
            let total = d.total_space();
            let available = d.available_space();
            Some(DiskStats {
                name: d.name().to_string_lossy().to_string(),
                mount_point,
                file_system,
                total_bytes: total,
                used_bytes: total.saturating_sub(available),
                free_bytes: available,
            })
        })
        .collect();
    sort_root_first(&mut stats);
    stats
}

fn sort_root_first(stats: &mut [DiskStats]) {
    stats.sort_by(|a, b| {
        (a.mount_point != "/")
            .cmp(&(b.mount_point != "/"))
            .then_with(|| a.mount_point.cmp(&b.mount_point))
    });
}

/// Usage of every real mount; graphs the used percent of the root mount.
pub struct DiskSource {
    disks: Disks,
    platform: Platform,
}

impl DiskSource {
    pub fn new(platform: Platform) -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
            platform,
        }
    }
}

impl SampleSource for DiskSource {
    async fn sample(&mut self) -> Result<Sample, SampleError> {
        self.disks.refresh(true);
        let stats = collect(&self.disks, &self.platform);
        let Some(primary) = stats.first() else {
            return Err(SampleError::unavailable("disk", "no mounted filesystems"));
        };
        let plot = f64::from(primary.usage_percent());
        Ok(Sample::new(plot, Reading::Disk(stats)))
    }
}

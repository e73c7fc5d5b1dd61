use super::Platform;
use sysinfo::System;

/// Static facts about the machine, shown beside the graphs.
#[derive(Clone, Debug, PartialEq)]
pub struct HostInfo {
    pub platform: Platform,
    pub hostname: String,
    pub hf_endpoint: Option<String>,
    pub hf_home: Option<String>,
}

impl HostInfo {
    pub fn collect() -> Self {
        Self {
            platform: Platform::current(),
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            hf_endpoint: env_var("HF_ENDPOINT"),
            hf_home: env_var("HF_HOME"),
        }
    }

    /// AutoDL cloud instances are recognisable by their hostname.
    pub fn is_autodl(&self) -> bool {
        self.hostname.starts_with("autodl")
    }

    pub fn lines(&self) -> Vec<String> {
        let unset = || "unset".to_string();
        vec![
            format!("OS: {}", self.platform.os_name()),
            format!("Arch: {}", self.platform.arch_name()),
            format!("Hostname: {}", self.hostname),
            format!("AutoDL: {}", self.is_autodl()),
            format!("HF_ENDPOINT: {}", self.hf_endpoint.clone().unwrap_or_else(unset)),
            format!("HF_HOME: {}", self.hf_home.clone().unwrap_or_else(unset)),
        ]
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

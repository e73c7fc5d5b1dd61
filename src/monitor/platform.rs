use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
    Other(String),
}

/// Host identity used to pick which metric backends can work here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn current() -> Self {
        Self::from_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_names(os: &str, arch: &str) -> Self {
        let os = match os.to_lowercase().as_str() {
            "linux" => Os::Linux,
            "macos" | "darwin" => Os::MacOs,
            other => Os::Other(other.to_string()),
        };
        let arch = match arch.to_lowercase().as_str() {
            "x86_64" | "amd64" => Arch::X86_64,
            "aarch64" | "arm64" => Arch::Aarch64,
            other => Arch::Other(other.to_string()),
        };
        Self { os, arch }
    }

    pub fn os_name(&self) -> &str {
        match &self.os {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Other(name) => name,
        }
    }

    pub fn arch_name(&self) -> &str {
        match &self.arch {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Other(name) => name,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os_name(), self.arch_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_aliases() {
        let mac = Platform::from_names("Darwin", "arm64");
        assert_eq!(mac.os, Os::MacOs);
        assert_eq!(mac.arch, Arch::Aarch64);
        assert_eq!(mac.to_string(), "macos/aarch64");

        let linux = Platform::from_names("linux", "amd64");
        assert_eq!(linux.to_string(), "linux/x86_64");
    }

    #[test]
    fn keeps_unknown_names() {
        let p = Platform::from_names("freebsd", "riscv64");
        assert_eq!(p.os, Os::Other("freebsd".into()));
        assert_eq!(p.to_string(), "freebsd/riscv64");
    }
}

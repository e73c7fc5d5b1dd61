use crate::error::SampleError;
use crate::model::GpuStats;
use serde::Deserialize;

pub const TOOL: &str = "macmon";
pub const INSTALL_HINT: &str = "brew install macmon";

const MIB: u64 = 1024 * 1024;

/// `macmon pipe` arguments for a single sample averaged over `interval_ms`.
pub fn pipe_args(interval_ms: u64) -> Vec<String> {
    vec![
        "pipe".to_string(),
        "-s".to_string(),
        "1".to_string(),
        "-i".to_string(),
        interval_ms.max(100).to_string(),
    ]
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MacmonSample {
    temp: MacmonTemp,
    memory: MacmonMemory,
    /// `[frequency_mhz, usage_ratio]`
    gpu_usage: Option<(f64, f64)>,
    gpu_power: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MacmonTemp {
    gpu_temp_avg: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MacmonMemory {
    ram_total: Option<u64>,
    ram_usage: Option<u64>,
}

/// Parses newline-delimited JSON from `macmon pipe`, keeping the newest object.
pub fn parse_pipe(output: &str) -> Result<GpuStats, SampleError> {
    let line = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .ok_or_else(|| SampleError::tool_failed(TOOL, "empty output"))?;
    let sample: MacmonSample = serde_json::from_str(line)
        .map_err(|err| SampleError::tool_failed(TOOL, format!("invalid json: {err}")))?;
    let Some((_, usage)) = sample.gpu_usage else {
        return Err(SampleError::tool_failed(TOOL, "missing gpu_usage"));
    };

    Ok(GpuStats {
        index: 0,
        name: "Apple GPU".to_string(),
        utilization_pct: Some((usage * 100.0).clamp(0.0, 100.0) as f32),
        temperature_c: sample.temp.gpu_temp_avg,
        fan_pct: None,
        power_draw_w: sample.gpu_power,
        power_limit_w: None,
        // unified memory: the GPU shares system RAM
        memory_used_mib: sample.memory.ram_usage.map(|b| b / MIB),
        memory_total_mib: sample.memory.ram_total.map(|b| b / MIB),
        compute_mode: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"timestamp":"2025-01-01T00:00:00Z","temp":{"cpu_temp_avg":43.7,"gpu_temp_avg":36.2},"memory":{"ram_total":25769803776,"ram_usage":20985479168,"swap_total":4294967296,"swap_usage":2602434560},"ecpu_usage":[1181,0.08],"pcpu_usage":[1974,0.06],"gpu_usage":[461,0.25],"cpu_power":0.2,"gpu_power":1.5,"ane_power":0.0,"all_power":1.7,"sys_power":5.4}"#;

    #[test]
    fn parses_gpu_fields() {
        let gpu = parse_pipe(SAMPLE).unwrap();
        assert_eq!(gpu.name, "Apple GPU");
        assert_eq!(gpu.utilization_pct, Some(25.0));
        assert_eq!(gpu.temperature_c, Some(36.2));
        assert_eq!(gpu.power_draw_w, Some(1.5));
        assert_eq!(gpu.memory_total_mib, Some(24576));
        assert_eq!(gpu.memory_used_mib, Some(20013));
        assert_eq!(gpu.fan_pct, None);
    }

    #[test]
    fn keeps_the_last_line() {
        let older = SAMPLE.replace("[461,0.25]", "[461,0.75]");
        let out = format!("{older}\n{SAMPLE}\n\n");
        assert_eq!(parse_pipe(&out).unwrap().utilization_pct, Some(25.0));
    }

    #[test]
    fn rejects_broken_output() {
        assert!(matches!(
            parse_pipe(""),
            Err(SampleError::ToolExecutionFailed { .. })
        ));
        assert!(matches!(
            parse_pipe("{not json"),
            Err(SampleError::ToolExecutionFailed { .. })
        ));
        assert!(matches!(
            parse_pipe(r#"{"gpu_power": 1.0}"#),
            Err(SampleError::ToolExecutionFailed { .. })
        ));
    }

    #[test]
    fn pipe_args_floor_the_interval() {
        assert_eq!(pipe_args(1000), ["pipe", "-s", "1", "-i", "1000"]);
        assert_eq!(pipe_args(5)[4], "100");
    }
}

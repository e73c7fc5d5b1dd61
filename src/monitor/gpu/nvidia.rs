use crate::error::SampleError;
use crate::model::GpuStats;
use std::collections::HashMap;

pub const TOOL: &str = "nvidia-smi";
pub const INSTALL_HINT: &str = "install the NVIDIA driver, which ships nvidia-smi";
pub const QUERY_ARGS: [&str; 2] = [
    "--query-gpu=name,temperature.gpu,fan.speed,power.draw,power.limit,memory.total,memory.used,utilization.gpu,compute_mode",
    "--format=csv,nounits",
];

const NO_DEVICES: &str = "No devices were found";

/// Checks a bare `nvidia-smi` run for a usable device. The tool exits
/// non-zero when it finds none, so the banner is looked for in failures too.
pub fn check_probe(result: Result<String, SampleError>) -> Result<(), SampleError> {
    let no_devices = || SampleError::tool_failed(TOOL, "no devices were found");
    match result {
        Ok(output) if output.contains(NO_DEVICES) => Err(no_devices()),
        Ok(_) => Ok(()),
        Err(SampleError::ToolExecutionFailed { reason, .. }) if reason.contains(NO_DEVICES) => {
            Err(no_devices())
        }
        Err(err) => Err(err),
    }
}

/// Parses `--format=csv,nounits` output: a header row, then one row per GPU.
pub fn parse_query(output: &str) -> Result<Vec<GpuStats>, SampleError> {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines
        .next()
        .ok_or_else(|| SampleError::tool_failed(TOOL, "empty output"))?;
    // header cells look like "memory.total [MiB]"; keep the key only
    let keys: Vec<&str> = header
        .split(',')
        .map(|h| h.split(" [").next().unwrap_or(h).trim())
        .collect();
    if !keys.contains(&"name") {
        return Err(SampleError::tool_failed(
            TOOL,
            format!("unexpected header: {header}"),
        ));
    }

    let mut gpus = Vec::new();
    for (index, line) in lines.enumerate() {
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        if values.len() != keys.len() {
            return Err(SampleError::tool_failed(
                TOOL,
                format!("row {index} has {} fields, expected {}", values.len(), keys.len()),
            ));
        }
        let row: HashMap<&str, &str> = keys.iter().copied().zip(values).collect();
        let get = |key: &str| row.get(key).copied().and_then(present);
        gpus.push(GpuStats {
            index,
            name: get("name").unwrap_or("GPU").to_string(),
            utilization_pct: get("utilization.gpu").and_then(number),
            temperature_c: get("temperature.gpu").and_then(number),
            fan_pct: get("fan.speed").and_then(number),
            power_draw_w: get("power.draw").and_then(number),
            power_limit_w: get("power.limit").and_then(number),
            memory_used_mib: get("memory.used").and_then(number).map(|v| v as u64),
            memory_total_mib: get("memory.total").and_then(number).map(|v| v as u64),
            compute_mode: get("compute_mode").map(str::to_string),
        });
    }

    if gpus.is_empty() {
        return Err(SampleError::tool_failed(TOOL, "no devices reported"));
    }
    Ok(gpus)
}

fn present(value: &str) -> Option<&str> {
    match value {
        "" | "N/A" => None,
        v if v.starts_with('[') => None,
        v => Some(v),
    }
}

fn number(value: &str) -> Option<f32> {
    value.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GPUS: &str = "\
name, temperature.gpu, fan.speed [%], power.draw [W], power.limit [W], memory.total [MiB], memory.used [MiB], utilization.gpu [%], compute_mode
NVIDIA GeForce RTX 4090, 45, 30, 71.52, 450.00, 24564, 1234, 12, Default
NVIDIA A100-SXM4-80GB, 38, [N/A], 60.11, 400.00, 81920, 0, 0, Exclusive_Process
";

    #[test]
    fn parses_rows_by_header() {
        let gpus = parse_query(TWO_GPUS).unwrap();
        assert_eq!(gpus.len(), 2);

        let first = &gpus[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.name, "NVIDIA GeForce RTX 4090");
        assert_eq!(first.temperature_c, Some(45.0));
        assert_eq!(first.fan_pct, Some(30.0));
        assert_eq!(first.power_draw_w, Some(71.52));
        assert_eq!(first.power_limit_w, Some(450.0));
        assert_eq!(first.memory_total_mib, Some(24564));
        assert_eq!(first.memory_used_mib, Some(1234));
        assert_eq!(first.utilization_pct, Some(12.0));
        assert_eq!(first.compute_mode.as_deref(), Some("Default"));

        let second = &gpus[1];
        assert_eq!(second.index, 1);
        assert_eq!(second.fan_pct, None);
        assert_eq!(second.compute_mode.as_deref(), Some("Exclusive_Process"));
    }

    #[test]
    fn column_order_follows_the_header() {
        let out = "utilization.gpu [%], name\n77, Tesla T4\n";
        let gpus = parse_query(out).unwrap();
        assert_eq!(gpus[0].name, "Tesla T4");
        assert_eq!(gpus[0].utilization_pct, Some(77.0));
        assert_eq!(gpus[0].temperature_c, None);
    }

    #[test]
    fn not_supported_fields_are_none() {
        let out = "name, power.draw [W], utilization.gpu [%]\nGRID, [Not Supported], N/A\n";
        let gpus = parse_query(out).unwrap();
        assert_eq!(gpus[0].power_draw_w, None);
        assert_eq!(gpus[0].utilization_pct, None);
    }

    #[test]
    fn malformed_output_is_an_execution_failure() {
        for out in [
            "",
            "garbage without header\n",
            "name, utilization.gpu [%]\n",
            "name, utilization.gpu [%]\nA, 1, extra\n",
        ] {
            let err = parse_query(out).unwrap_err();
            assert!(
                matches!(err, SampleError::ToolExecutionFailed { .. }),
                "{out:?} gave {err:?}"
            );
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn hosts_without_devices_are_rejected() {
        let expected = SampleError::tool_failed(TOOL, "no devices were found");
        assert_eq!(check_probe(Ok("No devices were found\n".into())), Err(expected.clone()));
        assert!(check_probe(Ok("+----------------+\n| NVIDIA-SMI 550.54 |\n".into())).is_ok());

        let exited = SampleError::tool_failed(TOOL, "exit status: 6: No devices were found");
        assert_eq!(check_probe(Err(exited)), Err(expected));

        let other = SampleError::tool_failed(TOOL, "exit status: 9: driver mismatch");
        assert_eq!(check_probe(Err(other.clone())), Err(other));
    }
}

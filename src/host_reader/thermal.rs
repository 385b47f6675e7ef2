// CPU temperature: scan sysfs thermal zones and hwmon chips, rank by label.
//
// Ranking policy lives in THERMAL_LABEL_SCORES: the first row whose markers appear in the
// lowercased label wins; unmatched labels score FALLBACK_SCORE.

use crate::rates::round1;
use std::path::Path;

const THERMAL_LABEL_SCORES: &[(&[&str], u32)] = &[
    // CPU package / core / die / SoC sensors
    (
        &["cpu", "x86_pkg_temp", "package", "core", "tctl", "tdie", "soc"],
        20,
    ),
    // generic ACPI thermal zones
    (&["acpitz", "thermal"], 8),
];

const FALLBACK_SCORE: u32 = 1;

const MIN_PLAUSIBLE_C: f64 = -20.0;
const MAX_PLAUSIBLE_C: f64 = 150.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ThermalCandidate {
    pub label: String,
    pub temp_c: f64,
}

pub fn thermal_label_score(label: &str) -> u32 {
    let label = label.to_lowercase();
    THERMAL_LABEL_SCORES
        .iter()
        .find(|(markers, _)| markers.iter().any(|m| label.contains(m)))
        .map(|(_, score)| *score)
        .unwrap_or(FALLBACK_SCORE)
}

/// Parse a sysfs temperature. Millidegree values (> 1000) are scaled to degrees;
/// anything outside the plausible physical range is discarded.
pub fn parse_temp_c(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let temp_c = if value > 1000.0 { value / 1000.0 } else { value };
    (MIN_PLAUSIBLE_C..=MAX_PLAUSIBLE_C)
        .contains(&temp_c)
        .then_some(temp_c)
}

/// Highest label score wins; ties go to the hotter sensor.
pub fn select_cpu_temp(candidates: &[ThermalCandidate]) -> Option<f64> {
    candidates
        .iter()
        .max_by(|a, b| {
            thermal_label_score(&a.label)
                .cmp(&thermal_label_score(&b.label))
                .then(a.temp_c.total_cmp(&b.temp_c))
        })
        .map(|c| round1(c.temp_c))
}

/// All readable, plausible sensors under `<sys_root>/class/{thermal,hwmon}`.
pub(super) fn scan_candidates(sys_root: &Path) -> Vec<ThermalCandidate> {
    let mut out = Vec::new();
    scan_thermal_zones(&sys_root.join("class/thermal"), &mut out);
    scan_hwmon(&sys_root.join("class/hwmon"), &mut out);
    out
}

fn read_trimmed(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

fn scan_thermal_zones(root: &Path, out: &mut Vec<ThermalCandidate>) {
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with("thermal_zone") {
            continue;
        }
        let zone = entry.path();
        let Some(temp_c) = read_trimmed(&zone.join("temp")).and_then(|s| parse_temp_c(&s)) else {
            continue;
        };
        let label = read_trimmed(&zone.join("type")).unwrap_or_default();
        out.push(ThermalCandidate { label, temp_c });
    }
}

fn scan_hwmon(root: &Path, out: &mut Vec<ThermalCandidate>) {
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let dir = entry.path();
        let chip = read_trimmed(&dir.join("name")).unwrap_or_default();
        let Ok(files) = std::fs::read_dir(&dir) else {
            continue;
        };
        for file in files.flatten() {
            let fname = file.file_name().to_string_lossy().into_owned();
            if !(fname.starts_with("temp") && fname.ends_with("_input")) {
                continue;
            }
            let Some(temp_c) = read_trimmed(&file.path()).and_then(|s| parse_temp_c(&s)) else {
                continue;
            };
            let sensor = read_trimmed(&dir.join(fname.replace("_input", "_label")))
                .unwrap_or_default();
            let label = format!("{chip} {sensor}").trim().to_string();
            out.push(ThermalCandidate { label, temp_c });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(label: &str, temp_c: f64) -> ThermalCandidate {
        ThermalCandidate {
            label: label.into(),
            temp_c,
        }
    }

    #[test]
    fn package_sensor_beats_acpi_zone() {
        let c = [candidate("acpitz", 45.0), candidate("x86_pkg_temp", 62.0)];
        assert_eq!(select_cpu_temp(&c), Some(62.0));
        // score wins even when the generic zone is hotter
        let c = [candidate("acpitz", 80.0), candidate("x86_pkg_temp", 62.0)];
        assert_eq!(select_cpu_temp(&c), Some(62.0));
    }

    #[test]
    fn ties_prefer_hotter_sensor() {
        let c = [candidate("Core 0", 50.0), candidate("Core 1", 57.25)];
        assert_eq!(select_cpu_temp(&c), Some(57.3));
        assert_eq!(select_cpu_temp(&[]), None);
    }

    #[test]
    fn scores_follow_table() {
        assert_eq!(thermal_label_score("TCTL"), 20);
        assert_eq!(thermal_label_score("acpitz"), 8);
        assert_eq!(thermal_label_score("iwlwifi_1"), 1);
        assert_eq!(thermal_label_score(""), 1);
    }

    #[test]
    fn parse_scales_millidegrees_and_rejects_implausible() {
        assert_eq!(parse_temp_c("45000\n"), Some(45.0));
        assert_eq!(parse_temp_c("62"), Some(62.0));
        assert_eq!(parse_temp_c("-25"), None);
        assert_eq!(parse_temp_c("200000"), None);
        assert_eq!(parse_temp_c("n/a"), None);
    }
}

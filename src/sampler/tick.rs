// What a tick computes, independent of when it fires.

use crate::models::{
    CompositeSample, CpuTimesSnapshot, HostReadings, NetworkIoSnapshot, NetworkUsageRow,
};
use crate::rates::{cpu_usage_percent, iso_millis, network_deltas};

/// Counter baselines carried from one tick to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickState {
    pub last_cpu: Option<CpuTimesSnapshot>,
    pub last_network: Option<NetworkIoSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: TickState,
    pub sample: CompositeSample,
    pub usage_row: NetworkUsageRow,
}

/// Builds the composite sample and the persisted usage row for one tick.
///
/// Baselines are only replaced by readings that actually arrived, so an unreadable
/// source on one tick does not reset the next tick's delta.
pub fn compute_tick(prev: &TickState, readings: HostReadings, at_ms: i64) -> TickOutcome {
    let cpu_usage = match (prev.last_cpu.as_ref(), readings.cpu_times.as_ref()) {
        (Some(p), Some(c)) => cpu_usage_percent(p, c),
        _ => None,
    };
    let (inbound_delta, outbound_delta) =
        network_deltas(prev.last_network.as_ref(), readings.network.as_ref());

    let state = TickState {
        last_cpu: readings.cpu_times.or(prev.last_cpu),
        last_network: readings.network.or(prev.last_network),
    };

    let memory = readings.memory.as_ref();
    let disk = readings.disk.as_ref();
    let sample = CompositeSample {
        taken_at_ms: at_ms,
        cpu_usage_percent: cpu_usage,
        cpu_temp_c: readings.cpu_temp_c,
        memory_usage_percent: memory.map(|m| m.usage_percent),
        memory_used_bytes: memory.map(|m| m.used_bytes),
        memory_total_bytes: memory.map(|m| m.total_bytes),
        disk_usage_percent: disk.and_then(|d| d.usage_percent),
        disk_used_bytes: disk.map(|d| d.used_bytes),
        disk_total_bytes: disk.map(|d| d.total_bytes),
    };

    let usage_row = NetworkUsageRow {
        at_ms,
        taken_at_iso: iso_millis(at_ms),
        inbound_bytes_total: readings.network.map(|n| n.rx_bytes),
        outbound_bytes_total: readings.network.map(|n| n.tx_bytes),
        inbound_bytes_delta: inbound_delta,
        outbound_bytes_delta: outbound_delta,
    };

    TickOutcome {
        state,
        sample,
        usage_row,
    }
}

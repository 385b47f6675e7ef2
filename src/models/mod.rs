// Domain models

mod network_usage;
mod report;
mod sample;

pub use network_usage::{
    ByteTotals, CurrentRate, DailyUsage, NetworkUsageRow, NetworkUsageSummary, RatePoint,
    UsageDeltaPoint, UsageSnapshot, UsageTotals,
};
pub use report::{
    CpuReport, DiskReport, MemoryReport, MetricsReport, SamplePoint, ThermalReport, WindowStats,
};
pub use sample::{
    CompositeSample, CpuTimesSnapshot, DiskSnapshot, HostIdentity, HostReadings, MemorySnapshot,
    NetworkIoSnapshot,
};

//! Host metrics sample and the provider seam.

/// One reading of host load. Every field is 0 when unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemSample {
    pub cpu_percent: f64,
    pub mem_used_gb: f64,
    pub mem_total_gb: f64,
    pub swap_used_mb: f64,
    pub swap_total_mb: f64,
    pub load_avg_1m: f64,
}

impl SystemSample {
    #[must_use]
    pub fn mem_percent(&self) -> f64 {
        percent(self.mem_used_gb, self.mem_total_gb)
    }

    #[must_use]
    pub fn swap_percent(&self) -> f64 {
        percent(self.swap_used_mb, self.swap_total_mb)
    }
}

fn percent(used: f64, total: f64) -> f64 {
    if total > 0.0 {
        used / total * 100.0
    } else {
        0.0
    }
}

/// Source of host metrics.
///
/// Implementations must not fail: any metric they cannot obtain reads
/// as zero.
pub trait MetricsProvider: Send {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    fn sample(&mut self) -> SystemSample;
}

impl<P: MetricsProvider + ?Sized> MetricsProvider for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn sample(&mut self) -> SystemSample {
        (**self).sample()
    }
}

/// Clamp a reading to a finite, non-negative value.
#[must_use]
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

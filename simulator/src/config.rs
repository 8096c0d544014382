use anyhow::Context;
use std::str::FromStr;
use std::time::Duration;
use wheel_reconciler::{Easing, ReconcilerConfig};

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub reconciler: ReconcilerConfig,
    pub frame_interval: Duration,
    pub api_latency: Duration,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            reconciler: ReconcilerConfig::default(),
            frame_interval: Duration::from_millis(16),
            api_latency: Duration::from_millis(400),
            seed: None,
        }
    }
}

fn env_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", name, raw, e)),
        Err(_) => Ok(None),
    }
}

impl SimConfig {
    /// Defaults overridden by `WHEEL_*` and `SIM_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        let wheel = &mut config.reconciler;

        if let Some(v) = env_var("WHEEL_POINTER_OFFSET_DEG")? {
            wheel.pointer_offset_deg = v;
        }
        if let Some(v) = env_var("WHEEL_FULL_TURNS")? {
            wheel.full_turns = v;
        }
        if let Some(v) = env_var("WHEEL_MIN_DURATION_MS")? {
            wheel.min_duration_ms = v;
        }
        if let Some(v) = env_var("WHEEL_MAX_DURATION_MS")? {
            wheel.max_duration_ms = v;
        }
        if let Some(v) = env_var("WHEEL_REQUEST_TIMEOUT_MS")? {
            wheel.request_timeout_ms = v;
        }
        if let Some(v) = env_var::<Easing>("WHEEL_EASING")? {
            wheel.easing = v;
        }

        if let Some(ms) = env_var::<u64>("SIM_FRAME_MS")? {
            config.frame_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = env_var::<u64>("SIM_API_LATENCY_MS")? {
            config.api_latency = Duration::from_millis(ms);
        }
        config.seed = env_var("SIM_SEED")?;

        config.reconciler = config
            .reconciler
            .validated()
            .context("invalid WHEEL_* configuration")?;
        Ok(config)
    }
}

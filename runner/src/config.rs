use anyhow::Context;
use dotenv::dotenv;
use pairtrade_rs::config::{EngineConfig, HedgeFailurePolicy, RiskConfig, StalenessPolicy};
use std::path::PathBuf;
use std::str::FromStr;

pub struct RunnerConfig {
    pub engine: EngineConfig,
    pub risk: RiskConfig,
    pub ticks_file: PathBuf,
    pub initial_balance: f64,
    pub json_logs: bool,
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T>(key: &str) -> Result<Option<T>, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value: {raw:?}"))
        })
        .transpose()
}

fn hedge_failure(raw: &str) -> Result<HedgeFailurePolicy, anyhow::Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "alert" => Ok(HedgeFailurePolicy::Alert),
        "compensate" => Ok(HedgeFailurePolicy::Compensate),
        other => anyhow::bail!("PAIR_HEDGE_FAILURE must be 'alert' or 'compensate', got {other:?}"),
    }
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenv().ok();

        let leg1 = var("PAIR_LEG1").context("PAIR_LEG1 is not set")?;
        let leg2 = var("PAIR_LEG2").context("PAIR_LEG2 is not set")?;
        let defaults = EngineConfig::new(leg1, leg2);

        let mut engine = defaults
            .clone()
            .with_period(parse("PAIR_PERIOD")?.unwrap_or(defaults.period))
            .with_thresholds(
                parse("PAIR_ENTRY_Z")?.unwrap_or(defaults.entry_threshold),
                parse("PAIR_EXIT_Z")?.unwrap_or(defaults.exit_band),
            )
            .with_beta(parse("PAIR_BETA")?.unwrap_or(defaults.beta))
            .with_base_volume(parse("PAIR_VOLUME")?.unwrap_or(defaults.base_volume));

        if let Some(step) = parse("PAIR_VOLUME_STEP")? {
            engine = engine.with_volume_step(step);
        }
        if let Some(secs) = parse::<i64>("PAIR_MAX_LEG_AGE_SECS")? {
            engine = engine.with_staleness(StalenessPolicy::Expire {
                max_age_ms: secs.saturating_mul(1_000),
            });
        }
        if let Some(raw) = var("PAIR_HEDGE_FAILURE") {
            engine = engine.with_hedge_failure(hedge_failure(&raw)?);
        }

        let risk = match parse("PAIR_STOP_LOSS_PCT")? {
            Some(pct) => RiskConfig::with_stop_loss(pct),
            None => RiskConfig::default(),
        };

        Ok(RunnerConfig {
            engine,
            risk,
            ticks_file: var("PAIR_TICKS_FILE")
                .unwrap_or_else(|| "./ticks.jsonl".to_string())
                .into(),
            initial_balance: parse("PAIR_INITIAL_BALANCE")?.unwrap_or(10_000.0),
            json_logs: var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

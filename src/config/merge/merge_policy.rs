//! Built-in defaults. Every later source (files, environment) overrides these keys.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Builder seeded with the orchestrator and storage defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("orchestrator.parallelism", 2)?
        .set_default("orchestrator.max_runtime_minutes", 180)?
        .set_default("orchestrator.policy_mode", "advisory")?
        .set_default("orchestrator.dry_run", false)?
        .set_default("orchestrator.retry_policy.enabled", true)?
        .set_default("orchestrator.retry_policy.max_retries", 2)?
        .set_default("orchestrator.retry_policy.delay_ms", 0)?
        .set_default("storage.store_path", ".mend/store")
}

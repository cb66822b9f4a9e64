pub mod storage;

pub use storage::AuthStorage;

use anyhow::{Context, Result, bail};
use storage::{Credential, KeySource};

/// Providers that accept a stored API key.
const SUPPORTED_PROVIDERS: &[&str] = &["gemini"];

/// Save an API key for a provider.
///
/// Shared by the `morph login` subcommand and the `/login` REPL command.
pub fn login(db_path: &str, provider: &str, key: &str) -> Result<()> {
    if !SUPPORTED_PROVIDERS.contains(&provider) {
        bail!("unsupported provider: {provider}");
    }
    let key = key.trim();
    if key.is_empty() {
        bail!("no API key provided");
    }
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .set(provider, &Credential::api_key(key))
        .context("failed to save credentials")?;
    Ok(())
}

/// Remove the stored API key for a provider.
///
/// Environment variables are untouched, so the provider may still be usable.
pub fn logout(db_path: &str, provider: &str) -> Result<()> {
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .remove(provider)
        .context("failed to remove credentials")?;
    Ok(())
}

/// One-line auth summary for the banner and `/status`.
pub fn auth_status(
    storage: &AuthStorage,
    provider: &str,
    env_vars: &[&'static str],
) -> Result<String> {
    Ok(match storage.resolve_api_key(provider, env_vars)? {
        Some((_, KeySource::Stored)) => "API key ✓".to_string(),
        Some((_, KeySource::Env(var))) => format!("API key (env {var}) ✓"),
        None => "not authenticated".to_string(),
    })
}

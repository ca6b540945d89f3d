//! Shared wiring for command handlers: brand lookup, store and engine setup.

use std::sync::Arc;

use cadence_channels::DispatchTable;
use cadence_core::{AppConfig, BrandProfile, BrandsFile, Store};
use cadence_orchestrator::{EngineSettings, Orchestrator};

/// Load and validate `brands.yaml` from the configured path.
pub(crate) fn load_brands(config: &AppConfig) -> anyhow::Result<BrandsFile> {
    cadence_core::load_brands(&config.brands_path).map_err(|e| {
        anyhow::anyhow!(
            "failed to load brands from {}: {e}",
            config.brands_path.display()
        )
    })
}

/// Pick the brand profile a command applies to.
///
/// An explicit name must exist in `brands.yaml`. Without one, the brand
/// flagged `schedule: true` is used, or the only brand when there is just one.
pub(crate) fn resolve_brand<'a>(
    brands: &'a BrandsFile,
    name: Option<&str>,
) -> anyhow::Result<&'a BrandProfile> {
    if let Some(name) = name {
        return brands
            .find(name)
            .ok_or_else(|| anyhow::anyhow!("brand '{name}' not found in brands.yaml"));
    }
    if let Some(scheduled) = brands.scheduled() {
        return Ok(scheduled);
    }
    match brands.brands.as_slice() {
        [only] => Ok(only),
        [] => anyhow::bail!("brands.yaml lists no brands"),
        _ => anyhow::bail!("several brands configured and none is scheduled; pass --brand"),
    }
}

/// Brand name for commands that only need the stored plan.
///
/// An explicit name is used as given when it is not in `brands.yaml`, so
/// plans saved for retired profiles stay reachable.
pub(crate) fn resolve_brand_name(
    config: &AppConfig,
    name: Option<&str>,
) -> anyhow::Result<String> {
    if let Some(name) = name {
        if let Ok(brands) = load_brands(config) {
            if let Some(profile) = brands.find(name) {
                return Ok(profile.name.clone());
            }
        }
        return Ok(name.to_string());
    }
    let brands = load_brands(config)?;
    Ok(resolve_brand(&brands, None)?.name.clone())
}

pub(crate) async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    let opened = cadence_db::open_store(config).await?;
    Ok(opened.store)
}

/// Build an engine over `store` with channels, signal feed and settings
/// taken from `config`.
pub(crate) fn build_orchestrator(
    config: &AppConfig,
    store: Arc<dyn Store>,
) -> anyhow::Result<Orchestrator> {
    let channels = DispatchTable::from_config(config)?;
    let feed = cadence_core::load_signal_feed(config.signals_path.as_deref())?;
    tracing::debug!(platforms = ?channels.platforms(), "channels registered");
    Ok(Orchestrator::new(
        store,
        channels,
        feed,
        EngineSettings::from_app_config(config),
    ))
}

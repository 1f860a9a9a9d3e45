//! Run options from defaults, an optional TOML file and `COSTKIT_` env vars.

use std::path::Path;

use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use costkit_monthly::SpecRunOptions;

pub const C_ENV_PREFIX: &str = "COSTKIT_";

/// Layer defaults < TOML file < environment.
pub fn load_run_options(path_config: Option<&Path>) -> Result<SpecRunOptions> {
    let mut figment = Figment::from(Serialized::defaults(SpecRunOptions::default()));
    if let Some(path) = path_config {
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::prefixed(C_ENV_PREFIX))
        .extract()
        .context("failed to load run options")
}

#[cfg(test)]
mod tests {
    use super::*;
    use costkit_monthly::{EnumOwnerUniverse, EnumWorkbookLayout};

    #[test]
    fn toml_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costkit.toml");
        std::fs::write(
            &path,
            "period = \"Mar-24\"\nlayout = \"per-owner\"\nowner_universe = \"storage-and-unknown\"\nsummary = true\n",
        )
        .unwrap();

        let options = load_run_options(Some(&path)).unwrap();
        assert_eq!(options.period.as_deref(), Some("Mar-24"));
        assert_eq!(options.layout, EnumWorkbookLayout::PerOwner);
        assert_eq!(options.owner_universe, EnumOwnerUniverse::StorageAndUnknown);
        assert!(options.summary);
        assert_eq!(options.sku_event, "Dummy Cards & Boxes");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_run_options(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}

//! Entry points for building a [`MendConfig`] from its layered sources.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::MendConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then workspace files, then `MEND__*` env vars.
    pub fn load(workspace_root: &Path) -> Result<MendConfig, ConfigError> {
        Self::load_layers(workspace_root, global_file::global_config_path())
    }

    /// Defaults overlaid with a single explicit file.
    pub fn load_from_file(path: &Path) -> Result<MendConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    pub(crate) fn load_layers(
        workspace_root: &Path,
        global_path: Option<PathBuf>,
    ) -> Result<MendConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global_path.as_deref())?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config: MendConfig = builder
            .add_source(
                Environment::with_prefix("MEND")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "configuration loaded");
        Ok(config)
    }
}

use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Filter label applied when none is configured.
pub const DEFAULT_LABEL: &str = "autoupdate.enable=true";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Label selecting containers, `key=value` or bare `key`.
    pub label: String,
    /// CLI binary used for `pull` and `compose`.
    pub docker_bin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.into(),
            docker_bin: "docker".into(),
            docker_host: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Loads defaults, then `autoupdate.toml`, `autoupdate.json`, `extra`
    /// and finally `AUTOUPDATE_*` environment variables.
    pub fn load(extra: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_from(Path::new("."), extra)
    }

    /// Like [`Config::load`], reading the default files from `dir`.
    pub fn load_from(dir: &Path, extra: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_layers(dir, extra, Env::prefixed("AUTOUPDATE_"))
    }

    fn load_layers(dir: &Path, extra: Option<&Path>, env: Env) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(dir.join("autoupdate.toml")))
            .merge(Json::file(dir.join("autoupdate.json")));
        if let Some(path) = extra {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            .merge(env)
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        if config.label.trim().is_empty() {
            anyhow::bail!("Invalid label: must not be empty");
        }
        Ok(config)
    }
}

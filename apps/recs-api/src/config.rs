//! Configuration for Recommendations API

use core_config::{app_info, server::ServerConfig, AppInfo, FromEnv};
use domain_recommendations::{ClipConfig, QdrantConfig};

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub qdrant: QdrantConfig,
    pub clip: ClipConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub probe_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let qdrant = QdrantConfig::from_env().map_err(|e| eyre::eyre!("{}", e))?;
        let clip = ClipConfig::from_env().map_err(|e| eyre::eyre!("{}", e))?;
        let server = ServerConfig::from_env()?;

        let probe_seed = match std::env::var("PROBE_SEED") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|e| eyre::eyre!("invalid PROBE_SEED value '{}': {}", raw, e))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            app: app_info!(),
            qdrant,
            clip,
            server,
            environment,
            probe_seed,
        })
    }
}

use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use database::mongodb::MongoConfig;
use domain_recommendations::{EmbeddingConfig, VectorSearchConfig};

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub embedding: EmbeddingConfig,
    pub vector_search: VectorSearchConfig,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let app = app_info!();
        let mongodb = MongoConfig::from_env()?.with_app_name(app.name);
        let embedding = EmbeddingConfig::from_env()?;
        let vector_search = VectorSearchConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        Ok(Self {
            app,
            mongodb,
            embedding,
            vector_search,
            server,
            environment,
        })
    }
}

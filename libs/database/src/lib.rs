//! Database connectors and connection utilities.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "Atma-Contents");
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let collection = client
//!     .database(config.database())
//!     .collection::<mongodb::bson::Document>("meditations");
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

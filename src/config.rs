use crate::engine::loader::{Manifest, ManifestEntry};
use crate::engine::stage::Size;
use crate::error::EngineError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH: &str = "config.json";

/// Texture names the views and game objects look up.
pub mod textures {
    pub const STARS: &str = "stars";
    pub const SHIP: &str = "ship";
    pub const BULLET: &str = "bullet";
    pub const ASTEROID: &str = "asteroid";
}

/// Start-up settings. Every field has a default, so a partial
/// `config.json` (or none at all) is fine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// logical canvas resolution the views draw in
    pub width: f64,
    pub height: f64,
    pub load_timeout_ms: u32,
    pub log_level: String,
    pub textures: Vec<ManifestEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            width: 800.0,
            height: 600.0,
            load_timeout_ms: 10_000,
            log_level: "info".to_string(),
            textures: default_textures(),
        }
    }
}

fn default_textures() -> Vec<ManifestEntry> {
    vec![
        ManifestEntry::new(textures::STARS, "Textures/stars.png"),
        ManifestEntry::new(textures::SHIP, "Textures/Ships/ship3_0.png"),
        ManifestEntry::new(textures::BULLET, "Textures/Bullets/bullet1_0.png"),
        ManifestEntry::new(textures::ASTEROID, "Textures/Asteroids/asteroid1_0.png"),
    ]
}

impl AppConfig {
    /// Fetches `path`, falling back to the defaults when it is missing or
    /// malformed.
    pub async fn fetch(path: &str) -> Self {
        match crate::browser::fetch_json::<AppConfig>(path).await {
            Ok(config) => config,
            Err(err) => {
                log::warn!("using default configuration, {} unavailable: {:#}", path, err);
                AppConfig::default()
            }
        }
    }

    pub fn logical_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn manifest(&self) -> Result<Manifest, EngineError> {
        Manifest::new(self.textures.clone())
    }

    /// Unknown level names fall back to `info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            log::warn!("unknown log level '{}', using info", self.log_level);
            LevelFilter::Info
        })
    }
}

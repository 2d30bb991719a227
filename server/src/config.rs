use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::PathBuf;

use crate::encoders::WorldRaster;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Where rasterization uploads are written before decoding.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_world_size")]
    pub world_width: f64,
    #[serde(default = "default_world_size")]
    pub world_height: f64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("tmp")
}

// Single zoom level 0 web map tile
fn default_world_size() -> f64 {
    256.0
}

fn default_max_upload_bytes() -> u64 {
    u64::MAX
}

fn default_pool_size() -> u32 {
    10
}

impl Config {
    pub fn world_raster(&self) -> WorldRaster {
        WorldRaster {
            width: self.world_width,
            height: self.world_height,
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    envy::prefixed("FLIGHTTRACK_")
        .from_env::<Config>()
        .expect("Invalid config. Optional env vars: FLIGHTTRACK_UPLOAD_DIR, FLIGHTTRACK_WORLD_WIDTH, FLIGHTTRACK_WORLD_HEIGHT, FLIGHTTRACK_MAX_UPLOAD_BYTES, FLIGHTTRACK_POOL_SIZE")
});

pub fn config() -> &'static Config {
    &CONFIG
}

//! Server configuration
//!
//! Defaults reproduce the reference behaviour: port 8080 on all interfaces,
//! 1024x1024 frames at 60 fps, a five-frame pool. A YAML file can override
//! any subset of fields.
//!
//! ```rust
//! use framepace::ServerConfig;
//!
//! let config = ServerConfig::from_yaml_str("default_fps: 30\npool_size: 3\n").unwrap();
//! assert_eq!(config.default_rate.fps(), 30.0);
//! assert_eq!(config.bind_addr.port(), 8080);
//! ```

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use crate::pool::{DEFAULT_POOL_SIZE, FrameRenderer};
use crate::raster::{BmpEncoder, NoiseGenerator};
use crate::types::{FrameRate, Geometry};
use crate::{Result, StreamError};

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Largest accepted frame side, in pixels
///
/// A 4096x4096 pool of five frames holds about 80 MiB of BMP data, and the
/// previous pool stays alive while a replacement renders.
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listening address
    pub bind_addr: SocketAddr,

    /// Geometry every new connection starts with
    pub default_geometry: Geometry,

    /// Target rate every new connection starts with
    #[serde(rename = "default_fps")]
    pub default_rate: FrameRate,

    /// Distinct frames per pool
    pub pool_size: usize,

    /// Upper bound on either side of a requested geometry
    pub max_dimension: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            default_geometry: Geometry::default(),
            default_rate: FrameRate::default(),
            pool_size: DEFAULT_POOL_SIZE,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl ServerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ServerConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| StreamError::config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            StreamError::ConfigFile { path: path.to_path_buf(), source }
        };

        let yaml = std::fs::read_to_string(path).map_err(|e| file_error(Box::new(e)))?;
        let config: ServerConfig =
            serde_yaml_ng::from_str(&yaml).map_err(|e| file_error(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants a running server relies on
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(StreamError::config("pool_size must be at least 1"));
        }
        if self.max_dimension == 0 {
            return Err(StreamError::config("max_dimension must be at least 1"));
        }
        if !self.default_geometry.fits_within(self.max_dimension) {
            return Err(StreamError::config(format!(
                "default geometry {} must fit within 1..={} per side",
                self.default_geometry, self.max_dimension
            )));
        }
        Ok(())
    }

    /// Renderer producing noise frames in BMP containers
    pub fn renderer(&self) -> FrameRenderer {
        FrameRenderer::new(Arc::new(NoiseGenerator), Arc::new(BmpEncoder), self.pool_size)
    }
}

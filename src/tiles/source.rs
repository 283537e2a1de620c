use crate::core::geo::TileCoord;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;

/// Shared async HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request. Building the
/// client once avoids the cost of TLS and connection pool setup per tile.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("estatemap/0.1")
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("failed to build reqwest async client")
});

/// Why a single tile could not be produced.
///
/// Tile failures are always recovered locally: the compositor paints the
/// affected cell with the fallback fill and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for tile {coord:?}")]
    Status {
        coord: TileCoord,
        status: reqwest::StatusCode,
    },

    #[error("tile {0:?} timed out")]
    Timeout(TileCoord),

    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),
}

/// Anything that can produce raw tile image bytes for a grid coordinate.
///
/// The coordinate handed to `fetch` always has `x` already wrapped into
/// `[0, 2^z)` and `y` in range. Fetches must be idempotent and safe to
/// retry; no latency bound is guaranteed.
#[async_trait]
pub trait TileSource: Send + Sync {
    async fn fetch(&self, coord: TileCoord) -> Result<Vec<u8>, TileError>;
}

/// Tile source backed by the public OpenStreetMap raster servers.
pub struct OpenStreetMapSource {
    subdomains: Vec<&'static str>,
}

impl OpenStreetMapSource {
    pub fn new() -> Self {
        Self {
            subdomains: vec!["a", "b", "c"],
        }
    }

    fn url(&self, coord: TileCoord) -> String {
        if self.subdomains.is_empty() {
            return format!(
                "https://tile.openstreetmap.org/{}/{}/{}.png",
                coord.z, coord.x, coord.y
            );
        }

        let idx = ((coord.x + coord.y).rem_euclid(self.subdomains.len() as i64)) as usize;
        format!(
            "https://{}.tile.openstreetmap.org/{}/{}/{}.png",
            self.subdomains[idx], coord.z, coord.x, coord.y
        )
    }
}

impl Default for OpenStreetMapSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TileSource for OpenStreetMapSource {
    async fn fetch(&self, coord: TileCoord) -> Result<Vec<u8>, TileError> {
        let url = self.url(coord);
        log::debug!("fetching tile {:?} from {}", coord, url);

        let response = HTTP_CLIENT.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(TileError::Status {
                coord,
                status: response.status(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

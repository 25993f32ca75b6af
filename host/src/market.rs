use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use battle_core::{Asset, PriceSample};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Market data files larger than this are refused
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;
const FALLBACK_BASE_PRICE: f64 = 50_000.0;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("no market data for '{0}'")]
    NotFound(String),

    #[error("empty price history for '{0}'")]
    Empty(String),

    #[error("market data file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed market data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Current price for display; the simulation never reads it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotQuote {
    pub price: f64,
    pub change_24h: f64,
}

/// Source of competitor lists, price histories and spot quotes.
pub trait MarketData {
    fn list_assets(&self) -> Result<Vec<Asset>, FetchError>;

    /// Chronological history covering the last `days` days.
    fn historical_series(&self, asset_id: &str, days: u32) -> Result<Vec<PriceSample>, FetchError>;

    fn spot_price(&self, asset_id: &str) -> Result<SpotQuote, FetchError>;
}

/// Competitors offered when the asset list cannot be loaded.
pub fn fallback_assets() -> Vec<Asset> {
    vec![
        Asset::new("bitcoin", "BTC", "Bitcoin"),
        Asset::new("ethereum", "ETH", "Ethereum"),
    ]
}

/// BTC against ETH, when both are listed.
pub fn default_pair(assets: &[Asset]) -> Option<(Asset, Asset)> {
    let find = |sym: &str| assets.iter().find(|a| a.symbol == sym).cloned();
    Some((find("BTC")?, find("ETH")?))
}

/// Hourly points ending at `now_ms`, jittered ±5% around a fixed base price.
/// Never empty.
pub fn synthetic_series<R: Rng + ?Sized>(days: u32, now_ms: i64, rng: &mut R) -> Vec<PriceSample> {
    let points = (days.max(1) * 24) as i64;
    (0..points)
        .map(|i| {
            let jitter = (rng.gen::<f64>() - 0.5) * 0.1;
            PriceSample::new(now_ms - (points - i) * HOUR_MS, FALLBACK_BASE_PRICE * (1.0 + jitter))
        })
        .collect()
}

/// Keep the trailing `days` window, in chronological order.
fn trailing_window(mut samples: Vec<PriceSample>, days: u32) -> Vec<PriceSample> {
    samples.sort_by_key(|s| s.timestamp_ms);
    if let Some(last) = samples.last().map(|s| s.timestamp_ms) {
        let cutoff = last - days.max(1) as i64 * DAY_MS;
        samples.retain(|s| s.timestamp_ms >= cutoff);
    }
    samples
}

#[derive(Deserialize)]
struct MarketChart {
    prices: Vec<PriceSample>,
}

#[derive(Deserialize)]
struct RawQuote {
    usd: f64,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

/// Market data read from a directory of JSON files:
///
/// - `assets.json`: `[{"id", "symbol", "name", ...}]`
/// - `<asset id>.json`: `{"prices": [[timestamp_ms, price], ...]}`
/// - `quotes.json`: `{"<asset id>": {"usd": .., "usd_24h_change": ..}}`
pub struct FileMarket {
    dir: PathBuf,
}

impl FileMarket {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, name: &str) -> Result<String, FetchError> {
        // asset ids become file names; refuse anything that could leave the directory
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(FetchError::NotFound(name.to_string()));
        }
        let path = self.dir.join(name);
        read_limited(&path, name)
    }
}

fn read_limited(path: &Path, name: &str) -> Result<String, FetchError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FetchError::NotFound(name.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    if metadata.len() > MAX_FILE_SIZE {
        return Err(FetchError::TooLarge { size: metadata.len(), max: MAX_FILE_SIZE });
    }
    Ok(fs::read_to_string(path)?)
}

impl MarketData for FileMarket {
    fn list_assets(&self) -> Result<Vec<Asset>, FetchError> {
        let raw = self.read("assets.json")?;
        let assets: Vec<Asset> = serde_json::from_str(&raw)?;
        Ok(assets
            .into_iter()
            .map(|a| Asset::new(&a.id, &a.symbol, &a.name))
            .collect())
    }

    fn historical_series(&self, asset_id: &str, days: u32) -> Result<Vec<PriceSample>, FetchError> {
        let raw = self.read(&format!("{}.json", asset_id))?;
        let chart: MarketChart = serde_json::from_str(&raw)?;
        if chart.prices.is_empty() {
            return Err(FetchError::Empty(asset_id.to_string()));
        }
        Ok(trailing_window(chart.prices, days))
    }

    fn spot_price(&self, asset_id: &str) -> Result<SpotQuote, FetchError> {
        let raw = self.read("quotes.json")?;
        let quotes: HashMap<String, RawQuote> = serde_json::from_str(&raw)?;
        let q = quotes
            .get(asset_id)
            .ok_or_else(|| FetchError::NotFound(asset_id.to_string()))?;
        Ok(SpotQuote { price: q.usd, change_24h: q.usd_24h_change.unwrap_or(0.0) })
    }
}

/// In-memory market, for request payloads and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticMarket {
    assets: Vec<Asset>,
    series: HashMap<String, Vec<PriceSample>>,
    quotes: HashMap<String, SpotQuote>,
}

impl StaticMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, asset: Asset, samples: Vec<PriceSample>) -> Self {
        if !self.assets.iter().any(|a| a.id == asset.id) {
            self.assets.push(asset.clone());
        }
        self.series.insert(asset.id, samples);
        self
    }

    pub fn with_quote(mut self, asset_id: &str, quote: SpotQuote) -> Self {
        self.quotes.insert(asset_id.to_string(), quote);
        self
    }
}

impl MarketData for StaticMarket {
    fn list_assets(&self) -> Result<Vec<Asset>, FetchError> {
        if self.assets.is_empty() {
            return Err(FetchError::NotFound("asset list".into()));
        }
        Ok(self.assets.clone())
    }

    /// Returns the stored series as-is; `days` is not applied.
    fn historical_series(&self, asset_id: &str, _days: u32) -> Result<Vec<PriceSample>, FetchError> {
        let samples = self
            .series
            .get(asset_id)
            .ok_or_else(|| FetchError::NotFound(asset_id.to_string()))?;
        if samples.is_empty() {
            return Err(FetchError::Empty(asset_id.to_string()));
        }
        Ok(samples.clone())
    }

    fn spot_price(&self, asset_id: &str) -> Result<SpotQuote, FetchError> {
        self.quotes
            .get(asset_id)
            .copied()
            .ok_or_else(|| FetchError::NotFound(asset_id.to_string()))
    }
}

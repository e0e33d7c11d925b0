//! Persisted sensor series and their chart projections

use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use crate::types::{ChartPoint, SeriesIndex};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Ambient temperature sensor key
pub const SENSOR_AMBIENT_TEMPERATURE: &str = "Temperatura ambiente";
/// Internal humidity sensor key
pub const SENSOR_INTERNAL_HUMIDITY: &str = "Humedad interna";
/// Accumulated error sensor key
pub const SENSOR_ACCUMULATED_ERROR: &str = "Error acumulado";
/// Battery current sensor key
pub const SENSOR_BATTERY_CURRENT: &str = "Corriente de Bateria";

/// Sensors shown on the dashboard, in display order
pub const DASHBOARD_SENSORS: [&str; 4] = [
    SENSOR_AMBIENT_TEMPERATURE,
    SENSOR_INTERNAL_HUMIDITY,
    SENSOR_ACCUMULATED_ERROR,
    SENSOR_BATTERY_CURRENT,
];

static TIME_LABEL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"T(\d{2})-(\d{2})").ok());

/// `HH:MM` from a `...THH-MM...` timestamp token, or the token itself
pub fn time_label(token: &str) -> String {
    TIME_LABEL
        .as_ref()
        .and_then(|re| re.captures(token))
        .map(|caps| format!("{}:{}", &caps[1], &caps[2]))
        .unwrap_or_else(|| token.to_string())
}

/// Tail window of a sensor's non-null readings, labelled for charts.
///
/// Returns at most `max_points` points, oldest first. Unknown sensors yield an
/// empty projection.
pub fn project(index: &SeriesIndex, sensor: &str, max_points: usize) -> Vec<ChartPoint> {
    let Some(points) = index.get(sensor) else {
        return Vec::new();
    };
    let readings: Vec<_> = points
        .iter()
        .filter_map(|p| p.v.map(|value| (value, p.t.as_str())))
        .collect();
    let skip = readings.len().saturating_sub(max_points);

    readings[skip..]
        .iter()
        .map(|(value, t)| ChartPoint {
            value: *value,
            label: time_label(t),
        })
        .collect()
}

/// Stores the series index as a single JSON artifact
#[derive(Clone)]
pub struct SeriesStore {
    storage: Arc<dyn StorageBackend>,
    name: String,
}

impl SeriesStore {
    /// Store the index as `name` (usually `events.json`) in `storage`
    pub fn new(storage: Arc<dyn StorageBackend>, name: impl Into<String>) -> Self {
        Self {
            storage,
            name: name.into(),
        }
    }

    /// Artifact name of the persisted index
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a persisted index exists
    pub async fn exists(&self) -> bool {
        self.storage.exists(&self.name).await
    }

    /// Replace the persisted index with `index` (pretty-printed JSON)
    pub async fn persist(&self, index: &SeriesIndex) -> Result<()> {
        let json = serde_json::to_vec_pretty(index)?;
        self.storage.ensure().await?;
        self.storage
            .write(&self.name, &json, "application/json")
            .await?;
        tracing::debug!(
            name = %self.name,
            sensors = index.len(),
            points = index.point_count(),
            "persisted series index"
        );
        Ok(())
    }

    /// Load the persisted index.
    ///
    /// `Ok(None)` when nothing has been persisted yet. Unparsable content is
    /// an [`Error::Serialization`], never treated as absent.
    pub async fn load(&self) -> Result<Option<SeriesIndex>> {
        if !self.storage.exists(&self.name).await {
            return Ok(None);
        }
        let bytes = self.storage.read(&self.name).await?;
        let index = serde_json::from_slice(&bytes)?;
        Ok(Some(index))
    }

    /// Like [`load`](Self::load), with absence reported as [`Error::NotFound`]
    pub async fn require(&self) -> Result<SeriesIndex> {
        self.load()
            .await?
            .ok_or_else(|| Error::NotFound(self.name.clone()))
    }

    /// Projection of every dashboard sensor present in `index`
    pub fn dashboard(index: &SeriesIndex, window: usize) -> Vec<(&'static str, Vec<ChartPoint>)> {
        DASHBOARD_SENSORS
            .iter()
            .filter(|sensor| index.get(sensor).is_some())
            .map(|sensor| (*sensor, project(index, sensor, window)))
            .collect()
    }
}

//! Telemetry log acquisition and series refresh.

use crate::error::{Error, Result};
use crate::series::{SeriesStore, project};
use crate::telemetry::transform;
use crate::transfer::{Destination, ProgressSink};
use crate::types::{ChartPoint, Event, SeriesIndex};

use super::FieldMonitor;

impl FieldMonitor {
    /// Load the series index, acquiring and transforming the log if needed.
    ///
    /// When the series document is absent, or `force` is set, the station's
    /// telemetry log is downloaded with progress tracking, stored as the raw
    /// log artifact, transformed and persisted before being loaded again.
    ///
    /// A corrupt series document is reported as
    /// [`Error::Serialization`](crate::Error::Serialization) unless `force`
    /// replaces it.
    pub async fn load_series(&self, force: bool) -> Result<SeriesIndex> {
        let store = self.series_store();
        if !force && let Some(index) = store.load().await? {
            return Ok(index);
        }
        self.refresh_series(&store).await
    }

    /// Chart projection of one sensor from the persisted index
    ///
    /// Uses the configured chart window. Does not trigger an acquisition.
    pub async fn chart(&self, sensor: &str) -> Result<Vec<ChartPoint>> {
        let index = self.series_store().require().await?;
        Ok(project(&index, sensor, self.config.telemetry.chart_window))
    }

    /// Chart projections of every dashboard sensor present in the persisted index
    pub async fn dashboard(&self) -> Result<Vec<(&'static str, Vec<ChartPoint>)>> {
        let index = self.series_store().require().await?;
        Ok(SeriesStore::dashboard(
            &index,
            self.config.telemetry.chart_window,
        ))
    }

    async fn refresh_series(&self, store: &SeriesStore) -> Result<SeriesIndex> {
        self.config.require_download_url()?;
        let telemetry = &self.config.telemetry;
        let url = self.remote.download_url(&telemetry.log_file)?;

        self.storage.ensure().await?;
        let sink: &dyn ProgressSink = &self.event_tx;
        let transferred = self
            .tracker
            .transfer(
                url,
                Destination::Storage {
                    backend: self.storage.as_ref(),
                    name: &telemetry.raw_log_name,
                    mime_type: "text/plain",
                },
                Some(sink),
            )
            .await;

        let transferred = match transferred {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(file = %telemetry.log_file, error = %e, "telemetry log transfer failed");
                self.emit(Event::TransferFailed {
                    name: telemetry.raw_log_name.clone(),
                    error: e.to_string(),
                });
                return Err(Error::from(e));
            }
        };
        self.emit(Event::TransferComplete {
            name: telemetry.raw_log_name.clone(),
            bytes: transferred.bytes,
        });
        // Runs detached; a newer transfer cancels the clear
        let _clear = self.tracker.schedule_clear(self.config.progress.clear_after);

        let raw = self.storage.read(&telemetry.raw_log_name).await?;
        let index = transform(&String::from_utf8_lossy(&raw));
        store.persist(&index).await?;

        let loaded = store.require().await?;
        tracing::info!(
            sensors = loaded.len(),
            points = loaded.point_count(),
            "series refreshed from telemetry log"
        );
        self.emit(Event::SeriesUpdated {
            sensors: loaded.len(),
            points: loaded.point_count(),
        });
        Ok(loaded)
    }
}

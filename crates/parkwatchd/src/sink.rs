//! Alert output for the daemon

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkwatch_api::{AlertBatch, Event, EventPayload, OvertimeRecord};
use parkwatch_config::AlertFormat;
use parkwatch_host_api::{AlertSink, HostError, HostResult};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Build the sink selected in config
pub fn make_sink(format: AlertFormat) -> Arc<dyn AlertSink> {
    match format {
        AlertFormat::Log => Arc::new(LogAlertSink),
        AlertFormat::Json => Arc::new(JsonAlertSink::new(std::io::stdout())),
    }
}

/// Emits one log line per overtime record
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&self, batch: AlertBatch) -> HostResult<()> {
        for record in &batch.records {
            warn!(
                target: "parkwatch::alert",
                slot_id = %record.slot_id,
                checked_at = %batch.checked_at,
                "{}",
                record.summary()
            );
        }
        Ok(())
    }

    async fn publish_current(
        &self,
        computed_at: DateTime<Utc>,
        records: &[OvertimeRecord],
    ) -> HostResult<()> {
        info!(
            computed_at = %computed_at,
            overtime = records.len(),
            "Current overtime set"
        );
        Ok(())
    }
}

/// Writes each event as one JSON line
pub struct JsonAlertSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonAlertSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, payload: EventPayload) -> HostResult<()> {
        let line = serde_json::to_string(&Event::new(payload))
            .map_err(|e| HostError::Internal(e.to_string()))?;

        let mut out = self
            .out
            .lock()
            .map_err(|_| HostError::Internal("alert writer poisoned".into()))?;
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> AlertSink for JsonAlertSink<W> {
    async fn notify(&self, batch: AlertBatch) -> HostResult<()> {
        self.emit(EventPayload::OvertimeAlert(batch))
    }

    async fn publish_current(
        &self,
        computed_at: DateTime<Utc>,
        records: &[OvertimeRecord],
    ) -> HostResult<()> {
        self.emit(EventPayload::OvertimeSet {
            computed_at,
            records: records.to_vec(),
        })
    }
}

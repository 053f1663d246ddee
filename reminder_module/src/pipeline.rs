//! The chore reminder batch pipeline.
//!
//! One run resolves "today" (and a Lunch/Dinner shift), filters the roster
//! down to the rows that apply, and walks them in order: normalize the
//! phone, skip anything already delivered for the same (phone, day, shift),
//! compose the reminder, then either preview it or send and log it.
//!
//! Runs are single-threaded and synchronous. The delivery log is read once
//! at the start and appended per successful send; two runs executing
//! concurrently against the same log can race the read-then-append dedup
//! check. Invocations are expected to be serialized by the caller.

use std::fmt;
use std::path::Path;

use chrono::{Local, Timelike};
use compose_module::MessageComposer;
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::delivery_log::{already_sent, DeliveryLog, DeliveryLogError, DeliveryRecord};
use crate::gateway::MessagingGateway;
use crate::phone;
use crate::roster::{Roster, RosterError, RosterRow, COL_NAME, COL_PHONE, COL_WORK};

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sub-day grouping that lets the pipeline run twice a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Lunch,
    Dinner,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Lunch => "Lunch",
            Shift::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Afternoon runs (from 16:00 local) are dinner runs.
pub(crate) fn auto_shift(hour: u32) -> Shift {
    if hour < 16 {
        Shift::Lunch
    } else {
        Shift::Dinner
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    PreviewOnly,
    SkippedAlreadySent,
    Failed(String),
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Sent => f.write_str("Sent"),
            DeliveryStatus::PreviewOnly => f.write_str("PreviewOnly"),
            DeliveryStatus::SkippedAlreadySent => f.write_str("SkippedAlreadySent"),
            DeliveryStatus::Failed(reason) => write!(f, "Failed:{}", reason),
        }
    }
}

impl Serialize for DeliveryStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One processed roster row. Not persisted; returned to the caller and
/// serialized as the service response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultRecord {
    pub day: String,
    pub shift: String,
    pub name: String,
    pub phone: String,
    pub work: String,
    pub message: String,
    pub status: DeliveryStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("roster must contain a column for {column} (found columns: {found:?})")]
    MissingColumn {
        column: &'static str,
        found: Vec<&'static str>,
    },
    #[error("delivery log error: {0}")]
    Log(#[from] DeliveryLogError),
}

pub struct ChorePipeline<G> {
    composer: MessageComposer,
    gateway: G,
    log: DeliveryLog,
}

impl<G: MessagingGateway> ChorePipeline<G> {
    pub fn new(composer: MessageComposer, gateway: G, log: DeliveryLog) -> Self {
        Self {
            composer,
            gateway,
            log,
        }
    }

    pub fn run_path(
        &self,
        roster_path: &Path,
        dry_run: bool,
        prefer_shift: Option<Shift>,
    ) -> Result<Vec<ResultRecord>, PipelineError> {
        let roster = Roster::from_path(roster_path)?;
        self.run(&roster, dry_run, prefer_shift)
    }

    /// Process every roster row that applies to today, in roster order.
    pub fn run(
        &self,
        roster: &Roster,
        dry_run: bool,
        prefer_shift: Option<Shift>,
    ) -> Result<Vec<ResultRecord>, PipelineError> {
        let now = Local::now();
        let today = now.format("%A").to_string();
        let shift = prefer_shift.unwrap_or_else(|| auto_shift(now.hour()));
        info!("processing chores for {} ({} shift)", today, shift);

        let today_lower = today.to_lowercase();
        let shift_lower = shift.as_str().to_lowercase();
        let has_shift_column = roster.has_shift_column();

        let matching: Vec<&RosterRow> = roster
            .rows()
            .iter()
            .filter(|row| {
                if row.day.to_lowercase() != today_lower {
                    return false;
                }
                if has_shift_column {
                    return row.shift.as_deref().unwrap_or("").to_lowercase() == shift_lower;
                }
                true
            })
            .collect();

        if matching.is_empty() {
            info!("no chores for {} ({})", today, shift);
            return Ok(Vec::new());
        }

        for column in [COL_NAME, COL_PHONE, COL_WORK] {
            if !roster.has_column(column) {
                return Err(PipelineError::MissingColumn {
                    column,
                    found: roster.columns().to_vec(),
                });
            }
        }

        // one snapshot per run; not re-read between rows
        let sent_log = self.log.load()?;

        let mut results = Vec::with_capacity(matching.len());
        for row in matching {
            let name = row.name.trim().to_string();
            let work = row.work.trim().to_string();
            let dialable = phone::normalize(&row.phone);
            let effective_shift = match &row.shift {
                Some(value) => value.clone(),
                None => shift.as_str().to_string(),
            };

            if already_sent(&sent_log, &dialable, &today, &effective_shift) {
                results.push(ResultRecord {
                    day: today.clone(),
                    shift: effective_shift,
                    name,
                    phone: dialable,
                    work,
                    message: String::new(),
                    status: DeliveryStatus::SkippedAlreadySent,
                });
                continue;
            }

            let shift_for_message = if effective_shift.is_empty() {
                None
            } else {
                Some(effective_shift.as_str())
            };
            let message = self.composer.compose(&name, &work, shift_for_message);
            info!("composed reminder for {} ({})", name, dialable);

            let status = if dry_run {
                DeliveryStatus::PreviewOnly
            } else {
                match self.gateway.send(&dialable, &message) {
                    Ok(result) if result.success => {
                        self.log.append(&DeliveryRecord {
                            day: today.clone(),
                            shift: effective_shift.clone(),
                            name: name.clone(),
                            phone: dialable.clone(),
                            work: work.clone(),
                            message: message.clone(),
                            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
                        })?;
                        DeliveryStatus::Sent
                    }
                    Ok(result) => {
                        let reason = result
                            .error
                            .unwrap_or_else(|| "unknown delivery error".to_string());
                        warn!("whatsapp send failed for {}: {}", dialable, reason);
                        DeliveryStatus::Failed(reason)
                    }
                    Err(err) => {
                        warn!("whatsapp send failed for {}: {}", dialable, err);
                        DeliveryStatus::Failed(err.to_string())
                    }
                }
            };

            results.push(ResultRecord {
                day: today.clone(),
                shift: effective_shift,
                name,
                phone: dialable,
                work,
                message,
                status,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_shift_switches_at_sixteen_hundred() {
        assert_eq!(auto_shift(0), Shift::Lunch);
        assert_eq!(auto_shift(15), Shift::Lunch);
        assert_eq!(auto_shift(16), Shift::Dinner);
        assert_eq!(auto_shift(23), Shift::Dinner);
    }

    #[test]
    fn delivery_status_renders_stable_tokens() {
        assert_eq!(DeliveryStatus::Sent.to_string(), "Sent");
        assert_eq!(DeliveryStatus::PreviewOnly.to_string(), "PreviewOnly");
        assert_eq!(
            DeliveryStatus::SkippedAlreadySent.to_string(),
            "SkippedAlreadySent"
        );
        assert_eq!(
            DeliveryStatus::Failed("no balance".to_string()).to_string(),
            "Failed:no balance"
        );
    }

    #[test]
    fn result_record_serializes_with_pascal_case_keys() {
        let record = ResultRecord {
            day: "Monday".to_string(),
            shift: "Lunch".to_string(),
            name: "Asha".to_string(),
            phone: "+919876543210".to_string(),
            work: "Dishes".to_string(),
            message: "hi".to_string(),
            status: DeliveryStatus::PreviewOnly,
        };
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["Day"], "Monday");
        assert_eq!(value["Phone"], "+919876543210");
        assert_eq!(value["Status"], "PreviewOnly");
    }
}

//! Synchronization engine: normalize, partition, transmit, classify.
//!
//! The full change set travels in one batched request — a deliberate
//! decision to avoid partial-interleaving races between items of one
//! rating session. Reconciliation (rebaseline + cache upkeep) is driven by
//! the session after a committed report; a failed submit leaves draft and
//! baseline untouched so a retry re-sends the identical change set.

mod client;
mod wire;

pub use client::SubmitClient;
pub use wire::{RemoteFieldErrors, SubmitRequest, SubmitRow, flatten_field_errors};

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::draft::ChangeSet;
use crate::error::{EngineError, Message, Result};
use crate::taxonomy::{Category, ItemKey, LevelCatalog, Taxonomy};

/// A change-set entry resolved to its numeric rank, post-clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub key: ItemKey,
    pub level_id: String,
    pub rank: u8,
}

/// A rank coerced down to the server ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coercion {
    pub key: ItemKey,
    pub from: u8,
    pub to: u8,
}

/// Outcome of a committed submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub submitted: usize,
    pub skills: usize,
    pub kaab: usize,
    pub coercions: Vec<Coercion>,
    /// Informational notes for the rater, e.g. coercion notices.
    pub notes: Vec<Message>,
    pub duration_ms: u128,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "↑{} ({} skill, {} kaab) ✎{} in {}ms",
            self.submitted,
            self.skills,
            self.kaab,
            self.coercions.len(),
            self.duration_ms
        )
    }
}

/// Synchronization engine for one rating session.
pub struct SyncEngine {
    client: SubmitClient,
    server_max_rank: u8,
    user_id: String,
    sub_institute_id: String,
}

impl SyncEngine {
    #[must_use]
    pub const fn new(
        client: SubmitClient,
        server_max_rank: u8,
        user_id: String,
        sub_institute_id: String,
    ) -> Self {
        Self {
            client,
            server_max_rank,
            user_id,
            sub_institute_id,
        }
    }

    #[must_use]
    pub const fn server_max_rank(&self) -> u8 {
        self.server_max_rank
    }

    /// Resolve every entry to its numeric rank and clamp to the server
    /// ceiling. A rank above the ceiling is coerced down rather than
    /// rejected, and every coercion is reported — never hidden.
    pub fn normalize(
        &self,
        changeset: &ChangeSet,
        taxonomy: &Taxonomy,
        catalogs: &HashMap<Category, LevelCatalog>,
    ) -> Result<(Vec<NormalizedEntry>, Vec<Coercion>)> {
        let mut entries = Vec::with_capacity(changeset.len());
        let mut coercions = Vec::new();

        for change in changeset {
            let Some(level_id) = &change.level_id else {
                return Err(EngineError::IncompleteChange(taxonomy.title_of(&change.key)));
            };
            let level = catalogs
                .get(&change.key.category)
                .and_then(|catalog| catalog.find(level_id))
                .ok_or_else(|| EngineError::UnknownLevel {
                    level_id: level_id.clone(),
                    category: change.key.category,
                })?;

            let mut rank = level.rank;
            if rank < 1 {
                return Err(EngineError::RankOutOfRange {
                    rank,
                    max: self.server_max_rank,
                });
            }
            if rank > self.server_max_rank {
                coercions.push(Coercion {
                    key: change.key.clone(),
                    from: rank,
                    to: self.server_max_rank,
                });
                rank = self.server_max_rank;
            }
            entries.push(NormalizedEntry {
                key: change.key.clone(),
                level_id: level_id.clone(),
                rank,
            });
        }
        Ok((entries, coercions))
    }

    /// Split into the skill bucket and the KAAB bucket; both travel in the
    /// same request.
    #[must_use]
    pub fn partition(&self, entries: &[NormalizedEntry]) -> (Vec<SubmitRow>, Vec<SubmitRow>) {
        let mut skills = Vec::new();
        let mut kaab = Vec::new();
        for entry in entries {
            let row = SubmitRow {
                skill_id: entry.key.item_id.clone(),
                skill_level: entry.rank,
                row_type: entry.key.category.as_str().to_string(),
                user_id: self.user_id.clone(),
            };
            if entry.key.category.is_skill() {
                skills.push(row);
            } else {
                kaab.push(row);
            }
        }
        (skills, kaab)
    }

    /// Normalize, partition, and transmit the change set as one request.
    /// Failure is never silent: every error path renders as Error-severity
    /// messages via `EngineError::user_messages`.
    pub fn submit(
        &self,
        changeset: &ChangeSet,
        taxonomy: &Taxonomy,
        catalogs: &HashMap<Category, LevelCatalog>,
    ) -> Result<SyncReport> {
        let started = Instant::now();
        let request_id = format!(
            "rs-{}",
            Uuid::new_v4().to_string().split('-').next().unwrap_or("0")
        );

        let (entries, coercions) = self.normalize(changeset, taxonomy, catalogs)?;
        let (skills, kaab) = self.partition(&entries);
        let (skills_len, kaab_len) = (skills.len(), kaab.len());

        info!(
            request_id = %request_id,
            entries = entries.len(),
            skills = skills_len,
            kaab = kaab_len,
            coerced = coercions.len(),
            "submitting rating batch"
        );

        let request = SubmitRequest {
            skills,
            kaab,
            user_id: self.user_id.clone(),
            sub_institute_id: self.sub_institute_id.clone(),
        };

        match self.client.post_bulk(&request, &request_id) {
            Ok(()) => {
                let notes = coercions
                    .iter()
                    .map(|c| {
                        Message::info(format!(
                            "rank {} for '{}' exceeds the server ceiling {}; submitted as {}",
                            c.from,
                            taxonomy.title_of(&c.key),
                            self.server_max_rank,
                            c.to
                        ))
                    })
                    .collect();
                let report = SyncReport {
                    submitted: entries.len(),
                    skills: skills_len,
                    kaab: kaab_len,
                    coercions,
                    notes,
                    duration_ms: started.elapsed().as_millis(),
                    completed_at: Some(Utc::now()),
                };
                info!(
                    request_id = %request_id,
                    summary = %report.summary_line(),
                    "rating batch committed"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(request_id = %request_id, error = %err, "rating batch failed; draft preserved");
                Err(err)
            }
        }
    }
}

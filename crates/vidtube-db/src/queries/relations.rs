use rusqlite::{OptionalExtension, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use vidtube_types::models::{Relation, TargetKind, ToggleOutcome, ToggleState};

use crate::models::{RELATION_COLUMNS, now, relation_from_row};
use crate::queries::{target_exists, user_exists};
use crate::{Database, StoreError};

impl Database {
    /// Toggle a relation: removes it if present, creates it if absent.
    ///
    /// Delete-if-exists and create-if-absent run in one IMMEDIATE transaction on
    /// the writer, and the UNIQUE (subject, target, kind) constraint rejects any
    /// insert that races past it, so the edge set never holds duplicates.
    pub fn toggle_relation(
        &self,
        subject_id: Uuid,
        target_id: Uuid,
        kind: TargetKind,
    ) -> Result<ToggleOutcome, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !user_exists(&tx, subject_id)? {
                return Err(StoreError::InvalidSubject);
            }
            if !target_exists(&tx, target_id, kind)? {
                return Err(StoreError::InvalidTarget(kind));
            }

            let removed = tx
                .query_row(
                    &format!(
                        "DELETE FROM relations
                         WHERE subject_id = ?1 AND target_id = ?2 AND target_kind = ?3
                         RETURNING {}",
                        RELATION_COLUMNS
                    ),
                    rusqlite::params![subject_id.to_string(), target_id.to_string(), kind.as_str()],
                    relation_from_row,
                )
                .optional()?;

            let outcome = match removed {
                Some(relation) => ToggleOutcome {
                    state: ToggleState::Inactive,
                    relation: Some(relation),
                },
                None => {
                    let inserted = tx.query_row(
                        &format!(
                            "INSERT INTO relations (id, subject_id, target_id, target_kind, created_at)
                             VALUES (?1, ?2, ?3, ?4, ?5)
                             RETURNING {}",
                            RELATION_COLUMNS
                        ),
                        rusqlite::params![
                            Uuid::new_v4().to_string(),
                            subject_id.to_string(),
                            target_id.to_string(),
                            kind.as_str(),
                            now(),
                        ],
                        relation_from_row,
                    );
                    let relation = match inserted {
                        Ok(relation) => relation,
                        Err(e) if StoreError::is_unique_violation(&e) => {
                            return Err(StoreError::ToggleConflict);
                        }
                        Err(e) => return Err(e.into()),
                    };
                    ToggleOutcome {
                        state: ToggleState::Active,
                        relation: Some(relation),
                    }
                }
            };

            tx.commit()?;
            debug!(
                "Relation {} {} -> {} {:?}",
                kind, subject_id, target_id, outcome.state
            );
            Ok(outcome)
        })
    }

    /// The edge for a (subject, target, kind) tuple, if any.
    pub fn get_relation(
        &self,
        subject_id: Uuid,
        target_id: Uuid,
        kind: TargetKind,
    ) -> Result<Option<Relation>, StoreError> {
        self.with_conn(|conn| {
            let relation = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM relations
                         WHERE subject_id = ?1 AND target_id = ?2 AND target_kind = ?3",
                        RELATION_COLUMNS
                    ),
                    rusqlite::params![subject_id.to_string(), target_id.to_string(), kind.as_str()],
                    relation_from_row,
                )
                .optional()?;
            Ok(relation)
        })
    }

    /// Number of edges pointing at a target. Counts orphaned edges too.
    pub fn count_relations_to(&self, target_id: Uuid, kind: TargetKind) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM relations WHERE target_id = ?1 AND target_kind = ?2",
                rusqlite::params![target_id.to_string(), kind.as_str()],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}

//! Query operations for SQLite Backend.
//!
//! Implements `LineageStore` and `RegistryBackend` on top of the `versions`,
//! `tags` and `transitions` tables. The row-level statements take a plain
//! `&Connection` so they run the same inside a lineage section's transaction
//! and inside the one-shot transactions of standalone writes.

use super::backend::{
    busy_err, decode_id, decode_stage, decode_timestamp, decode_version, read_version_row, sql_err,
    SqliteBackend, WRITER_SLOT,
};
use crate::storage::registry::{
    ArtifactVersion, Deadline, RegistryError, Result, StageTransition, Tags,
};
use crate::storage::traits::{LineageStore, RegistryBackend};
use rusqlite::{params, Connection, OptionalExtension};

const SELECT_VERSION: &str =
    "SELECT lineage, version, source_ref, stage, created_at FROM versions";

fn version_exists(conn: &Connection, lineage: &str, version: u32) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM versions WHERE lineage = ?1 AND version = ?2)",
        params![lineage, version],
        |row| row.get(0),
    )
    .map_err(sql_err("Failed to check version"))
}

fn select_versions(conn: &Connection, lineage: &str) -> Result<Vec<ArtifactVersion>> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_VERSION} WHERE lineage = ?1 ORDER BY version"))
        .map_err(sql_err("Failed to prepare query"))?;

    let rows = stmt
        .query_map(params![lineage], read_version_row)
        .map_err(sql_err("Failed to query versions"))?;

    let mut result = Vec::new();
    for row in rows {
        let row = row.map_err(sql_err("Failed to read version row"))?;
        result.push(decode_version(row)?);
    }
    Ok(result)
}

fn select_version(conn: &Connection, lineage: &str, version: u32) -> Result<Option<ArtifactVersion>> {
    let row = conn
        .query_row(
            &format!("{SELECT_VERSION} WHERE lineage = ?1 AND version = ?2"),
            params![lineage, version],
            read_version_row,
        )
        .optional()
        .map_err(sql_err("Failed to get version"))?;

    row.map(decode_version).transpose()
}

fn insert_version_row(conn: &Connection, version: &ArtifactVersion) -> Result<()> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT version FROM versions WHERE lineage = ?1 AND source_ref = ?2",
            params![version.lineage, version.source_ref],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_err("Failed to check source reference"))?;

    if let Some(existing) = existing {
        return Err(RegistryError::DuplicateSourceRef {
            lineage: version.lineage.clone(),
            source_ref: version.source_ref.clone(),
            existing: decode_id(existing)?,
        });
    }

    conn.execute(
        "INSERT INTO versions (lineage, version, source_ref, stage, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            version.lineage,
            version.version,
            version.source_ref,
            version.stage.as_str(),
            version.created_at.to_rfc3339(),
        ],
    )
    .map_err(sql_err("Failed to insert version"))?;
    Ok(())
}

fn write_transition(conn: &Connection, transition: &StageTransition) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE versions SET stage = ?1 WHERE lineage = ?2 AND version = ?3",
            params![transition.to_stage.as_str(), transition.lineage, transition.version],
        )
        .map_err(sql_err("Failed to update stage"))?;

    if updated == 0 {
        return Err(RegistryError::version_not_found(&transition.lineage, transition.version));
    }

    conn.execute(
        "INSERT INTO transitions (lineage, version, from_stage, to_stage, timestamp, user, reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            transition.lineage,
            transition.version,
            transition.from_stage.as_str(),
            transition.to_stage.as_str(),
            transition.timestamp.to_rfc3339(),
            transition.user,
            transition.reason,
        ],
    )
    .map_err(sql_err("Failed to record transition"))?;
    Ok(())
}

/// View handed to a lineage section; every call joins its open transaction
struct SqliteSection<'a> {
    conn: &'a Connection,
}

impl LineageStore for SqliteSection<'_> {
    fn versions(&self, lineage: &str) -> Result<Vec<ArtifactVersion>> {
        select_versions(self.conn, lineage)
    }

    fn version(&self, lineage: &str, version: u32) -> Result<Option<ArtifactVersion>> {
        select_version(self.conn, lineage, version)
    }

    fn insert_version(&self, version: &ArtifactVersion) -> Result<()> {
        insert_version_row(self.conn, version)
    }

    fn apply_transition(&self, transition: &StageTransition) -> Result<()> {
        write_transition(self.conn, transition)
    }
}

impl LineageStore for SqliteBackend {
    fn versions(&self, lineage: &str) -> Result<Vec<ArtifactVersion>> {
        let conn = self.lock_conn()?;
        select_versions(&conn, lineage)
    }

    fn version(&self, lineage: &str, version: u32) -> Result<Option<ArtifactVersion>> {
        let conn = self.lock_conn()?;
        select_version(&conn, lineage, version)
    }

    fn insert_version(&self, version: &ArtifactVersion) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = Self::begin_immediate(&mut conn, self.busy_timeout)?;
        insert_version_row(&tx, version)?;
        tx.commit().map_err(busy_err("commit version", self.busy_timeout))
    }

    fn apply_transition(&self, transition: &StageTransition) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = Self::begin_immediate(&mut conn, self.busy_timeout)?;
        write_transition(&tx, transition)?;
        tx.commit().map_err(busy_err("commit transition", self.busy_timeout))
    }
}

impl RegistryBackend for SqliteBackend {
    /// One `BEGIN IMMEDIATE` transaction spans the whole section, so other
    /// handles and processes on the same file wait for it and an error from
    /// `work` rolls every write back.
    fn exclusive(
        &self,
        lineage: &str,
        deadline: &Deadline,
        work: &mut dyn FnMut(&dyn LineageStore) -> Result<()>,
    ) -> Result<()> {
        let _writer = self.writer.acquire(WRITER_SLOT, deadline, "lineage section")?;
        let wait = deadline.remaining().unwrap_or(self.busy_timeout);

        let mut conn = self.lock_conn()?;
        let tx = Self::begin_immediate(&mut conn, wait).map_err(|e| match e {
            RegistryError::Timeout { .. } if deadline.remaining().is_some() => {
                deadline.timeout_error("lineage section")
            }
            other => other,
        })?;

        work(&SqliteSection { conn: &tx })?;

        tx.commit().map_err(busy_err("commit lineage section", wait))?;
        tracing::trace!(lineage, "committed lineage section");
        Ok(())
    }

    fn lineages(&self) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT lineage FROM versions ORDER BY lineage")
            .map_err(sql_err("Failed to prepare query"))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(sql_err("Failed to query lineages"))?;

        let lineages = rows.map(|row| row.map_err(sql_err("Failed to read lineage row"))).collect();
        lineages
    }

    fn transitions(&self, lineage: &str) -> Result<Vec<StageTransition>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT lineage, version, from_stage, to_stage, timestamp, user, reason
                 FROM transitions WHERE lineage = ?1 ORDER BY id",
            )
            .map_err(sql_err("Failed to prepare query"))?;

        let rows = stmt
            .query_map(params![lineage], |row| {
                let lineage: String = row.get(0)?;
                let version: i64 = row.get(1)?;
                let from_stage: String = row.get(2)?;
                let to_stage: String = row.get(3)?;
                let timestamp: String = row.get(4)?;
                let user: Option<String> = row.get(5)?;
                let reason: Option<String> = row.get(6)?;
                Ok((lineage, version, from_stage, to_stage, timestamp, user, reason))
            })
            .map_err(sql_err("Failed to query transitions"))?;

        let mut result = Vec::new();
        for row in rows {
            let (lineage, version, from_stage, to_stage, timestamp, user, reason) =
                row.map_err(sql_err("Failed to read transition row"))?;
            result.push(StageTransition {
                lineage,
                version: decode_id(version)?,
                from_stage: decode_stage(&from_stage)?,
                to_stage: decode_stage(&to_stage)?,
                timestamp: decode_timestamp(&timestamp)?,
                user,
                reason,
            });
        }
        Ok(result)
    }

    fn upsert_tags(&self, lineage: &str, version: u32, tags: &Tags) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = Self::begin_immediate(&mut conn, self.busy_timeout)?;

        if !version_exists(&tx, lineage, version)? {
            return Err(RegistryError::version_not_found(lineage, version));
        }

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO tags (lineage, version, key, value) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (lineage, version, key) DO UPDATE SET value = excluded.value",
                )
                .map_err(sql_err("Failed to prepare tag upsert"))?;
            for (key, value) in tags {
                stmt.execute(params![lineage, version, key, value])
                    .map_err(sql_err("Failed to upsert tag"))?;
            }
        }

        tx.commit().map_err(busy_err("commit tags", self.busy_timeout))
    }

    fn tags(&self, lineage: &str, version: u32) -> Result<Tags> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare("SELECT key, value FROM tags WHERE lineage = ?1 AND version = ?2")
            .map_err(sql_err("Failed to prepare query"))?;

        let rows = stmt
            .query_map(params![lineage, version], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(sql_err("Failed to query tags"))?;

        let tags = rows.map(|row| row.map_err(sql_err("Failed to read tag row"))).collect();
        tags
    }

    fn backend_type(&self) -> &'static str {
        "sqlite"
    }
}

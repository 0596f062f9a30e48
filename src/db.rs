use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::orchestrator::Accepted;
use crate::record::{CAPTURED_AT, PRIMARY_SCORE, RECORD_ID, SECONDARY_SCORE};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS records (
            title           TEXT PRIMARY KEY,
            record_id       TEXT NOT NULL,
            primary_score   TEXT,
            secondary_score TEXT,
            captured_at     TEXT,
            url             TEXT NOT NULL,
            directory       TEXT NOT NULL,
            document_ok     BOOLEAN NOT NULL,
            asset_ok        BOOLEAN NOT NULL,
            fields_json     TEXT NOT NULL,
            indexed_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_records_indexed ON records(indexed_at);
        ",
    )?;
    Ok(())
}

/// Index accepted records. Same title replaces the earlier row, like the
/// directory it points at.
pub fn save_records(conn: &Connection, records: &[Accepted]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO records
             (title, record_id, primary_score, secondary_score, captured_at, url,
              directory, document_ok, asset_ok, fields_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for a in records {
            let r = &a.record;
            count += stmt.execute(rusqlite::params![
                r.title(),
                r.text(RECORD_ID),
                r.text(PRIMARY_SCORE),
                r.text(SECONDARY_SCORE),
                r.text(CAPTURED_AT),
                a.url,
                a.report.directory.to_string_lossy().into_owned(),
                a.report.document_ok(),
                a.report.asset_ok(),
                serde_json::to_string(r)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Overview ──

pub struct OverviewRow {
    pub title: String,
    pub primary_score: String,
    pub secondary_score: String,
    pub captured_at: String,
    pub document_ok: bool,
    pub asset_ok: bool,
}

pub fn fetch_overview(conn: &Connection, limit: usize) -> Result<Vec<OverviewRow>> {
    let mut stmt = conn.prepare(
        "SELECT title, COALESCE(primary_score,''), COALESCE(secondary_score,''),
                COALESCE(captured_at,''), document_ok, asset_ok
         FROM records
         ORDER BY indexed_at DESC, title
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(OverviewRow {
                title: row.get(0)?,
                primary_score: row.get(1)?,
                secondary_score: row.get(2)?,
                captured_at: row.get(3)?,
                document_ok: row.get(4)?,
                asset_ok: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub records: usize,
    pub complete: usize,
    pub missing_document: usize,
    pub missing_asset: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let records: usize = conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?;
    let complete: usize = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE document_ok = 1 AND asset_ok = 1",
        [],
        |r| r.get(0),
    )?;
    let missing_document: usize = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE document_ok = 0",
        [],
        |r| r.get(0),
    )?;
    let missing_asset: usize =
        conn.query_row("SELECT COUNT(*) FROM records WHERE asset_ok = 0", [], |r| r.get(0))?;
    Ok(Stats {
        records,
        complete,
        missing_document,
        missing_asset,
    })
}

//! Local report archive backed by SQLite.
//!
//! Every successfully fetched evaluation report is stored locally so past
//! interviews stay browsable without the service. `history --sync` upserts
//! the server-side saved reports into the same table.

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::OptionalExtension;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::api::types::{InterviewReport, SavedReport};
use crate::session::Message;

/// One archived interview report.
#[derive(Debug, Clone)]
pub struct ArchivedReport {
    pub id: i64,
    /// Session id (local interviews) or server report id (synced entries).
    pub source_id: String,
    pub candidate_name: Option<String>,
    pub created_at: DateTime<Local>,
    pub overall_score: f64,
    pub recommendation: String,
    pub report: InterviewReport,
    pub transcript: Vec<Message>,
}

/// Manages the report archive database.
pub struct ReportArchive {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl ReportArchive {
    /// Creates an archive manager for the given data directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            database_path: data_dir.join("reports.db"),
            connection: None,
        })
    }

    /// Initializes database connection and creates tables if necessary.
    fn get_connection(&mut self) -> Result<&Connection> {
        if self.connection.is_none() {
            let connection = Connection::open(&self.database_path)?;

            connection.execute(
                "CREATE TABLE IF NOT EXISTS reports (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    source_id TEXT NOT NULL UNIQUE,
                    candidate_name TEXT,
                    created_at TEXT NOT NULL,
                    overall_score REAL NOT NULL,
                    recommendation TEXT NOT NULL,
                    report_json TEXT NOT NULL,
                    transcript_json TEXT NOT NULL
                )",
                [],
            )?;

            self.connection = Some(connection);
        }

        Ok(self.connection.as_ref().unwrap())
    }

    /// Archives a report fetched for a completed local interview.
    ///
    /// Re-archiving the same session replaces the stored entry.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If serialization or insertion fails
    pub fn save(
        &mut self,
        session_id: &str,
        candidate_name: Option<&str>,
        report: &InterviewReport,
        transcript: &[Message],
    ) -> Result<()> {
        let report_json = serde_json::to_string(report)?;
        let transcript_json = serde_json::to_string(transcript)?;
        let timestamp = Local::now().to_rfc3339();

        let connection = self.get_connection()?;
        connection.execute(
            "INSERT INTO reports
                (source_id, candidate_name, created_at, overall_score, recommendation,
                 report_json, transcript_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(source_id) DO UPDATE SET
                candidate_name = excluded.candidate_name,
                created_at = excluded.created_at,
                overall_score = excluded.overall_score,
                recommendation = excluded.recommendation,
                report_json = excluded.report_json,
                transcript_json = excluded.transcript_json",
            params![
                session_id,
                candidate_name,
                timestamp,
                report.overall_score,
                report.recommendation,
                report_json,
                transcript_json,
            ],
        )?;

        tracing::debug!("Report archived for session {session_id}");
        Ok(())
    }

    /// Upserts a server-side saved report pulled by `history --sync`.
    pub fn save_remote(&mut self, saved: &SavedReport) -> Result<()> {
        let report_json = serde_json::to_string(&saved.report)?;
        let transcript_json = serde_json::to_string(&saved.messages)?;

        let connection = self.get_connection()?;
        connection.execute(
            "INSERT INTO reports
                (source_id, candidate_name, created_at, overall_score, recommendation,
                 report_json, transcript_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(source_id) DO UPDATE SET
                candidate_name = excluded.candidate_name,
                created_at = excluded.created_at,
                overall_score = excluded.overall_score,
                recommendation = excluded.recommendation,
                report_json = excluded.report_json,
                transcript_json = excluded.transcript_json",
            params![
                saved.id,
                saved.candidate_name,
                saved.created_at,
                saved.report.overall_score,
                saved.report.recommendation,
                report_json,
                transcript_json,
            ],
        )?;
        Ok(())
    }

    /// Retrieves all archived reports ordered by most recent first.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If query execution or row decoding fails
    pub fn list(&mut self) -> Result<Vec<ArchivedReport>> {
        let connection = self.get_connection()?;

        let mut statement = connection.prepare(
            "SELECT id, source_id, candidate_name, created_at, overall_score, recommendation,
                    report_json, transcript_json
             FROM reports ORDER BY created_at DESC",
        )?;

        let entries = statement
            .query_map([], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Retrieves a single archived report by its local id.
    pub fn get(&mut self, id: i64) -> Result<Option<ArchivedReport>> {
        let connection = self.get_connection()?;

        let mut statement = connection.prepare(
            "SELECT id, source_id, candidate_name, created_at, overall_score, recommendation,
                    report_json, transcript_json
             FROM reports WHERE id = ?1",
        )?;

        let entry = statement
            .query_row(params![id], Self::row_to_entry)
            .optional()?;

        Ok(entry)
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> std::result::Result<ArchivedReport, rusqlite::Error> {
        let id = row.get::<_, i64>(0)?;
        let source_id = row.get::<_, String>(1)?;
        let candidate_name = row.get::<_, Option<String>>(2)?;
        let timestamp_str = row.get::<_, String>(3)?;
        let overall_score = row.get::<_, f64>(4)?;
        let recommendation = row.get::<_, String>(5)?;
        let report_json = row.get::<_, String>(6)?;
        let transcript_json = row.get::<_, String>(7)?;

        let created_at = DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Local))
            .map_err(|_| {
                rusqlite::Error::InvalidParameterName("Invalid timestamp format".to_string())
            })?;

        let report: InterviewReport = serde_json::from_str(&report_json).map_err(|_| {
            rusqlite::Error::InvalidParameterName("Invalid report JSON".to_string())
        })?;
        let transcript: Vec<Message> = serde_json::from_str(&transcript_json).map_err(|_| {
            rusqlite::Error::InvalidParameterName("Invalid transcript JSON".to_string())
        })?;

        Ok(ArchivedReport {
            id,
            source_id,
            candidate_name,
            created_at,
            overall_score,
            recommendation,
            report,
            transcript,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{InterviewPhase, Role};

    fn report(score: f64) -> InterviewReport {
        InterviewReport {
            overall_score: score,
            summary: "Solid performance".to_string(),
            criteria: vec![],
            strengths: vec!["clear".to_string()],
            improvements: vec![],
            recommendation: "Hire".to_string(),
        }
    }

    fn transcript() -> Vec<Message> {
        vec![Message {
            role: Role::Interviewer,
            content: "Welcome".to_string(),
            phase: InterviewPhase::Opening,
        }]
    }

    #[test]
    fn saves_and_lists_reports_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = ReportArchive::new(dir.path()).unwrap();

        archive.save("s1", Some("Dana"), &report(7.0), &transcript()).unwrap();
        archive.save("s2", None, &report(9.0), &transcript()).unwrap();

        let entries = archive.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].report.summary, "Solid performance");
        assert_eq!(entries[0].transcript.len(), 1);
    }

    #[test]
    fn re_archiving_a_session_replaces_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = ReportArchive::new(dir.path()).unwrap();

        archive.save("s1", Some("Dana"), &report(6.0), &transcript()).unwrap();
        archive.save("s1", Some("Dana"), &report(8.0), &transcript()).unwrap();

        let entries = archive.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].overall_score, 8.0);
    }

    #[test]
    fn get_by_id_returns_the_stored_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = ReportArchive::new(dir.path()).unwrap();
        archive.save("s1", Some("Dana"), &report(7.5), &transcript()).unwrap();

        let id = archive.list().unwrap()[0].id;
        let entry = archive.get(id).unwrap().unwrap();
        assert_eq!(entry.source_id, "s1");
        assert_eq!(entry.candidate_name.as_deref(), Some("Dana"));

        assert!(archive.get(id + 100).unwrap().is_none());
    }
}

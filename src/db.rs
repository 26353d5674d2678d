use anyhow::{anyhow, Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use std::path::PathBuf;

use crate::models::{Profile, ProfileNote, Project, Query, Search, SearchSpec, SpecVersion};
use crate::xray::CompiledQuery;

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "scout") {
            Ok(proj_dirs.data_dir().join("scout.db"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("scout.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS searches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                name TEXT NOT NULL DEFAULT 'New Search',
                nl_prompt TEXT NOT NULL DEFAULT '',
                summary TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS search_specs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                search_id INTEGER NOT NULL REFERENCES searches(id),
                spec_json TEXT NOT NULL,
                version INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS queries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                search_id INTEGER NOT NULL REFERENCES searches(id),
                query_type TEXT NOT NULL,
                label TEXT NOT NULL,
                query_text TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                search_id INTEGER REFERENCES searches(id),
                full_name TEXT,
                current_company TEXT,
                current_title TEXT,
                location TEXT,
                linkedin_url TEXT NOT NULL,
                linkedin_url_normalised TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'not_contacted',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS profile_notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id INTEGER NOT NULL REFERENCES profiles(id),
                note TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT 'user',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_searches_project ON searches(project_id);
            CREATE INDEX IF NOT EXISTS idx_specs_search ON search_specs(search_id);
            CREATE INDEX IF NOT EXISTS idx_queries_search ON queries(search_id);
            CREATE INDEX IF NOT EXISTS idx_profiles_project ON profiles(project_id);
            CREATE INDEX IF NOT EXISTS idx_profiles_status ON profiles(status);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='projects'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!("Database not initialized. Run 'scout init' first."));
        }
        Ok(())
    }

    // --- Project operations ---

    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO projects (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM projects ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_project)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list projects")
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let result = self.conn.query_row(
            "SELECT id, name, description, created_at, updated_at
             FROM projects WHERE id = ?1",
            [id],
            Self::row_to_project,
        );
        match result {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    // --- Search operations ---

    pub fn create_search(
        &self,
        project_id: i64,
        name: &str,
        nl_prompt: &str,
        summary: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO searches (project_id, name, nl_prompt, summary)
             VALUES (?1, ?2, ?3, ?4)",
            params![project_id, name, nl_prompt, summary],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_searches(&self, project_id: i64) -> Result<Vec<Search>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, name, nl_prompt, summary, created_at
             FROM searches WHERE project_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([project_id], Self::row_to_search)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list searches")
    }

    pub fn get_search(&self, id: i64) -> Result<Option<Search>> {
        let result = self.conn.query_row(
            "SELECT id, project_id, name, nl_prompt, summary, created_at
             FROM searches WHERE id = ?1",
            [id],
            Self::row_to_search,
        );
        match result {
            Ok(search) => Ok(Some(search)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_search(row: &rusqlite::Row) -> rusqlite::Result<Search> {
        Ok(Search {
            id: row.get(0)?,
            project_id: row.get(1)?,
            name: row.get(2)?,
            nl_prompt: row.get(3)?,
            summary: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    // --- Spec versions ---

    /// Append a new spec revision for a search and return its version number.
    pub fn insert_spec_version(&self, search_id: i64, spec: &SearchSpec) -> Result<i64> {
        let spec_json = serde_json::to_string(spec).context("Failed to serialize spec")?;
        let version: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM search_specs WHERE search_id = ?1",
            [search_id],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO search_specs (search_id, spec_json, version) VALUES (?1, ?2, ?3)",
            params![search_id, spec_json, version],
        )?;
        Ok(version)
    }

    /// Latest spec revision for a search, if any has been saved.
    pub fn latest_spec(&self, search_id: i64) -> Result<Option<SpecVersion>> {
        let result = self.conn.query_row(
            "SELECT id, search_id, spec_json, version, created_at
             FROM search_specs WHERE search_id = ?1 ORDER BY id DESC LIMIT 1",
            [search_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        );
        let (id, search_id, spec_json, version, created_at) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let spec: SearchSpec = serde_json::from_str(&spec_json)
            .with_context(|| format!("Corrupt spec_json for search #{}", search_id))?;
        Ok(Some(SpecVersion {
            id,
            search_id,
            version,
            spec,
            created_at,
        }))
    }

    // --- Queries ---

    /// Replace the full query set for a search. Saving a spec always drops
    /// the old set and inserts the freshly compiled one.
    pub fn replace_queries(&self, search_id: i64, queries: &[CompiledQuery]) -> Result<()> {
        self.conn
            .execute("DELETE FROM queries WHERE search_id = ?1", [search_id])?;
        for query in queries {
            self.conn.execute(
                "INSERT INTO queries (search_id, query_type, label, query_text)
                 VALUES (?1, ?2, ?3, ?4)",
                params![search_id, query.query_type, query.label, query.query_text],
            )?;
        }
        Ok(())
    }

    /// Compiled queries in insert order, so the primary comes first.
    pub fn list_queries(&self, search_id: i64) -> Result<Vec<Query>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, search_id, query_type, label, query_text, created_at
             FROM queries WHERE search_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([search_id], Self::row_to_query)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list queries")
    }

    fn row_to_query(row: &rusqlite::Row) -> rusqlite::Result<Query> {
        Ok(Query {
            id: row.get(0)?,
            search_id: row.get(1)?,
            query_type: row.get(2)?,
            label: row.get(3)?,
            query_text: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    // --- Profile operations ---

    /// Insert-or-update keyed on the normalized URL. Re-capturing the same
    /// profile overwrites its attributes; the pipeline status is left alone
    /// on update and defaults to not_contacted on insert.
    #[allow(clippy::too_many_arguments)]
    pub fn upsert_profile(
        &self,
        project_id: i64,
        search_id: Option<i64>,
        full_name: Option<&str>,
        current_company: Option<&str>,
        current_title: Option<&str>,
        location: Option<&str>,
        linkedin_url: &str,
        linkedin_url_normalised: &str,
    ) -> Result<Profile> {
        self.conn.execute(
            "INSERT INTO profiles
                (project_id, search_id, full_name, current_company, current_title,
                 location, linkedin_url, linkedin_url_normalised)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(linkedin_url_normalised) DO UPDATE SET
                project_id = excluded.project_id,
                search_id = excluded.search_id,
                full_name = excluded.full_name,
                current_company = excluded.current_company,
                current_title = excluded.current_title,
                location = excluded.location,
                linkedin_url = excluded.linkedin_url,
                updated_at = datetime('now')",
            params![
                project_id,
                search_id,
                full_name,
                current_company,
                current_title,
                location,
                linkedin_url,
                linkedin_url_normalised
            ],
        )?;

        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM profiles WHERE linkedin_url_normalised = ?1",
                    PROFILE_COLUMNS
                ),
                [linkedin_url_normalised],
                Self::row_to_profile,
            )
            .context("Failed to read back upserted profile")
    }

    pub fn get_profile(&self, id: i64) -> Result<Option<Profile>> {
        let result = self.conn.query_row(
            &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS),
            [id],
            Self::row_to_profile,
        );
        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_profiles(
        &self,
        project_id: Option<i64>,
        search_id: Option<i64>,
        status: Option<&str>,
    ) -> Result<Vec<Profile>> {
        let mut sql = format!("SELECT {} FROM profiles WHERE 1=1", PROFILE_COLUMNS);
        let mut params: Vec<String> = vec![];

        if let Some(pid) = project_id {
            sql.push_str(&format!(" AND project_id = ?{}", params.len() + 1));
            params.push(pid.to_string());
        }
        if let Some(sid) = search_id {
            sql.push_str(&format!(" AND search_id = ?{}", params.len() + 1));
            params.push(sid.to_string());
        }
        if let Some(s) = status {
            sql.push_str(&format!(" AND status = ?{}", params.len() + 1));
            params.push(s.to_string());
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), Self::row_to_profile)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list profiles")
    }

    pub fn set_profile_status(&self, id: i64, status: &str) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE profiles SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![status, id],
        )?;
        if changed == 0 {
            return Err(anyhow!("Profile #{} not found", id));
        }
        Ok(())
    }

    fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            project_id: row.get(1)?,
            search_id: row.get(2)?,
            full_name: row.get(3)?,
            current_company: row.get(4)?,
            current_title: row.get(5)?,
            location: row.get(6)?,
            linkedin_url: row.get(7)?,
            linkedin_url_normalised: row.get(8)?,
            status: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    // --- Profile notes ---

    pub fn add_profile_note(&self, profile_id: i64, note: &str, source: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO profile_notes (profile_id, note, source) VALUES (?1, ?2, ?3)",
            params![profile_id, note, source],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_profile_notes(&self, profile_id: i64) -> Result<Vec<ProfileNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, note, source, created_at
             FROM profile_notes WHERE profile_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([profile_id], |row| {
            Ok(ProfileNote {
                id: row.get(0)?,
                profile_id: row.get(1)?,
                note: row.get(2)?,
                source: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list profile notes")
    }
}

const PROFILE_COLUMNS: &str = "id, project_id, search_id, full_name, current_company, \
     current_title, location, linkedin_url, linkedin_url_normalised, status, \
     created_at, updated_at";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xray::{build_queries, normalize_linkedin_url};

    fn test_db() -> Database {
        let conn = Connection::open_in_memory().unwrap();
        let db = Database {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.init().unwrap();
        db
    }

    fn capture(db: &Database, project_id: i64, url: &str, company: Option<&str>) -> Profile {
        let normalised = normalize_linkedin_url(url);
        db.upsert_profile(
            project_id,
            None,
            Some("Jane Doe"),
            company,
            Some("Sales Director"),
            Some("Manchester"),
            url,
            &normalised,
        )
        .unwrap()
    }

    #[test]
    fn test_upsert_dedups_on_normalized_url_second_wins() {
        let db = test_db();
        let project_id = db.create_project("Fleet hires", None).unwrap();

        let first = capture(
            &db,
            project_id,
            "https://linkedin.com/in/jane-doe/",
            Some("Holman"),
        );
        let second = capture(
            &db,
            project_id,
            "https://LinkedIn.com/in/Jane-Doe?utm=x",
            Some("SG Fleet UK"),
        );

        assert_eq!(first.id, second.id);
        assert_eq!(second.current_company.as_deref(), Some("SG Fleet UK"));
        // Original, unnormalized URL from the latest submission is kept.
        assert_eq!(second.linkedin_url, "https://LinkedIn.com/in/Jane-Doe?utm=x");

        let all = db.list_profiles(Some(project_id), None, None).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_upsert_leaves_status_alone_on_update() {
        let db = test_db();
        let project_id = db.create_project("Fleet hires", None).unwrap();

        let profile = capture(&db, project_id, "https://linkedin.com/in/jane-doe", None);
        assert_eq!(profile.status, "not_contacted");

        db.set_profile_status(profile.id, "shortlisted").unwrap();
        let again = capture(&db, project_id, "https://linkedin.com/in/jane-doe/", None);
        assert_eq!(again.status, "shortlisted");
    }

    #[test]
    fn test_set_status_on_missing_profile_errors() {
        let db = test_db();
        let result = db.set_profile_status(999, "shortlisted");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("999"));
    }

    #[test]
    fn test_list_profiles_filters_by_status_equality() {
        let db = test_db();
        let project_id = db.create_project("Fleet hires", None).unwrap();
        let a = capture(&db, project_id, "https://linkedin.com/in/a", None);
        capture(&db, project_id, "https://linkedin.com/in/b", None);

        db.set_profile_status(a.id, "shortlisted").unwrap();

        let shortlisted = db
            .list_profiles(Some(project_id), None, Some("shortlisted"))
            .unwrap();
        assert_eq!(shortlisted.len(), 1);
        assert_eq!(shortlisted[0].id, a.id);

        let everyone = db.list_profiles(Some(project_id), None, None).unwrap();
        assert_eq!(everyone.len(), 2);
    }

    #[test]
    fn test_spec_versions_increment_and_latest_wins() {
        let db = test_db();
        let project_id = db.create_project("Fleet hires", None).unwrap();
        let search_id = db.create_search(project_id, "New Search", "", "").unwrap();

        assert!(db.latest_spec(search_id).unwrap().is_none());

        let v1 = db
            .insert_spec_version(search_id, &SearchSpec::default())
            .unwrap();
        let edited = SearchSpec {
            job_titles: vec!["Sales Director".to_string()],
            ..Default::default()
        };
        let v2 = db.insert_spec_version(search_id, &edited).unwrap();

        assert_eq!(v1, 1);
        assert_eq!(v2, 2);

        let latest = db.latest_spec(search_id).unwrap().unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.spec, edited);
    }

    #[test]
    fn test_replace_queries_is_replace_all() {
        let db = test_db();
        let project_id = db.create_project("Fleet hires", None).unwrap();
        let search_id = db.create_search(project_id, "New Search", "", "").unwrap();

        let spec = SearchSpec {
            keywords: vec!["fleet".to_string()],
            ..Default::default()
        };
        db.replace_queries(search_id, &build_queries(&spec)).unwrap();
        db.replace_queries(search_id, &build_queries(&SearchSpec::default()))
            .unwrap();

        let queries = db.list_queries(search_id).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].query_type, "xray_linkedin");
        assert_eq!(queries[0].query_text, "site:linkedin.com/in");
        assert_eq!(queries[1].query_type, "xray_linkedin_variant");
    }

    #[test]
    fn test_profile_notes_append() {
        let db = test_db();
        let project_id = db.create_project("Fleet hires", None).unwrap();
        let profile = capture(&db, project_id, "https://linkedin.com/in/jane-doe", None);

        db.add_profile_note(profile.id, "Strong leasing background", "user")
            .unwrap();
        db.add_profile_note(profile.id, "Responded on 12 Aug", "user")
            .unwrap();

        let notes = db.list_profile_notes(profile.id).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].note, "Strong leasing background");
        assert_eq!(notes[1].source, "user");
    }
}

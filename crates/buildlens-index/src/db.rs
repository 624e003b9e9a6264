use anyhow::{Context, Result};
use buildlens_core::path::{path_key, split_folder_file};
use buildlens_types::{CompileRecord, RecordSink};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

/// One row of the `files` table. Defines and includes are stored in their
/// final clang spelling (`-DFOO=1|-DBAR`, `-isystemC:/vs/inc|-IC:/proj/inc`)
/// so editor integrations can split on `|` and use the pieces directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: i64,
    pub full_path: String,
    pub name: String,
    pub project_name: String,
    pub project_file: String,
    pub defines: String,
    pub includes: String,
}

impl FileEntry {
    /// The stored columns split back into individual clang arguments.
    pub fn clang_arguments(&self) -> Vec<String> {
        self.defines
            .split('|')
            .chain(self.includes.split('|'))
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Compile record store. The row id is [`path_key`] of the file path, so the
/// same file on disk always maps to the same row and `INSERT OR REPLACE`
/// refreshes it when a build is re-indexed with different flags.
pub struct Database {
    conn: Connection,
    /// Paths written during this session. [`RecordSink::contains`] consults
    /// only this set: rows from earlier runs must not suppress fresh writes.
    written: HashSet<i64>,
    write_error: Option<anyhow::Error>,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Losing the index on a crash is acceptable; it is rebuilt from the
        // next build log. Trading durability for write speed is worth it
        // when a large build inserts tens of thousands of headers.
        conn.execute_batch(
            r#"
            PRAGMA synchronous = OFF;

            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY,
                fullpath TEXT COLLATE NOCASE,
                name TEXT COLLATE NOCASE,
                prj_name TEXT,
                prj_file TEXT,
                defines TEXT,
                includes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_files_name ON files(name);
            "#,
        )?;

        Ok(Self {
            conn,
            written: HashSet::new(),
            write_error: None,
        })
    }

    pub fn add_file(&mut self, record: &CompileRecord) -> Result<()> {
        let id = row_id(&record.file_path);
        let (_, name) = split_folder_file(&record.file_path);
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO files (id, fullpath, name, prj_name, prj_file, defines, includes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id,
                &record.file_path,
                &name,
                &record.project_name,
                &record.project_file,
                &record.defines_column(),
                &record.includes_column()
            ],
        )?;
        self.written.insert(id);

        Ok(())
    }

    pub fn get_file(&self, path: &str) -> Result<Option<FileEntry>> {
        let entry = self
            .conn
            .query_row(
                r#"
                SELECT id, fullpath, name, prj_name, prj_file, defines, includes
                FROM files
                WHERE id = ?1
                "#,
                [row_id(path)],
                entry_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    /// All entries whose file name matches, case-insensitively. Editor
    /// lookups usually have only a basename to go on.
    pub fn get_with_basename(&self, name: &str) -> Result<Vec<FileEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, fullpath, name, prj_name, prj_file, defines, includes
            FROM files
            WHERE name = ?1
            ORDER BY fullpath
            "#,
        )?;

        let entries = stmt
            .query_map([name], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn all_files(&self) -> Result<Vec<FileEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, fullpath, name, prj_name, prj_file, defines, includes
            FROM files
            ORDER BY fullpath
            "#,
        )?;

        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// The first write failure of this session, if any. Writes happen inside
    /// [`RecordSink::insert`], which cannot surface errors itself.
    pub fn take_write_error(&mut self) -> Option<anyhow::Error> {
        self.write_error.take()
    }
}

impl RecordSink for Database {
    fn contains(&self, file_path: &str) -> bool {
        self.written.contains(&row_id(file_path))
    }

    fn insert(&mut self, record: CompileRecord) {
        let id = row_id(&record.file_path);
        if self.written.contains(&id) {
            return;
        }
        if let Err(err) = self.add_file(&record)
            && self.write_error.is_none()
        {
            self.write_error = Some(err);
        }
    }
}

fn row_id(path: &str) -> i64 {
    path_key(path) as i64
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileEntry> {
    Ok(FileEntry {
        id: row.get(0)?,
        full_path: row.get(1)?,
        name: row.get(2)?,
        project_name: row.get(3)?,
        project_file: row.get(4)?,
        defines: row.get(5)?,
        includes: row.get(6)?,
    })
}

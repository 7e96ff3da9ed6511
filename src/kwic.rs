//! Keyword-in-context retrieval from the relational store

use crate::{cache::QueryCache, config::Config, Keyword, Result, Year};
use anyhow::Context;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::{
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

/// One recorded occurence of a keyword, with its surrounding text
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct KwicRow {
    /// Source document the occurence was found in
    pub file: Box<str>,

    /// Publication year of the source document
    pub year: Year,

    /// Text surrounding the occurence
    pub context: Box<str>,
}

/// Outcome of a KWIC refresh request
#[derive(Clone, Debug)]
pub enum KwicUpdate {
    /// New rows to be displayed
    Update(Arc<[KwicRow]>),

    /// Nothing to show, the current display should be left alone
    NoChange,
}

/// Refresh the KWIC display for a keyword and a selection of years
///
/// The display keeps its current contents when there is no store to query or
/// no keyword to query it for.
pub async fn refresh(
    store: Option<&KwicStore>,
    keyword: &str,
    years: &[Year],
) -> Result<KwicUpdate> {
    let Some(store) = store else {
        return Ok(KwicUpdate::NoChange);
    };
    if keyword.is_empty() {
        return Ok(KwicUpdate::NoChange);
    }
    Ok(KwicUpdate::Update(store.lookup(keyword, years).await?))
}

/// Read-only handle to one corpus' KWIC table
pub struct KwicStore {
    /// Database connection, only used from blocking tasks
    conn: Arc<Mutex<Connection>>,

    /// Name of the table to query, from the corpus registry
    table: &'static str,

    /// Memoized query results
    cache: QueryCache,

    /// Number of SQL queries executed so far
    queries: AtomicU64,
}
//
impl KwicStore {
    /// Open the store that this process is configured for, if any
    ///
    /// Comes out None, disabling KWIC retrieval, when the corpus has no KWIC
    /// table or no database has been configured.
    pub fn open_configured(config: &Config) -> Result<Option<Self>> {
        let Some(table) = config.corpus.kwic_table else {
            log::debug!("corpus {:?} has no KWIC table", config.corpus.id);
            return Ok(None);
        };
        let Some(path) = &config.kwic_database else {
            log::debug!("no KWIC database configured, context lookups are disabled");
            return Ok(None);
        };
        Self::open(path, table).map(Some)
    }

    /// Open the KWIC database at a given path
    pub fn open(path: &Path, table: &'static str) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("opening KWIC database {}", path.display()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table,
            cache: QueryCache::new(),
            queries: AtomicU64::new(0),
        })
    }

    /// Retrieve the rows for one keyword and year selection
    ///
    /// An empty year selection means no year restriction at all.
    pub async fn lookup(&self, keyword: &str, years: &[Year]) -> Result<Arc<[KwicRow]>> {
        let key = (Keyword::from(keyword), Box::<[Year]>::from(years));
        if let Some(rows) = self.cache.get(&key) {
            return Ok(rows);
        }

        // Cache miss, go to the database
        self.queries.fetch_add(1, Ordering::Relaxed);
        let conn = self.conn.clone();
        let table = self.table;
        let (keyword, years) = key.clone();
        let rows = tokio::task::spawn_blocking(move || query_rows(&conn, table, &keyword, &years))
            .await
            .context("collecting results from the KWIC query task")??;
        let rows = Arc::<[KwicRow]>::from(rows);
        self.cache.insert(key, rows.clone());
        let (hits, misses) = self.cache.stats();
        log::debug!(
            "KWIC query #{} done ({hits} memoized hits / {misses} misses so far)",
            self.queries()
        );
        Ok(rows)
    }

    /// Number of SQL queries executed so far
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}

/// Run one KWIC query against the database
fn query_rows(
    conn: &Mutex<Connection>,
    table: &str,
    keyword: &str,
    years: &[Year],
) -> Result<Vec<KwicRow>> {
    // Assemble the statement, numbering one placeholder per bound value
    let mut bind_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    bind_values.push(Box::new(keyword.to_owned()));
    let mut sql = format!("SELECT file, year, context FROM {table} WHERE term = ?1");
    match years {
        [] => {}
        [year] => {
            bind_values.push(Box::new(*year));
            sql.push_str(&format!(" AND year = ?{}", bind_values.len()));
        }
        years => {
            let mut placeholders = Vec::with_capacity(years.len());
            for &year in years {
                bind_values.push(Box::new(year));
                placeholders.push(format!("?{}", bind_values.len()));
            }
            sql.push_str(&format!(" AND year IN ({})", placeholders.join(", ")));
        }
    }
    sql.push_str(" ORDER BY year, file");

    // Run it
    let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
        bind_values.iter().map(|b| b.as_ref()).collect();
    let conn = conn
        .lock()
        .expect("no panics while holding the connection lock");
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("preparing KWIC query {sql:?}"))?;
    let rows = stmt
        .query_map(bind_refs.as_slice(), |row| {
            Ok(KwicRow {
                file: row.get::<_, String>(0)?.into(),
                year: row.get(1)?,
                context: row.get::<_, String>(2)?.into(),
            })
        })
        .context("starting the KWIC query")?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row.context("decoding one KWIC row")?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("freqdash_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("test_{}_{name}.sqlite", std::process::id()))
    }

    fn seed_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE kwic_newspapers (
                 term TEXT NOT NULL,
                 year INTEGER NOT NULL,
                 file TEXT NOT NULL,
                 context TEXT NOT NULL
             );
             INSERT INTO kwic_newspapers VALUES
                ('adel', 1700, 'riksdag_1700.txt', 'om adel och borgare'),
                ('adel', 1701, 'riksdag_1701.txt', 'adels privilegier'),
                ('adel', 1701, 'abo_tidning_1701.txt', 'den gamla adeln'),
                ('bonde', 1700, 'riksdag_1700.txt', 'bonde och borgare');",
        )
        .unwrap();
    }

    fn store(name: &str) -> KwicStore {
        let path = temp_db_path(name);
        let _ = std::fs::remove_file(&path);
        seed_db(&path);
        KwicStore::open(&path, "kwic_newspapers").unwrap()
    }

    fn files(rows: &[KwicRow]) -> Vec<&str> {
        rows.iter().map(|row| &*row.file).collect()
    }

    #[test]
    fn missing_database_fails_to_open() {
        let path = temp_db_path("missing");
        let _ = std::fs::remove_file(&path);
        assert!(KwicStore::open(&path, "kwic_newspapers").is_err());
    }

    #[tokio::test]
    async fn empty_selection_reads_all_years() {
        let store = store("all_years");
        let rows = store.lookup("adel", &[]).await.unwrap();
        assert_eq!(
            files(&rows),
            ["riksdag_1700.txt", "abo_tidning_1701.txt", "riksdag_1701.txt"]
        );
    }

    #[tokio::test]
    async fn single_year_is_an_equality_restriction() {
        let store = store("single_year");
        let rows = store.lookup("adel", &[1701]).await.unwrap();
        assert_eq!(
            files(&rows),
            ["abo_tidning_1701.txt", "riksdag_1701.txt"]
        );
        assert!(rows.iter().all(|row| row.year == 1701));
    }

    #[tokio::test]
    async fn several_years_are_a_membership_restriction() {
        let store = store("several_years");
        let rows = store.lookup("bonde", &[1700, 1701, 1700]).await.unwrap();
        assert_eq!(files(&rows), ["riksdag_1700.txt"]);
        assert_eq!(&*rows[0].context, "bonde och borgare");
    }

    #[tokio::test]
    async fn unknown_term_reads_no_rows() {
        let store = store("unknown_term");
        let rows = store.lookup("greve", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn repeated_lookups_are_memoized() {
        let store = store("memoized");
        let first = store.lookup("adel", &[1700]).await.unwrap();
        assert_eq!(store.queries(), 1);
        let second = store.lookup("adel", &[1700]).await.unwrap();
        assert_eq!(store.queries(), 1);
        assert_eq!(first, second);

        // The same years in a different shape are a different query
        store.lookup("adel", &[1700, 1700]).await.unwrap();
        assert_eq!(store.queries(), 2);
    }

    #[tokio::test]
    async fn old_queries_get_forgotten() {
        let store = store("forgotten");
        for i in 0..33 {
            store.lookup(&format!("k{i}"), &[]).await.unwrap();
        }
        assert_eq!(store.queries(), 33);

        // The first query went over the cache capacity and runs again, the
        // most recent one is still memoized
        store.lookup("k0", &[]).await.unwrap();
        assert_eq!(store.queries(), 34);
        store.lookup("k32", &[]).await.unwrap();
        assert_eq!(store.queries(), 34);
    }

    #[tokio::test]
    async fn refresh_suppresses_updates_without_store_or_keyword() {
        let store = store("suppression");
        assert!(matches!(
            refresh(None, "adel", &[1700]).await.unwrap(),
            KwicUpdate::NoChange
        ));
        assert!(matches!(
            refresh(Some(&store), "", &[1700]).await.unwrap(),
            KwicUpdate::NoChange
        ));
        let KwicUpdate::Update(rows) = refresh(Some(&store), "adel", &[1700]).await.unwrap()
        else {
            panic!("a keyword and a store should produce fresh rows");
        };
        assert_eq!(files(&rows), ["riksdag_1700.txt"]);
    }
}

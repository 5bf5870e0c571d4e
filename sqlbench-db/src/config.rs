/// Supported database engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    MySql,
}

impl DbEngine {
    pub fn default_port(self) -> u16 {
        match self {
            DbEngine::Postgres => 5432,
            DbEngine::MySql => 3306,
        }
    }
}

/// Connection and schema-placement settings for one backing store.
///
/// `scale` mirrors the run configuration's scale factor; the strategies need
/// it to size the populated tables.
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub engine: DbEngine,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub username: String,
    pub password: Option<String>,
    /// Create objects in this schema rather than the connection default.
    pub schema: Option<String>,
    /// Create objects in this tablespace rather than the engine default.
    pub tablespace: Option<String>,
    /// Skip write-ahead logging for the benchmark tables where supported.
    pub nologging: bool,
    pub scale: u64,
}

impl DbConfig {
    /// `"myschema."` or `""`, ready to paste in front of a table name.
    pub(crate) fn schema_prefix(&self) -> String {
        self.schema
            .as_deref()
            .map(|schema| format!("{schema}."))
            .unwrap_or_default()
    }

    /// `" TABLESPACE xyz"` or `""`, ready to append to a CREATE statement.
    pub(crate) fn tablespace_clause(&self) -> String {
        self.tablespace
            .as_deref()
            .map(|tablespace| format!(" TABLESPACE {tablespace}"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DbConfig {
        DbConfig {
            engine: DbEngine::Postgres,
            host: "localhost".into(),
            port: DbEngine::Postgres.default_port(),
            dbname: "bench".into(),
            username: "bench".into(),
            password: None,
            schema: None,
            tablespace: None,
            nologging: false,
            scale: 1,
        }
    }

    #[test]
    fn schema_prefix_is_empty_by_default() {
        assert_eq!(config().schema_prefix(), "");

        let mut with_schema = config();
        with_schema.schema = Some("loadtest".into());
        assert_eq!(with_schema.schema_prefix(), "loadtest.");
    }

    #[test]
    fn tablespace_clause_is_empty_by_default() {
        assert_eq!(config().tablespace_clause(), "");

        let mut with_tablespace = config();
        with_tablespace.tablespace = Some("fast_ssd".into());
        assert_eq!(with_tablespace.tablespace_clause(), " TABLESPACE fast_ssd");
    }
}

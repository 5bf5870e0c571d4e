use crate::config::DbConfig;
use crate::{fmt_elapsed, INSERT_BATCH_ROWS, TABLES};
use async_trait::async_trait;
use sqlbench_core::{
    DatabaseStrategy, TransactionExecutor, TxParams, ACCOUNTS_PER_BRANCH, TELLERS_PER_BRANCH,
};
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection, Postgres, QueryBuilder};
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, warn};

/// PostgreSQL implementation of the benchmark schema and transactions.
pub struct PostgresStrategy {
    config: DbConfig,
}

impl PostgresStrategy {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> anyhow::Result<PgConnection> {
        let mut opts = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.dbname)
            .username(&self.config.username);
        if let Some(password) = self.config.password.as_deref() {
            opts = opts.password(password);
        }
        Ok(opts.connect().await?)
    }

    fn create_table_stmts(&self) -> [String; 4] {
        let unlogged = if self.config.nologging { "UNLOGGED " } else { "" };
        let prefix = self.config.schema_prefix();
        let tablespace = self.config.tablespace_clause();
        [
            format!(
                "CREATE {unlogged}TABLE {prefix}bench_branches \
                 (bid BIGINT NOT NULL, bbalance INTEGER){tablespace}"
            ),
            format!(
                "CREATE {unlogged}TABLE {prefix}bench_tellers \
                 (tid BIGINT NOT NULL, bid BIGINT NOT NULL, tbalance INTEGER){tablespace}"
            ),
            format!(
                "CREATE {unlogged}TABLE {prefix}bench_accounts \
                 (aid BIGINT NOT NULL, bid BIGINT NOT NULL, abalance INTEGER){tablespace}"
            ),
            format!(
                "CREATE {unlogged}TABLE {prefix}bench_history \
                 (tid BIGINT NOT NULL, bid BIGINT NOT NULL, aid BIGINT NOT NULL, \
                 delta INTEGER, mtime TIMESTAMP(6)){tablespace}"
            ),
        ]
    }

    fn create_index_stmts(&self) -> [String; 3] {
        let prefix = self.config.schema_prefix();
        let tablespace = self.config.tablespace_clause();
        [
            format!(
                "CREATE UNIQUE INDEX bench_branches_pk ON {prefix}bench_branches (bid){tablespace}"
            ),
            format!(
                "CREATE UNIQUE INDEX bench_tellers_pk ON {prefix}bench_tellers (tid){tablespace}"
            ),
            format!(
                "CREATE UNIQUE INDEX bench_accounts_pk ON {prefix}bench_accounts (aid){tablespace}"
            ),
        ]
    }

    async fn drop_tables(&self, conn: &mut PgConnection) -> anyhow::Result<()> {
        info!("Dropping tables...");
        let start = Instant::now();
        let prefix = self.config.schema_prefix();
        for table in TABLES {
            let sql = format!("DROP TABLE IF EXISTS {prefix}{table} CASCADE");
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
        info!("done! ({})", fmt_elapsed(start.elapsed()));
        Ok(())
    }

    async fn create_tables(&self, conn: &mut PgConnection) -> anyhow::Result<()> {
        info!("Creating tables...");
        let start = Instant::now();
        for sql in self.create_table_stmts() {
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
        info!("done! ({})", fmt_elapsed(start.elapsed()));
        Ok(())
    }

    async fn populate_tables(&self, conn: &mut PgConnection) -> anyhow::Result<()> {
        info!("Populating tables...");
        let start = Instant::now();
        let prefix = self.config.schema_prefix();
        let scale = self.config.scale;

        let mut next = 1u64;
        while next <= scale {
            let end = (next + INSERT_BATCH_ROWS - 1).min(scale);
            let mut qb =
                QueryBuilder::<Postgres>::new(format!("INSERT INTO {prefix}bench_branches VALUES "));
            qb.push_values(next..=end, |mut row, bid| {
                row.push_bind(bid as i64).push_bind(0i32);
            });
            qb.build().execute(&mut *conn).await?;
            next = end + 1;
        }

        let tellers = scale * TELLERS_PER_BRANCH;
        let mut next = 1u64;
        while next <= tellers {
            let end = (next + INSERT_BATCH_ROWS - 1).min(tellers);
            let mut qb =
                QueryBuilder::<Postgres>::new(format!("INSERT INTO {prefix}bench_tellers VALUES "));
            qb.push_values(next..=end, |mut row, tid| {
                row.push_bind(tid as i64)
                    .push_bind(((tid - 1) / TELLERS_PER_BRANCH + 1) as i64)
                    .push_bind(0i32);
            });
            qb.build().execute(&mut *conn).await?;
            next = end + 1;
        }

        let accounts = scale * ACCOUNTS_PER_BRANCH;
        let mut next = 1u64;
        while next <= accounts {
            let end = (next + INSERT_BATCH_ROWS - 1).min(accounts);
            let mut qb =
                QueryBuilder::<Postgres>::new(format!("INSERT INTO {prefix}bench_accounts VALUES "));
            qb.push_values(next..=end, |mut row, aid| {
                row.push_bind(aid as i64)
                    .push_bind(((aid - 1) / ACCOUNTS_PER_BRANCH + 1) as i64)
                    .push_bind(0i32);
            });
            qb.build().execute(&mut *conn).await?;
            debug!("{end} accounts inserted...");
            next = end + 1;
        }

        info!("done! ({})", fmt_elapsed(start.elapsed()));
        Ok(())
    }

    async fn create_indexes(&self, conn: &mut PgConnection) -> anyhow::Result<()> {
        info!("Creating indexes...");
        let start = Instant::now();
        for sql in self.create_index_stmts() {
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
        info!("done! ({})", fmt_elapsed(start.elapsed()));
        Ok(())
    }

    async fn analyze_tables(&self, conn: &mut PgConnection) -> anyhow::Result<()> {
        info!("Analyzing...");
        let start = Instant::now();
        let prefix = self.config.schema_prefix();
        for table in TABLES {
            let sql = format!("VACUUM ANALYZE {prefix}{table}");
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
        info!("done! ({})", fmt_elapsed(start.elapsed()));
        Ok(())
    }
}

#[async_trait]
impl DatabaseStrategy for PostgresStrategy {
    async fn prepare(&self) -> anyhow::Result<()> {
        let mut conn = self.connect().await?;
        self.drop_tables(&mut conn).await?;
        self.create_tables(&mut conn).await?;
        self.populate_tables(&mut conn).await?;
        self.create_indexes(&mut conn).await?;
        self.analyze_tables(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    async fn cleanup(&self) -> anyhow::Result<()> {
        let mut conn = self.connect().await?;
        self.drop_tables(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    async fn executor(&self) -> anyhow::Result<Box<dyn TransactionExecutor>> {
        let conn = self.connect().await?;
        Ok(Box::new(PostgresExecutor::new(
            conn,
            &self.config.schema_prefix(),
        )))
    }
}

/// Executes the TPC-B-style transaction over one privately-owned connection.
///
/// Statement text is rendered once at construction so sqlx's per-connection
/// statement cache is effective across iterations.
struct PostgresExecutor {
    conn: PgConnection,
    update_accounts: String,
    select_accounts: String,
    update_tellers: String,
    update_branches: String,
    insert_history: String,
}

impl PostgresExecutor {
    fn new(conn: PgConnection, prefix: &str) -> Self {
        Self {
            conn,
            update_accounts: format!(
                "UPDATE {prefix}bench_accounts SET abalance = abalance + $1 WHERE aid = $2"
            ),
            select_accounts: format!("SELECT abalance FROM {prefix}bench_accounts WHERE aid = $1"),
            update_tellers: format!(
                "UPDATE {prefix}bench_tellers SET tbalance = tbalance + $1 WHERE tid = $2"
            ),
            update_branches: format!(
                "UPDATE {prefix}bench_branches SET bbalance = bbalance + $1 WHERE bid = $2"
            ),
            insert_history: format!(
                "INSERT INTO {prefix}bench_history (tid, bid, aid, delta, mtime) \
                 VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP)"
            ),
        }
    }
}

#[async_trait]
impl TransactionExecutor for PostgresExecutor {
    async fn execute_write(&mut self, tx: &TxParams) -> anyhow::Result<()> {
        let mut dbtx = self.conn.begin().await?;

        sqlx::query(&self.update_accounts)
            .bind(tx.delta as i32)
            .bind(tx.account as i64)
            .execute(&mut *dbtx)
            .await?;
        let _abalance: i32 = sqlx::query_scalar(&self.select_accounts)
            .bind(tx.account as i64)
            .fetch_one(&mut *dbtx)
            .await?;
        sqlx::query(&self.update_tellers)
            .bind(tx.delta as i32)
            .bind(tx.teller as i64)
            .execute(&mut *dbtx)
            .await?;
        sqlx::query(&self.update_branches)
            .bind(tx.delta as i32)
            .bind(tx.branch as i64)
            .execute(&mut *dbtx)
            .await?;
        sqlx::query(&self.insert_history)
            .bind(tx.teller as i64)
            .bind(tx.branch as i64)
            .bind(tx.account as i64)
            .bind(tx.delta as i32)
            .execute(&mut *dbtx)
            .await?;

        dbtx.commit().await?;
        Ok(())
    }

    async fn execute_read_only(&mut self, tx: &TxParams) -> anyhow::Result<()> {
        let _abalance: i32 = sqlx::query_scalar(&self.select_accounts)
            .bind(tx.account as i64)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbEngine;

    fn strategy(nologging: bool, schema: Option<&str>, tablespace: Option<&str>) -> PostgresStrategy {
        PostgresStrategy::new(DbConfig {
            engine: DbEngine::Postgres,
            host: "localhost".into(),
            port: 5432,
            dbname: "bench".into(),
            username: "bench".into(),
            password: None,
            schema: schema.map(Into::into),
            tablespace: tablespace.map(Into::into),
            nologging,
            scale: 1,
        })
    }

    #[test]
    fn nologging_renders_unlogged_tables() {
        let stmts = strategy(true, None, None).create_table_stmts();
        assert!(stmts.iter().all(|sql| sql.starts_with("CREATE UNLOGGED TABLE ")));

        let stmts = strategy(false, None, None).create_table_stmts();
        assert!(stmts.iter().all(|sql| sql.starts_with("CREATE TABLE ")));
    }

    #[test]
    fn schema_and_tablespace_are_applied() {
        let stmts = strategy(false, Some("loadtest"), Some("fast_ssd")).create_table_stmts();
        assert!(stmts[0].contains("loadtest.bench_branches"));
        assert!(stmts[0].ends_with(" TABLESPACE fast_ssd"));

        let indexes = strategy(false, Some("loadtest"), None).create_index_stmts();
        assert!(indexes[2].contains("ON loadtest.bench_accounts (aid)"));
    }
}

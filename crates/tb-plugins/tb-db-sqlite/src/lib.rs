//! # tb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite `tickets` table
//! and the `tb-core` domain models, and compiles [`FilterClause`]s into SQL.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tb_core::filter::{FilterClause, TicketFilter};
use tb_core::models::{NewTicket, PaginationMeta, Ticket, TicketPage};
use tb_core::pagination::PageRequest;
use tb_core::traits::TicketRepo;

const TICKET_COLUMNS: &str =
    "SELECT id, title, content, user_email, creation_time, labels, created_at, updated_at FROM tickets";

pub struct SqliteTicketRepo {
    pool: SqlitePool,
}

impl SqliteTicketRepo {
    /// Connects (creating the database file if needed) and runs migrations.
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Every `:memory:` connection is a separate database, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::migrate!().run(&pool).await?;
        log::debug!("tickets schema is up to date");
        Ok(Self { pool })
    }
}

/// Appends the WHERE clause for `filter`. Terms are ASCII-lowercased by the
/// filter builder, which is exactly what SQLite's `LOWER` does to the column.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TicketFilter) {
    qb.push(" WHERE 1 = 1");

    for clause in filter.clauses() {
        match clause {
            FilterClause::TitleContains(term) => {
                qb.push(" AND instr(LOWER(title), ")
                    .push_bind(term.clone())
                    .push(") > 0");
            }
            FilterClause::CreatedAfter(ms) => {
                qb.push(" AND creation_time > ").push_bind(*ms);
            }
            FilterClause::CreatedBefore(ms) => {
                qb.push(" AND creation_time < ").push_bind(*ms);
            }
            FilterClause::ReporterContains(term) => {
                qb.push(" AND instr(LOWER(user_email), ")
                    .push_bind(term.clone())
                    .push(") > 0");
            }
            FilterClause::LabelsAny(tokens) => {
                qb.push(
                    " AND EXISTS (SELECT 1 FROM json_each(\
                     CASE WHEN json_valid(tickets.labels) THEN tickets.labels ELSE '[]' END\
                     ) AS label WHERE ",
                );
                {
                    let mut any = qb.separated(" OR ");
                    for token in tokens {
                        any.push("instr(LOWER(label.value), ")
                            .push_bind_unseparated(token.clone())
                            .push_unseparated(") > 0");
                    }
                }
                qb.push(")");
            }
        }
    }
}

fn row_to_ticket(row: &SqliteRow) -> Result<Ticket, sqlx::Error> {
    let labels: Option<String> = row.try_get("labels")?;
    Ok(Ticket {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        user_email: row.try_get("user_email")?,
        creation_time: row.try_get("creation_time")?,
        labels: labels
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn insert_rows(
    conn: &mut SqliteConnection,
    tickets: Vec<NewTicket>,
    now: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let mut inserted = 0;
    for ticket in tickets {
        let result = sqlx::query(
            "INSERT INTO tickets (id, title, content, user_email, creation_time, labels, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(ticket.id)
        .bind(ticket.title)
        .bind(ticket.content)
        .bind(ticket.user_email)
        .bind(ticket.creation_time)
        .bind(serde_json::to_string(&ticket.labels)?)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

#[async_trait]
impl TicketRepo for SqliteTicketRepo {
    /// One COUNT over the filtered set, then one SELECT for the page window.
    async fn search(&self, filter: &TicketFilter, page: &PageRequest) -> anyhow::Result<TicketPage> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tickets");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(TICKET_COLUMNS);
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY creation_time DESC, id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let data = select
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_ticket)
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "ticket search: {} clause(s), page {} -> {} of {} row(s)",
            filter.clauses().len(),
            page.page,
            data.len(),
            total
        );

        Ok(TicketPage {
            data,
            meta: PaginationMeta::new(total, page.page_size, page.page),
        })
    }

    async fn insert_many(&self, tickets: Vec<NewTicket>) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;
        let inserted = insert_rows(&mut *tx, tickets, Utc::now()).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    /// Atomic swap of the whole dataset.
    ///
    /// # Developer Note
    /// The delete and the inserts share one transaction so a bad record leaves
    /// the previous dataset in place instead of an empty table.
    async fn replace_all(&self, tickets: Vec<NewTicket>) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM tickets")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let inserted = insert_rows(&mut *tx, tickets, Utc::now()).await?;
        tx.commit().await?;

        log::info!("replaced {removed} ticket(s) with {inserted}");
        Ok(inserted)
    }
}

//! Document table migration runner for SiteBook.
//!
//! Reads `DATABASE_URL` (SQLite or Postgres).
//!
//! Usage:
//!   migrator up      - Create the documents table
//!   migrator down    - Drop it again
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop everything and re-run migrations

use sea_orm_migration::prelude::*;
use sitebook_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI sets up its own tracing.
    cli::run_cli(Migrator).await;
}

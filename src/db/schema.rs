//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// The `quotes` table: identity key plus bounded author/text columns. The
/// seed path only ever appends; rows are never updated or deleted here.
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY NOT NULL,
    author TEXT NOT NULL CHECK (length(author) <= 255),
    text TEXT NOT NULL CHECK (length(text) <= 2000)
);
"#;

use serde::Serialize;

/// A persisted quote row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct QuoteRow {
    pub id: i64,
    pub author: String,
    pub text: String,
}

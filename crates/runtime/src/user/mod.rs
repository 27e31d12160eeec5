mod quota;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use strum_macros::{Display, EnumString};

use promptdraw_database::TableSchema;

pub use quota::UserQuota;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Display, EnumString, Default)]
#[derive(sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    Admin,
    Contributor,
    #[default]
    User,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub created_at: i64,
}

impl User {
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            role,
            created_at: promptdraw_common::get_current_timestamp(),
        }
    }
}

impl TableSchema for User {
    const TABLE_NAME: &'static str = "users";
    const INDEXES_SQL: &'static [&'static str] = &[];

    fn create_table_sql() -> String {
        r#"CREATE TABLE IF NOT EXISTS "users" (
            id UUID PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'user',
            created_at BIGINT NOT NULL DEFAULT floor(extract(epoch from now()))
        )"#.to_string()
    }
}

/// Schema description of a table owned by the application.
///
/// Implementations live next to the row types; `init_databases!` walks the
/// registered types in order when creating or dropping tables, so types with
/// foreign keys must be listed after the tables they reference.
pub trait TableSchema {
    const TABLE_NAME: &'static str;
    const INDEXES_SQL: &'static [&'static str];

    /// `CREATE TABLE IF NOT EXISTS ...` for this type.
    fn create_table_sql() -> String;

    fn drop_table_sql() -> String {
        format!("DROP TABLE IF EXISTS \"{}\" CASCADE;", Self::TABLE_NAME)
    }

    /// Attaches the shared `updated_at` trigger. Empty for append-only tables.
    fn trigger_sql() -> String {
        String::new()
    }
}

/// Shared trigger body that stamps `updated_at` with the unix time of the write.
pub const UPDATED_AT_TRIGGER_FUNCTION_SQL: &str = r#"
CREATE OR REPLACE FUNCTION set_updated_at_unix_timestamp()
RETURNS TRIGGER AS $$
BEGIN NEW.updated_at = floor(extract(epoch from now())); RETURN NEW; END;
$$ language 'plpgsql';
"#;

/// Builds the trigger statements that keep `updated_at` current for `table`.
pub fn updated_at_trigger_sql(table: &str) -> String {
    format!(
        "DROP TRIGGER IF EXISTS set_{table}_updated_at ON \"{table}\"; \
         CREATE TRIGGER set_{table}_updated_at BEFORE UPDATE ON \"{table}\" \
         FOR EACH ROW EXECUTE FUNCTION set_updated_at_unix_timestamp();"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widgets;

    impl TableSchema for Widgets {
        const TABLE_NAME: &'static str = "widgets";
        const INDEXES_SQL: &'static [&'static str] = &[];

        fn create_table_sql() -> String {
            "CREATE TABLE IF NOT EXISTS \"widgets\" (id UUID PRIMARY KEY)".to_string()
        }
    }

    #[test]
    fn test_default_drop_and_trigger_sql() {
        assert_eq!(Widgets::drop_table_sql(), "DROP TABLE IF EXISTS \"widgets\" CASCADE;");
        assert!(Widgets::trigger_sql().is_empty());
    }

    #[test]
    fn test_updated_at_trigger_sql_splits_into_two_statements() {
        let sql = updated_at_trigger_sql("user_quotas");
        let statements: Vec<_> = sql.split(';').filter(|s| !s.trim().is_empty()).collect();
        assert_eq!(statements.len(), 2);
        assert!(statements[1].contains("BEFORE UPDATE ON \"user_quotas\""));
    }
}

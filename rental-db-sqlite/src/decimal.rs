//! Exact decimal columns.
//!
//! Amounts and rates are written as TEXT so no binary rounding happens in
//! storage. Reads also accept INTEGER and REAL, which is what SQLite keeps
//! when a row was typed in by hand or seeded with bare numeric literals.

use std::fmt::Display;
use std::str::FromStr;

use rental_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Row, TypeInfo, ValueRef};

fn column_error(
    column: &str,
    what: impl Display,
) -> RepositoryError {
    RepositoryError::Database(format!("{what} (column '{column}')"))
}

fn raw<'r>(
    row: &'r SqliteRow,
    column: &str,
) -> Result<SqliteValueRef<'r>, RepositoryError> {
    row.try_get_raw(column)
        .map_err(|e| RepositoryError::Database(format!("Column '{column}' not found: {e}")))
}

/// Reads `column` as a [`Decimal`]. NULL reads as zero.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    let storage = raw(row, column)?.type_info().name().to_string();

    match storage.as_str() {
        "NULL" => Ok(Decimal::ZERO),
        "TEXT" => {
            let text: String = row.try_get(column).map_err(|e| column_error(column, e))?;
            Decimal::from_str(text.trim())
                .map_err(|e| column_error(column, format!("Invalid decimal '{text}': {e}")))
        }
        "INTEGER" => row
            .try_get::<i64, _>(column)
            .map(Decimal::from)
            .map_err(|e| column_error(column, e)),
        "REAL" => {
            let real: f64 = row.try_get(column).map_err(|e| column_error(column, e))?;
            Decimal::try_from(real).map_err(|e| column_error(column, format!("{real} is not a decimal: {e}")))
        }
        other => Err(RepositoryError::Database(format!(
            "Unexpected type '{other}' for column '{column}'"
        ))),
    }
}

/// Like [`get_decimal`] but NULL reads as `None` (open-ended bracket bounds).
pub fn get_optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    if raw(row, column)?.is_null() {
        return Ok(None);
    }
    get_decimal(row, column).map(Some)
}

/// TEXT storage form, without trailing zeros.
pub fn decimal_to_text(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn decimal_table() -> sqlx::sqlite::SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        sqlx::query(
            "CREATE TABLE amounts (
                id INTEGER PRIMARY KEY,
                text_value TEXT,
                int_value INTEGER,
                real_value REAL,
                blob_value BLOB
            )",
        )
        .execute(&pool)
        .await
        .expect("Failed to create amounts table");
        pool
    }

    async fn fetch_row(pool: &sqlx::sqlite::SqlitePool, insert: &str) -> sqlx::sqlite::SqliteRow {
        sqlx::query(insert)
            .execute(pool)
            .await
            .expect("Failed to insert row");
        sqlx::query("SELECT * FROM amounts WHERE id = 1")
            .fetch_one(pool)
            .await
            .expect("Failed to fetch row")
    }

    // ========================================================================
    // get_decimal
    // ========================================================================

    #[tokio::test]
    async fn test_get_decimal_from_text_keeps_exact_value() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id, text_value) VALUES (1, '0.172')").await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(0.172)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_negative_text() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id, text_value) VALUES (1, '-1600.50')").await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(dec!(-1600.50)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_integer() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id, int_value) VALUES (1, 11294)").await;

        assert_eq!(get_decimal(&row, "int_value"), Ok(dec!(11294)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_real() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id, real_value) VALUES (1, 123.45)").await;

        assert_eq!(get_decimal(&row, "real_value"), Ok(dec!(123.45)));
    }

    #[tokio::test]
    async fn test_get_decimal_from_null_returns_zero() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id) VALUES (1)").await;

        assert_eq!(get_decimal(&row, "text_value"), Ok(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_get_decimal_rejects_non_numeric_text() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id, text_value) VALUES (1, 'abc')").await;

        let result = get_decimal(&row, "text_value");

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Invalid decimal 'abc'")));
    }

    #[tokio::test]
    async fn test_get_decimal_unexpected_type() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id, blob_value) VALUES (1, x'00ff')").await;

        assert_eq!(
            get_decimal(&row, "blob_value"),
            Err(RepositoryError::Database(
                "Unexpected type 'BLOB' for column 'blob_value'".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_get_decimal_column_not_found() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id) VALUES (1)").await;

        let result = get_decimal(&row, "nonexistent_column");

        assert!(matches!(result, Err(RepositoryError::Database(msg)) if msg.starts_with("Column 'nonexistent_column' not found:")));
    }

    // ========================================================================
    // get_optional_decimal
    // ========================================================================

    #[tokio::test]
    async fn test_get_optional_decimal_from_text() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id, text_value) VALUES (1, '177106')").await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(Some(dec!(177106))));
    }

    #[tokio::test]
    async fn test_get_optional_decimal_from_null_returns_none() {
        let pool = decimal_table().await;
        let row = fetch_row(&pool, "INSERT INTO amounts (id) VALUES (1)").await;

        assert_eq!(get_optional_decimal(&row, "text_value"), Ok(None));
    }

    // ========================================================================
    // decimal_to_text
    // ========================================================================

    #[test]
    fn test_decimal_to_text_drops_trailing_zeros() {
        assert_eq!(decimal_to_text(dec!(0.10)), "0.1");
        assert_eq!(decimal_to_text(dec!(11294.00)), "11294");
        assert_eq!(decimal_to_text(dec!(-42.50)), "-42.5");
    }
}

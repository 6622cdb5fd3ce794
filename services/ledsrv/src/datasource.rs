//! Scalar data source
//!
//! Each display names a query; the first column of the first row is the value
//! shown on the display. Query text is executed verbatim.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use tracing::debug;

use crate::error::DataSourceError;

/// Source of display values
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Run `query` and return its first column of the first row as trimmed
    /// text; `None` when there is no row, the column is NULL, or it is blank.
    async fn fetch_scalar(&self, query: &str) -> Result<Option<String>, DataSourceError>;
}

/// SQL data source over a lazily connected `sqlx` Any pool
///
/// The URL scheme picks the driver (`sqlite://`, `postgres://`, `mysql://`).
#[derive(Debug, Clone)]
pub struct SqlDataSource {
    pool: AnyPool,
}

impl SqlDataSource {
    /// Create the pool without connecting; connections open on first query
    pub fn connect_lazy(url: &str, acquire_timeout: Duration) -> Result<Self, DataSourceError> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(url)
            .map_err(|e| DataSourceError::Connection(format!("{}: {}", redact(url), e)))?;

        debug!("Data source pool created for {}", redact(url));
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl DataSource for SqlDataSource {
    async fn fetch_scalar(&self, query: &str) -> Result<Option<String>, DataSourceError> {
        let row = sqlx::query(query).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => first_column_text(&row),
            None => Ok(None),
        }
    }
}

/// First column as text: strings as-is, numbers in decimal
fn first_column_text(row: &AnyRow) -> Result<Option<String>, DataSourceError> {
    if row.columns().is_empty() {
        return Ok(None);
    }

    let text = if let Ok(value) = row.try_get::<Option<String>, _>(0) {
        value
    } else if let Ok(value) = row.try_get::<Option<i64>, _>(0) {
        value.map(|v| v.to_string())
    } else if let Ok(value) = row.try_get::<Option<f64>, _>(0) {
        value.map(|v| v.to_string())
    } else if let Ok(value) = row.try_get::<Option<bool>, _>(0) {
        value.map(|v| v.to_string())
    } else {
        return Err(DataSourceError::Query(
            "first column cannot be rendered as text".to_string(),
        ));
    };

    Ok(text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// Hide credentials in a connection URL for logs
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        },
        _ => url.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn memory_source() -> SqlDataSource {
        SqlDataSource::connect_lazy("sqlite::memory:", Duration::from_secs(3)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_text_is_trimmed() {
        let source = memory_source();
        let value = source.fetch_scalar("SELECT '  A11S-12 '").await.unwrap();
        assert_eq!(value.as_deref(), Some("A11S-12"));
    }

    #[tokio::test]
    async fn test_fetch_numbers_render_decimal() {
        let source = memory_source();
        assert_eq!(
            source.fetch_scalar("SELECT 42").await.unwrap().as_deref(),
            Some("42")
        );
        assert_eq!(
            source.fetch_scalar("SELECT 2.5").await.unwrap().as_deref(),
            Some("2.5")
        );
    }

    #[tokio::test]
    async fn test_fetch_no_value_cases() {
        let source = memory_source();
        assert_eq!(source.fetch_scalar("SELECT NULL").await.unwrap(), None);
        assert_eq!(source.fetch_scalar("SELECT '   '").await.unwrap(), None);
        assert_eq!(
            source.fetch_scalar("SELECT 'x' WHERE 1 = 0").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_fetch_query_error() {
        let source = memory_source();
        let err = source
            .fetch_scalar("SELECT masp FROM missing_table")
            .await
            .unwrap_err();
        assert!(matches!(err, DataSourceError::Query(_)));
    }

    #[test]
    fn test_redact_credentials() {
        assert_eq!(
            redact("postgres://scada:secret@db:5432/plant"),
            "postgres://***@db:5432/plant"
        );
        assert_eq!(redact("sqlite://scada.db"), "sqlite://scada.db");
    }
}

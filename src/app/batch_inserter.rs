use crate::domain::{SqlValue, TableSchema};
use crate::storage::snapshot::{SnapshotTransaction, StoreError};

/// Rows written and statements issued by [`insert_in_chunks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertProgress {
    pub inserted: u64,
    pub chunks: usize,
}

/// Writes `rows` in input order, one multi-row INSERT per chunk of at most
/// `schema.chunk_size()` rows. Stops at the first failing chunk.
pub async fn insert_in_chunks(
    tx: &mut dyn SnapshotTransaction,
    table: &str,
    schema: &TableSchema,
    rows: &[Vec<SqlValue>],
) -> Result<InsertProgress, StoreError> {
    let mut progress = InsertProgress::default();
    for chunk in rows.chunks(schema.chunk_size()) {
        let n = tx.insert_rows(table, schema.columns(), chunk).await?;
        progress.inserted += n;
        progress.chunks += 1;
        tracing::debug!(
            table,
            chunk = progress.chunks,
            rows = chunk.len(),
            total = progress.inserted,
            "inserted chunk"
        );
    }
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoercionClass, ColumnSpec};
    use crate::storage::snapshot::{MemorySnapshotStore, SnapshotStore};

    fn rows(n: usize) -> Vec<Vec<SqlValue>> {
        (0..n)
            .map(|i| vec![SqlValue::Text(Some(i.to_string()))])
            .collect()
    }

    fn schema(chunk: usize) -> TableSchema {
        TableSchema::new(vec![ColumnSpec::new("code", CoercionClass::StringTrimmed)], chunk)
            .unwrap()
    }

    #[tokio::test]
    async fn splits_into_contiguous_chunks() {
        let store = MemorySnapshotStore::new();
        store.create_table("t", &["code"]).await;
        let mut tx = store.begin().await.unwrap();

        let progress = insert_in_chunks(tx.as_mut(), "t", &schema(500), &rows(1234))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(progress, InsertProgress { inserted: 1234, chunks: 3 });
        assert_eq!(store.insert_sizes().await, vec![500, 500, 234]);

        let stored = store.rows("t").await.unwrap();
        assert_eq!(stored[0], vec![SqlValue::Text(Some("0".into()))]);
        assert_eq!(stored[1233], vec![SqlValue::Text(Some("1233".into()))]);
    }

    #[tokio::test]
    async fn empty_input_issues_no_statement() {
        let store = MemorySnapshotStore::new();
        store.create_table("t", &["code"]).await;
        let mut tx = store.begin().await.unwrap();

        let progress = insert_in_chunks(tx.as_mut(), "t", &schema(100), &[]).await.unwrap();
        assert_eq!(progress, InsertProgress::default());
        assert!(store.insert_sizes().await.is_empty());
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let store = MemorySnapshotStore::new();
        store.create_table("t", &["code"]).await;
        store.fail_insert_at(Some(2)).await;
        let mut tx = store.begin().await.unwrap();

        let result = insert_in_chunks(tx.as_mut(), "t", &schema(10), &rows(35)).await;
        assert!(result.is_err());
        assert_eq!(store.insert_sizes().await, vec![10]);
    }
}

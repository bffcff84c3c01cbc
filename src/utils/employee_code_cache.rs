use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::directory::{DirectoryAdmin, DirectoryError};

/// true  => employee code is TAKEN
/// Only taken codes are stored; a miss means "ask the directory".
pub static EMPLOYEE_CODE_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

#[inline]
fn normalize(code: &str) -> String {
    code.trim().to_string()
}

/// Mark a single employee code as taken
pub async fn mark_taken(code: &str) {
    EMPLOYEE_CODE_CACHE.insert(normalize(code), true).await;
}

/// Forget a code, e.g. after its employee was deleted
pub async fn forget(code: &str) {
    EMPLOYEE_CODE_CACHE.invalidate(&normalize(code)).await;
}

pub async fn is_taken(code: &str) -> bool {
    EMPLOYEE_CODE_CACHE
        .get(&normalize(code))
        .await
        .unwrap_or(false)
}

/// true  => code AVAILABLE
/// false => code TAKEN
///
/// The unique index on `employees.employee_code` stays the source of truth;
/// this only spares the directory lookup for codes already known to exist.
pub async fn is_code_available(code: &str, directory: &dyn DirectoryAdmin) -> Result<bool, DirectoryError> {
    if is_taken(code).await {
        return Ok(false);
    }

    if directory.find_employee_by_code(&normalize(code)).await?.is_some() {
        mark_taken(code).await;
        return Ok(false);
    }

    Ok(true)
}

/// Batch mark codes as taken
async fn batch_mark(codes: &[String]) {
    let futures: Vec<_> = codes
        .iter()
        .map(|c| EMPLOYEE_CODE_CACHE.insert(normalize(c), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load every existing employee code into the cache (batched)
pub async fn warmup_employee_code_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT employee_code FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row?;
        batch.push(code);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!("Employee code cache warmup complete: {} codes", total_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::model::employee::NewEmployee;
    use crate::model::store::NewStore;

    #[actix_web::test]
    async fn falls_back_to_directory_and_remembers() {
        let directory = InMemoryDirectory::new();
        directory.insert_store(NewStore {
            id: "store-1".into(),
            name: "Tienda Centro".into(),
            address: String::new(),
        });
        directory
            .add_employee(NewEmployee {
                id: "cache-e1".into(),
                employee_code: "CACHE-001".into(),
                name: "Ana".into(),
                store_id: "store-1".into(),
                position: "Empleado".into(),
                phone: String::new(),
                email: String::new(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();

        assert!(!is_taken("CACHE-001").await);
        assert!(!is_code_available("CACHE-001", &directory).await.unwrap());
        assert!(is_taken("CACHE-001").await);

        assert!(is_code_available("CACHE-002", &directory).await.unwrap());

        forget("CACHE-001").await;
        assert!(!is_taken("CACHE-001").await);
    }
}

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::time::Duration;

/// Expected capacity and false-positive rate; a health center has a few
/// hundred accounts, so this is generous.
const FILTER_CAPACITY: usize = 10_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// In-memory view of taken usernames, consulted before hitting the database
/// when provisioning accounts.
///
/// 1. cuckoo filter: a miss means the name is certainly free
/// 2. moka cache: a hit means the name is certainly taken
/// 3. anything else falls through to `SELECT EXISTS`
pub struct UsernameIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, ()>,
}

impl Default for UsernameIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl UsernameIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(FILTER_CAPACITY as u64)
                .time_to_live(Duration::from_secs(86_400))
                .build(),
        }
    }

    #[inline]
    fn normalize(username: &str) -> String {
        username.trim().to_lowercase()
    }

    /// False positives possible, false negatives not.
    pub fn might_exist(&self, username: &str) -> bool {
        let username = Self::normalize(username);
        match self.filter.read() {
            Ok(filter) => filter.contains(&username),
            // a poisoned filter can no longer rule anything out
            Err(_) => true,
        }
    }

    pub async fn mark_taken(&self, username: &str) {
        let username = Self::normalize(username);
        if let Ok(mut filter) = self.filter.write() {
            filter.add(&username);
        }
        self.taken.insert(username, ()).await;
    }

    pub async fn is_known_taken(&self, username: &str) -> bool {
        self.taken.contains_key(&Self::normalize(username))
    }

    /// true => username AVAILABLE
    pub async fn is_available(&self, username: &str, pool: &MySqlPool) -> bool {
        if !self.might_exist(username) {
            return true;
        }

        if self.is_known_taken(username).await {
            return false;
        }

        let username = Self::normalize(username);
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM app_user WHERE LOWER(username) = ? LIMIT 1)",
        )
        .bind(&username)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Username lookup failed, treating as taken");
            true
        });

        if exists {
            self.taken.insert(username, ()).await;
        }

        !exists
    }

    /// Streams every existing username into the filter and cache.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT username FROM app_user").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (username,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(username);
            total += 1;

            if batch.len() == batch_size {
                self.insert_batch(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch).await;
        }

        tracing::info!(total, "Username index warmup complete");
        Ok(())
    }

    async fn insert_batch(&self, usernames: &[String]) {
        let normalized: Vec<String> = usernames.iter().map(|u| Self::normalize(u)).collect();

        if let Ok(mut filter) = self.filter.write() {
            for username in &normalized {
                filter.add(username);
            }
        }

        let inserts: Vec<_> = normalized
            .into_iter()
            .map(|u| self.taken.insert(u, ()))
            .collect();
        futures::future::join_all(inserts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn marked_names_are_known_regardless_of_case() {
        let index = UsernameIndex::new();
        assert!(!index.might_exist("jperez"));

        index.mark_taken("JPerez").await;

        assert!(index.might_exist("jperez"));
        assert!(index.is_known_taken(" jperez ").await);
    }

    #[actix_web::test]
    async fn unseen_names_are_available_without_touching_the_database() {
        let index = UsernameIndex::new();
        // never connected: the filter miss must short-circuit before any query
        let pool = MySqlPool::connect_lazy("mysql://nobody@127.0.0.1:1/none").unwrap();
        assert!(index.is_available("mgonzalez", &pool).await);
    }
}

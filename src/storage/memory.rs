//! In-memory object store
//!
//! Keeps objects in a sorted map so listings come back in key order, like
//! S3 does. Continuation tokens are the last key of the previous page.
//! Failures can be injected per operation for handler tests.

use super::{ObjectPage, ObjectRecord, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

const DEFAULT_PAGE_SIZE: usize = 1000;

pub struct MemoryObjectStore {
    bucket: String,
    page_size: usize,
    objects: RwLock<BTreeMap<String, ObjectRecord>>,
    fail_list: AtomicBool,
    fail_presign: AtomicBool,
    fail_delete_keys: RwLock<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            objects: RwLock::new(BTreeMap::new()),
            fail_list: AtomicBool::new(false),
            fail_presign: AtomicBool::new(false),
            fail_delete_keys: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_records(mut self, records: impl IntoIterator<Item = ObjectRecord>) -> Self {
        {
            let objects = self.objects.get_mut();
            for record in records {
                objects.insert(record.key.clone(), record);
            }
        }
        self
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    pub async fn insert(&self, key: &str, size: u64) {
        let record = ObjectRecord::new(key, size, Utc::now());
        self.objects.write().await.insert(key.to_string(), record);
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_presign(&self, fail: bool) {
        self.fail_presign.store(fail, Ordering::SeqCst);
    }

    pub async fn fail_delete_of(&self, key: &str) {
        self.fail_delete_keys.write().await.insert(key.to_string());
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list_page(
        &self,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> StorageResult<ObjectPage> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected list failure".to_string()));
        }

        let objects = self.objects.read().await;
        let start = match &continuation_token {
            Some(token) => Bound::Excluded(token.clone()),
            None => Bound::Unbounded,
        };

        let mut matching = objects
            .range((start, Bound::Unbounded))
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(_, record)| record.clone());

        let records: Vec<ObjectRecord> = matching.by_ref().take(self.page_size).collect();
        let is_truncated = matching.next().is_some();
        let next_continuation_token = if is_truncated {
            records.last().map(|r| r.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            records,
            next_continuation_token,
            is_truncated,
        })
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in_secs: u32,
    ) -> StorageResult<String> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected presign failure".to_string()));
        }

        Ok(format!(
            "memory://{}/{}?X-Amz-Expires={}&content-type={}",
            self.bucket, key, expires_in_secs, content_type
        ))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        if self.fail_delete_keys.read().await.contains(key) {
            return Err(StorageError::Backend(format!("injected delete failure for {}", key)));
        }

        // Missing keys delete fine, as on S3
        self.objects.write().await.remove(key);
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn store_with(keys: &[&str]) -> MemoryObjectStore {
        let store = MemoryObjectStore::new("test-bucket").with_page_size(2);
        for key in keys {
            store.insert(key, 1).await;
        }
        store
    }

    #[tokio::test]
    async fn test_pages_follow_continuation_token() {
        let store = store_with(&["a.txt", "b.txt", "c.txt"]).await;

        let first = store.list_page("", None).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert!(first.is_truncated);
        assert_eq!(first.next_continuation_token.as_deref(), Some("b.txt"));

        let second = store
            .list_page("", first.next_continuation_token)
            .await
            .unwrap();
        assert_eq!(second.records.len(), 1);
        assert_eq!(second.records[0].key, "c.txt");
        assert!(!second.is_truncated);
        assert!(second.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_prefix_filters_keys() {
        let store = store_with(&["docs/a.pdf", "img/b.png", "docs/c.pdf"]).await;
        let page = store.list_page("docs/", None).await.unwrap();
        let keys: Vec<_> = page.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["docs/a.pdf", "docs/c.pdf"]);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = store_with(&["a.txt"]).await;
        store.fail_list(true);
        assert!(store.list_page("", None).await.is_err());

        store.fail_delete_of("a.txt").await;
        assert!(store.delete_object("a.txt").await.is_err());
        assert_eq!(store.keys().await, vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_removes_key() {
        let store = store_with(&["a.txt", "b.txt"]).await;
        assert_ok!(store.delete_object("a.txt").await);
        assert_ok!(store.delete_object("missing.txt").await);
        assert_eq!(store.keys().await, vec!["b.txt".to_string()]);
    }
}

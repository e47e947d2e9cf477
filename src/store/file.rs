use crate::ports::{StoreError, SubscriptionStore};
use crate::types::push::Subscription;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Durable store backed by a single TOML document.
///
/// Every operation re-reads the file so external edits are picked up. Writes
/// go through a temp file and a rename, serialized by an async mutex.
#[derive(Debug, Clone)]
pub struct FileSubscriptionStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    subscriptions: Vec<Subscription>,
}

impl FileSubscriptionStore {
    /// Opens the store, creating the parent directory when needed and
    /// validating any existing document.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let document = read_document(&path).await?;
        debug!(
            path = %path.display(),
            subscriptions = document.subscriptions.len(),
            "opened subscription store"
        );
        Ok(Self {
            path: Arc::new(path),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

type StoreFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

impl SubscriptionStore for FileSubscriptionStore {
    type ListFut<'a>
        = StoreFut<'a, Vec<Subscription>>
    where
        Self: 'a;
    type PutFut<'a>
        = StoreFut<'a, ()>
    where
        Self: 'a;
    type RemoveFut<'a>
        = StoreFut<'a, ()>
    where
        Self: 'a;

    fn list<'a>(&'a self, user_id: &'a str) -> Self::ListFut<'a> {
        Box::pin(async move {
            let document = read_document(&self.path).await?;
            Ok(document
                .subscriptions
                .into_iter()
                .filter(|subscription| subscription.user_id == user_id)
                .collect())
        })
    }

    fn put(&self, subscription: Subscription) -> Self::PutFut<'_> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut document = read_document(&self.path).await?;
            match document
                .subscriptions
                .iter_mut()
                .find(|existing| existing.endpoint == subscription.endpoint)
            {
                Some(existing) => *existing = subscription,
                None => document.subscriptions.push(subscription),
            }
            write_document(&self.path, &document).await
        })
    }

    fn remove_by_endpoint<'a>(&'a self, endpoint: &'a str) -> Self::RemoveFut<'a> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut document = read_document(&self.path).await?;
            let before = document.subscriptions.len();
            document
                .subscriptions
                .retain(|subscription| subscription.endpoint != endpoint);
            if document.subscriptions.len() == before {
                return Ok(());
            }
            write_document(&self.path, &document).await
        })
    }
}

async fn read_document(path: &Path) -> Result<StoreDocument, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoreDocument::default()),
        Err(err) => Err(err.into()),
    }
}

async fn write_document(path: &Path, document: &StoreDocument) -> Result<(), StoreError> {
    let contents = toml::to_string(document)?;
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    tokio::fs::write(&temp, contents).await?;
    tokio::fs::rename(&temp, path).await?;
    Ok(())
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::store::test_support::{create_temp_root, subscription};

    #[tokio::test]
    async fn open__should_treat_missing_file_as_empty() {
        // Given
        let root = create_temp_root("missing");
        let path = root.join("nested").join("subscriptions.toml");

        // When
        let store = FileSubscriptionStore::open(&path).await.expect("open");

        // Then
        assert!(store.list("patient").await.expect("list").is_empty());
        assert!(!path.exists());

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn put__should_persist_across_reopen() {
        // Given
        let root = create_temp_root("persist");
        let path = root.join("subscriptions.toml");
        let store = FileSubscriptionStore::open(&path).await.expect("open");
        let mut stored = subscription("patient", "https://push.example/a");
        stored.expiration_time = Some(1_700_000_000_000);

        // When
        store.put(stored.clone()).await.expect("put");
        store
            .put(subscription("patient", "https://push.example/b"))
            .await
            .expect("put");
        let reopened = FileSubscriptionStore::open(&path).await.expect("reopen");

        // Then
        let listed = reopened.list("patient").await.expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], stored);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn put__should_not_duplicate_known_endpoint() {
        // Given
        let root = create_temp_root("upsert");
        let store = FileSubscriptionStore::open(root.join("subscriptions.toml"))
            .await
            .expect("open");
        store
            .put(subscription("patient", "https://push.example/a"))
            .await
            .expect("put");
        let mut updated = subscription("patient", "https://push.example/a");
        updated.keys.p256dh = "rotated".to_string();

        // When
        store.put(updated).await.expect("put again");

        // Then
        let listed = store.list("patient").await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].keys.p256dh, "rotated");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn remove_by_endpoint__should_delete_only_matching_endpoint() {
        // Given
        let root = create_temp_root("remove");
        let store = FileSubscriptionStore::open(root.join("subscriptions.toml"))
            .await
            .expect("open");
        store
            .put(subscription("patient", "https://push.example/a"))
            .await
            .expect("put");
        store
            .put(subscription("patient", "https://push.example/b"))
            .await
            .expect("put");

        // When
        store
            .remove_by_endpoint("https://push.example/a")
            .await
            .expect("remove");
        store
            .remove_by_endpoint("https://push.example/unknown")
            .await
            .expect("remove unknown");

        // Then
        let listed = store.list("patient").await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].endpoint, "https://push.example/b");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn list__should_fail_on_corrupt_document() {
        // Given
        let root = create_temp_root("corrupt");
        let path = root.join("subscriptions.toml");
        let store = FileSubscriptionStore::open(&path).await.expect("open");
        std::fs::write(&path, "subscriptions = [[[").expect("write corrupt");

        // When
        let result = store.list("patient").await;

        // Then
        assert!(matches!(result, Err(StoreError::Decode(_))));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }
}

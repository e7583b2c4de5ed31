use crate::Result;

/// A string key/value store that the ledger persists its documents into. Every call completes
/// its write before returning.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if nothing has been stored there.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a key that does not exist is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}

#[cfg(test)]
pub(crate) use memory::MemoryStorage;

#[cfg(test)]
mod memory {
    use super::Storage;
    use crate::Result;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// An in-memory `Storage` for tests.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStorage {
        items: Mutex<HashMap<String, String>>,
    }

    impl MemoryStorage {
        pub(crate) fn raw(&self, key: &str) -> Option<String> {
            self.items.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait::async_trait]
    impl Storage for MemoryStorage {
        async fn get_item(&self, key: &str) -> Result<Option<String>> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<()> {
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove_item(&self, key: &str) -> Result<()> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }
}

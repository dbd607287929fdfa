use crate::utils::Result;

/// Durable string key-value storage, the local-storage backing for sessions
/// and preferences.
///
/// Writes replace the whole value for a key; readers never observe a
/// partially written value.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `Ok(None)` if the key was never written or was removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the key; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

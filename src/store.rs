use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Location of one setting: schema id, optional relocatable path, key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingAddress {
    pub schema: String,
    pub path: Option<String>,
    pub key: String,
}

impl SettingAddress {
    pub fn new(schema: &str, key: &str) -> Self {
        Self {
            schema: schema.to_string(),
            path: None,
            key: key.to_string(),
        }
    }

    /// Address of a key under a relocatable schema mounted at `path`
    pub fn relocatable(schema: &str, path: &str, key: &str) -> Self {
        Self {
            schema: schema.to_string(),
            path: Some(path.to_string()),
            key: key.to_string(),
        }
    }

    /// The `schema` or `schema:path` form understood by `gsettings`
    pub fn schema_arg(&self) -> String {
        match &self.path {
            Some(path) => format!("{}:{}", self.schema, path),
            None => self.schema.clone(),
        }
    }
}

impl fmt::Display for SettingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.schema_arg(), self.key)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to read {address}: {reason}")]
    Read { address: String, reason: String },

    #[error("Failed to write {address}: {reason}")]
    Write { address: String, reason: String },

    #[error("Required tool not found: {tool}")]
    ToolMissing { tool: String },
}

/// Session configuration store holding values in their serialized text form.
///
/// Writes must be visible to later reads through the same handle.
pub trait ConfigStore {
    fn get(&self, address: &SettingAddress) -> Result<String, StoreError>;

    fn set(&mut self, address: &SettingAddress, value: &str) -> Result<(), StoreError>;
}

impl<S: ConfigStore + ?Sized> ConfigStore for &mut S {
    fn get(&self, address: &SettingAddress) -> Result<String, StoreError> {
        (**self).get(address)
    }

    fn set(&mut self, address: &SettingAddress, value: &str) -> Result<(), StoreError> {
        (**self).set(address, value)
    }
}

impl<S: ConfigStore + ?Sized> ConfigStore for Box<S> {
    fn get(&self, address: &SettingAddress) -> Result<String, StoreError> {
        (**self).get(address)
    }

    fn set(&mut self, address: &SettingAddress, value: &str) -> Result<(), StoreError> {
        (**self).set(address, value)
    }
}

/// Passes reads through to the wrapped store but keeps writes in memory.
///
/// Used for `--dry-run`: later reads see the pending writes so a whole
/// flow can be previewed without touching the session.
pub struct DryRunStore<S> {
    inner: S,
    overlay: HashMap<SettingAddress, String>,
}

impl<S: ConfigStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            overlay: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }
}

impl<S: ConfigStore> ConfigStore for DryRunStore<S> {
    fn get(&self, address: &SettingAddress) -> Result<String, StoreError> {
        match self.overlay.get(address) {
            Some(value) => Ok(value.clone()),
            None => self.inner.get(address),
        }
    }

    fn set(&mut self, address: &SettingAddress, value: &str) -> Result<(), StoreError> {
        log::info!("[dry-run] would set {} to {}", address, value);
        self.overlay.insert(address.clone(), value.to_string());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[test]
    fn schema_arg_includes_path_for_relocatable_schemas() {
        let plain = SettingAddress::new("org.gnome.shell.keybindings", "message-list-toggle");
        assert_eq!(plain.schema_arg(), "org.gnome.shell.keybindings");

        let slot = SettingAddress::relocatable("a.b.custom", "/x/custom0/", "name");
        assert_eq!(slot.schema_arg(), "a.b.custom:/x/custom0/");
        assert_eq!(slot.to_string(), "a.b.custom:/x/custom0/ name");
    }

    #[test]
    fn dry_run_keeps_writes_out_of_inner_store() {
        let address = SettingAddress::new("s", "k");
        let mut inner = MemoryStore::new().with(address.clone(), "'old'");
        {
            let mut dry = DryRunStore::new(&mut inner);
            dry.set(&address, "'new'").unwrap();
            assert_eq!(dry.get(&address).unwrap(), "'new'");
            assert_eq!(dry.pending_writes(), 1);
        }
        assert_eq!(inner.value(&address), Some("'old'"));
        assert!(inner.writes.is_empty());
    }
}

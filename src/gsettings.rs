use crate::store::{ConfigStore, SettingAddress, StoreError};
use crate::tools::find_tool;
use std::path::PathBuf;
use std::process::Command;

/// Settings store backed by the `gsettings` command line tool.
///
/// Every call blocks until `gsettings` exits. Values are exchanged in
/// GVariant text form, exactly as `gsettings get` prints them.
pub struct GSettings {
    tool: PathBuf,
}

impl GSettings {
    pub fn new() -> Result<Self, StoreError> {
        let tool = find_tool("gsettings").ok_or_else(|| StoreError::ToolMissing {
            tool: "gsettings".to_string(),
        })?;
        log::debug!("Using {}", tool.display());
        Ok(Self::with_tool(tool))
    }

    /// Use a specific `gsettings` executable
    pub fn with_tool(tool: PathBuf) -> Self {
        Self { tool }
    }

    fn run(&self, args: &[&str]) -> Result<String, String> {
        let output = Command::new(&self.tool)
            .args(args)
            .output()
            .map_err(|e| format!("Failed to run gsettings: {}", e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

impl ConfigStore for GSettings {
    fn get(&self, address: &SettingAddress) -> Result<String, StoreError> {
        self.run(&["get", &address.schema_arg(), &address.key])
            .map_err(|reason| StoreError::Read {
                address: address.to_string(),
                reason,
            })
    }

    fn set(&mut self, address: &SettingAddress, value: &str) -> Result<(), StoreError> {
        log::debug!("gsettings set {} {}", address, value);
        self.run(&["set", &address.schema_arg(), &address.key, value])
            .map(|_| ())
            .map_err(|reason| StoreError::Write {
                address: address.to_string(),
                reason,
            })
    }
}

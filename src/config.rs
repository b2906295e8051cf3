use crate::keybinding_list;
use crate::store::SettingAddress;
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub keybinding: KeybindingConfig,
    pub desktop: DesktopConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    /// Name written into the custom keybinding slot, used to find it again
    pub name: String,
    /// Chord registered when none is given
    pub binding: String,
    /// Stock shortcut that collides with `binding` on Ubuntu
    pub default_shortcut_schema: String,
    pub default_shortcut_key: String,
    pub default_shortcut_binding: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub app_id: String,
    pub display_name: String,
    pub binary_name: String,
    /// Directory name under the user config dir
    pub config_dir_name: String,
    pub package: String,
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            name: "klipBored".to_string(),
            binding: "<Super>v".to_string(),
            default_shortcut_schema: "org.gnome.shell.keybindings".to_string(),
            default_shortcut_key: "message-list-toggle".to_string(),
            default_shortcut_binding: "<Super>v".to_string(),
        }
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            app_id: "io.github.klipbored.app".to_string(),
            display_name: "klipBored".to_string(),
            binary_name: "klipbored".to_string(),
            config_dir_name: "klipBored".to_string(),
            package: "klipbored".to_string(),
        }
    }
}

impl KeybindingConfig {
    pub fn default_shortcut_address(&self) -> SettingAddress {
        SettingAddress::new(&self.default_shortcut_schema, &self.default_shortcut_key)
    }

    /// Value the stock shortcut is put back to once our binding is gone
    pub fn default_shortcut_restore(&self) -> String {
        keybinding_list::encode(&[self.default_shortcut_binding.as_str()])
    }

    /// Whether `binding` steals the stock shortcut's chord
    pub fn overrides_default(&self, binding: &str) -> bool {
        binding == self.default_shortcut_binding
    }
}

impl LifecycleConfig {
    /// Load config from `path`, or use the built-in defaults when none is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: LifecycleConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        Ok(config)
    }
}

/// Per-user locations the application is installed into
#[derive(Debug, Clone)]
pub struct InstallPaths {
    pub config_dir: PathBuf,
    pub autostart_entry: PathBuf,
    pub binary: PathBuf,
    pub desktop_entry: PathBuf,
    pub icon_theme_dir: PathBuf,
    pub icon: PathBuf,
    pub applications_dir: PathBuf,
}

impl InstallPaths {
    /// Resolve paths for the current user
    pub fn for_current_user(desktop: &DesktopConfig) -> Result<Self> {
        let dirs = BaseDirs::new().context("Could not determine home directory")?;
        let bin_dir = dirs
            .executable_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.home_dir().join(".local/bin"));
        Ok(Self::under(dirs.config_dir(), dirs.data_dir(), &bin_dir, desktop))
    }

    pub fn under(config_home: &Path, data_home: &Path, bin_dir: &Path, desktop: &DesktopConfig) -> Self {
        let applications_dir = data_home.join("applications");
        let icon_theme_dir = data_home.join("icons/hicolor");
        let desktop_file = format!("{}.desktop", desktop.app_id);
        Self {
            config_dir: config_home.join(&desktop.config_dir_name),
            autostart_entry: config_home.join("autostart").join(&desktop_file),
            binary: bin_dir.join(&desktop.binary_name),
            desktop_entry: applications_dir.join(&desktop_file),
            icon: icon_theme_dir
                .join("scalable/apps")
                .join(format!("{}.svg", desktop.app_id)),
            icon_theme_dir,
            applications_dir,
        }
    }

    /// File the application reads its chosen binding from
    pub fn keybinding_file(&self) -> PathBuf {
        self.config_dir.join("keybinding")
    }
}

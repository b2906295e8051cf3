use crate::keybinding_list::{parse_string, quote_string};
use crate::store::{ConfigStore, SettingAddress, StoreError};

/// Schema holding the list of custom keybinding slots
pub const MEDIA_KEYS_SCHEMA: &str = "org.gnome.settings-daemon.plugins.media-keys";

/// Key of the slot list inside [`MEDIA_KEYS_SCHEMA`]
pub const CUSTOM_KEYBINDINGS_KEY: &str = "custom-keybindings";

/// Relocatable schema describing one slot
pub const CUSTOM_KEYBINDING_SCHEMA: &str =
    "org.gnome.settings-daemon.plugins.media-keys.custom-keybinding";

/// Directory under which GNOME Settings creates new slots
pub const CUSTOM_KEYBINDINGS_DIR: &str =
    "/org/gnome/settings-daemon/plugins/media-keys/custom-keybindings";

pub fn keybinding_list_address() -> SettingAddress {
    SettingAddress::new(MEDIA_KEYS_SCHEMA, CUSTOM_KEYBINDINGS_KEY)
}

/// Address of one field of the slot at `slot`
pub fn slot_field(slot: &str, field: &str) -> SettingAddress {
    SettingAddress::relocatable(CUSTOM_KEYBINDING_SCHEMA, slot, field)
}

/// Path GNOME Settings would give the slot numbered `index`
pub fn slot_path(index: usize) -> String {
    format!("{}/custom{}/", CUSTOM_KEYBINDINGS_DIR, index)
}

/// One user-defined global shortcut
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeybindingEntry {
    pub name: String,
    pub command: String,
    pub binding: String,
}

impl KeybindingEntry {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn read(store: &impl ConfigStore, slot: &str) -> Result<Self, StoreError> {
        let field = |key: &str| store.get(&slot_field(slot, key)).map(|raw| parse_string(&raw));
        Ok(Self {
            name: field("name")?,
            command: field("command")?,
            binding: field("binding")?,
        })
    }

    /// Write all three fields, attempting each even if an earlier one fails.
    ///
    /// Returns the errors of the writes that were rejected.
    pub fn write(&self, store: &mut impl ConfigStore, slot: &str) -> Vec<StoreError> {
        [
            ("name", &self.name),
            ("command", &self.command),
            ("binding", &self.binding),
        ]
        .into_iter()
        .filter_map(|(key, value)| store.set(&slot_field(slot, key), &quote_string(value)).err())
        .collect()
    }
}

/// Decides whether a slot belongs to the application
#[derive(Debug, Clone)]
pub struct EntryMatcher {
    name: String,
}

impl EntryMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact, case-sensitive comparison of the slot's name.
    /// Unreadable slots are never ours.
    pub fn is_ours(&self, store: &impl ConfigStore, slot: &str) -> bool {
        match store.get(&slot_field(slot, "name")) {
            Ok(raw) => parse_string(&raw) == self.name,
            Err(e) => {
                log::debug!("Treating slot {} as foreign: {}", slot, e);
                false
            }
        }
    }
}

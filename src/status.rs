use crate::config::KeybindingConfig;
use crate::entry::{keybinding_list_address, EntryMatcher, KeybindingEntry};
use crate::keybinding_list;
use crate::store::ConfigStore;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    pub slot: String,
    pub entry: KeybindingEntry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub name: String,
    pub slots: Vec<SlotSummary>,
    pub default_shortcut: Option<String>,
}

/// Read-only view of what is currently registered
pub fn status(store: &impl ConfigStore, config: &KeybindingConfig) -> StatusReport {
    let matcher = EntryMatcher::new(config.name.as_str());

    let slots = store
        .get(&keybinding_list_address())
        .map(|raw| keybinding_list::decode(&raw))
        .unwrap_or_default()
        .into_iter()
        .filter(|slot| matcher.is_ours(store, slot))
        .filter_map(|slot| match KeybindingEntry::read(store, &slot) {
            Ok(entry) => Some(SlotSummary { slot, entry }),
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        })
        .collect();

    StatusReport {
        name: config.name.clone(),
        slots,
        default_shortcut: store.get(&config.default_shortcut_address()).ok(),
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.slots.is_empty() {
            writeln!(f, "No custom keybinding named {:?}.", self.name)?;
        }
        for summary in &self.slots {
            writeln!(
                f,
                "{} -> {} ({})",
                summary.entry.binding, summary.entry.command, summary.slot
            )?;
        }
        match &self.default_shortcut {
            Some(value) => write!(f, "Stock shortcut: {}", value.trim()),
            None => write!(f, "Stock shortcut: unknown"),
        }
    }
}

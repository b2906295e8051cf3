use crate::config::KeybindingConfig;
use crate::entry::{keybinding_list_address, slot_path, EntryMatcher, KeybindingEntry};
use crate::keybinding_list;
use crate::store::{ConfigStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub slot: String,
    /// False when an existing slot with our name was reused
    pub created: bool,
}

/// Point a custom keybinding named after the application at `command`.
///
/// An unreadable slot list is an error: writing a fresh list would drop
/// every other custom shortcut.
///
/// An existing slot carrying our name is reused, otherwise the first free
/// `customN` slot is appended to the list. When `binding` takes the stock
/// shortcut's chord the stock shortcut is disabled, otherwise restored.
pub fn register(
    store: &mut impl ConfigStore,
    config: &KeybindingConfig,
    command: &str,
    binding: &str,
) -> Result<Registration, StoreError> {
    let matcher = EntryMatcher::new(config.name.as_str());
    let list_address = keybinding_list_address();

    let mut slots = keybinding_list::decode(&store.get(&list_address)?);

    let existing = slots
        .iter()
        .find(|slot| matcher.is_ours(&*store, slot))
        .cloned();

    let registration = match existing {
        Some(slot) => {
            log::info!("Reusing custom keybinding at {}", slot);
            Registration { slot, created: false }
        }
        None => {
            let slot = first_free_slot(&slots);
            log::info!("Adding custom keybinding at {}", slot);
            slots.push(slot.clone());
            store.set(&list_address, &keybinding_list::encode(&slots))?;
            Registration { slot, created: true }
        }
    };

    let entry = KeybindingEntry {
        name: config.name.clone(),
        command: command.to_string(),
        binding: binding.to_string(),
    };
    if let Some(e) = entry.write(store, &registration.slot).into_iter().next() {
        return Err(e);
    }

    let default_shortcut = if config.overrides_default(binding) {
        log::info!("{} takes over {}, disabling it", binding, config.default_shortcut_address());
        keybinding_list::encode::<&str>(&[])
    } else {
        config.default_shortcut_restore()
    };
    store.set(&config.default_shortcut_address(), &default_shortcut)?;

    Ok(registration)
}

fn first_free_slot(slots: &[String]) -> String {
    (0..)
        .map(slot_path)
        .find(|candidate| !slots.contains(candidate))
        .unwrap_or_else(|| slot_path(slots.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::slot_field;
    use crate::store::memory::MemoryStore;

    fn config() -> KeybindingConfig {
        KeybindingConfig::default()
    }

    #[test]
    fn appends_first_free_slot() {
        let taken = slot_path(0);
        let mut store = MemoryStore::new()
            .with(keybinding_list_address(), &keybinding_list::encode(&[taken.as_str()]))
            .with(slot_field(&taken, "name"), "'Terminal'");

        let registration = register(&mut store, &config(), "/bin/klipbored", "<Super>v").unwrap();

        assert!(registration.created);
        assert_eq!(registration.slot, slot_path(1));
        assert_eq!(
            store.value(&keybinding_list_address()),
            Some(keybinding_list::encode(&[slot_path(0), slot_path(1)]).as_str())
        );
        assert_eq!(
            KeybindingEntry::read(&store, &slot_path(1)).unwrap(),
            KeybindingEntry {
                name: "klipBored".to_string(),
                command: "/bin/klipbored".to_string(),
                binding: "<Super>v".to_string(),
            }
        );
        assert_eq!(store.value(&config().default_shortcut_address()), Some("[]"));
    }

    #[test]
    fn reuses_existing_slot_and_keeps_list() {
        let mut store = MemoryStore::new()
            .with(keybinding_list_address(), "['/mine/']")
            .with(slot_field("/mine/", "name"), "'klipBored'");

        let registration =
            register(&mut store, &config(), "/bin/klipbored", "<Ctrl><Alt>v").unwrap();

        assert_eq!(registration, Registration { slot: "/mine/".to_string(), created: false });
        assert_eq!(store.value(&keybinding_list_address()), Some("['/mine/']"));
        assert_eq!(
            store.value(&config().default_shortcut_address()),
            Some("['<Super>v']")
        );
    }

    #[test]
    fn unreadable_list_is_an_error_and_writes_nothing() {
        let mut store = MemoryStore::new()
            .with(slot_field("/other/", "name"), "'Terminal'");

        let result = register(&mut store, &config(), "/bin/klipbored", "<Super>v");

        assert!(matches!(result, Err(StoreError::Read { .. })));
        assert!(store.writes.is_empty());
        assert_eq!(store.value(&keybinding_list_address()), None);
    }

    #[test]
    fn fills_gaps_in_numbering() {
        let slots = [slot_path(1)];
        assert_eq!(first_free_slot(&slots), slot_path(0));
    }

    #[test]
    fn registration_is_undone_by_deregistration() {
        let mut store = MemoryStore::new().with(keybinding_list_address(), "@as []");
        register(&mut store, &config(), "/bin/klipbored", "<Super>v").unwrap();

        let result = crate::deregister::deregister(&mut store, &config());

        assert_eq!(
            result,
            crate::deregister::Deregistration::Removed { slots: vec![slot_path(0)] }
        );
        assert_eq!(store.value(&keybinding_list_address()), Some("[]"));
        assert_eq!(
            store.value(&config().default_shortcut_address()),
            Some("['<Super>v']")
        );
    }
}

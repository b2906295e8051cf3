use crate::config::KeybindingConfig;
use crate::entry::{keybinding_list_address, EntryMatcher, KeybindingEntry};
use crate::keybinding_list;
use crate::store::ConfigStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deregistration {
    /// Slots that carried our name, in list order
    Removed { slots: Vec<String> },
    NotFound,
}

impl Deregistration {
    /// The one line shown to the user
    pub fn status_line(&self, dry_run: bool) -> &'static str {
        match self {
            Deregistration::Removed { .. } if dry_run => {
                "Keyboard shortcut detected, it would be removed (dry run, nothing changed)."
            }
            Deregistration::Removed { .. } => "Keyboard shortcut detected and removed.",
            Deregistration::NotFound => "No keyboard shortcut configuration detected, nothing touched.",
        }
    }
}

/// Removes the application's custom keybinding and gives the stock
/// shortcut back.
///
/// 1. Read and decode the slot list
/// 2. Split it into our slots and everyone else's, keeping order
/// 3. Nothing of ours: stop without writing anything
/// 4. Blank every slot of ours
/// 5. Write the list back without them
/// 6. Restore the stock shortcut
///
/// Write failures are logged and the remaining writes still happen.
pub fn deregister(store: &mut impl ConfigStore, config: &KeybindingConfig) -> Deregistration {
    let matcher = EntryMatcher::new(config.name.as_str());
    let list_address = keybinding_list_address();

    let slots = match store.get(&list_address) {
        Ok(raw) => keybinding_list::decode(&raw),
        Err(e) => {
            log::warn!("Could not read custom keybindings, assuming none: {}", e);
            return Deregistration::NotFound;
        }
    };

    let (matched, kept): (Vec<String>, Vec<String>) = slots
        .into_iter()
        .partition(|slot| matcher.is_ours(&*store, slot));

    if matched.is_empty() {
        log::info!("No custom keybinding named {:?}", matcher.name());
        return Deregistration::NotFound;
    }
    if matched.len() > 1 {
        log::warn!(
            "{} custom keybindings are named {:?}, removing all of them",
            matched.len(),
            matcher.name()
        );
    }

    for slot in &matched {
        log::info!("Clearing custom keybinding at {}", slot);
        for e in KeybindingEntry::blank().write(store, slot) {
            log::warn!("{}", e);
        }
    }

    if let Err(e) = store.set(&list_address, &keybinding_list::encode(&kept)) {
        log::warn!("{}", e);
    }

    let restore = config.default_shortcut_restore();
    log::info!(
        "Restoring {} to {}",
        config.default_shortcut_address(),
        restore
    );
    if let Err(e) = store.set(&config.default_shortcut_address(), &restore) {
        log::warn!("{}", e);
    }

    Deregistration::Removed { slots: matched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::slot_field;
    use crate::store::memory::MemoryStore;

    fn config() -> KeybindingConfig {
        KeybindingConfig::default()
    }

    fn seed_slot(store: MemoryStore, slot: &str, name: &str, binding: &str) -> MemoryStore {
        store
            .with(slot_field(slot, "name"), &format!("'{}'", name))
            .with(slot_field(slot, "command"), "'/usr/bin/something'")
            .with(slot_field(slot, "binding"), &format!("'{}'", binding))
    }

    #[test]
    fn removes_our_slot_and_restores_default() {
        let store = MemoryStore::new().with(keybinding_list_address(), "['/a/', '/b/']");
        let store = seed_slot(store, "/a/", "klipBored", "<Super>v");
        let mut store = seed_slot(store, "/b/", "Terminal", "<Ctrl><Alt>t");

        let result = deregister(&mut store, &config());

        assert_eq!(result, Deregistration::Removed { slots: vec!["/a/".to_string()] });
        assert_eq!(store.value(&keybinding_list_address()), Some("['/b/']"));
        for field in ["name", "command", "binding"] {
            assert_eq!(store.value(&slot_field("/a/", field)), Some("''"));
        }
        assert_eq!(
            store.value(&config().default_shortcut_address()),
            Some("['<Super>v']")
        );
    }

    #[test]
    fn empty_list_is_a_true_no_op() {
        let mut store = MemoryStore::new().with(keybinding_list_address(), "[]");

        assert_eq!(deregister(&mut store, &config()), Deregistration::NotFound);
        assert!(store.writes.is_empty());
        assert_eq!(store.value(&keybinding_list_address()), Some("[]"));
    }

    #[test]
    fn foreign_slots_are_left_untouched() {
        let store = MemoryStore::new().with(keybinding_list_address(), "['/a/', '/b/']");
        let store = seed_slot(store, "/a/", "Terminal", "<Ctrl><Alt>t");
        let mut store = seed_slot(store, "/b/", "KlipBored", "<Super>v");

        assert_eq!(deregister(&mut store, &config()), Deregistration::NotFound);
        assert!(store.writes.is_empty());
        assert_eq!(store.value(&slot_field("/b/", "binding")), Some("'<Super>v'"));
    }

    #[test]
    fn preserves_order_of_kept_slots() {
        let store = MemoryStore::new().with(keybinding_list_address(), "['x', 'ours', 'y']");
        let store = seed_slot(store, "x", "one", "");
        let store = seed_slot(store, "ours", "klipBored", "<Super>v");
        let mut store = seed_slot(store, "y", "two", "");

        deregister(&mut store, &config());
        assert_eq!(store.value(&keybinding_list_address()), Some("['x', 'y']"));
    }

    #[test]
    fn second_run_finds_nothing() {
        let store = MemoryStore::new().with(keybinding_list_address(), "['/a/', '/b/']");
        let store = seed_slot(store, "/a/", "klipBored", "<Super>v");
        let mut store = seed_slot(store, "/b/", "Terminal", "");

        assert!(matches!(
            deregister(&mut store, &config()),
            Deregistration::Removed { .. }
        ));
        let after_first = store.value(&keybinding_list_address()).map(str::to_string);
        let writes_after_first = store.writes.len();

        assert_eq!(deregister(&mut store, &config()), Deregistration::NotFound);
        assert_eq!(
            store.value(&keybinding_list_address()).map(str::to_string),
            after_first
        );
        assert_eq!(store.writes.len(), writes_after_first);
    }

    #[test]
    fn removes_every_slot_carrying_our_name() {
        let store = MemoryStore::new().with(keybinding_list_address(), "['/a/', '/b/', '/c/']");
        let store = seed_slot(store, "/a/", "klipBored", "<Super>v");
        let store = seed_slot(store, "/b/", "Terminal", "");
        let mut store = seed_slot(store, "/c/", "klipBored", "<Super>c");

        let result = deregister(&mut store, &config());

        assert_eq!(
            result,
            Deregistration::Removed { slots: vec!["/a/".to_string(), "/c/".to_string()] }
        );
        assert_eq!(store.value(&keybinding_list_address()), Some("['/b/']"));
        assert_eq!(store.value(&slot_field("/c/", "binding")), Some("''"));
    }

    #[test]
    fn write_failures_do_not_stop_the_flow() {
        let store = MemoryStore::new().with(keybinding_list_address(), "['/a/']");
        let mut store = seed_slot(store, "/a/", "klipBored", "<Super>v");
        store.reject_writes.push(slot_field("/a/", "name"));

        let result = deregister(&mut store, &config());

        assert!(matches!(result, Deregistration::Removed { .. }));
        assert_eq!(store.value(&keybinding_list_address()), Some("[]"));
        assert_eq!(store.value(&slot_field("/a/", "binding")), Some("''"));
        assert_eq!(
            store.value(&config().default_shortcut_address()),
            Some("['<Super>v']")
        );
    }

    #[test]
    fn status_line_distinguishes_outcomes() {
        let removed = Deregistration::Removed { slots: vec!["/a/".to_string()] };
        assert_eq!(removed.status_line(false), "Keyboard shortcut detected and removed.");
        assert!(Deregistration::NotFound.status_line(false).contains("nothing touched"));
        assert!(Deregistration::NotFound.status_line(true).contains("nothing touched"));
    }

    #[test]
    fn dry_run_status_line_does_not_claim_removal() {
        let removed = Deregistration::Removed { slots: vec!["/a/".to_string()] };
        let line = removed.status_line(true);
        assert!(line.contains("would be removed"));
        assert!(line.contains("nothing changed"));
    }

    #[test]
    fn unreadable_list_counts_as_not_found() {
        let mut store = MemoryStore::new();
        assert_eq!(deregister(&mut store, &config()), Deregistration::NotFound);
        assert!(store.writes.is_empty());
    }

    #[test]
    fn default_shortcut_written_only_on_removal() {
        let mut store = MemoryStore::new().with(keybinding_list_address(), "['/a/']");
        store = seed_slot(store, "/a/", "Other", "<Super>v");
        deregister(&mut store, &config());
        assert_eq!(store.value(&config().default_shortcut_address()), None);
    }
}

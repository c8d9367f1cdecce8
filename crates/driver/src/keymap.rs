use std::collections::{BTreeMap, HashMap};

use crate::controller::{ButtonEvent, ButtonId, Edge};

/// Maps host key identities to controller buttons.
///
/// Keys are whatever the host reports, e.g. a browser `KeyboardEvent.key`.
/// Single-character keys match regardless of case.
#[derive(Clone, Debug)]
pub struct KeyMap {
    map: HashMap<String, ButtonId>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a key to a button, replacing any previous binding for that key.
    pub fn bind(&mut self, key: &str, button: ButtonId) {
        self.map.insert(normalize(key), button);
    }

    pub fn get(&self, key: &str) -> Option<ButtonId> {
        self.map.get(&normalize(key)).copied()
    }

    /// Turn a raw key event into a button event. Unmapped keys are dropped here
    /// so they never reach the controller.
    pub fn translate(&self, key: &str, edge: Edge) -> Option<ButtonEvent> {
        self.get(key).map(|button| ButtonEvent { button, edge })
    }

    pub fn from_bindings(bindings: &BTreeMap<String, ButtonId>) -> Self {
        let mut km = Self::new();
        for (key, button) in bindings {
            km.bind(key, *button);
        }
        km
    }

    pub fn default_bindings() -> BTreeMap<String, ButtonId> {
        [
            ("a", ButtonId::Left),
            ("w", ButtonId::Up),
            ("s", ButtonId::Down),
            ("d", ButtonId::Right),
            ("j", ButtonId::A),
            ("k", ButtonId::B),
            ("u", ButtonId::Select),
            ("i", ButtonId::Start),
        ]
        .into_iter()
        .map(|(k, b)| (k.to_string(), b))
        .collect()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::from_bindings(&Self::default_bindings())
    }
}

fn normalize(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let km = KeyMap::default();
        assert_eq!(km.get("w"), Some(ButtonId::Up));
        assert_eq!(km.get("a"), Some(ButtonId::Left));
        assert_eq!(km.get("j"), Some(ButtonId::A));
        assert_eq!(km.get("i"), Some(ButtonId::Start));
        assert_eq!(km.get("x"), None);
    }

    #[test]
    fn single_chars_ignore_case() {
        let km = KeyMap::default();
        assert_eq!(km.get("W"), Some(ButtonId::Up));

        let mut km = KeyMap::new();
        km.bind("ArrowUp", ButtonId::Up);
        assert_eq!(km.get("ArrowUp"), Some(ButtonId::Up));
        assert_eq!(km.get("arrowup"), None);
    }

    #[test]
    fn unknown_keys_are_filtered() {
        let km = KeyMap::default();
        assert_eq!(km.translate("Escape", Edge::Press), None);
        assert_eq!(
            km.translate("k", Edge::Release),
            Some(ButtonEvent::release(ButtonId::B))
        );
    }

    #[test]
    fn rebinding_replaces() {
        let mut km = KeyMap::default();
        km.bind("j", ButtonId::B);
        assert_eq!(km.get("j"), Some(ButtonId::B));
    }
}

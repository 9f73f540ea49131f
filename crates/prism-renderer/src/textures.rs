//! Named screen textures

use crate::device::TextureId;

/// Ordered name to texture map filled by rendering strategies.
#[derive(Debug, Clone, Default)]
pub struct TextureRegistry {
    entries: Vec<(String, TextureId)>,
}

impl TextureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` under `name`, replacing an existing entry with that name.
    pub fn insert(&mut self, name: impl Into<String>, id: TextureId) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = id,
            None => self.entries.push((name, id)),
        }
    }

    /// Texture registered under `name`.
    pub fn get(&self, name: &str) -> Option<TextureId> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    /// Name of a registered texture.
    pub fn name_of(&self, id: TextureId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, t)| *t == id)
            .map(|(n, _)| n.as_str())
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_and_keeps_order() {
        let mut registry = TextureRegistry::new();
        registry.insert("Fancy", TextureId(0));
        registry.insert("Final", TextureId(1));
        registry.insert("Fancy", TextureId(4));
        assert_eq!(registry.names(), ["Fancy", "Final"]);
        assert_eq!(registry.get("Fancy"), Some(TextureId(4)));
        assert_eq!(registry.name_of(TextureId(1)), Some("Final"));
        assert_eq!(registry.get("Depth"), None);
    }
}

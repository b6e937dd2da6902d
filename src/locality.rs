//! Locality-group routing.
//!
//! A locality group is an independently versioned sub-store that shares the
//! physical WAL with its siblings but owns its own tables and manifest. The
//! router decides which group a replayed mutation belongs to.

/// Identifier of a locality group; also the name of its subdirectory.
pub type GroupId = u32;

/// Maps a mutation's user key to the group that owns it.
pub trait LocalityGroupRouter: Send + Sync {
    fn route(&self, user_key: &[u8]) -> GroupId;
}

/// Sends every key to a single group.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGroupRouter(pub GroupId);

impl LocalityGroupRouter for DefaultGroupRouter {
    fn route(&self, _user_key: &[u8]) -> GroupId {
        self.0
    }
}

/// Routes by the longest registered key prefix, falling back to a default.
#[derive(Debug, Clone, Default)]
pub struct KeyPrefixRouter {
    prefixes: Vec<(Vec<u8>, GroupId)>,
    fallback: GroupId,
}

impl KeyPrefixRouter {
    pub fn new(fallback: GroupId) -> Self {
        KeyPrefixRouter {
            prefixes: Vec::new(),
            fallback,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>, group: GroupId) -> Self {
        self.prefixes.push((prefix.into(), group));
        // longest first, so the first match wins
        self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }
}

impl LocalityGroupRouter for KeyPrefixRouter {
    fn route(&self, user_key: &[u8]) -> GroupId {
        self.prefixes
            .iter()
            .find(|(prefix, _)| user_key.starts_with(prefix))
            .map_or(self.fallback, |(_, group)| *group)
    }
}

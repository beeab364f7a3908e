use serde::{Deserialize, Serialize};

/// What producers put on the queue: the producer's tag and its own running
/// sequence number. Displayed as `"<tag> <seq>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Message {
    pub tag: String,
    pub seq: u64,
}

impl Message {
    pub fn new(tag: impl Into<String>, seq: u64) -> Self {
        Self {
            tag: tag.into(),
            seq,
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tag, self.seq)
    }
}

use std::{fmt, sync::*};

//
// Tag
//

/// Cache invalidation tag.
///
/// Tags associate cached query results with the mutations that can affect them:
/// query endpoints attach tags to the entries they store, and mutation endpoints
/// declare the tags they invalidate. A mutation's declared tag set must cover
/// every query whose result it can change; a mismatch shows up as stale UI, not
/// as an error.
///
/// Cloning is cheap.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tag(Arc<str>);

impl Tag {
    /// Constructor.
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().into())
    }

    /// As string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

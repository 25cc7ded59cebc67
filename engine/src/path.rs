//! Hierarchical addresses into the remote tree.
//!
//! ```text
//! tasks/{category}/{taskId}
//! categories/{categoryName}
//! ```

use crate::{error::Result, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Root node holding task leaves grouped by category.
pub const TASKS_ROOT: &str = "tasks";

/// Root node holding category metadata records.
pub const CATEGORIES_ROOT: &str = "categories";

/// Longest key segment accepted, in bytes.
pub const MAX_SEGMENT_LEN: usize = 768;

const FORBIDDEN: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Check that `segment` can be used as a single key in the tree.
pub fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::InvalidPath("empty key".into()));
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(Error::InvalidPath(format!(
            "key longer than {} bytes",
            MAX_SEGMENT_LEN
        )));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_ascii_control())
    {
        return Err(Error::InvalidPath(format!(
            "key '{}' contains forbidden character {:?}",
            segment.escape_debug(),
            c
        )));
    }
    Ok(())
}

/// A validated path into the remote tree. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path. Empty segments are ignored.
    pub fn parse(path: &str) -> Result<Self> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| validate_segment(s).map(|_| s.to_string()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Append one key.
    pub fn child(&self, key: &str) -> Result<Self> {
        validate_segment(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    /// `tasks`
    pub fn tasks_root() -> Self {
        Self {
            segments: vec![TASKS_ROOT.to_string()],
        }
    }

    /// `tasks/{category}`
    pub fn task_category(category: &str) -> Result<Self> {
        Self::tasks_root().child(category)
    }

    /// `tasks/{category}/{id}`
    pub fn task(category: &str, id: &str) -> Result<Self> {
        Self::task_category(category)?.child(id)
    }

    /// `categories`
    pub fn categories_root() -> Self {
        Self {
            segments: vec![CATEGORIES_ROOT.to_string()],
        }
    }

    /// `categories/{name}`
    pub fn category(name: &str) -> Result<Self> {
        Self::categories_root().child(name)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last key, `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    pub fn contains(&self, other: &RemotePath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Whether a change at one path can affect a value read at the other.
    pub fn is_related(&self, other: &RemotePath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for RemotePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RemotePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.to_string()
    }
}

//! Node paths
//!
//! Nodes have no back-pointers; a node is identified by the chain of keys
//! leading to it from the statement root. Passes thread a `NodePath` down
//! their traversal and attach it to any error they raise.

use std::fmt;

/// One step of a node path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Named child, e.g. `where` or `operand0`
    Key(String),
    /// Position inside a list child
    Index(usize),
}

/// Path from the statement root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The statement root
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a named child
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Path of the n-th element of a list child
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Path of the n-th operand of an operation
    pub fn operand(&self, index: usize) -> Self {
        self.child(format!("operand{}", index))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<statement>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                PathSegment::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

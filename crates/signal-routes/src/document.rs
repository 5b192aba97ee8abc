//! Hierarchical key/value documents
//!
//! The text form is a single named root node:
//!
//! ```text
//! SIGNAL_ROUTES
//! {
//! 	Version = 1
//! 	Satellite
//! 	{
//! 		Guid = 0b6a5c3e-...
//! 	}
//! }
//! ```
//!
//! Keys may contain spaces and the value is everything after the first `=`.
//! Lines starting with `//` are comments.

use crate::{DocumentError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigNode {
    name: String,
    values: Vec<(String, String)>,
    nodes: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.values.iter().any(|(k, _)| k == key)
    }

    /// First value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Line breaks are flattened so the value survives a text round trip.
    pub fn add_value(&mut self, key: impl Into<String>, value: impl ToString) {
        let value = value.to_string().replace(['\r', '\n'], " ");
        self.values.push((key.into(), value));
    }

    /// Replace the first value under `key`, or append it.
    pub fn set_value(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string().replace(['\r', '\n'], " ");
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.values.push((key.to_string(), value)),
        }
    }

    /// Remove every value under `key`, returning how many were dropped.
    pub fn remove_values(&mut self, key: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|(k, _)| k != key);
        before - self.values.len()
    }

    /// Remove every child named `name`, returning how many were dropped.
    pub fn remove_nodes(&mut self, name: &str) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.name != name);
        before - self.nodes.len()
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    /// Children named `name`, in document order.
    pub fn nodes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> + 'a {
        self.nodes.iter().filter(move |n| n.name == name)
    }

    pub fn nodes_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut ConfigNode> + 'a {
        self.nodes.iter_mut().filter(move |n| n.name == name)
    }

    pub fn children(&self) -> &[ConfigNode] {
        &self.nodes
    }

    pub fn add_node(&mut self, node: ConfigNode) -> &mut ConfigNode {
        self.nodes.push(node);
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    /// Parse a document holding exactly one top-level node.
    pub fn parse(text: &str) -> Result<ConfigNode> {
        let mut stack = vec![ConfigNode::default()];
        let mut pending: Option<(String, usize)> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if line == "{" {
                let (name, _) = pending
                    .take()
                    .ok_or(DocumentError::UnexpectedOpen { line: line_no })?;
                stack.push(ConfigNode::new(name));
                continue;
            }

            if let Some((name, line)) = pending.take() {
                return Err(DocumentError::MissingOpenBrace { name, line });
            }

            if line == "}" {
                if stack.len() == 1 {
                    return Err(DocumentError::UnexpectedClose { line: line_no });
                }
                if let Some(done) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.nodes.push(done);
                    }
                }
            } else if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    return Err(DocumentError::Malformed { line: line_no });
                }
                if let Some(node) = stack.last_mut() {
                    node.values.push((key.to_string(), value.trim().to_string()));
                }
            } else if let Some(header) = line.strip_suffix('{') {
                let header = header.trim();
                if header.is_empty() {
                    return Err(DocumentError::Malformed { line: line_no });
                }
                stack.push(ConfigNode::new(header));
            } else if line.contains(['{', '}']) {
                return Err(DocumentError::Malformed { line: line_no });
            } else {
                pending = Some((line.to_string(), line_no));
            }
        }

        if let Some((name, line)) = pending {
            return Err(DocumentError::MissingOpenBrace { name, line });
        }
        if stack.len() > 1 {
            let name = stack.last().map(|n| n.name.clone()).unwrap_or_default();
            return Err(DocumentError::UnclosedNode { name });
        }

        let mut top = stack.pop().unwrap_or_default();
        if !top.values.is_empty() || top.nodes.len() != 1 {
            return Err(DocumentError::NotSingleRoot {
                nodes: top.nodes.len(),
                values: top.values.len(),
            });
        }
        Ok(top.nodes.remove(0))
    }

    fn write_into(&self, depth: usize, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "\t".repeat(depth);
        writeln!(out, "{}{}", indent, self.name)?;
        writeln!(out, "{}{{", indent)?;
        for (key, value) in &self.values {
            writeln!(out, "{}\t{} = {}", indent, key, value)?;
        }
        for node in &self.nodes {
            node.write_into(depth + 1, out)?;
        }
        writeln!(out, "{}}}", indent)
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_into(0, f)
    }
}

pub fn read_document(path: impl AsRef<Path>) -> Result<ConfigNode> {
    let text = fs::read_to_string(path)?;
    ConfigNode::parse(&text)
}

/// Write `document` to `path`, replacing any previous file in one rename so
/// an interrupted save never leaves a partial document behind.
pub fn write_document(path: impl AsRef<Path>, document: &ConfigNode) -> Result<()> {
    let path = path.as_ref();
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    fs::write(&staging, document.to_string())?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }
    Ok(())
}

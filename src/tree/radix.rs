//! Compressed prefix tree over literal keys
//!
//! Edges carry whole label fragments, so a chain of single-child nodes is
//! always merged into one edge. No wildcard handling.

use std::collections::BTreeMap;

#[derive(Debug)]
struct RadixNode<V> {
    label: String,
    value: Option<V>,
    /// Keyed by the first character of the child's label
    children: BTreeMap<char, RadixNode<V>>,
}

impl<V> RadixNode<V> {
    fn new(label: String, value: Option<V>) -> Self {
        Self {
            label,
            value,
            children: BTreeMap::new(),
        }
    }
}

/// Radix tree mapping string keys to values
#[derive(Debug)]
pub struct RadixTree<V> {
    root: RadixNode<V>,
    len: usize,
}

impl<V> RadixTree<V> {
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(String::new(), None),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.root = RadixNode::new(String::new(), None);
        self.len = 0;
    }

    /// Insert a value, returning the previous value for the key
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let previous = Self::insert_node(&mut self.root, key, value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    fn insert_node(node: &mut RadixNode<V>, key: &str, value: V) -> Option<V> {
        let Some(first) = key.chars().next() else {
            return node.value.replace(value);
        };

        let Some(child) = node.children.get_mut(&first) else {
            node.children
                .insert(first, RadixNode::new(key.to_string(), Some(value)));
            return None;
        };

        let common = common_prefix_len(&child.label, key);
        if common < child.label.len() {
            // Split the edge: the child keeps the shared prefix and the
            // remainder moves down one level, keeping its value and children
            let suffix = child.label.split_off(common);
            let mut tail = RadixNode::new(suffix, child.value.take());
            tail.children = std::mem::take(&mut child.children);
            if let Some(c) = tail.label.chars().next() {
                child.children.insert(c, tail);
            }
        }
        Self::insert_node(child, &key[common..], value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let mut node = &self.root;
        let mut rest = key;
        loop {
            let Some(first) = rest.chars().next() else {
                return node.value.as_ref();
            };
            let child = node.children.get(&first)?;
            rest = rest.strip_prefix(child.label.as_str())?;
            node = child;
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a key, merging edges left with a single child
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = Self::remove_node(&mut self.root, key);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn remove_node(node: &mut RadixNode<V>, key: &str) -> Option<V> {
        let Some(first) = key.chars().next() else {
            return node.value.take();
        };
        let child = node.children.get_mut(&first)?;
        let rest = key.strip_prefix(child.label.as_str())?;
        let removed = Self::remove_node(child, rest)?;

        if child.value.is_none() {
            match child.children.len() {
                0 => {
                    node.children.remove(&first);
                }
                1 => {
                    if let Some((_, grandchild)) = child.children.pop_first() {
                        child.label.push_str(&grandchild.label);
                        child.value = grandchild.value;
                        child.children = grandchild.children;
                    }
                }
                _ => {}
            }
        }
        Some(removed)
    }

    /// Values whose keys start with `prefix`, in lexical key order, at most
    /// `max` of them
    pub fn search_prefix(&self, prefix: &str, max: usize) -> Vec<&V> {
        let mut results = Vec::new();
        if max == 0 {
            return results;
        }

        let mut node = &self.root;
        let mut rest = prefix;
        loop {
            let Some(first) = rest.chars().next() else {
                break;
            };
            let Some(child) = node.children.get(&first) else {
                return results;
            };
            if child.label.starts_with(rest) {
                node = child;
                break;
            }
            match rest.strip_prefix(child.label.as_str()) {
                Some(remaining) => {
                    rest = remaining;
                    node = child;
                }
                None => return results,
            }
        }

        Self::collect(node, max, &mut results);
        results
    }

    fn collect<'a>(node: &'a RadixNode<V>, max: usize, out: &mut Vec<&'a V>) {
        if out.len() >= max {
            return;
        }
        if let Some(value) = &node.value {
            out.push(value);
        }
        for child in node.children.values() {
            if out.len() >= max {
                return;
            }
            Self::collect(child, max, out);
        }
    }
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Length in bytes of the common prefix, on a char boundary
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()))
}

//! Path trie for subscription indexing
//!
//! A trie keyed by the tokens of a separator-delimited path. Unlike a plain
//! split on the separator, the separator itself is a token, so `/foo`, `foo`
//! and `foo/` are three distinct paths: `/foo` starts with a separator
//! branch, while `foo` and `foo/` share the `foo` branch and differ only in
//! their trailing separator node.
//!
//! Wildcards are recognised at insertion time when they occupy a whole token:
//! - single-level (`+`) matches exactly one non-separator token
//! - multi-level (`#`) must be the final token and matches everything from
//!   its position onwards; it is stored as a terminal marker, not expanded
//!
//! Matching walks the concrete path token by token and fans out into the
//! literal and single-wildcard children at every level, so the cost is
//! bounded by path depth and branching, not by the number of stored paths.
//!
//! The trie performs no locking; owners serialize mutations against reads.

use std::collections::BTreeSet;

use ahash::AHashMap;
use compact_str::CompactString;
use smallvec::SmallVec;

use super::error::{Limit, TreeError};

/// Default maximum number of tokens in a path
pub const DEFAULT_MAX_PATH_SEGMENTS: usize = 1024;
/// Default maximum path length in bytes
pub const DEFAULT_MAX_PATH_SIZE: usize = 1024;
/// Default maximum number of members attached at one node
pub const DEFAULT_MAX_MEMBERS_AT_LEVEL: usize = 1024 * 10;

/// Structural limits enforced on insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieLimits {
    pub max_path_segments: usize,
    pub max_path_size: usize,
    pub max_members_at_level: usize,
}

impl Default for TrieLimits {
    fn default() -> Self {
        Self {
            max_path_segments: DEFAULT_MAX_PATH_SEGMENTS,
            max_path_size: DEFAULT_MAX_PATH_SIZE,
            max_members_at_level: DEFAULT_MAX_MEMBERS_AT_LEVEL,
        }
    }
}

/// Wildcard tokens recognised in inserted paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wildcards {
    pub single: char,
    pub multi: char,
}

impl Default for Wildcards {
    fn default() -> Self {
        Self {
            single: '+',
            multi: '#',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Separator,
    Level(&'a str),
    SingleWildcard,
    MultiWildcard,
}

type Tokens<'a> = SmallVec<[Token<'a>; 16]>;

/// Node in the path trie
#[derive(Debug)]
struct PathNode<M> {
    /// Literal level children (CompactString keeps short levels inline)
    children: AHashMap<CompactString, PathNode<M>>,
    /// Separator child
    separator: Option<Box<PathNode<M>>>,
    /// Single-level wildcard child
    single_wildcard: Option<Box<PathNode<M>>>,
    /// Multi-level wildcard terminal marker
    multi_wildcard: Option<Box<PathNode<M>>>,
    /// Members attached at this node
    members: BTreeSet<M>,
    /// Whether a path ends here (as opposed to an intermediate node)
    terminus: bool,
}

impl<M> PathNode<M> {
    fn new() -> Self {
        Self {
            children: AHashMap::new(),
            separator: None,
            single_wildcard: None,
            multi_wildcard: None,
            members: BTreeSet::new(),
            terminus: false,
        }
    }

    fn child(&self, token: Token<'_>) -> Option<&PathNode<M>> {
        match token {
            Token::Separator => self.separator.as_deref(),
            Token::Level(level) => self.children.get(level),
            Token::SingleWildcard => self.single_wildcard.as_deref(),
            Token::MultiWildcard => self.multi_wildcard.as_deref(),
        }
    }

    fn child_mut(&mut self, token: Token<'_>) -> Option<&mut PathNode<M>> {
        match token {
            Token::Separator => self.separator.as_deref_mut(),
            Token::Level(level) => self.children.get_mut(level),
            Token::SingleWildcard => self.single_wildcard.as_deref_mut(),
            Token::MultiWildcard => self.multi_wildcard.as_deref_mut(),
        }
    }

    fn child_or_insert(&mut self, token: Token<'_>) -> &mut PathNode<M> {
        match token {
            Token::Separator => &mut **self
                .separator
                .get_or_insert_with(|| Box::new(PathNode::new())),
            Token::Level(level) => self
                .children
                .entry(CompactString::new(level))
                .or_insert_with(PathNode::new),
            Token::SingleWildcard => &mut **self
                .single_wildcard
                .get_or_insert_with(|| Box::new(PathNode::new())),
            Token::MultiWildcard => &mut **self
                .multi_wildcard
                .get_or_insert_with(|| Box::new(PathNode::new())),
        }
    }

    fn detach(&mut self, token: Token<'_>) {
        match token {
            Token::Separator => self.separator = None,
            Token::Level(level) => {
                self.children.remove(level);
            }
            Token::SingleWildcard => self.single_wildcard = None,
            Token::MultiWildcard => self.multi_wildcard = None,
        }
    }

    fn branch_count(&self) -> usize {
        self.children.len()
            + usize::from(self.separator.is_some())
            + usize::from(self.single_wildcard.is_some())
            + usize::from(self.multi_wildcard.is_some())
    }

    fn is_prunable(&self) -> bool {
        !self.terminus && self.members.is_empty() && self.branch_count() == 0
    }

    fn counts(&self, members_only: bool) -> bool {
        self.terminus && (!members_only || !self.members.is_empty())
    }
}

/// Path trie with wildcard-aware member search
#[derive(Debug)]
pub struct PathTrie<M> {
    root: PathNode<M>,
    separator: char,
    wildcards: Option<Wildcards>,
    limits: TrieLimits,
}

impl<M: Ord + Clone> PathTrie<M> {
    /// Trie over `/`-separated paths with `+` and `#` wildcards
    pub fn new() -> Self {
        Self::with_options('/', Some(Wildcards::default()), TrieLimits::default())
    }

    pub fn with_limits(limits: TrieLimits) -> Self {
        Self::with_options('/', Some(Wildcards::default()), limits)
    }

    /// Build a trie with a custom separator. With `wildcards` set to `None`
    /// every token is literal.
    pub fn with_options(separator: char, wildcards: Option<Wildcards>, limits: TrieLimits) -> Self {
        Self {
            root: PathNode::new(),
            separator,
            wildcards,
            limits,
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn limits(&self) -> TrieLimits {
        self.limits
    }

    pub fn set_limits(&mut self, limits: TrieLimits) {
        self.limits = limits;
    }

    fn tokenize<'a>(&self, path: &'a str, wildcards: bool) -> Tokens<'a> {
        let mut tokens = Tokens::new();
        let mut start = 0;
        for (i, c) in path.char_indices() {
            if c == self.separator {
                if start < i {
                    tokens.push(self.level(&path[start..i], wildcards));
                }
                tokens.push(Token::Separator);
                start = i + c.len_utf8();
            }
        }
        if start < path.len() {
            tokens.push(self.level(&path[start..], wildcards));
        }
        tokens
    }

    fn level<'a>(&self, level: &'a str, wildcards: bool) -> Token<'a> {
        if wildcards {
            if let Some(w) = self.wildcards {
                if is_char_token(level, w.single) {
                    return Token::SingleWildcard;
                }
                if is_char_token(level, w.multi) {
                    return Token::MultiWildcard;
                }
            }
        }
        Token::Level(level)
    }

    fn node(&self, tokens: &[Token<'_>]) -> Option<&PathNode<M>> {
        let mut node = &self.root;
        for token in tokens {
            node = node.child(*token)?;
        }
        Some(node)
    }

    /// Insert a path and attach `members` at its terminus
    ///
    /// All limits are checked before the first node is created, so a
    /// failed insertion leaves the trie exactly as it was.
    pub fn add_path<I>(&mut self, path: &str, members: I) -> Result<(), TreeError>
    where
        I: IntoIterator<Item = M>,
    {
        if path.len() > self.limits.max_path_size {
            return Err(TreeError::LimitExceeded {
                limit: Limit::PathSize,
                max: self.limits.max_path_size,
                actual: path.len(),
            });
        }

        let tokens = self.tokenize(path, true);
        if tokens.is_empty() {
            return Err(TreeError::EmptyPath);
        }
        if tokens.len() > self.limits.max_path_segments {
            return Err(TreeError::LimitExceeded {
                limit: Limit::PathSegments,
                max: self.limits.max_path_segments,
                actual: tokens.len(),
            });
        }
        if let Some(pos) = tokens.iter().position(|t| *t == Token::MultiWildcard) {
            if pos != tokens.len() - 1 {
                return Err(TreeError::MisplacedWildcard);
            }
        }

        let members: Vec<M> = members.into_iter().collect();
        let max_members = self.limits.max_members_at_level;
        if members.len() > max_members {
            return Err(TreeError::LimitExceeded {
                limit: Limit::MembersAtLevel,
                max: max_members,
                actual: members.len(),
            });
        }
        let resulting = match self.node(&tokens) {
            Some(existing) => {
                let fresh: BTreeSet<&M> = members
                    .iter()
                    .filter(|m| !existing.members.contains(*m))
                    .collect();
                existing.members.len() + fresh.len()
            }
            None => members.iter().collect::<BTreeSet<&M>>().len(),
        };
        if resulting > max_members {
            return Err(TreeError::LimitExceeded {
                limit: Limit::MembersAtLevel,
                max: max_members,
                actual: resulting,
            });
        }

        let mut node = &mut self.root;
        for token in &tokens {
            node = node.child_or_insert(*token);
        }
        node.terminus = true;
        node.members.extend(members);
        Ok(())
    }

    /// Union of the members of every stored path matching a concrete path
    pub fn search_members(&self, path: &str) -> BTreeSet<M> {
        let mut result = BTreeSet::new();
        self.search_with(path, |members| result.extend(members.iter().cloned()));
        result
    }

    /// Visit the member set of every stored path matching a concrete path
    ///
    /// The callback may see the same member more than once when several
    /// stored paths match.
    pub fn search_with<F>(&self, path: &str, mut callback: F)
    where
        F: FnMut(&BTreeSet<M>),
    {
        let tokens = self.tokenize(path, false);
        if tokens.is_empty() {
            return;
        }
        Self::search_recursive(&self.root, &tokens, &mut callback);
    }

    fn search_recursive<F>(node: &PathNode<M>, tokens: &[Token<'_>], callback: &mut F)
    where
        F: FnMut(&BTreeSet<M>),
    {
        // Multi-level wildcard matches whatever remains, including nothing
        if let Some(multi) = node.multi_wildcard.as_deref() {
            if !multi.members.is_empty() {
                callback(&multi.members);
            }
        }

        let Some((token, rest)) = tokens.split_first() else {
            if node.terminus && !node.members.is_empty() {
                callback(&node.members);
            }
            return;
        };

        if let Some(child) = node.child(*token) {
            Self::search_recursive(child, rest, callback);
        }

        if let Token::Level(_) = token {
            if let Some(single) = node.single_wildcard.as_deref() {
                Self::search_recursive(single, rest, callback);
            }
        }
    }

    /// Whether `path` was inserted, walking it literally
    pub fn has_path(&self, path: &str) -> bool {
        let tokens = self.tokenize(path, true);
        !tokens.is_empty() && self.node(&tokens).is_some_and(|n| n.terminus)
    }

    /// Whether `path` was inserted and carries at least one member
    pub fn has_members(&self, path: &str) -> bool {
        let tokens = self.tokenize(path, true);
        !tokens.is_empty()
            && self
                .node(&tokens)
                .is_some_and(|n| n.terminus && !n.members.is_empty())
    }

    /// Members attached at exactly `path`
    pub fn members(&self, path: &str) -> Option<&BTreeSet<M>> {
        let tokens = self.tokenize(path, true);
        if tokens.is_empty() {
            return None;
        }
        self.node(&tokens)
            .filter(|n| n.terminus)
            .map(|n| &n.members)
    }

    /// Check a single stored-path pattern against a concrete path using the
    /// same rules as [`search_members`](Self::search_members)
    pub fn filter_matches(&self, filter: &str, path: &str) -> bool {
        let filter = self.tokenize(filter, true);
        let path = self.tokenize(path, false);
        if filter.is_empty() || path.is_empty() {
            return false;
        }

        let mut pi = 0;
        for token in &filter {
            match token {
                Token::MultiWildcard => return true,
                Token::SingleWildcard => match path.get(pi) {
                    Some(Token::Level(_)) => pi += 1,
                    _ => return false,
                },
                literal => {
                    if path.get(pi) == Some(literal) {
                        pi += 1;
                    } else {
                        return false;
                    }
                }
            }
        }
        pi == path.len()
    }

    /// Reconstruct every terminus into its path string
    ///
    /// With `members_only` set, termini without members are skipped.
    pub fn distinct_paths(&self, members_only: bool) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        let mut buf = String::new();
        self.visit(&self.root, &mut buf, &mut |path, node| {
            if node.counts(members_only) {
                paths.insert(path.to_string());
            }
        });
        paths
    }

    pub fn count_distinct_paths(&self, members_only: bool) -> usize {
        let mut count = 0;
        let mut buf = String::new();
        self.visit(&self.root, &mut buf, &mut |_, node| {
            if node.counts(members_only) {
                count += 1;
            }
        });
        count
    }

    fn visit<F>(&self, node: &PathNode<M>, buf: &mut String, f: &mut F)
    where
        F: FnMut(&str, &PathNode<M>),
    {
        f(buf.as_str(), node);

        let wildcards = self.wildcards.unwrap_or_default();
        let len = buf.len();
        for (level, child) in &node.children {
            buf.push_str(level);
            self.visit(child, buf, f);
            buf.truncate(len);
        }
        let special = [
            (node.separator.as_deref(), self.separator),
            (node.single_wildcard.as_deref(), wildcards.single),
            (node.multi_wildcard.as_deref(), wildcards.multi),
        ];
        for (child, c) in special {
            if let Some(child) = child {
                buf.push(c);
                self.visit(child, buf, f);
                buf.truncate(len);
            }
        }
    }

    /// Number of distinct top-level branches
    pub fn branch_count(&self) -> usize {
        self.root.branch_count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.branch_count() == 0
    }

    /// Remove one member from `path`, pruning nodes left empty
    ///
    /// A terminus whose last member is removed reverts to an intermediate
    /// node.
    pub fn remove_member(&mut self, path: &str, member: &M) -> bool {
        let tokens = self.tokenize(path, true);
        if tokens.is_empty() {
            return false;
        }
        Self::remove_recursive(&mut self.root, &tokens, &mut |node| {
            let removed = node.members.remove(member);
            if removed && node.members.is_empty() {
                node.terminus = false;
            }
            removed
        })
    }

    /// Remove `path` and all of its members, pruning nodes left empty
    pub fn remove_path(&mut self, path: &str) -> bool {
        let tokens = self.tokenize(path, true);
        if tokens.is_empty() {
            return false;
        }
        Self::remove_recursive(&mut self.root, &tokens, &mut |node| {
            let was_terminus = node.terminus;
            node.terminus = false;
            node.members.clear();
            was_terminus
        })
    }

    fn remove_recursive<F>(node: &mut PathNode<M>, tokens: &[Token<'_>], op: &mut F) -> bool
    where
        F: FnMut(&mut PathNode<M>) -> bool,
    {
        let Some((token, rest)) = tokens.split_first() else {
            return op(node);
        };
        let Some(child) = node.child_mut(*token) else {
            return false;
        };
        let removed = Self::remove_recursive(child, rest, op);
        if removed && child.is_prunable() {
            node.detach(*token);
        }
        removed
    }

    /// Remove every path and member
    pub fn clear(&mut self) {
        self.root = PathNode::new();
    }
}

impl<M: Ord + Clone> Default for PathTrie<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_char_token(token: &str, c: char) -> bool {
    let mut chars = token.chars();
    chars.next() == Some(c) && chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;
    use std::collections::HashSet;

    fn random_topic(segments: usize) -> String {
        let mut rng = rand::thread_rng();
        let mut topic = String::new();
        for i in 0..segments {
            if i == 0 {
                topic.push('/');
            }
            topic.push_str(&rng.gen_range(0..1000).to_string());
            topic.push('/');
        }
        topic
    }

    fn set<const N: usize>(items: [&'static str; N]) -> BTreeSet<&'static str> {
        items.into_iter().collect()
    }

    #[test]
    fn test_read_all_paths() {
        let mut trie = PathTrie::new();
        let mut rng = rand::thread_rng();
        let mut added = HashSet::new();
        for _ in 0..50 {
            let topic = random_topic(rng.gen_range(1..10));
            trie.add_path(&topic, ["foo"]).unwrap();
            added.insert(topic);
        }

        let all = trie.distinct_paths(true);
        assert_eq!(all.len(), added.len());
        assert!(all.iter().all(|p| added.contains(p)));
    }

    #[test]
    fn test_exceeds_max_segments() {
        let mut trie: PathTrie<&str> = PathTrie::new();
        let limits = trie.limits();
        let topic = random_topic(limits.max_path_segments + 1);
        let err = trie.add_path(&topic, ["foo"]).unwrap_err();
        assert!(err.is_limit_exceeded());
        assert!(trie.is_empty());
    }

    #[test]
    fn test_exceeds_segments_with_room_for_size() {
        let mut trie: PathTrie<&str> = PathTrie::with_limits(TrieLimits {
            max_path_segments: 3,
            ..TrieLimits::default()
        });
        trie.add_path("a/b", ["m"]).unwrap();
        let err = trie.add_path("a/b/c", ["m"]).unwrap_err();
        assert_eq!(
            err,
            TreeError::LimitExceeded {
                limit: Limit::PathSegments,
                max: 3,
                actual: 5
            }
        );
        assert_eq!(trie.count_distinct_paths(false), 1);
    }

    #[test]
    fn test_exceeds_max_length() {
        let mut trie: PathTrie<&str> = PathTrie::new();
        let topic = "a".repeat(trie.limits().max_path_size + 1);
        let err = trie.add_path(&topic, ["foo"]).unwrap_err();
        assert!(matches!(
            err,
            TreeError::LimitExceeded {
                limit: Limit::PathSize,
                ..
            }
        ));
        assert_eq!(trie.count_distinct_paths(false), 0);
    }

    #[test]
    fn test_exceeds_max_members() {
        let mut trie = PathTrie::new();
        let members = vec!["same"; trie.limits().max_members_at_level + 1];
        let err = trie.add_path(&random_topic(10), members).unwrap_err();
        assert!(matches!(
            err,
            TreeError::LimitExceeded {
                limit: Limit::MembersAtLevel,
                ..
            }
        ));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_members_accumulate_towards_limit() {
        let mut trie = PathTrie::with_limits(TrieLimits {
            max_members_at_level: 2,
            ..TrieLimits::default()
        });
        trie.add_path("a/b", [1]).unwrap();
        trie.add_path("a/b", [1, 2]).unwrap();
        assert!(trie.add_path("a/b", [3]).unwrap_err().is_limit_exceeded());
        assert_eq!(trie.search_members("a/b"), [1, 2].into_iter().collect());
    }

    #[test]
    fn test_top_level_separator_token() {
        let mut trie = PathTrie::new();
        trie.add_path("/", ["foo"]).unwrap();
        assert_eq!(trie.search_members("/"), set(["foo"]));
    }

    #[test]
    fn test_leading_separator_is_distinct() {
        let mut trie = PathTrie::new();
        trie.add_path("/foo", ["a"]).unwrap();
        trie.add_path("foo", ["b"]).unwrap();
        assert_eq!(trie.branch_count(), 2);
        assert_eq!(trie.search_members("/foo"), set(["a"]));
        assert_eq!(trie.search_members("foo"), set(["b"]));
    }

    #[test]
    fn test_trailing_separator_shares_branch() {
        let mut trie = PathTrie::new();
        trie.add_path("foo/", ["a"]).unwrap();
        trie.add_path("foo", ["b"]).unwrap();
        assert_eq!(trie.branch_count(), 1);
        assert_eq!(trie.search_members("foo/"), set(["a"]));
        assert_eq!(trie.search_members("foo"), set(["b"]));
        assert!(trie.search_members("/foo").is_empty());
    }

    #[test]
    fn test_multi_level_wildcard() {
        let mut trie = PathTrie::new();
        trie.add_path("foo/bar/#", ["foo"]).unwrap();
        assert_eq!(trie.branch_count(), 1);
        assert_eq!(trie.search_members("foo/bar/is/me").len(), 1);
        assert_eq!(trie.search_members("foo/bar/").len(), 1);
        assert!(trie.search_members("foo/bar").is_empty());
        assert!(trie.search_members("foo/baris/me").is_empty());
        assert!(trie.search_members("moo/bar/is/me").is_empty());
    }

    #[test]
    fn test_root_multi_level_wildcard() {
        let mut trie = PathTrie::new();
        trie.add_path("#", ["all"]).unwrap();
        assert_eq!(trie.search_members("a"), set(["all"]));
        assert_eq!(trie.search_members("/a/b"), set(["all"]));
    }

    #[test]
    fn test_single_level_wildcard() {
        let mut trie = PathTrie::new();
        trie.add_path("foo/+/is/good", ["foo"]).unwrap();
        assert_eq!(trie.branch_count(), 1);
        assert_eq!(trie.search_members("foo/mar/is/good").len(), 1);
        assert_eq!(trie.search_members("foo/bar/is/good").len(), 1);
        assert!(trie.search_members("foo/bar/is/bad").is_empty());
        // + never swallows a separator
        assert!(trie.search_members("foo//is/good").is_empty());
    }

    #[test]
    fn test_union_of_matches() {
        let mut trie = PathTrie::new();
        trie.add_path("a/b", ["exact"]).unwrap();
        trie.add_path("a/+", ["single", "shared"]).unwrap();
        trie.add_path("a/#", ["multi", "shared"]).unwrap();
        assert_eq!(
            trie.search_members("a/b"),
            set(["exact", "multi", "shared", "single"])
        );
    }

    #[test]
    fn test_misplaced_multi_wildcard() {
        let mut trie = PathTrie::new();
        assert_eq!(
            trie.add_path("a/#/b", ["m"]),
            Err(TreeError::MisplacedWildcard)
        );
        assert_eq!(trie.add_path("", ["m"]), Err(TreeError::EmptyPath));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_partial_wildcard_is_literal() {
        let mut trie = PathTrie::new();
        trie.add_path("foo/bar#", ["m"]).unwrap();
        assert!(trie.search_members("foo/bar/x").is_empty());
        assert_eq!(trie.search_members("foo/bar#").len(), 1);
    }

    #[test]
    fn test_wildcards_disabled() {
        let mut trie = PathTrie::with_options('.', None, TrieLimits::default());
        trie.add_path("a.+", ["m"]).unwrap();
        assert!(trie.search_members("a.b").is_empty());
        assert_eq!(trie.search_members("a.+").len(), 1);
    }

    #[test]
    fn test_path_existence() {
        let mut trie = PathTrie::new();
        for i in 0..20_000 {
            let topic = format!("/{}/{}/{}/", i % 7, i % 131, i);
            if i % 2 == 0 {
                trie.add_path(&topic, [i]).unwrap();
            } else {
                trie.add_path(&topic, []).unwrap();
            }
        }
        trie.add_path("some/member", [1]).unwrap();
        trie.add_path("/some/member", []).unwrap();

        assert!(trie.has_path("some/member"));
        assert!(trie.has_path("/some/member"));
        assert!(trie.has_members("some/member"));
        assert!(!trie.has_members("/some/member"));
        assert!(!trie.has_path("/doesnt/exist"));
        assert!(!trie.has_members("/doesnt/exist"));
        // intermediate nodes are not termini
        assert!(!trie.has_path("some/"));

        assert_eq!(trie.count_distinct_paths(false), 20_002);
        assert_eq!(trie.count_distinct_paths(true), 10_001);
    }

    #[test]
    fn test_has_path_is_literal() {
        let mut trie = PathTrie::new();
        trie.add_path("a/+/c", ["m"]).unwrap();
        assert!(trie.has_path("a/+/c"));
        assert!(!trie.has_path("a/b/c"));
    }

    #[test]
    fn test_distinct_paths_reconstruct_wildcards() {
        let mut trie = PathTrie::new();
        trie.add_path("a/+/c", ["m"]).unwrap();
        trie.add_path("a/#", ["m"]).unwrap();
        trie.add_path("/x", []).unwrap();
        let all: Vec<String> = trie.distinct_paths(false).into_iter().collect();
        assert_eq!(all, vec!["/x", "a/#", "a/+/c"]);
        assert_eq!(trie.count_distinct_paths(true), 2);
    }

    #[test]
    fn test_remove_member_prunes() {
        let mut trie = PathTrie::new();
        trie.add_path("a/b/c", ["x", "y"]).unwrap();
        trie.add_path("a/d", ["x"]).unwrap();

        assert!(trie.remove_member("a/b/c", &"x"));
        assert!(!trie.remove_member("a/b/c", &"x"));
        assert!(trie.has_members("a/b/c"));

        assert!(trie.remove_member("a/b/c", &"y"));
        assert!(!trie.has_path("a/b/c"));
        assert_eq!(trie.count_distinct_paths(false), 1);

        assert!(trie.remove_member("a/d", &"x"));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_remove_keeps_shared_ancestors() {
        let mut trie = PathTrie::new();
        trie.add_path("a/b", ["x"]).unwrap();
        trie.add_path("a/b/c", ["y"]).unwrap();
        assert!(trie.remove_member("a/b", &"x"));
        assert_eq!(trie.search_members("a/b/c"), set(["y"]));
        assert!(trie.remove_path("a/b/c"));
        assert!(trie.is_empty());
    }

    #[test]
    fn test_filter_matches() {
        let trie: PathTrie<u8> = PathTrie::new();
        assert!(trie.filter_matches("a/b", "a/b"));
        assert!(trie.filter_matches("a/+", "a/b"));
        assert!(!trie.filter_matches("a/+", "a/"));
        assert!(trie.filter_matches("a/#", "a/b/c"));
        assert!(trie.filter_matches("a/#", "a/"));
        assert!(!trie.filter_matches("a/#", "a"));
        assert!(!trie.filter_matches("/a", "a"));
        assert!(trie.filter_matches("#", "/"));
    }

    fn level() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("a".to_string()),
            Just("b".to_string()),
            Just("c".to_string()),
            Just(String::new()),
        ]
    }

    fn filter_level() -> impl Strategy<Value = String> {
        prop_oneof![level(), Just("+".to_string())]
    }

    proptest! {
        #[test]
        fn prop_search_agrees_with_filter_matches(
            filter in prop::collection::vec(filter_level(), 1..5),
            multi in any::<bool>(),
            topic in prop::collection::vec(level(), 1..6),
        ) {
            let mut filter = filter.join("/");
            if multi {
                filter.push_str("/#");
            }
            let topic = topic.join("/");
            prop_assume!(!topic.is_empty());

            let mut trie = PathTrie::new();
            if trie.add_path(&filter, ["m"]).is_ok() {
                let found = !trie.search_members(&topic).is_empty();
                prop_assert_eq!(found, trie.filter_matches(&filter, &topic));
            }
        }
    }
}

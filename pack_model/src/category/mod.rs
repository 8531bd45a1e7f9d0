//! Category tree - the hierarchical namespace markers and trails are filed under.
//!
//! Categories live in an arena owned by the tree and are addressed by
//! [`CategoryId`]. Namespaces are dotted paths (`"wvw.reset"`) compared without
//! regard to case. Resolving a namespace that does not exist yet creates it
//! (and any missing parents) instead of failing.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Separator between namespace segments.
pub const NAMESPACE_SEPARATOR: char = '.';

/// Identity of one category tree instance.
///
/// Every pack load produces a fresh tree, so ids minted by an older tree never
/// resolve against a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeId(pub Uuid);

impl TreeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TreeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a category node inside a specific tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId {
    tree: TreeId,
    index: u32,
}

impl CategoryId {
    /// The tree this id was minted by.
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    /// Whether this is the synthetic root.
    pub fn is_root(&self) -> bool {
        self.index == ROOT_INDEX
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.tree, self.index)
    }
}

/// Fold a namespace into the form used for case-insensitive comparison.
///
/// Borrows when the input is already folded, so lookups on the render path
/// do not allocate in the common case.
pub fn normalize_namespace(namespace: &str) -> Cow<'_, str> {
    if namespace.chars().any(char::is_uppercase) {
        Cow::Owned(namespace.to_lowercase())
    } else {
        Cow::Borrowed(namespace)
    }
}

const ROOT_INDEX: u32 = 0;

#[derive(Debug, Clone)]
struct CategoryNode {
    name: String,
    display_name: Option<String>,
    namespace: String,
    parent: Option<u32>,
    children: Vec<u32>,
}

#[derive(Debug)]
struct Arena {
    nodes: Vec<CategoryNode>,
    /// Folded namespace -> node index.
    by_namespace: HashMap<String, u32>,
}

impl Arena {
    fn new() -> Self {
        let root = CategoryNode {
            name: String::new(),
            display_name: None,
            namespace: String::new(),
            parent: None,
            children: Vec::new(),
        };

        let mut by_namespace = HashMap::new();
        by_namespace.insert(String::new(), ROOT_INDEX);

        Self {
            nodes: vec![root],
            by_namespace,
        }
    }

    fn lookup(&self, namespace: &str) -> Option<u32> {
        self.by_namespace
            .get(normalize_namespace(namespace).as_ref())
            .copied()
    }

    fn get_or_add(&mut self, namespace: &str) -> u32 {
        let mut current = ROOT_INDEX;

        for segment in namespace
            .split(NAMESPACE_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let full = if current == ROOT_INDEX {
                segment.to_string()
            } else {
                format!(
                    "{}{}{}",
                    self.nodes[current as usize].namespace, NAMESPACE_SEPARATOR, segment
                )
            };

            let key = normalize_namespace(&full).into_owned();
            current = match self.by_namespace.get(&key) {
                Some(&index) => index,
                None => {
                    let index = self.nodes.len() as u32;
                    self.nodes.push(CategoryNode {
                        name: segment.to_string(),
                        display_name: None,
                        namespace: full,
                        parent: Some(current),
                        children: Vec::new(),
                    });
                    self.nodes[current as usize].children.push(index);
                    self.by_namespace.insert(key, index);
                    index
                }
            };
        }

        current
    }
}

/// The category forest for one loaded pack collection, rooted at a synthetic root.
#[derive(Debug)]
pub struct CategoryTree {
    id: TreeId,
    arena: RwLock<Arena>,
}

impl CategoryTree {
    /// Create a tree holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            id: TreeId::new(),
            arena: RwLock::new(Arena::new()),
        }
    }

    /// Build a tree containing every given namespace (and their parents).
    pub fn from_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tree = Self::new();
        for namespace in namespaces {
            tree.get_or_add(namespace.as_ref());
        }
        tree
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    /// The synthetic root every namespace hangs from.
    pub fn root(&self) -> CategoryId {
        self.handle(ROOT_INDEX)
    }

    /// Resolve a namespace, creating any missing categories along the way.
    ///
    /// Never fails: an unknown namespace materializes as a category without
    /// a display name.
    pub fn get_or_add(&self, namespace: &str) -> CategoryId {
        if let Some(index) = self.arena.read().lookup(namespace) {
            return self.handle(index);
        }

        let index = self.arena.write().get_or_add(namespace);
        self.handle(index)
    }

    /// Resolve or create a category and give it a display name.
    pub fn define(&self, namespace: &str, display_name: impl Into<String>) -> CategoryId {
        let mut arena = self.arena.write();
        let index = arena.get_or_add(namespace);
        arena.nodes[index as usize].display_name = Some(display_name.into());
        self.handle(index)
    }

    /// Look up an existing category without creating it.
    pub fn find(&self, namespace: &str) -> Option<CategoryId> {
        self.arena.read().lookup(namespace).map(|index| self.handle(index))
    }

    /// Whether the id was minted by this tree.
    pub fn contains(&self, id: CategoryId) -> bool {
        self.index_of(id).is_some()
    }

    /// Full namespace of a category, in the casing it was first created with.
    pub fn namespace(&self, id: CategoryId) -> Option<String> {
        let index = self.index_of(id)?;
        Some(self.arena.read().nodes[index].namespace.clone())
    }

    /// Last namespace segment of a category.
    pub fn name(&self, id: CategoryId) -> Option<String> {
        let index = self.index_of(id)?;
        Some(self.arena.read().nodes[index].name.clone())
    }

    pub fn display_name(&self, id: CategoryId) -> Option<String> {
        let index = self.index_of(id)?;
        self.arena.read().nodes[index].display_name.clone()
    }

    pub fn parent(&self, id: CategoryId) -> Option<CategoryId> {
        let index = self.index_of(id)?;
        self.arena.read().nodes[index]
            .parent
            .map(|parent| self.handle(parent))
    }

    /// Direct children of a category, in insertion order.
    pub fn children(&self, id: CategoryId) -> Vec<CategoryId> {
        let Some(index) = self.index_of(id) else {
            return Vec::new();
        };

        self.arena.read().nodes[index]
            .children
            .iter()
            .map(|&child| self.handle(child))
            .collect()
    }

    /// Number of categories, including the root.
    pub fn len(&self) -> usize {
        self.arena.read().nodes.len()
    }

    /// A tree always holds its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Insert the folded namespace of `id` and of every descendant into `out`.
    ///
    /// Returns `false` (and inserts nothing) if the id belongs to another tree.
    pub fn collect_subtree_namespaces(&self, id: CategoryId, out: &mut HashSet<String>) -> bool {
        let Some(start) = self.index_of(id) else {
            return false;
        };

        let arena = self.arena.read();
        let mut stack = vec![start as u32];

        while let Some(index) = stack.pop() {
            let node = &arena.nodes[index as usize];
            out.insert(normalize_namespace(&node.namespace).into_owned());
            stack.extend_from_slice(&node.children);
        }

        true
    }

    fn handle(&self, index: u32) -> CategoryId {
        CategoryId {
            tree: self.id,
            index,
        }
    }

    fn index_of(&self, id: CategoryId) -> Option<usize> {
        if id.tree != self.id {
            return None;
        }
        let index = id.index as usize;
        (index < self.arena.read().nodes.len()).then_some(index)
    }
}

impl Default for CategoryTree {
    fn default() -> Self {
        Self::new()
    }
}

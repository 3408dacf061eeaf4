//! Forgiving parser for the indentation based `.pairs` format.
//!
//! The format is a small YAML-like subset:
//!
//! ```text
//! # comment
//! pairs:
//!   gc: Grumpy Cat; grumpy.cat
//!   rw: Robert A. Wallis; robert.wallis
//! email:
//!   prefix: team
//!   domain: example.com
//! global: true
//! ```
//!
//! Parsing never fails. Lines that do not fit are attached wherever the
//! indentation points, or dropped. Indentation is counted one unit per
//! leading whitespace character, so a tab and a space weigh the same.

mod node;

pub use node::Node;

const ROOT: usize = 0;

/// One open indentation level.
#[derive(Debug, Clone, Copy)]
struct Scope {
    parent: usize,
    node: usize,
    depth: isize,
}

/// Flat storage used while parsing; turned into an owned [`Node`] tree at the end.
struct Arena {
    nodes: Vec<Option<Node>>,
    children: Vec<Vec<usize>>,
}

impl Arena {
    fn new() -> Self {
        Self {
            nodes: vec![Some(Node::root())],
            children: vec![Vec::new()],
        }
    }

    fn insert(&mut self, node: Node) -> usize {
        self.nodes.push(Some(node));
        self.children.push(Vec::new());
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: usize, child: usize) {
        self.children[parent].push(child);
    }

    fn append_value(&mut self, id: usize, line: &str) {
        if let Some(node) = self.nodes[id].as_mut() {
            node.append_value(line);
        }
    }

    fn build(&mut self, id: usize) -> Node {
        let mut node = self.nodes[id].take().unwrap_or_default();
        for child in std::mem::take(&mut self.children[id]) {
            let built = self.build(child);
            node.add_child(built);
        }
        node
    }
}

/// Parse `.pairs` text into a tree rooted at a keyless node.
pub fn parse(text: &str) -> Node {
    let mut arena = Arena::new();
    let mut scopes = vec![Scope {
        parent: ROOT,
        node: ROOT,
        depth: -1,
    }];

    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let depth = depth(line) as isize;

        // shallower: close every scope at or below this depth
        if depth < top(&scopes).depth {
            while scopes.len() > 1 && depth <= top(&scopes).depth {
                scopes.pop();
            }
        }

        if let Some((key, rest)) = trimmed.split_once(':') {
            let id = arena.insert(Node::keyed(key));

            let current = top(&scopes);
            if depth > current.depth {
                scopes.push(Scope {
                    parent: current.node,
                    node: id,
                    depth,
                });
            } else if let Some(last) = scopes.last_mut() {
                // same depth: sibling replaces the current node
                last.node = id;
            }

            arena.attach(top(&scopes).parent, id);

            let rest = rest.trim();
            if !rest.is_empty() {
                arena.append_value(id, rest);
            }
        } else {
            let current = top(&scopes);
            if depth > current.depth {
                arena.append_value(current.node, trimmed);
            } else if depth == current.depth {
                arena.append_value(current.parent, trimmed);
            }
        }
    }

    arena.build(ROOT)
}

fn top(scopes: &[Scope]) -> Scope {
    scopes.last().copied().unwrap_or(Scope {
        parent: ROOT,
        node: ROOT,
        depth: -1,
    })
}

/// Number of leading whitespace characters (space, tab, `\r`, `\n`).
///
/// A line made only of whitespace has depth 0.
pub fn depth(line: &str) -> usize {
    line.chars()
        .position(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
        .unwrap_or(0)
}

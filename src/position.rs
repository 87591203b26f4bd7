//! Source position lookup for document fields.
//!
//! The typed [`Document`](crate::config::Document) carries no location
//! metadata. To point a diagnostic at a line, the source text is parsed a
//! second time with `yaml-rust2`'s event API into a small tree of nodes that
//! only remember where they start, and field paths are resolved against it.
//!
//! Field paths use dot notation with brackets for indices and for keys that
//! contain dots or slashes:
//!
//! ```text
//! files.vimrc.source
//! packages.apt[2]
//! dconf.settings["/org/gnome/desktop/interface/gtk-theme"]
//! ```

use std::path::Path;

use log::warn;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::Marker;

/// A 1-based line and column in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    fn from_marker(marker: &Marker) -> Self {
        Self {
            line: marker.line(),
            column: marker.col() + 1,
        }
    }
}

/// A segment of a parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key for accessing mapping members
    Key(String),
    /// A numeric index for accessing sequence elements
    Index(usize),
}

/// Parse a field path into segments.
///
/// Supports:
/// - Dot notation: `files.vimrc.source`
/// - Bracket notation: `settings["/a.b"]` or `settings['/a.b']`
/// - Sequence indices: `packages.apt[0]`
/// - Escaped characters: `files.my\.conf` (literal dot)
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    if path.trim().is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }

                match chars.peek().copied() {
                    Some(quote @ ('"' | '\'')) => {
                        chars.next();
                        let mut key = String::new();
                        let mut bracket_escaped = false;
                        while let Some(ch) = chars.next() {
                            if bracket_escaped {
                                key.push(ch);
                                bracket_escaped = false;
                            } else if ch == '\\' {
                                bracket_escaped = true;
                            } else if ch == quote && chars.peek() == Some(&']') {
                                chars.next();
                                break;
                            } else {
                                key.push(ch);
                            }
                        }
                        segments.push(PathSegment::Key(key));
                    }
                    _ => {
                        let mut content = String::new();
                        for next in chars.by_ref() {
                            if next == ']' {
                                break;
                            }
                            content.push(next);
                        }
                        let content = content.trim();
                        if let Ok(index) = content.parse::<usize>() {
                            segments.push(PathSegment::Index(index));
                        } else if !content.is_empty() {
                            segments.push(PathSegment::Key(content.to_string()));
                        }
                    }
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    segments
}

/// Append `key` to a field path, bracketing it when it would not survive
/// [`parse_path`] in dot form.
pub fn join_key(parent: &str, key: &str) -> String {
    let plain = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    match (parent.is_empty(), plain) {
        (true, true) => key.to_string(),
        (false, true) => format!("{}.{}", parent, key),
        (_, false) => format!("{}[\"{}\"]", parent, key.replace('\\', "\\\\")),
    }
}

/// Append a sequence index to a field path.
pub fn join_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

#[derive(Debug, Clone)]
enum Node {
    /// Aliases are kept as scalars without a value.
    Scalar(Position, Option<String>),
    Sequence(Position, Vec<Node>),
    Mapping(Position, Vec<Entry>),
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    key_position: Position,
    value: Node,
}

impl Node {
    fn position(&self) -> Position {
        match self {
            Node::Scalar(position, _) | Node::Sequence(position, _) | Node::Mapping(position, _) => {
                *position
            }
        }
    }
}

/// Line and column lookup for one source document.
#[derive(Debug, Clone, Default)]
pub struct PositionIndex {
    root: Option<Node>,
}

impl PositionIndex {
    /// Index `content`. Returns `None` if it cannot be parsed; callers then
    /// report without locations.
    pub fn parse(content: &str) -> Option<Self> {
        let mut builder = Builder::default();
        let mut parser = Parser::new_from_str(content);
        match parser.load(&mut builder, false) {
            Ok(()) if !builder.broken => Some(Self { root: builder.root }),
            Ok(()) => {
                warn!("Position index is incomplete; diagnostics will have no locations");
                None
            }
            Err(e) => {
                warn!("Cannot index source positions: {}", e);
                None
            }
        }
    }

    /// Read and index a file, degrading to `None` on any failure.
    pub fn from_file(path: &Path) -> Option<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!("Cannot read {} for position indexing: {}", path.display(), e);
                None
            }
        }
    }

    /// Position of the node at `field_path`.
    ///
    /// For a mapping member this is the position of its key, which is where
    /// the line a reader looks for starts.
    pub fn locate(&self, field_path: &str) -> Option<Position> {
        self.node_at(field_path).map(|(_, position)| position)
    }

    /// The scalar at `field_path` as written in the source.
    pub fn scalar(&self, field_path: &str) -> Option<&str> {
        match self.node_at(field_path)? {
            (Node::Scalar(_, value), _) => value.as_deref(),
            _ => None,
        }
    }

    /// Index of the first item of the sequence at `list_path` that is
    /// identified by `identity`.
    ///
    /// An item matches when it is a scalar equal to `identity`, a mapping
    /// whose `key` member equals it, or a single-key mapping keyed by it.
    /// An empty `identity` also matches a mapping without a `key` member.
    pub fn find_item(&self, list_path: &str, key: &str, identity: &str) -> Option<usize> {
        let (Node::Sequence(_, items), _) = self.node_at(list_path)? else {
            return None;
        };
        items.iter().position(|item| match item {
            Node::Scalar(_, value) => value.as_deref() == Some(identity),
            Node::Mapping(_, entries) => match entries.iter().find(|entry| entry.key == key) {
                Some(entry) => {
                    matches!(&entry.value, Node::Scalar(_, Some(value)) if value == identity)
                }
                None => identity.is_empty() || (entries.len() == 1 && entries[0].key == identity),
            },
            Node::Sequence(..) => false,
        })
    }

    fn node_at(&self, field_path: &str) -> Option<(&Node, Position)> {
        let mut node = self.root.as_ref()?;
        let mut position = node.position();
        for segment in &parse_path(field_path) {
            let (next, next_position) = step(node, segment)?;
            node = next;
            position = next_position;
        }
        Some((node, position))
    }

    /// Position of the deepest existing node along `field_path`.
    ///
    /// Used for findings about fields that are absent: the diagnostic points
    /// at the entry that lacks them.
    pub fn locate_nearest(&self, field_path: &str) -> Option<Position> {
        let segments = parse_path(field_path);
        let mut node = self.root.as_ref()?;
        let mut position = node.position();
        for segment in &segments {
            match step(node, segment) {
                Some((next, next_position)) => {
                    node = next;
                    position = next_position;
                }
                None => break,
            }
        }
        Some(position)
    }
}

fn step<'a>(node: &'a Node, segment: &PathSegment) -> Option<(&'a Node, Position)> {
    match (node, segment) {
        (Node::Mapping(_, entries), PathSegment::Key(key)) => entries
            .iter()
            .rev()
            .find(|entry| &entry.key == key)
            .map(|entry| (&entry.value, entry.key_position)),
        (Node::Mapping(_, entries), PathSegment::Index(index)) => {
            let key = index.to_string();
            entries
                .iter()
                .find(|entry| entry.key == key)
                .map(|entry| (&entry.value, entry.key_position))
        }
        (Node::Sequence(_, items), PathSegment::Index(index)) => {
            items.get(*index).map(|item| (item, item.position()))
        }
        _ => None,
    }
}

enum Partial {
    Sequence(Position, Vec<Node>),
    Mapping {
        position: Position,
        entries: Vec<Entry>,
        pending_key: Option<(String, Position)>,
    },
}

#[derive(Default)]
struct Builder {
    stack: Vec<Partial>,
    root: Option<Node>,
    broken: bool,
}

impl Builder {
    fn complete(&mut self, node: Node, scalar: Option<String>) {
        let Some(parent) = self.stack.last_mut() else {
            if self.root.is_none() {
                self.root = Some(node);
            }
            return;
        };
        match parent {
            Partial::Sequence(_, items) => items.push(node),
            Partial::Mapping {
                entries,
                pending_key,
                ..
            } => match pending_key.take() {
                Some((key, key_position)) => entries.push(Entry {
                    key,
                    key_position,
                    value: node,
                }),
                None => *pending_key = Some((scalar.unwrap_or_default(), node.position())),
            },
        }
    }
}

impl MarkedEventReceiver for Builder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        let position = Position::from_marker(&marker);
        match event {
            Event::Scalar(value, ..) => {
                self.complete(Node::Scalar(position, Some(value.clone())), Some(value))
            }
            Event::Alias(..) => self.complete(Node::Scalar(position, None), None),
            Event::SequenceStart(..) => self.stack.push(Partial::Sequence(position, Vec::new())),
            Event::MappingStart(..) => self.stack.push(Partial::Mapping {
                position,
                entries: Vec::new(),
                pending_key: None,
            }),
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Partial::Sequence(start, items)) => {
                    self.complete(Node::Sequence(start, items), None)
                }
                Some(Partial::Mapping {
                    position: start,
                    entries,
                    ..
                }) => self.complete(Node::Mapping(start, entries), None),
                None => self.broken = true,
            },
            _ => {}
        }
    }
}

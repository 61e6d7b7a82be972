//! A simple owned tree used for hierarchical listings.
//!
//! ## Example Output
//!
//! ```text
//! Visual Studio 2022
//! ├── devenv.com_x86
//! └── vcvarsall.bat
//! ```

use std::fmt;

/// A value with an ordered list of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
    pub value: T,
    pub children: Vec<Node<T>>,
}

impl<T> Node<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            children: Vec::new(),
        }
    }

    /// Append a child and return it for further nesting.
    pub fn add_child(&mut self, value: T) -> &mut Node<T> {
        self.children.push(Node::new(value));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn with_children<I: IntoIterator<Item = T>>(mut self, values: I) -> Self {
        self.children.extend(values.into_iter().map(Node::new));
        self
    }
}

impl<T: fmt::Display> Node<T> {
    /// Render with box drawing branches.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.value);
        render_children(&self.children, "", &mut out);
        out
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{}{}", "\t".repeat(depth), self.value)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

fn render_children<T: fmt::Display>(children: &[Node<T>], prefix: &str, out: &mut String) {
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        let is_last = i == count - 1;
        let branch = if is_last { "└──" } else { "├──" };
        out.push_str(&format!("{}{} {}\n", prefix, branch, child.value));
        let next = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
        render_children(&child.children, &next, out);
    }
}

/// One line per node, indented with a tab per level.
impl<T: fmt::Display> fmt::Display for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node<&'static str> {
        let mut root = Node::new("root");
        root.add_child("a").add_child("a1");
        root.add_child("b");
        root
    }

    #[test]
    fn test_display_is_tab_indented() {
        assert_eq!(sample().to_string(), "root\n\ta\n\t\ta1\n\tb\n");
    }

    #[test]
    fn test_render_branches() {
        assert_eq!(
            sample().render(),
            "root\n├── a\n│   └── a1\n└── b\n"
        );
    }

    #[test]
    fn test_with_children() {
        let node = Node::new(1).with_children([2, 3]);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.render(), "1\n├── 2\n└── 3\n");
    }
}

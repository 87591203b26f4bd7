//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the include
//! hierarchy of a machine document in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Include Tree Visualization**: Displays every document that was loaded,
//!   in the order its parent pulled it in
//! - **Depth Control**: Supports `--depth` flag to limit tree depth
//! - **Descriptions**: Shows the include description next to each fragment
//!
//! Conditional includes that do not hold on this host are not shown. This
//! command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use machinecfg::loader::IncludeTree;

use super::DocumentArgs;

/// Display the include tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the root document, 1 to show its direct includes, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let path = args.document.document_path();
    println!("🌳 Include tree for: {}", path.display());

    let (_, include_tree) = super::load_tree(&path)?;

    let tree_root = build_tree_node(&include_tree, args.depth.unwrap_or(usize::MAX), 0);
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

/// Build a tree node from an include tree node
fn build_tree_node(node: &IncludeTree, max_depth: usize, current_depth: usize) -> TreeNode {
    let label = if node.description.is_empty() {
        node.path.display().to_string()
    } else {
        format!("{} ({})", node.path.display(), node.description)
    };

    if current_depth >= max_depth || node.children.is_empty() {
        TreeNode {
            label,
            children: vec![],
        }
    } else {
        let children = node
            .children
            .iter()
            .map(|child| build_tree_node(child, max_depth, current_depth + 1))
            .collect();
        TreeNode { label, children }
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}

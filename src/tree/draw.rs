use std::fmt::{self, Display, Write};

use super::children::ChildStore;
use super::{NodeId, Tree};

impl<P, C: ChildStore> Tree<P, C> {
    /// Draws the tree one node per line, with `format_payload` rendering the payloads.
    ///
    /// ```text
    /// tree 0, 3 nodes
    ///   └── 0 [0]: root
    ///       ├── 1 [0]: a
    ///       └── 2 [1]: b
    /// ```
    pub fn draw(&self, mut format_payload: impl FnMut(&P) -> String) -> String {
        let mut output = String::new();
        self.draw_into(&mut output, &mut format_payload)
            .expect("[consistency] writing to a String cannot fail");
        output
    }

    fn draw_into<W: Write>(
        &self,
        f: &mut W,
        format_payload: &mut impl FnMut(&P) -> String,
    ) -> fmt::Result {
        writeln!(f, "tree {}, {} nodes", self.id(), self.len())?;

        // (node, prefix of its line, whether it is the last of its siblings)
        let mut stack: Vec<(NodeId, String, bool)> =
            self.root().map(|root| (root, "  ".to_owned(), true)).into_iter().collect();
        while let Some((id, prefix, is_last_child)) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            let connector = if is_last_child { "└── " } else { "├── " };
            writeln!(
                f,
                "{prefix}{connector}{id} [{}]: {}",
                node.index(),
                format_payload(node.payload())
            )?;

            let child_prefix = format!("{prefix}{}", if is_last_child { "    " } else { "│   " });
            for (i, child) in node.child_ids().rev().enumerate() {
                stack.push((child, child_prefix.clone(), i == 0));
            }
        }
        Ok(())
    }
}

impl<P: Display, C: ChildStore> Display for Tree<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.draw_into(f, &mut |payload: &P| payload.to_string())
    }
}

//! Text rendering of codex subtrees with box-drawing connectors

use crate::domain::codex::Codex;
use crate::domain::entry::EntryId;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const CONTINUATION: &str = "│   ";
const BLANK: &str = "    ";

impl Codex {
    /// Lazy line-by-line rendering of the subtree below `id`.
    ///
    /// Entries at or beyond `maxdepth` are printed without their children.
    pub fn tree(&self, id: EntryId, maxdepth: Option<usize>) -> TreeLines<'_> {
        let mut stack = Vec::new();
        if self.get_entry(id).is_some() {
            stack.push(Frame {
                id,
                line_prefix: String::new(),
                child_prefix: String::new(),
                depth: self.depth(id),
            });
        }
        TreeLines {
            codex: self,
            stack,
            maxdepth,
        }
    }

    /// Rendered subtree, one newline-terminated line per entry.
    pub fn render_tree(&self, id: EntryId, maxdepth: Option<usize>) -> String {
        self.tree(id, maxdepth).fold(String::new(), |mut out, line| {
            out.push_str(&line);
            out.push('\n');
            out
        })
    }

    /// Path from the root down to `id`, rendered like a single-branch tree.
    pub fn ancestry(&self, id: EntryId) -> String {
        let mut path: Vec<EntryId> = self.ancestors(id).collect();
        path.reverse();

        let mut out = String::new();
        for (i, &current) in path.iter().enumerate() {
            let Some(entry) = self.get_entry(current) else {
                continue;
            };
            if i > 0 {
                out.push_str(&BLANK.repeat(i - 1));
                out.push_str(LAST_BRANCH);
            }
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }
}

struct Frame {
    id: EntryId,
    line_prefix: String,
    child_prefix: String,
    depth: usize,
}

/// Iterator over rendered tree lines (without trailing newline).
pub struct TreeLines<'a> {
    codex: &'a Codex,
    stack: Vec<Frame>,
    maxdepth: Option<usize>,
}

impl Iterator for TreeLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            let Some(entry) = self.codex.get_entry(frame.id) else {
                continue;
            };
            let line = format!("{}{}", frame.line_prefix, entry);

            if !self.maxdepth.is_some_and(|max| max <= frame.depth) {
                let last = entry.children().len().saturating_sub(1);
                for (i, &child) in entry.children().iter().enumerate().rev() {
                    let (branch, continuation) = if i == last {
                        (LAST_BRANCH, BLANK)
                    } else {
                        (BRANCH, CONTINUATION)
                    };
                    self.stack.push(Frame {
                        id: child,
                        line_prefix: format!("{}{}", frame.child_prefix, branch),
                        child_prefix: format!("{}{}", frame.child_prefix, continuation),
                        depth: frame.depth + 1,
                    });
                }
            }
            return Some(line);
        }
        None
    }
}

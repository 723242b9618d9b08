use std::fmt::{self, Write};

use super::{Document, Node, NodeId};

impl Document {
    /// Indented dump with each element's geometry after its tag.
    pub fn dump_geometry(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_node(&mut out, self.root, 0, true);
        out
    }

    fn write_node<W: Write>(&self, out: &mut W, id: NodeId, depth: usize, geometry: bool) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Some(Node::Element(el)) => {
                write!(out, "{indent}<{}", el.tag())?;
                for (name, value) in el.attributes() {
                    write!(out, " {name}=\"{value}\"")?;
                }
                write!(out, ">")?;
                if geometry {
                    let r = el.rect;
                    write!(out, " [{} {} {}x{}]", r.x, r.y, r.width, r.height)?;
                }
                writeln!(out)?;
            }
            Some(Node::Text(text)) => writeln!(out, "{indent}\"{text}\"")?,
            None => return Ok(()),
        }
        for child in self.children(id) {
            self.write_node(out, child, depth + 1, geometry)?;
        }
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.root, 0, false)
    }
}

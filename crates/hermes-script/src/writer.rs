//! Indentation-tracking text output.

/// Accumulates generated source, indenting each line to the current depth.
#[derive(Debug, Clone)]
pub(crate) struct ScriptWriter {
    out: String,
    depth: usize,
    indent: &'static str,
}

impl ScriptWriter {
    /// Creates a writer indenting with `indent` per level.
    pub(crate) fn new(indent: &'static str) -> Self {
        Self {
            out: String::new(),
            depth: 0,
            indent,
        }
    }

    /// Writes one line at the current depth. Blank text writes an empty line.
    pub(crate) fn line(&mut self, text: &str) {
        if !text.trim().is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(self.indent);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Writes an empty line.
    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Writes several lines verbatim, each at the current depth.
    pub(crate) fn lines(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    /// Runs `body` one level deeper.
    pub(crate) fn indented<F>(&mut self, body: F)
    where
        F: FnOnce(&mut Self),
    {
        self.depth += 1;
        body(self);
        self.depth -= 1;
    }

    /// Writes `header {`, the body one level deeper, then `}` plus `close`.
    pub(crate) fn block<F>(&mut self, header: &str, close: &str, body: F)
    where
        F: FnOnce(&mut Self),
    {
        self.line(&format!("{header} {{"));
        self.indented(body);
        self.line(&format!("}}{close}"));
    }

    /// Writes a JSDoc comment. One line collapses to `/** text */`.
    pub(crate) fn doc(&mut self, text: &str) {
        let lines: Vec<&str> = text.lines().collect();
        match lines.as_slice() {
            [] => {}
            [single] => self.line(&format!("/** {} */", single.trim())),
            many => {
                self.line("/**");
                for line in many {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        self.line(" *");
                    } else {
                        self.line(&format!(" * {trimmed}"));
                    }
                }
                self.line(" */");
            }
        }
    }

    /// Returns the generated text.
    pub(crate) fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_indentation() {
        let mut w = ScriptWriter::new("  ");
        w.block("class A", "", |w| {
            w.block("run()", "", |w| w.line("return 1;"));
        });
        assert_eq!(w.finish(), "class A {\n  run() {\n    return 1;\n  }\n}\n");
    }

    #[test]
    fn test_doc_comments() {
        let mut w = ScriptWriter::new("  ");
        w.doc("One line.");
        w.doc("First.\n\n@param {number} id");
        w.doc("");
        assert_eq!(
            w.finish(),
            "/** One line. */\n/**\n * First.\n *\n * @param {number} id\n */\n"
        );
    }

    #[test]
    fn test_blank_lines_are_not_indented() {
        let mut w = ScriptWriter::new("    ");
        w.block("if (x)", ";", |w| {
            w.lines("a();\n\nb();");
        });
        assert_eq!(w.finish(), "if (x) {\n    a();\n\n    b();\n};\n");
    }
}

// Copyright 2024 Oxide Computer Company

/// Indentation aware line buffer for generated Bluespec text.
#[derive(Debug, Default, Clone)]
pub struct BsvBuilder {
    text: String,
    indent: usize,
}

const INDENT: &str = "  ";

impl BsvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, s: impl AsRef<str>) -> &mut Self {
        for _ in 0..self.indent {
            self.text.push_str(INDENT);
        }
        self.text.push_str(s.as_ref());
        self.text.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.text.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    /// Emit `open`, the lines written by `body` one level deeper, then
    /// `close`.
    pub fn block(
        &mut self,
        open: impl AsRef<str>,
        close: impl AsRef<str>,
        body: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close)
    }

    pub fn append(&mut self, other: &BsvBuilder) -> &mut Self {
        for l in other.text.lines() {
            if l.is_empty() {
                self.blank();
            } else {
                self.line(l);
            }
        }
        self
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn finish(self) -> String {
        self.text
    }
}

impl From<String> for BsvBuilder {
    fn from(text: String) -> Self {
        Self { text, indent: 0 }
    }
}

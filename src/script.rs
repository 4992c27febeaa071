//! Shell script assembly.
//!
//! The generated scripts (the init script, the module loader, the modprobe
//! stub) are built as ordered statement lists and rendered to text in one
//! step, so their logic can be asserted on without string-scraping a giant
//! template.

/// Logging helper sourced into every generated script.
///
/// Writes kernel-style `<6>` (info) lines to `/dev/kmsg` when the node
/// exists, so messages land in the kernel log; falls back to stdout before
/// the device nodes are usable.
pub const LOG_HELPER: &str = "\
log() {
  if [ -e /dev/kmsg ]; then
    echo \"<6>guestramfs: $*\" >/dev/kmsg
  else
    echo \"guestramfs: $*\"
  fi
}";

/// An ordered list of shell statements, rendered line by line.
#[derive(Debug, Default)]
pub struct ShellScript {
    lines: Vec<String>,
}

impl ShellScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single statement.
    pub fn line(&mut self, stmt: impl Into<String>) -> &mut Self {
        self.lines.push(stmt.into());
        self
    }

    /// Append an empty line.
    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// Append a multi-line snippet verbatim, one statement per line.
    pub fn block(&mut self, snippet: &str) -> &mut Self {
        for line in snippet.lines() {
            self.lines.push(line.to_string());
        }
        self
    }

    /// Render to text. Every line, including the last, ends with a newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Quote a string for use as a single shell word.
///
/// Wraps in single quotes, closing and reopening around embedded quotes
/// (`don't` becomes `'don'\''t'`).
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

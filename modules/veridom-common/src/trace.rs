//! Execution trace: the linear, append-only log of everything the
//! exploration engine did, carried verbatim into the verdict.

/// Lines are formatted `:icon: message` and never reordered or merged; the
/// trace is the audit trail for why scores came out the way they did.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    lines: Vec<String>,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, icon: &str, message: impl AsRef<str>) {
        self.lines.push(format!(":{}: {}", icon, message.as_ref()));
    }

    /// Open a named section. Subsequent lines belong to it until the next
    /// divider.
    pub fn section(&mut self, name: &str) {
        self.lines.push(format!("=== {name} ==="));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_formats_icon_prefix() {
        let mut trace = ExecutionTrace::new();
        trace.push("rocket", "Engine initialized");
        trace.push("warning", "Something degraded");
        assert_eq!(trace.lines()[0], ":rocket: Engine initialized");
        assert_eq!(trace.lines()[1], ":warning: Something degraded");
    }

    #[test]
    fn preserves_append_order() {
        let mut trace = ExecutionTrace::new();
        trace.push("computer", "first");
        trace.push("mag", "second");
        trace.push("iphone", "third");
        let lines = trace.into_lines();
        assert_eq!(lines[0], ":computer: first");
        assert_eq!(lines[1], ":mag: second");
        assert_eq!(lines[2], ":iphone: third");
    }

    #[test]
    fn sections_become_divider_lines() {
        let mut trace = ExecutionTrace::new();
        trace.section("Static Analysis");
        trace.push("mag", "checking");
        trace.section("Browser Session");
        let lines = trace.into_lines();
        assert_eq!(lines[0], "=== Static Analysis ===");
        assert_eq!(lines[1], ":mag: checking");
        assert_eq!(lines[2], "=== Browser Session ===");
    }
}

/// Accumulates source text line by line with two-space indentation.
#[derive(Debug, Default)]
pub struct Printer {
    output: String,
    indentation: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `text`, indenting every line of it.
    pub fn line(&mut self, text: &str) {
        for line in text.split('\n') {
            if !line.is_empty() {
                for _ in 0..self.indentation {
                    self.output.push_str("  ");
                }
            }
            self.output.push_str(line);
            self.output.push('\n');
        }
    }

    pub fn indent(&mut self) {
        self.indentation += 1;
    }

    pub fn dedent(&mut self) {
        self.indentation = self.indentation.saturating_sub(1);
    }

    pub fn finish(self) -> String {
        self.output
    }
}

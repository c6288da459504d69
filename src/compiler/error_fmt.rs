//! Rustc-style rendering of template errors with source context.

use super::error::SyntaxError;

/// Longest template line shown before it is cut down around the caret.
const MAX_LINE_LEN: usize = 80;
const CONTEXT_CHARS: usize = 30;

/// Configuration for formatting an error with source context.
pub struct ErrorFormat<'a> {
    /// The error message (e.g., "unmatched `end`")
    pub message: &'a str,
    /// Template source
    pub source: &'a str,
    /// 1-based line of the error
    pub line: usize,
    /// 1-based byte column within the line
    pub column: usize,
    /// Name shown in the location line, such as `Query.GetByID`
    pub name: &'a str,
    /// Annotation under the caret (e.g., "found: {{fi x}}")
    pub annotation: Option<String>,
    /// Help text
    pub help: Option<&'a str>,
}

impl<'a> ErrorFormat<'a> {
    pub fn new(message: &'a str, source: &'a str, line: usize, column: usize) -> Self {
        Self {
            message,
            source,
            line,
            column,
            name: "template",
            annotation: None,
            help: None,
        }
    }

    pub fn name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    pub fn annotation(mut self, ann: String) -> Self {
        self.annotation = Some(ann);
        self
    }

    pub fn help(mut self, help: &'a str) -> Self {
        self.help = Some(help);
        self
    }

    /// Formats the error with source context.
    ///
    /// ```text
    /// error: message
    ///  --> name:line:column
    ///   |
    /// N | template line
    ///   |     ^ annotation
    /// help: suggestion
    /// ```
    pub fn format(&self) -> String {
        let mut msg = format!("error: {}\n", self.message);
        msg.push_str(&format!(" --> {}:{}:{}\n", self.name, self.line, self.column));

        if let Some(content) = self.line.checked_sub(1).and_then(|i| self.source.lines().nth(i)) {
            let content = content.trim_end_matches('\r');

            // Caret position in characters, with tabs shown as four spaces.
            let byte_col = self.column.saturating_sub(1);
            let visual_column: usize = content
                .char_indices()
                .take_while(|(i, _)| *i < byte_col)
                .map(|(_, c)| if c == '\t' { 4 } else { 1 })
                .sum();

            let expanded = content.replace('\t', "    ");
            let leading = expanded.chars().count() - expanded.trim_start().chars().count();
            let trimmed = expanded.trim();
            let caret = visual_column.saturating_sub(leading);

            let (display, caret) = truncate_around(trimmed, caret);

            let width = self.line.to_string().len();
            let annotation = self.annotation.as_deref().unwrap_or("");
            msg.push_str(&format!("{:>width$} |\n", ""));
            msg.push_str(&format!("{:>width$} | {}\n", self.line, display));
            msg.push_str(
                format!("{:>width$} | {:>caret$}^ {}", "", "", annotation)
                    .trim_end(),
            );
            msg.push('\n');
        }

        if let Some(help) = self.help {
            msg.push_str(&format!("help: {help}\n"));
        }

        msg
    }
}

/// Cuts `content` down to a window around `caret` when it is too long.
/// Returns the text to show and the caret column within it.
fn truncate_around(content: &str, caret: usize) -> (String, usize) {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() <= MAX_LINE_LEN {
        return (content.to_string(), caret);
    }

    let start = caret.saturating_sub(CONTEXT_CHARS).min(chars.len());
    let end = (caret + CONTEXT_CHARS).min(chars.len());
    let prefix = if start > 0 { "..." } else { "" };
    let suffix = if end < chars.len() { "..." } else { "" };
    let snippet: String = chars[start..end].iter().collect();

    (
        format!("{prefix}{snippet}{suffix}"),
        caret.saturating_sub(start) + prefix.len(),
    )
}

impl SyntaxError {
    /// Renders this error against the template it came from.
    pub fn display_with_source(&self, source: &str, name: &str) -> String {
        let message = self.message();
        let mut format = ErrorFormat::new(&message, source, self.line, self.column).name(name);
        if let Some(found) = &self.found {
            format = format.annotation(format!("found: {{{{{found}}}}}"));
        }
        if let Some(help) = self.kind.suggestion() {
            format = format.help(help);
        }
        format.format()
    }
}

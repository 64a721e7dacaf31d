use std::io::{BufRead, Write};

use crate::parser::{is_valid_ticket_key, ReferenceResolver};

/// Resolver for non-interactive runs: every ambiguous entry is skipped.
pub struct AutoSkipResolver;

impl ReferenceResolver for AutoSkipResolver {
    fn resolve(&mut self, _note: &str) -> Option<String> {
        None
    }
}

/// Terminal prompt loop for entries whose note carries no ticket token.
///
/// Keeps asking until a validly formatted key or a skip signal (`s`/`skip`,
/// case-insensitive) is given. End of input counts as a skip.
pub struct PromptResolver<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> ReferenceResolver for PromptResolver<R, W> {
    fn resolve(&mut self, note: &str) -> Option<String> {
        let _ = writeln!(self.writer, "Entry note has no ticket reference: {}", note);

        loop {
            let _ = write!(self.writer, "JIRA ticket key for this entry (or 's' to skip): ");
            let _ = self.writer.flush();

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }

            let input = line.trim();
            if input.eq_ignore_ascii_case("s") || input.eq_ignore_ascii_case("skip") {
                return None;
            }
            if is_valid_ticket_key(input) {
                return Some(input.to_string());
            }

            let _ = writeln!(
                self.writer,
                "Invalid key `{}`, expected LETTERS-DIGITS (e.g. PROJ-123)",
                input
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::AutoSkipResolver;
    use super::PromptResolver;
    use crate::parser::ReferenceResolver;

    #[test]
    fn test_auto_skip_always_cancels() {
        let mut resolver = AutoSkipResolver;

        assert_eq!(resolver.resolve("whatever"), None);
    }

    #[rstest]
    #[case::valid_key("PROJ-123\n", Some("PROJ-123"))]
    #[case::skip_short("s\n", None)]
    #[case::skip_word("skip\n", None)]
    #[case::skip_case_insensitive("SKIP\n", None)]
    #[case::retry_until_valid("garbage\nPROJ-9\n", Some("PROJ-9"))]
    #[case::end_of_input("", None)]
    fn test_prompt_resolver(#[case] input: &str, #[case] expected: Option<&str>) {
        let mut writer = Vec::new();
        let mut resolver = PromptResolver::new(Cursor::new(input), &mut writer);

        let resolved = resolver.resolve("worked on things");

        assert_eq!(resolved.as_deref(), expected);
    }

    /// A rejected answer is named before the prompt repeats.
    #[test]
    fn test_prompt_resolver_reports_invalid_input() {
        let mut writer = Vec::new();
        let mut resolver = PromptResolver::new(Cursor::new("nope\ns\n"), &mut writer);

        resolver.resolve("worked on things");

        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("Invalid key `nope`"));
    }
}

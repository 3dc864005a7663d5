//! Import statement handling
//!
//! An import statement starts at the beginning of a line with the `import`
//! keyword and runs to its first `;` outside a string literal. It may span
//! several lines (`import {\n  A,\n  B\n} from "./x.sol";`) and may carry a
//! trailing comment, but nothing else may follow it on the same line.

use regex::Regex;
use std::sync::OnceLock;

fn import_statement() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^\s*import\s+(?:"[^"\n]*"|'[^'\n]*'|[^;"'])*;[ \t]*(?://[^\n]*|/\*[^\n]*?\*/)?\s*$"#,
        )
        .expect("valid import regex")
    })
}

fn string_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("valid literal regex"))
}

/// Removes every import statement and trims the remaining text
pub fn strip_imports(content: &str) -> String {
    import_statement().replace_all(content, "").trim().to_string()
}

/// Returns the path of every import statement, in source order
///
/// The path is the first string literal of the statement, which covers
/// `import "x.sol";`, `import {A} from "x.sol";` and `import * as M from 'x.sol';`.
pub fn import_paths(content: &str) -> Vec<String> {
    import_statement()
        .find_iter(content)
        .filter_map(|statement| {
            string_literal()
                .captures(statement.as_str())
                .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| m.as_str().to_string())
        })
        .filter(|path| !path.is_empty())
        .collect()
}

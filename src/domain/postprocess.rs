//! Whole-artifact assembly and post-processing
//!
//! These passes run on the fully concatenated text because "keep only the
//! first occurrence" rules span file boundaries.

use regex::{Captures, Regex};

/// Canonical license marker
pub const LICENSE_MARKER: &str = "SPDX-License-Identifier:";

/// What per-file license markers are rewritten to
pub const DEMOTED_LICENSE_MARKER: &str = "License-Identifier:";

/// License declared for a flattened artifact by default
pub const DEFAULT_LICENSE: &str = "MIXED";

/// Directive that is only meaningful once per compilation unit
pub const ABI_ENCODER_V2: &str = "pragma experimental ABIEncoderV2;";

/// Concatenates per-file blocks
///
/// Each block is `// File <name>\n<content>\n`; blocks are separated by one
/// blank line.
pub fn assemble<'a>(blocks: impl IntoIterator<Item = (String, &'a str)>) -> String {
    let mut out = String::new();
    for (versioned_name, content) in blocks {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("// File {}\n", versioned_name));
        out.push_str(content);
        out.push('\n');
    }
    out
}

/// Post-processing passes applied to an assembled artifact
#[derive(Debug, Clone)]
pub struct PostProcessor {
    license: String,
    one_time_directives: Vec<String>,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_LICENSE, vec![ABI_ENCODER_V2.to_string()])
    }
}

impl PostProcessor {
    pub fn new(license: impl Into<String>, one_time_directives: Vec<String>) -> Self {
        Self {
            license: license.into(),
            one_time_directives,
        }
    }

    /// Runs every pass in order: license rewrite, header, directive dedupe, trim
    pub fn apply(&self, assembled: &str) -> String {
        let text = demote_license_markers(assembled);
        let mut text = format!("// {} {}\n\n{}", LICENSE_MARKER, self.license, text);
        for directive in &self.one_time_directives {
            text = keep_first_directive(&text, directive);
        }
        text.trim().to_string()
    }
}

/// Rewrites every canonical license marker to its demoted form
pub fn demote_license_markers(text: &str) -> String {
    text.replace(LICENSE_MARKER, DEMOTED_LICENSE_MARKER)
}

/// Removes every line-terminated occurrence of `directive` except the first
pub fn keep_first_directive(text: &str, directive: &str) -> String {
    if directive.trim().is_empty() {
        return text.to_string();
    }

    let pattern = format!(r"{}\r?\n", regex::escape(directive));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };

    let mut seen = false;
    re.replace_all(text, |caps: &Captures| {
        if seen {
            String::new()
        } else {
            seen = true;
            caps[0].to_string()
        }
    })
    .into_owned()
}

//! Repairs the quasi-JSON that `plutil -showjson` emits for some value shapes.
//!
//! Only one defect family is handled:
//! - a key whose value was dropped (`"k":}` / `"k":,`) gets an empty string;
//! - dangling separators before a list terminator (`,]`, `,,]`) are removed.
//!
//! The rewrites are purely textual and run once. Anything else stays broken.

use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

/// Colon rules run first: `"k":,]` becomes `"k":"",]`, which the comma rule then closes.
const RULES: [(&str, &str); 3] = [
    (r":\}", r#":""}"#),
    (r":,", r#":"","#),
    (r",+\]", "]"),
];

fn compiled_rules() -> &'static [(Regex, &'static str)] {
    static RULES_RE: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES_RE.get_or_init(|| {
        RULES
            .iter()
            .map(|(pattern, replacement)| {
                (
                    Regex::new(pattern).expect("repair patterns are valid regexes"),
                    *replacement,
                )
            })
            .collect()
    })
}

/// Result of a repair pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired<'a> {
    pub text: Cow<'a, str>,
    /// Number of rewritten spans across all rules.
    pub rewrites: usize,
}

/// Applies every rule once, borrowing the input when nothing matched.
pub fn repair_text(text: &str) -> Repaired<'_> {
    let mut out = Cow::Borrowed(text);
    let mut rewrites = 0;
    for (re, replacement) in compiled_rules() {
        let hits = re.find_iter(&out).count();
        if hits == 0 {
            continue;
        }
        rewrites += hits;
        let replaced = re.replace_all(&out, *replacement).into_owned();
        out = Cow::Owned(replaced);
    }
    Repaired { text: out, rewrites }
}

/// Rewrites malformed `plutil -showjson` output into parseable JSON.
pub fn repair(text: &str) -> String {
    repair_text(text).text.into_owned()
}

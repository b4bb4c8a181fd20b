//! Recursive-descent expansion of `$NAME` and `${NAME}` references.
//!
//! A reference is `$` followed by a name of `[A-Za-z0-9_]+`, optionally
//! wrapped in braces. `${NAME` without the closing brace is accepted and
//! ends at the name. A `$` followed by anything else (end of input, a space,
//! `{}`) is literal text.
//!
//! Unresolved references are dropped from the output rather than kept
//! literally.

/// A reference located in a string, as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    pub name: &'a str,
    /// Offset of the `$`.
    pub start: usize,
    /// Offset just past the reference (after `}` when braced).
    pub end: usize,
}

pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse the reference whose `$` sits at byte offset `start`.
pub fn reference_at(text: &str, start: usize) -> Option<Reference<'_>> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'$') {
        return None;
    }
    let braced = bytes.get(start + 1) == Some(&b'{');
    let name_start = start + 1 + usize::from(braced);
    let name_len = text[name_start..]
        .chars()
        .take_while(|c| is_name_char(*c))
        .count();
    if name_len == 0 {
        return None;
    }
    let name_end = name_start + name_len;
    let end = if braced && bytes.get(name_end) == Some(&b'}') {
        name_end + 1
    } else {
        name_end
    };
    Some(Reference {
        name: &text[name_start..name_end],
        start,
        end,
    })
}

pub fn has_reference(text: &str) -> bool {
    text.match_indices('$')
        .any(|(i, _)| reference_at(text, i).is_some())
}

/// Upper bound on nested value expansions in one `expand` call.
pub const DEFAULT_BUDGET: usize = 4096;

/// Expands references using `lookup` to resolve names.
///
/// References are walked left to right; only resolved values that hold
/// references of their own are expanded recursively. Three bounds keep
/// pathological tables finite:
///
/// - a name already being resolved further up is left unexpanded, so
///   cycles (`A=$B$B`, `B=$A$A`) stop on the first repeat;
/// - nesting deeper than `max_depth` is returned unexpanded;
/// - one call performs at most `budget` nested expansions, so fan-out
///   chains (`A1=$A2$A2`, `A2=$A3$A3`, ...) cannot grow exponentially.
pub struct Expander<L> {
    lookup: L,
    max_depth: usize,
    budget: usize,
}

/// Per-call state shared by every level of one expansion.
struct Walk {
    active: Vec<String>,
    budget: usize,
    exhausted: bool,
}

impl<L> Expander<L>
where
    L: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: L, max_depth: usize) -> Self {
        Self {
            lookup,
            max_depth,
            budget: DEFAULT_BUDGET,
        }
    }

    pub fn budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn expand(&self, value: &str) -> String {
        self.run(value, Vec::new())
    }

    /// Expand the stored value of `name`; references back to `name` stay
    /// unexpanded.
    pub fn expand_variable(&self, name: &str, value: &str) -> String {
        self.run(value, vec![name.to_string()])
    }

    fn run(&self, value: &str, active: Vec<String>) -> String {
        let mut walk = Walk {
            active,
            budget: self.budget,
            exhausted: false,
        };
        let out = self.parse_value(value, 0, &mut walk);
        if walk.exhausted {
            log::warn!("expansion budget of {} exhausted at {value:?}", self.budget);
        }
        out
    }

    fn parse_value(&self, value: &str, depth: usize, walk: &mut Walk) -> String {
        if !value.contains('$') {
            return value.to_string();
        }
        if depth > self.max_depth {
            log::warn!("expansion depth {} exceeded at {value:?}", self.max_depth);
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for (i, _) in value.match_indices('$') {
            if i < last {
                continue;
            }
            let Some(r) = reference_at(value, i) else {
                continue;
            };
            out.push_str(&value[last..r.start]);
            last = r.end;

            if walk.active.iter().any(|n| n == r.name) {
                out.push_str(&value[r.start..r.end]);
                continue;
            }
            let Some(resolved) = (self.lookup)(r.name) else {
                continue;
            };
            if !resolved.contains('$') {
                out.push_str(&resolved);
                continue;
            }
            if walk.budget == 0 {
                walk.exhausted = true;
                out.push_str(&resolved);
                continue;
            }
            walk.budget -= 1;
            walk.active.push(r.name.to_string());
            let nested = self.parse_value(&resolved, depth + 1, walk);
            walk.active.pop();
            out.push_str(&nested);
        }
        out.push_str(&value[last..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn expand_with(vars: &[(&str, &str)], value: &str) -> String {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Expander::new(|name: &str| map.get(name).cloned(), 32).expand(value)
    }

    #[test]
    fn reference_plain() {
        let r = reference_at("$FOO:bar", 0).unwrap();
        assert_eq!(r.name, "FOO");
        assert_eq!((r.start, r.end), (0, 4));
    }

    #[test]
    fn reference_braced() {
        let r = reference_at("a${FOO}b", 1).unwrap();
        assert_eq!(r.name, "FOO");
        assert_eq!(r.end, 7);
    }

    #[test]
    fn reference_unclosed_brace_is_lenient() {
        let r = reference_at("${FOO", 0).unwrap();
        assert_eq!(r.name, "FOO");
        assert_eq!(r.end, 5);
    }

    #[test]
    fn no_reference_for_bare_dollar() {
        assert!(reference_at("$", 0).is_none());
        assert!(reference_at("$ foo", 0).is_none());
        assert!(reference_at("${}", 0).is_none());
        assert!(!has_reference("cost: 5$"));
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(expand_with(&[], "hello world"), "hello world");
    }

    #[test]
    fn leading_reference() {
        assert_eq!(expand_with(&[("FOO", "/opt")], "$FOO/bin"), "/opt/bin");
    }

    #[test]
    fn middle_reference() {
        assert_eq!(
            expand_with(&[("FOO", "/opt")], "path=${FOO}/bin"),
            "path=/opt/bin"
        );
    }

    #[test]
    fn several_references() {
        assert_eq!(
            expand_with(&[("A", "1"), ("B", "2"), ("C", "3")], "$A-$B-${C}!"),
            "1-2-3!"
        );
    }

    #[test]
    fn chained_values() {
        let vars = [("FOO", "/opt"), ("FOO2", "$FOO"), ("TEST", "/foo/bar")];
        assert_eq!(expand_with(&vars, "$FOO2:${TEST}"), "/opt:/foo/bar");
    }

    #[test]
    fn unresolved_reference_dropped() {
        assert_eq!(expand_with(&[], "$FOO3"), "");
        assert_eq!(expand_with(&[], "$FOO3 bar"), " bar");
        assert_eq!(expand_with(&[("A", "x")], "pre $NOPE $A post"), "pre  x post");
    }

    #[test]
    fn literal_dollars_kept() {
        assert_eq!(expand_with(&[("A", "x")], "$A$"), "x$");
        assert_eq!(expand_with(&[("A", "x")], "5$ and ${} $A"), "5$ and ${} x");
    }

    #[test]
    fn name_stops_at_non_word_char() {
        assert_eq!(expand_with(&[("A", "x")], "$A.txt"), "x.txt");
        assert_eq!(expand_with(&[("A", "x")], "$AB"), "");
    }

    #[test]
    fn cycle_terminates() {
        let out = expand_with(&[("A", "$B"), ("B", "$A")], "$A");
        assert!(out == "$A" || out == "$B", "got {out}");
    }

    #[test]
    fn many_references_not_limited_by_depth() {
        let vars = [("X", "x")];
        let input = "$X".repeat(100);
        let out = Expander::new(
            |name: &str| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string()),
            4,
        )
        .expand(&input);
        assert_eq!(out, "x".repeat(100));
    }

    #[test]
    fn fan_out_cycle_terminates() {
        let vars = [("A", "$B$B"), ("B", "$A$A")];
        assert_eq!(expand_with(&vars, "$A"), "$A".repeat(4));
    }

    #[test]
    fn variable_does_not_expand_itself() {
        let map = [("A", "$B"), ("B", "x$A")];
        let out = Expander::new(
            |name: &str| map.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string()),
            32,
        )
        .expand_variable("A", "$B");
        assert_eq!(out, "x$A");
    }

    #[test]
    fn fan_out_chain_stops_at_budget() {
        let vars: Vec<(String, String)> = (0..30)
            .map(|i| (format!("A{i}"), format!("$A{0}$A{0}", i + 1)))
            .chain([("A30".to_string(), "x".to_string())])
            .collect();
        let out = Expander::new(
            |name: &str| vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone()),
            32,
        )
        .budget(64)
        .expand("$A0");
        assert!(out.contains('$'));
        assert!(out.len() < 1 << 16, "output grew to {} bytes", out.len());
    }

    #[test]
    fn long_input_with_many_references() {
        let input = "a$X".repeat(20_000);
        assert_eq!(expand_with(&[], &input), "a".repeat(20_000));
        let input = "$Y-".repeat(20_000);
        assert_eq!(expand_with(&[("Y", "y")], &input), "y-".repeat(20_000));
    }
}

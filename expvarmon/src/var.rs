//! Tracked variable names: a dotted path into the debug document plus a display kind.
//!
//! The kind is written as a prefix (`mem:memstats.Alloc`) or, equivalently, as a
//! suffix (`memstats.Alloc:mem`). An unknown annotation is dropped and the kind
//! falls back to [`VarKind::Default`]; parsing never fails.

use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// How a variable's value should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VarKind {
    #[default]
    Default,
    /// Byte counts, humanized.
    Memory,
    /// Nanoseconds, humanized.
    Duration,
    /// Plain text.
    String,
    /// A 0..1 fraction shown as a percentage.
    GcCpu,
}

impl VarKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "mem" | "bytes" => Some(VarKind::Memory),
            "duration" => Some(VarKind::Duration),
            "str" | "string" => Some(VarKind::String),
            "gccpu" => Some(VarKind::GcCpu),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarName {
    raw: String,
    path: Vec<String>,
    kind: VarKind,
}

impl VarName {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        let (kind, dotted) = match raw.split_once(':') {
            Some((head, tail)) => {
                if let Some(kind) = VarKind::from_tag(head) {
                    (kind, tail)
                } else if let Some((rest, tag)) = raw.rsplit_once(':') {
                    match VarKind::from_tag(tag) {
                        Some(kind) => (kind, rest),
                        None => (VarKind::Default, tail),
                    }
                } else {
                    (VarKind::Default, tail)
                }
            }
            None => (VarKind::Default, raw),
        };
        let path = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            raw: raw.to_string(),
            path,
            kind,
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn kind(&self) -> VarKind {
        self.kind
    }

    /// Last path segment, used for compact column headers.
    pub fn short(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// Dotted path without the kind annotation.
    pub fn long(&self) -> String {
        self.path.join(".")
    }
}

impl PartialEq for VarName {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.kind == other.kind
    }
}

impl Eq for VarName {}

impl Hash for VarName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VarName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(VarName::new(s))
    }
}

impl From<&str> for VarName {
    fn from(s: &str) -> Self {
        VarName::new(s)
    }
}

/// Parse a comma separated list of variable names, skipping empty items.
pub fn parse_vars(list: &str) -> Vec<VarName> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(VarName::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_dotted_path() {
        let v = VarName::new("memstats.PauseTotalNs");
        assert_eq!(v.path(), ["memstats", "PauseTotalNs"]);
        assert_eq!(v.kind(), VarKind::Default);
        assert_eq!(v.short(), "PauseTotalNs");
    }

    #[test]
    fn prefix_and_trailing_kind() {
        let a = VarName::new("mem:memstats.Alloc");
        let b = VarName::new("memstats.Alloc:bytes");
        assert_eq!(a.kind(), VarKind::Memory);
        assert_eq!(a.path(), b.path());
        assert_eq!(a, b);
        assert_eq!(a.long(), "memstats.Alloc");
        assert_eq!(a.to_string(), "mem:memstats.Alloc");
        assert_eq!(VarName::new("duration:Response.Mean").kind(), VarKind::Duration);
        assert_eq!(VarName::new("gccpu:memstats.GCCPUFraction").kind(), VarKind::GcCpu);
        assert_eq!(VarName::new("str:goroutines").kind(), VarKind::String);
    }

    #[test]
    fn unknown_kind_is_permissive() {
        let v = VarName::new("weird:counters.total");
        assert_eq!(v.kind(), VarKind::Default);
        assert_eq!(v.path(), ["counters", "total"]);
    }

    #[test]
    fn equality_ignores_spelling_but_not_kind() {
        assert_ne!(VarName::new("mem:a.b"), VarName::new("a.b"));
        assert_eq!(VarName::new(" a.b "), VarName::new("a.b"));
    }

    #[test]
    fn parse_list() {
        let vars = parse_vars("mem:memstats.Alloc, ,duration:memstats.PauseNs,");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[1].kind(), VarKind::Duration);
    }
}

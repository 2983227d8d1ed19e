use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Reserved classification tag satisfied by the wall partition.
pub const TAG_WALL: &str = "wall";
/// Reserved classification tag satisfied by the floor partition.
pub const TAG_FLOOR: &str = "floor";
/// Reserved classification tag satisfied by the generic-zone partition.
pub const TAG_ZONE: &str = "zone";
/// Reserved classification tag satisfied by the model-zone partition.
pub const TAG_MODEL_ZONE: &str = "model_zone";
/// Reserved keyword making zero overlap legal.
pub const TAG_NONE: &str = "none";

/// Comparison modifier on a required collision count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cmp {
    /// `count` or more matches satisfy the term (the default)
    #[default]
    AtLeast,
    /// exactly `count` matches
    Exactly,
    /// `count` or fewer matches, including zero
    AtMost,
}

impl Cmp {
    pub fn satisfied(&self, actual: usize, required: u32) -> bool {
        let required = required as usize;
        match self {
            Cmp::AtLeast => actual >= required,
            Cmp::Exactly => actual == required,
            Cmp::AtMost => actual <= required,
        }
    }
}

/// One term of a compound relationship: a tag plus its required count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundTerm {
    pub tag: String,
    pub count: u32,
}

/// A relationship descriptor: what a node must collide with to be legal.
///
/// Descriptors are declared in priority order on a node; the first
/// satisfied descriptor decides legality. The catalog's textual form
/// (`"wall:1"`, `"wall:1+floor:1"`, `"none"`) parses into this type;
/// the core itself never re-parses strings during analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Relationship {
    /// Zero (non-replace) overlap is legal
    None,
    /// A single tag with a count and comparison modifier
    Single { tag: String, count: u32, cmp: Cmp },
    /// All terms must be satisfied, each within its own partition
    Compound(SmallVec<[CompoundTerm; 2]>),
}

impl Relationship {
    pub fn single(tag: impl Into<String>, count: u32) -> Self {
        Self::Single {
            tag: tag.into(),
            count,
            cmp: Cmp::AtLeast,
        }
    }

    pub fn single_cmp(tag: impl Into<String>, count: u32, cmp: Cmp) -> Self {
        Self::Single {
            tag: tag.into(),
            count,
            cmp,
        }
    }

    pub fn compound(terms: impl IntoIterator<Item = (String, u32)>) -> Self {
        Self::Compound(
            terms
                .into_iter()
                .map(|(tag, count)| CompoundTerm { tag, count })
                .collect(),
        )
    }

    /// Parse the catalog's textual descriptor form.
    ///
    /// Grammar: `none` | term (`+` term)*, where term is
    /// `tag` | `tag:count` | `tag:>=count` | `tag:==count` | `tag:<=count`.
    /// A count defaults to 1. Comparison prefixes are only meaningful on
    /// single-term descriptors; compound terms always use at-least.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty relationship descriptor".to_string());
        }
        if s.eq_ignore_ascii_case(TAG_NONE) {
            return Ok(Self::None);
        }

        let terms: Vec<&str> = s.split('+').map(str::trim).collect();
        if terms.len() == 1 {
            let (tag, count, cmp) = parse_term(terms[0])?;
            return Ok(Self::Single { tag, count, cmp });
        }

        let mut out: SmallVec<[CompoundTerm; 2]> = SmallVec::new();
        for term in terms {
            let (tag, count, cmp) = parse_term(term)?;
            if cmp != Cmp::AtLeast {
                return Err(format!(
                    "comparison modifier not allowed in compound term '{}'",
                    term
                ));
            }
            out.push(CompoundTerm { tag, count });
        }
        Ok(Self::Compound(out))
    }
}

fn parse_term(term: &str) -> Result<(String, u32, Cmp), String> {
    match term.split_once(':') {
        None => {
            if term.is_empty() {
                return Err("empty relationship term".to_string());
            }
            Ok((term.to_string(), 1, Cmp::AtLeast))
        }
        Some((tag, count)) => {
            let tag = tag.trim();
            let count = count.trim();
            if tag.is_empty() {
                return Err(format!("missing tag in term '{}'", term));
            }
            let (cmp, digits) = if let Some(rest) = count.strip_prefix(">=") {
                (Cmp::AtLeast, rest)
            } else if let Some(rest) = count.strip_prefix("==") {
                (Cmp::Exactly, rest)
            } else if let Some(rest) = count.strip_prefix("<=") {
                (Cmp::AtMost, rest)
            } else {
                (Cmp::AtLeast, count)
            };
            let count: u32 = digits
                .trim()
                .parse()
                .map_err(|e| format!("bad count in term '{}': {}", term, e))?;
            Ok((tag.to_string(), count, cmp))
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relationship::None => write!(f, "none"),
            Relationship::Single { tag, count, cmp } => {
                let prefix = match cmp {
                    Cmp::AtLeast => "",
                    Cmp::Exactly => "==",
                    Cmp::AtMost => "<=",
                };
                write!(f, "{}:{}{}", tag, prefix, count)
            }
            Relationship::Compound(terms) => {
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, "+")?;
                    }
                    write!(f, "{}:{}", t.tag, t.count)?;
                }
                Ok(())
            }
        }
    }
}

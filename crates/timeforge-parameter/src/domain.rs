//! Parameter domains and values.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use timeforge_core::{Bounds, Result, TimeforgeError};

/// Type of a parameter placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterDomain {
    /// A finite set of symbols.
    Enumeration {
        name: String,
        values: Arc<[String]>,
    },
    /// An integer range.
    Numeric { name: String, range: Bounds },
}

impl ParameterDomain {
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParameterDomain::Enumeration {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn numeric(name: impl Into<String>, min: i64, max: i64) -> Self {
        ParameterDomain::Numeric {
            name: name.into(),
            range: Bounds::new(min, max),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterDomain::Enumeration { name, .. } | ParameterDomain::Numeric { name, .. } => {
                name
            }
        }
    }

    /// Full set of values of the domain.
    pub fn initial_values(&self) -> ParameterValues {
        match self {
            ParameterDomain::Enumeration { values, .. } => {
                ParameterValues::Symbols((0..values.len()).collect())
            }
            ParameterDomain::Numeric { range, .. } => ParameterValues::Range(*range),
        }
    }

    /// Parses a literal against the domain.
    pub fn parse(&self, literal: &str) -> Result<ParameterValues> {
        match self {
            ParameterDomain::Enumeration { name, values } => values
                .iter()
                .position(|v| v == literal)
                .map(|i| ParameterValues::Symbols(BTreeSet::from([i])))
                .ok_or_else(|| {
                    TimeforgeError::Domain(format!("value {literal:?} is not in domain {name}"))
                }),
            ParameterDomain::Numeric { name, range } => {
                let value: i64 = literal.trim().parse().map_err(|_| {
                    TimeforgeError::Domain(format!("value {literal:?} is not a number of {name}"))
                })?;
                if !range.contains(value) {
                    return Err(TimeforgeError::Domain(format!(
                        "value {value} is outside {name} {range}"
                    )));
                }
                Ok(ParameterValues::Range(Bounds::point(value)))
            }
        }
    }

    /// Renders a set of values using the domain's symbols.
    pub fn render(&self, values: &ParameterValues) -> String {
        match (self, values) {
            (ParameterDomain::Enumeration { values: names, .. }, ParameterValues::Symbols(set)) => {
                let rendered: Vec<&str> = set
                    .iter()
                    .filter_map(|i| names.get(*i).map(String::as_str))
                    .collect();
                if rendered.len() == 1 {
                    rendered[0].to_string()
                } else {
                    format!("{{{}}}", rendered.join(", "))
                }
            }
            (_, values) => values.to_string(),
        }
    }
}

/// Current values of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValues {
    /// Indices into an enumeration domain.
    Symbols(BTreeSet<usize>),
    /// An integer range.
    Range(Bounds),
}

impl ParameterValues {
    pub fn is_empty(&self) -> bool {
        match self {
            ParameterValues::Symbols(set) => set.is_empty(),
            ParameterValues::Range(range) => range.is_empty(),
        }
    }

    pub fn is_singleton(&self) -> bool {
        match self {
            ParameterValues::Symbols(set) => set.len() == 1,
            ParameterValues::Range(range) => range.is_point(),
        }
    }

    /// The value of a bound numeric parameter.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            ParameterValues::Range(range) if range.is_point() => Some(range.lb),
            _ => None,
        }
    }

    pub(crate) fn intersect(&self, other: &ParameterValues) -> Option<ParameterValues> {
        match (self, other) {
            (ParameterValues::Symbols(a), ParameterValues::Symbols(b)) => {
                Some(ParameterValues::Symbols(a.intersection(b).copied().collect()))
            }
            (ParameterValues::Range(a), ParameterValues::Range(b)) => Some(ParameterValues::Range(
                a.intersect(*b).unwrap_or(Bounds::new(1, 0)),
            )),
            _ => None,
        }
    }

    /// Removes the single value of `other` from `self`, if `other` is bound.
    pub(crate) fn exclude(&self, other: &ParameterValues) -> ParameterValues {
        match (self, other) {
            (ParameterValues::Symbols(a), ParameterValues::Symbols(b)) if b.len() == 1 => {
                let mut rest = a.clone();
                if let Some(v) = b.iter().next() {
                    rest.remove(v);
                }
                ParameterValues::Symbols(rest)
            }
            (ParameterValues::Range(a), ParameterValues::Range(b)) if b.is_point() => {
                let v = b.lb;
                if a.lb == v {
                    ParameterValues::Range(Bounds::new(v + 1, a.ub))
                } else if a.ub == v {
                    ParameterValues::Range(Bounds::new(a.lb, v - 1))
                } else {
                    self.clone()
                }
            }
            _ => self.clone(),
        }
    }
}

impl fmt::Display for ParameterValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValues::Symbols(set) => {
                let items: Vec<String> = set.iter().map(|i| format!("#{i}")).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            ParameterValues::Range(range) if range.is_point() => write!(f, "{}", range.lb),
            ParameterValues::Range(range) => write!(f, "{range}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enumeration() {
        let d = ParameterDomain::enumeration("target", ["a", "b", "c"]);
        assert_eq!(
            d.parse("b").unwrap(),
            ParameterValues::Symbols(BTreeSet::from([1]))
        );
        assert!(d.parse("z").is_err());
    }

    #[test]
    fn test_parse_numeric() {
        let d = ParameterDomain::numeric("amount", 0, 100);
        assert_eq!(d.parse("42").unwrap().as_number(), Some(42));
        assert!(d.parse("101").is_err());
        assert!(d.parse("x").is_err());
    }

    #[test]
    fn test_exclude_shrinks_range_edges_only() {
        let r = ParameterValues::Range(Bounds::new(0, 10));
        assert_eq!(
            r.exclude(&ParameterValues::Range(Bounds::point(0))),
            ParameterValues::Range(Bounds::new(1, 10))
        );
        assert_eq!(r.exclude(&ParameterValues::Range(Bounds::point(5))), r);
    }

    #[test]
    fn test_render_symbols() {
        let d = ParameterDomain::enumeration("mode", ["idle", "busy"]);
        assert_eq!(d.render(&d.parse("busy").unwrap()), "busy");
        assert_eq!(d.render(&d.initial_values()), "{idle, busy}");
    }
}

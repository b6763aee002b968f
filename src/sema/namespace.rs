// src/sema/namespace.rs
//! Container-scoped candidate generation for name resolution.
//!
//! Given container `a.b.c` and a name `x`, unqualified lookups probe
//! `a.b.c.x`, `a.b.x`, `a.x`, `x` in that order. A name written with a
//! leading dot (`.x`) is absolute and probes only `x`.

use crate::errors::CheckError;

#[derive(Debug, Clone)]
pub struct NamespaceGenerator {
    /// Container prefixes with trailing dots, longest first, ending with "".
    prefixes: Vec<String>,
}

impl NamespaceGenerator {
    pub fn new(container: &str) -> Result<Self, CheckError> {
        let mut prefixes = Vec::new();
        if !container.is_empty() {
            if !valid_container(container) {
                return Err(CheckError::InvalidContainer {
                    container: container.to_string(),
                });
            }
            let segments: Vec<&str> = container.split('.').collect();
            for end in (1..=segments.len()).rev() {
                let mut prefix = segments[..end].join(".");
                prefix.push('.');
                prefixes.push(prefix);
            }
        }
        prefixes.push(String::new());
        Ok(Self { prefixes })
    }

    /// Invoke `probe` with each candidate for a simple or dotted name, most
    /// specific container first. Stops early when `probe` returns `false`.
    pub fn candidates(&self, name: &str, mut probe: impl FnMut(&str) -> bool) {
        if let Some(absolute) = name.strip_prefix('.') {
            probe(absolute);
            return;
        }
        for prefix in &self.prefixes {
            let candidate = format!("{prefix}{name}");
            if !probe(&candidate) {
                return;
            }
        }
    }

    /// Invoke `probe` with each candidate for a qualified name, along with
    /// the segment index: the index of the last qualifier consumed by the
    /// candidate. Longer qualifier prefixes are tried before shorter ones,
    /// so a full-name match always wins over a name-plus-field reading.
    /// Stops early when `probe` returns `false`.
    pub fn qualified_candidates(
        &self,
        qualifiers: &[String],
        mut probe: impl FnMut(&str, usize) -> bool,
    ) {
        if qualifiers.is_empty() {
            return;
        }
        if let Some(absolute) = qualifiers[0].strip_prefix('.') {
            for end in (1..=qualifiers.len()).rev() {
                let mut candidate = absolute.to_string();
                for qualifier in &qualifiers[1..end] {
                    candidate.push('.');
                    candidate.push_str(qualifier);
                }
                if !probe(&candidate, end - 1) {
                    return;
                }
            }
            return;
        }
        for end in (1..=qualifiers.len()).rev() {
            let joined = qualifiers[..end].join(".");
            for prefix in &self.prefixes {
                let candidate = format!("{prefix}{joined}");
                if !probe(&candidate, end - 1) {
                    return;
                }
            }
        }
    }
}

fn valid_container(container: &str) -> bool {
    container.split('.').all(valid_segment)
}

fn valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(generator: &NamespaceGenerator, name: &str) -> Vec<String> {
        let mut out = Vec::new();
        generator.candidates(name, |candidate| {
            out.push(candidate.to_string());
            true
        });
        out
    }

    #[test]
    fn container_prefixes_shorten() {
        let generator = NamespaceGenerator::new("a.b.c").unwrap();
        assert_eq!(collect(&generator, "x"), vec!["a.b.c.x", "a.b.x", "a.x", "x"]);
    }

    #[test]
    fn empty_container_probes_name_only() {
        let generator = NamespaceGenerator::new("").unwrap();
        assert_eq!(collect(&generator, "x.y"), vec!["x.y"]);
    }

    #[test]
    fn absolute_name_skips_container() {
        let generator = NamespaceGenerator::new("a.b").unwrap();
        assert_eq!(collect(&generator, ".x.y"), vec!["x.y"]);
    }

    #[test]
    fn probe_stops_on_false() {
        let generator = NamespaceGenerator::new("a.b").unwrap();
        let mut seen = Vec::new();
        generator.candidates("x", |candidate| {
            seen.push(candidate.to_string());
            false
        });
        assert_eq!(seen, vec!["a.b.x"]);
    }

    #[test]
    fn invalid_containers_rejected() {
        assert!(NamespaceGenerator::new("a..b").is_err());
        assert!(NamespaceGenerator::new(".a").is_err());
        assert!(NamespaceGenerator::new("a.1b").is_err());
        assert!(NamespaceGenerator::new("a-b").is_err());
        assert!(NamespaceGenerator::new("a_1.b2").is_ok());
    }

    #[test]
    fn qualified_prefers_longest_prefix() {
        let generator = NamespaceGenerator::new("c").unwrap();
        let qualifiers: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        generator.qualified_candidates(&qualifiers, |candidate, segment_index| {
            out.push((candidate.to_string(), segment_index));
            true
        });
        assert_eq!(
            out,
            vec![
                ("c.a.b".to_string(), 1),
                ("a.b".to_string(), 1),
                ("c.a".to_string(), 0),
                ("a".to_string(), 0),
            ]
        );
    }

    #[test]
    fn qualified_absolute_strips_dot() {
        let generator = NamespaceGenerator::new("c").unwrap();
        let qualifiers: Vec<String> = [".a", "b"].iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        generator.qualified_candidates(&qualifiers, |candidate, segment_index| {
            out.push((candidate.to_string(), segment_index));
            true
        });
        assert_eq!(out, vec![("a.b".to_string(), 1), ("a".to_string(), 0)]);
    }
}

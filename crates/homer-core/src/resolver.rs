// Roster display name to stats-source query string.

use std::collections::HashMap;

/// Maps roster display names to the query string the stats source
/// understands.
///
/// Lookup is an exact string match against the alias table. Names that are
/// not in the table pass through unchanged; no case, accent, or punctuation
/// folding is applied, so a roster name that neither matches an alias nor
/// resolves at the source will read as zero stats.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    aliases: HashMap<String, String>,
}

impl NameResolver {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    /// Resolve a display name to its canonical query string.
    pub fn resolve<'a>(&'a self, display_name: &'a str) -> &'a str {
        self.aliases
            .get(display_name)
            .map(String::as_str)
            .unwrap_or(display_name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> NameResolver {
        let mut aliases = HashMap::new();
        aliases.insert("Vladdy Jr.".to_string(), "Vladimir Guerrero Jr.".to_string());
        aliases.insert("Big Dumper".to_string(), "Cal Raleigh".to_string());
        NameResolver::new(aliases)
    }

    #[test]
    fn alias_hit_returns_canonical_name() {
        assert_eq!(resolver().resolve("Big Dumper"), "Cal Raleigh");
    }

    #[test]
    fn miss_passes_through_byte_for_byte() {
        let r = resolver();
        let name = "Ronald Acuña Jr. ";
        assert_eq!(r.resolve(name).as_bytes(), name.as_bytes());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(resolver().resolve("big dumper"), "big dumper");
    }

    #[test]
    fn empty_table_is_passthrough() {
        let r = NameResolver::default();
        assert!(r.is_empty());
        assert_eq!(r.resolve("Aaron Judge"), "Aaron Judge");
    }
}

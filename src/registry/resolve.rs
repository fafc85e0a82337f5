use crate::core::gene::ReferenceGeneEntry;

use super::store::GeneRegistry;

/// Characters that separate the gene symbol from the rest of a reference identifier
const ID_DELIMITERS: [char; 2] = ['_', '|'];

/// Outcome of resolving a reference identifier
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedGene<'a> {
    /// The identifier names a registry gene
    Known(&'a ReferenceGeneEntry),
    /// Unrecognized; carries the leading identifier token
    Unknown(String),
}

impl<'a> ResolvedGene<'a> {
    /// Canonical symbol for known genes, the leading token otherwise
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Known(entry) => &entry.symbol,
            Self::Unknown(token) => token,
        }
    }

    #[must_use]
    pub fn entry(&self) -> Option<&'a ReferenceGeneEntry> {
        match self {
            Self::Known(entry) => Some(entry),
            Self::Unknown(_) => None,
        }
    }
}

/// Resolves noisy reference identifiers to registry gene symbols.
///
/// Reference FASTA identifiers mix gene symbols, accessions and free labels
/// (`mecA_X52593.1`, `X52593.1_ermA_variant`, `ermC`). Resolution never fails:
///
/// 1. The leading token (up to the first `_` or `|`) is compared case-insensitively
///    to every registry symbol.
/// 2. Otherwise the first registry symbol, in definition order, that occurs
///    case-insensitively anywhere in the identifier wins.
/// 3. Otherwise the leading token is passed through unchanged.
pub struct GeneIdentifier<'a> {
    registry: &'a GeneRegistry,
}

impl<'a> GeneIdentifier<'a> {
    pub fn new(registry: &'a GeneRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, subject_id: &str) -> ResolvedGene<'a> {
        let subject_id = subject_id.trim();
        let leading = leading_token(subject_id);

        if let Some(entry) = self.registry.get(leading) {
            return ResolvedGene::Known(entry);
        }

        let lowered = subject_id.to_lowercase();
        if let Some(entry) = self
            .registry
            .iter()
            .find(|entry| lowered.contains(&entry.symbol.to_lowercase()))
        {
            return ResolvedGene::Known(entry);
        }

        ResolvedGene::Unknown(leading.to_string())
    }

    /// Resolve straight to a symbol
    pub fn resolve_symbol(&self, subject_id: &str) -> String {
        self.resolve(subject_id).symbol().to_string()
    }
}

/// Token before the first delimiter; the whole identifier if that token is empty
fn leading_token(subject_id: &str) -> &str {
    match subject_id.split(ID_DELIMITERS).next() {
        Some(token) if !token.is_empty() => token,
        _ => subject_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_token_exact_match() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        assert_eq!(identifier.resolve_symbol("ermA_sample1"), "ermA");
        assert_eq!(identifier.resolve_symbol("mecA_X52593.1"), "mecA");
        assert_eq!(identifier.resolve_symbol("tetK|J01830.1"), "tetK");
        assert_eq!(identifier.resolve_symbol("vanA"), "vanA");
    }

    #[test]
    fn test_exact_match_is_case_insensitive_and_canonical() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        let resolved = identifier.resolve("MECA_reference");
        assert_eq!(resolved.symbol(), "mecA");
        assert!(resolved.entry().is_some());
    }

    #[test]
    fn test_substring_fallback() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        assert_eq!(identifier.resolve_symbol("X52593.1_ermA_variant"), "ermA");
        assert_eq!(identifier.resolve_symbol("LN865141.1_mecC_reference"), "mecC");
        assert_eq!(identifier.resolve_symbol("S_aureus_TETK_plasmid"), "tetK");
    }

    #[test]
    fn test_substring_fallback_uses_registry_order() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        // Both vanA and ermC occur; vanA is defined first
        assert_eq!(identifier.resolve_symbol("contig7_ermC_vanA_cluster"), "vanA");
    }

    #[test]
    fn test_unknown_passthrough() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        let resolved = identifier.resolve("blaZ_AB123456.1");
        assert_eq!(resolved, ResolvedGene::Unknown("blaZ".to_string()));
        assert!(resolved.entry().is_none());

        assert_eq!(identifier.resolve_symbol("NC_007795.1"), "NC");
        assert_eq!(identifier.resolve_symbol("_orphan"), "_orphan");
    }
}

//! Peptide-level (protein-wide) decoy generation: split a protein into
//! tryptic sub-peptides, reverse each inner segment independently, and
//! re-concatenate — optionally keeping each sub-peptide's N- and/or
//! C-terminal residue fixed (spec §4.7, last paragraph).

use pslp_core::registry::ResidueTable;

/// Boolean knobs controlling which termini survive reversal unchanged, per
/// sub-peptide, when decoy-generating a whole (tryptic) protein sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DigestDecoySettings {
    pub keep_n_terminus: bool,
    pub keep_c_terminus: bool,
}

/// Split `sequence` into contiguous tryptic sub-peptides: every substring
/// ending just after a `K`/`R` that is not followed by `P`, plus a trailing
/// remainder if the sequence does not end on a tryptic boundary.
pub fn split_tryptic(sequence: &str) -> Vec<String> {
    let chars: Vec<char> = sequence.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;
    for i in 0..chars.len() {
        let is_last = i + 1 == chars.len();
        let after = if is_last { None } else { Some(chars[i + 1]) };
        let cuts_here = match after {
            Some(next) => ResidueTable::is_tryptic_site(chars[i], next),
            None => true,
        };
        if cuts_here {
            pieces.push(chars[start..=i].iter().collect());
            start = i + 1;
        }
    }
    if start < chars.len() {
        pieces.push(chars[start..].iter().collect());
    }
    pieces
}

fn reverse_inner(piece: &str, settings: DigestDecoySettings) -> String {
    let mut chars: Vec<char> = piece.chars().collect();
    let n = chars.len();
    if n < 2 {
        return piece.to_string();
    }
    let lo = usize::from(settings.keep_n_terminus);
    let hi = n - usize::from(settings.keep_c_terminus);
    if lo < hi {
        chars[lo..hi].reverse();
    }
    chars.into_iter().collect()
}

/// Decoy-generate a whole (tryptic) protein sequence: split into
/// sub-peptides, reverse each one's interior according to `settings`, and
/// concatenate the results back together in original order.
pub fn reverse_digest(sequence: &str, settings: DigestDecoySettings) -> String {
    split_tryptic(sequence).iter().map(|piece| reverse_inner(piece, settings)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_tryptic_boundaries() {
        let pieces = split_tryptic("AKGAR");
        assert_eq!(pieces, vec!["AK".to_string(), "GAR".to_string()]);
    }

    #[test]
    fn proline_suppresses_cleavage() {
        let pieces = split_tryptic("AKPGAR");
        assert_eq!(pieces, vec!["AKPGAR".to_string()]);
    }

    #[test]
    fn reverse_digest_preserves_fixed_termini() {
        let settings = DigestDecoySettings { keep_n_terminus: true, keep_c_terminus: true };
        let decoy = reverse_digest("AKGAR", settings);
        // "AK" -> n/c both fixed on a 2-residue piece is a no-op; "GAR" keeps
        // G and R fixed, reversing only the interior single residue A.
        assert_eq!(decoy, "AKGAR");
    }

    #[test]
    fn reverse_digest_reverses_full_inner_segment_with_no_fixed_termini() {
        let decoy = reverse_digest("AKGAR", DigestDecoySettings::default());
        assert_eq!(decoy, "KARAG");
    }
}

/// Hamming distance between two byte sequences.
///
/// `N` bases never count as mismatches, so a UMI read with an undetermined
/// base can still join its molecule. Length differences are counted as
/// mismatches for the unpaired suffix.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    let paired = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| {
            let (x, y) = (x.to_ascii_uppercase(), y.to_ascii_uppercase());
            x != y && x != b'N' && y != b'N'
        })
        .count();

    paired + a.len().abs_diff(b.len())
}

/// Reverse complement of a DNA sequence.
///
/// Non-ACGT bytes map to `N`; case is preserved for the canonical bases.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement_base(b)).collect()
}

fn complement_base(b: u8) -> u8 {
    match b {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'n' => b'n',
        _ => b'N',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamming_distance() {
        assert_eq!(hamming_distance(b"ACGT", b"ACGT"), 0);
        assert_eq!(hamming_distance(b"ACGT", b"ACGA"), 1);
        assert_eq!(hamming_distance(b"AAAA", b"TTTT"), 4);
    }

    #[test]
    fn test_hamming_distance_n_is_wildcard() {
        assert_eq!(hamming_distance(b"ACGT", b"ACGN"), 0);
        assert_eq!(hamming_distance(b"NNNN", b"ACGT"), 0);
    }

    #[test]
    fn test_hamming_distance_length_mismatch() {
        assert_eq!(hamming_distance(b"ACGT", b"ACGTAA"), 2);
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
        assert_eq!(reverse_complement(b"AACC"), b"GGTT".to_vec());
        // The NlaIII recognition site is its own reverse complement
        assert_eq!(reverse_complement(b"CATG"), b"CATG".to_vec());
    }
}

/// contains the uppercase letter for every ASCII letter and 0 for everything that gets dropped
const NORMALIZE_TABLE: [u8; 256] = build_normalize();

/// builds up the NORMALIZE_TABLE const for us
const fn build_normalize() -> [u8; 256] {
    let mut ret: [u8; 256] = [0; 256];
    let mut c: u8 = b'A';
    while c <= b'Z' {
        ret[c as usize] = c;
        ret[(c + 32) as usize] = c;
        c += 1;
    }
    ret
}

/// Helper function that keeps only the letters of a sequence and uppercases them.
/// Digits, whitespace, gaps and other symbols are removed.
/// # Arguments
/// * `seq` - the raw sequence bytes
/// # Examples
/// ```rust
/// use fragtrim::string_util::normalize_sequence;
/// assert_eq!(normalize_sequence(b"ac gt-N 12\r"), b"ACGTN".to_vec());
/// ```
#[inline]
pub fn normalize_sequence(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&c| NORMALIZE_TABLE[c as usize])
        .filter(|&c| c != 0)
        .collect::<Vec<u8>>()
}

/// Helper function that builds a combined barcode from the first and last `flank` bases of a read.
/// Returns `None` if the read is shorter than both flanks together.
/// # Arguments
/// * `seq` - the read sequence
/// * `flank` - the number of bases taken from each end
/// # Examples
/// ```rust
/// use fragtrim::string_util::flank_barcode;
/// assert_eq!(flank_barcode(b"AAAACCCCGGGGTTTT", 4), Some(b"AAAATTTT".to_vec()));
/// assert_eq!(flank_barcode(b"ACGT", 4), None);
/// ```
#[inline]
pub fn flank_barcode(seq: &[u8], flank: usize) -> Option<Vec<u8>> {
    if seq.len() < 2 * flank {
        return None;
    }
    let mut ret: Vec<u8> = Vec::with_capacity(2 * flank);
    ret.extend_from_slice(&seq[..flank]);
    ret.extend_from_slice(&seq[seq.len() - flank..]);
    Some(ret)
}

/// Shortens a sequence for display, appending "..." if anything was cut.
/// # Examples
/// ```rust
/// use fragtrim::string_util::truncate_display;
/// assert_eq!(truncate_display("ACGTACGT", 4), "ACGT...");
/// assert_eq!(truncate_display("ACGT", 4), "ACGT");
/// ```
pub fn truncate_display(seq: &str, max_len: usize) -> String {
    if seq.chars().count() > max_len {
        let mut ret: String = seq.chars().take(max_len).collect();
        ret.push_str("...");
        ret
    } else {
        seq.to_string()
    }
}

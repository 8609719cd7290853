
use bio::pattern_matching::horspool::Horspool;

/// A contiguous span of a source sequence that begins with the start marker and ends with the end marker.
#[derive(Clone,Debug,PartialEq)]
pub struct Fragment<'a> {
    /// index of the start marker occurrence in the source
    pub start: usize,
    /// index immediately after the paired end marker occurrence
    pub end: usize,
    /// the fragment bytes, borrowed from the source
    pub seq: &'a [u8]
}

impl<'a> Fragment<'a> {
    /// Returns the length of the fragment in bases, markers included.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Inclusive length gate applied after extraction, a bound of 0 leaves that side open.
#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct LengthBounds {
    /// minimum allowed fragment length, 0 for no minimum
    pub min_length: usize,
    /// maximum allowed fragment length, 0 for no maximum
    pub max_length: usize
}

impl LengthBounds {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        LengthBounds {
            min_length,
            max_length
        }
    }

    /// Returns true if a fragment of `length` passes both bounds.
    /// # Examples
    /// ```rust
    /// use fragtrim::extract::LengthBounds;
    /// assert!(LengthBounds::new(0, 0).accepts(42));
    /// assert!(!LengthBounds::new(50, 0).accepts(42));
    /// assert!(!LengthBounds::new(0, 40).accepts(42));
    /// assert!(LengthBounds::new(42, 42).accepts(42));
    /// ```
    #[inline]
    pub fn accepts(&self, length: usize) -> bool {
        (self.min_length == 0 || length >= self.min_length) &&
        (self.max_length == 0 || length <= self.max_length)
    }
}

/// Finds the left-most occurrence of the searcher's pattern starting at or after `floor`.
#[inline]
fn find_from(searcher: &Horspool, pattern_len: usize, text: &[u8], floor: usize) -> Option<usize> {
    if floor > text.len() || text.len() - floor < pattern_len {
        return None;
    }
    searcher.find_all(&text[floor..])
        .next()
        .map(|idx| idx + floor)
}

/// Extracts the first reachable `start_marker ... end_marker` span from a sequence.
/// The left-most start marker is paired with the nearest end marker found at or after the end-search floor, which is
/// the start index itself when `allow_overlap` is set and the first base after the start marker otherwise.
/// If a start occurrence has no partner, the start search resumes one base after it, so overlapping start candidates
/// are retried. The first pairing found is returned, this is not a search for the shortest fragment.
/// Both markers must be non-empty, `params::MarkerPair` enforces that for callers working from configuration.
/// # Arguments
/// * `seq` - the sequence to search
/// * `start_marker` - the literal that opens the fragment
/// * `end_marker` - the literal that closes the fragment
/// * `allow_overlap` - if true, the end marker may overlap the start marker
/// # Examples
/// ```rust
/// use fragtrim::extract::extract_fragment;
/// let fragment = extract_fragment(b"XXAAYYAAZZ", b"AA", b"AA", false).unwrap();
/// assert_eq!(fragment.seq, b"AAYYAA");
/// assert_eq!((fragment.start, fragment.end), (2, 8));
/// assert!(extract_fragment(b"XXAAYYZZ", b"AA", b"AA", false).is_none());
/// ```
pub fn extract_fragment<'a>(seq: &'a [u8], start_marker: &[u8], end_marker: &[u8], allow_overlap: bool) -> Option<Fragment<'a>> {
    debug_assert!(!start_marker.is_empty() && !end_marker.is_empty());
    let start_len: usize = start_marker.len();
    let end_len: usize = end_marker.len();
    let start_search = Horspool::new(start_marker);
    let end_search = Horspool::new(end_marker);

    let mut start_floor: usize = 0;
    while let Some(start_idx) = find_from(&start_search, start_len, seq, start_floor) {
        let end_floor: usize = if allow_overlap { start_idx } else { start_idx + start_len };
        if let Some(end_idx) = find_from(&end_search, end_len, seq, end_floor) {
            let end: usize = end_idx + end_len;
            return Some(Fragment {
                start: start_idx,
                end,
                seq: &seq[start_idx..end]
            });
        }

        //step one base, not one marker, so overlapping start candidates get a chance
        start_floor = start_idx + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &[u8] = b"TGTACCTGCAGATGA";
    const END: &[u8] = b"GTGACCGTGTCTTCT";

    #[test]
    fn test_default_markers() {
        let seq = b"NNNTGTACCTGCAGATGAXYZGTGACCGTGTCTTCTNNN";
        let fragment = extract_fragment(seq, START, END, false).unwrap();
        assert_eq!(fragment.seq, &b"TGTACCTGCAGATGAXYZGTGACCGTGTCTTCT"[..]);
        assert_eq!(fragment.len(), 33);
        assert_eq!(fragment.start, 3);
        assert_eq!(fragment.end, 36);
    }

    #[test]
    fn test_no_start_marker() {
        assert_eq!(extract_fragment(b"NOMATCH", START, END, false), None);
        assert_eq!(extract_fragment(b"GTGACCGTGTCTTCT", START, END, false), None);
    }

    #[test]
    fn test_no_end_marker() {
        assert_eq!(extract_fragment(b"TGTACCTGCAGATGAXYZ", START, END, false), None);
        //end marker only before the start
        assert_eq!(extract_fragment(b"GTGACCGTGTCTTCTTGTACCTGCAGATGA", START, END, false), None);
        assert_eq!(extract_fragment(b"GTGACCGTGTCTTCTTGTACCTGCAGATGA", START, END, true), None);
    }

    #[test]
    fn test_short_and_empty_sequences() {
        assert_eq!(extract_fragment(b"", START, END, false), None);
        assert_eq!(extract_fragment(b"TGTA", START, END, false), None);
        assert_eq!(extract_fragment(b"A", b"AA", b"AA", true), None);
    }

    #[test]
    fn test_repeated_marker_spans() {
        let fragment = extract_fragment(b"XXAAYYAAZZ", b"AA", b"AA", false).unwrap();
        assert_eq!(fragment.seq, b"AAYYAA");
        assert_eq!((fragment.start, fragment.end), (2, 8));
    }

    #[test]
    fn test_overlap_floor() {
        //with overlap the end search starts on the start marker itself
        let fragment = extract_fragment(b"AAA", b"AA", b"AA", true).unwrap();
        assert_eq!((fragment.start, fragment.end), (0, 2));
        assert_eq!(fragment.seq, b"AA");

        //without overlap neither start candidate has room for an end marker
        assert_eq!(extract_fragment(b"AAA", b"AA", b"AA", false), None);

        //adjacent markers are fine without overlap
        let fragment = extract_fragment(b"AAAA", b"AA", b"AA", false).unwrap();
        assert_eq!((fragment.start, fragment.end), (0, 4));

        //end marker sharing bases with the start marker
        let fragment = extract_fragment(b"ACGTT", b"ACG", b"GTT", true).unwrap();
        assert_eq!(fragment.seq, b"ACGTT");
        assert_eq!(extract_fragment(b"ACGTT", b"ACG", b"GTT", false), None);
    }

    #[test]
    fn test_retry_one_base_past_start() {
        let fragment = extract_fragment(b"ABABAB", b"ABA", b"BAB", false).unwrap();
        assert_eq!((fragment.start, fragment.end), (0, 6));
        let fragment = extract_fragment(b"ABABX", b"ABA", b"BAB", true).unwrap();
        assert_eq!(fragment.seq, b"ABAB");

        //start at 0 sees no "AC" past its floor and the retry from 1 finds no further start
        assert_eq!(extract_fragment(b"AACA", b"AA", b"AC", false), None);
        let fragment = extract_fragment(b"AACA", b"AA", b"AC", true).unwrap();
        assert_eq!(fragment.seq, b"AAC");

        //overlapping start candidates, the left-most one is kept
        let fragment = extract_fragment(b"AAAxCC", b"AA", b"CC", false).unwrap();
        assert_eq!((fragment.start, fragment.end), (0, 6));
    }

    #[test]
    fn test_first_start_pairs() {
        //later start/end pairs are never considered once the first start pairs
        let seq = b"SSxEEySSzEE";
        let fragment = extract_fragment(seq, b"SS", b"EE", false).unwrap();
        assert_eq!(fragment.seq, b"SSxEE");

        //end markers before the start are ignored
        let seq = b"EESSxSSEE";
        let fragment = extract_fragment(seq, b"SS", b"EE", false).unwrap();
        assert_eq!((fragment.start, fragment.end), (2, 9));
    }

    #[test]
    fn test_first_pairing_not_shortest() {
        //the first start wins even though a later start gives a shorter fragment
        let seq = b"SSxxxxSSyEE";
        let fragment = extract_fragment(seq, b"SS", b"EE", false).unwrap();
        assert_eq!(fragment.seq, b"SSxxxxSSyEE");

        //and the nearest end wins over later ends
        let seq = b"SSxEEyyEE";
        let fragment = extract_fragment(seq, b"SS", b"EE", false).unwrap();
        assert_eq!(fragment.seq, b"SSxEE");
    }

    #[test]
    fn test_fragment_properties() {
        let seqs: Vec<&[u8]> = vec![
            &b"NNNTGTACCTGCAGATGAXYZGTGACCGTGTCTTCTNNN"[..],
            &b"TGTACCTGCAGATGATGTACCTGCAGATGAGTGACCGTGTCTTCTGTGACCGTGTCTTCT"[..],
            &b"TGTACCTGCAGATGAGTGACCGTGTCTTCT"[..]
        ];
        for seq in seqs {
            for &overlap in [false, true].iter() {
                let fragment = extract_fragment(seq, START, END, overlap).unwrap();
                assert!(fragment.seq.starts_with(START));
                assert!(fragment.seq.ends_with(END));
                assert_eq!(&seq[fragment.start..fragment.end], fragment.seq);
                //nothing that looks like an end marker closes earlier
                let floor = fragment.start + if overlap { 0 } else { START.len() };
                let inner = &seq[floor..fragment.end - 1];
                assert!(!inner.windows(END.len()).any(|w| w == END));
                //pure function
                assert_eq!(extract_fragment(seq, START, END, overlap), Some(fragment));
            }
        }
    }

    #[test]
    fn test_case_sensitive() {
        let seq = b"nnntgtacctgcagatgaxyzgtgaccgtgtcttctnnn";
        assert_eq!(extract_fragment(seq, START, END, false), None);
    }

    #[test]
    fn test_length_bounds() {
        assert!(!LengthBounds::new(50, 0).accepts(42));
        assert!(LengthBounds::new(0, 0).accepts(42));
        assert!(LengthBounds::default().accepts(1_000_000));
        assert!(!LengthBounds::new(0, 40).accepts(42));
        assert!(LengthBounds::new(42, 42).accepts(42));
        assert!(!LengthBounds::new(42, 42).accepts(43));
        assert!(!LengthBounds::new(42, 42).accepts(41));
    }
}

use crate::errors::{Error, Result};
use crate::extract::{Fragment, LengthBounds, extract_fragment};

/// default start marker for the nanobody library constructs
pub const DEFAULT_START_MARKER: &str = "TGTACCTGCAGATGA";
/// default end marker for the nanobody library constructs
pub const DEFAULT_END_MARKER: &str = "GTGACCGTGTCTTCT";
/// default column width for the FASTA output
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// A validated pair of non-empty markers.
#[derive(Clone,Debug,PartialEq)]
pub struct MarkerPair {
    start_marker: Vec<u8>,
    end_marker: Vec<u8>
}

impl MarkerPair {
    /// Creates the pair, rejecting empty markers.
    /// # Arguments
    /// * `start_marker` - the literal that opens a fragment
    /// * `end_marker` - the literal that closes a fragment
    /// # Examples
    /// ```rust
    /// use fragtrim::params::MarkerPair;
    /// assert!(MarkerPair::new("ACGT", "TTTT").is_ok());
    /// assert!(MarkerPair::new("", "TTTT").is_err());
    /// ```
    pub fn new(start_marker: &str, end_marker: &str) -> Result<Self> {
        if start_marker.is_empty() {
            return Err(Error::EmptyMarker("start"));
        }
        if end_marker.is_empty() {
            return Err(Error::EmptyMarker("end"));
        }
        Ok(MarkerPair {
            start_marker: start_marker.as_bytes().to_vec(),
            end_marker: end_marker.as_bytes().to_vec()
        })
    }

    pub fn start_marker(&self) -> &[u8] {
        &self.start_marker
    }

    pub fn end_marker(&self) -> &[u8] {
        &self.end_marker
    }

    /// Runs `extract_fragment` with this pair.
    #[inline]
    pub fn extract<'a>(&self, seq: &'a [u8], allow_overlap: bool) -> Option<Fragment<'a>> {
        extract_fragment(seq, &self.start_marker, &self.end_marker, allow_overlap)
    }
}

impl Default for MarkerPair {
    fn default() -> Self {
        MarkerPair {
            start_marker: DEFAULT_START_MARKER.as_bytes().to_vec(),
            end_marker: DEFAULT_END_MARKER.as_bytes().to_vec()
        }
    }
}

/// stores options for running the extraction
#[derive(Clone,Debug)]
pub struct ExtractionParameters {
    /// The start and end markers delimiting a fragment
    pub markers: MarkerPair,
    /// The length gate applied to every extracted fragment
    pub bounds: LengthBounds,
    /// If true, the end marker search starts at the start marker instead of after it
    pub allow_overlap: bool,
    /// Sequence column width in the output, 0 writes each fragment on one line
    pub line_width: usize,
    /// Will log each extracted fragment if verbose is set to `true`
    pub verbose: bool
}

impl Default for ExtractionParameters {
    fn default() -> Self {
        ExtractionParameters {
            markers: MarkerPair::default(),
            bounds: LengthBounds::default(),
            allow_overlap: false,
            line_width: DEFAULT_LINE_WIDTH,
            verbose: false
        }
    }
}

impl ExtractionParameters {
    /// Checks the parameters once before any records are read.
    /// Markers are already non-empty by construction, so this only looks at the length bounds.
    /// # Examples
    /// ```rust
    /// use fragtrim::extract::LengthBounds;
    /// use fragtrim::params::ExtractionParameters;
    /// let mut params = ExtractionParameters::default();
    /// assert!(params.validate().is_ok());
    /// params.bounds = LengthBounds::new(100, 50);
    /// assert!(params.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let bounds = &self.bounds;
        if bounds.min_length > 0 && bounds.max_length > 0 && bounds.min_length > bounds.max_length {
            return Err(Error::InvertedLengthBounds {
                min: bounds.min_length,
                max: bounds.max_length
            });
        }
        Ok(())
    }
}


pub mod demux;
pub mod errors;
pub mod extract;
pub mod fastx_util;
pub mod fragment_writer;
pub mod params;
pub mod pipeline;
pub mod sequence_stats;
pub mod string_util;

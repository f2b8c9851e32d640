//! Reader for GRIB2 (GRIdded Binary edition 2), the WMO FM 92 container
//! format for gridded meteorological data.
//!
//! A GRIB2 file is a concatenation of self-delimiting messages, each built
//! from numbered sections 0 through 8. This crate frames those sections,
//! decodes their headers into typed values, rebuilds the nested
//! local/grid/data-field structure implied by the repetition rules of the
//! standard, and flattens it to one record per data field.
//!
//! Two scanners are provided: [`GribReader`] consumes a forward-only byte
//! stream, [`GribReaderAt`] works over any positioned source implementing
//! [`ReadAt`] — an in-memory buffer, a file, or an HTTP endpoint that
//! honours range requests ([`HttpRangeReader`]). Section 7 payloads are
//! surfaced as lazily loaded handles so large messages never have to be
//! resident in memory at once.
//!
//! Decoding the packed values inside Section 7 is out of scope.

pub mod error;
pub mod reader;
pub mod sections;
mod utils;

pub use error::{GribError, Result};
pub use reader::http::HttpRangeReader;
pub use reader::message::{FlatMessage, Message, MessageInfo, SectionInfo};
pub use reader::source::ReadAt;
pub use reader::{GribReader, GribReaderAt};

#[macro_export]
macro_rules! read_as {
    ($ty:ty, $buf:ident, $start:expr) => {{
        let end = $start + std::mem::size_of::<$ty>();
        <$ty>::from_be_bytes($buf[$start..end].try_into().unwrap())
    }};
}

#[macro_export]
macro_rules! skip {
    ($reader:ident, $len_extra:expr) => {{
        if $len_extra > 0 {
            let mut buf = vec![0; $len_extra];
            $reader.read_exact(&mut buf[..])?;
        }
    }};
}

use thiserror::Error;

/// Rejected bit index or range.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("bit {index} is out of range for a {width}-bit word")]
    OutOfRange {
        index: usize,
        width: usize,
    },

    #[error("invalid bit range {start}..{end}, start must be below end")]
    InvalidRange {
        start: usize,
        end: usize,
    },

    #[error("value needs {value_bits} bits but the field is {len} bits wide")]
    ValueTooWide {
        value_bits: usize,
        len: usize,
    },
}

impl Error {
    pub(crate) fn out_of_range(index: usize, width: usize) -> Self {
        Error::OutOfRange { index, width }
    }
}

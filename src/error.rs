pub type Result<T, E = GribError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum GribError {
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),

    #[error("HttpError: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NotGrib")]
    NotGrib(),

    #[error("GRIBVersionMismatch({0})")]
    GRIBVersionMismatch(u8),

    #[error("EndSectionMismatch")]
    EndSectionMismatch(),

    #[error("InvalidMagic(offset {0})")]
    InvalidMagic(u64),

    #[error("InvalidSectionNumber({number} at offset {offset})")]
    InvalidSectionNumber { offset: u64, number: u8 },

    #[error("InvalidLength({length} at offset {offset})")]
    InvalidLength { offset: u64, length: u32 },

    #[error("UnknownSection({0})")]
    UnknownSection(u8),

    #[error("Truncated(section {section}: got {actual} of {expected} bytes)")]
    Truncated {
        section: u8,
        expected: usize,
        actual: usize,
    },

    #[error("SectionNumberMismatch(expected {expected}, got {actual})")]
    SectionNumberMismatch { expected: u8, actual: u8 },

    #[error("TemplateUnderrun(section {0})")]
    TemplateUnderrun(u8),

    #[error("OutOfOrder(section {0})")]
    OutOfOrder(u8),

    #[error("UnterminatedMessage({0})")]
    UnterminatedMessage(usize),

    #[error("OverlongSection(message {0})")]
    OverlongSection(usize),

    #[error("ParseError({0})")]
    ParseError(String),

    #[error("DecodeError({0})")]
    DecodeError(String),
}

/// GSLH 数据读写时的错误
///
/// 与编译期错误不同，这里没有源码行号信息。
#[derive(Debug, thiserror::Error)]
pub enum GslhError {
    #[error("Invalid GSLH magic {found:?}, expected {expected:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },
    #[error("Unsupported GSLH version or endianness {found:?}, expected {expected:?}")]
    BadVersion { expected: [u8; 4], found: [u8; 4] },
    #[error("GSLH data is truncated ({needed} bytes needed at offset {offset})")]
    Truncated { offset: usize, needed: usize },
    #[error("Duplicate {kind} entry \"{name}\"")]
    Duplicate { kind: &'static str, name: String },
    #[error("Invalid {field} value {value}")]
    InvalidValue { field: &'static str, value: u32 },
    #[error("Too many {kind} entries ({count}, max 255)")]
    CountOverflow { kind: &'static str, count: usize },
    #[error("Entry name \"{0}\" is longer than 255 bytes")]
    NameTooLong(String),
    #[error("Entry name is not valid UTF-8")]
    InvalidName,
    #[error("GSLH data has {0} trailing bytes")]
    TrailingData(usize),
}

use core::fmt;

/// Caller-side contract violations. Gameplay rejections (blocked moves,
/// repeated collection) are never reported through this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundError {
    InvalidDimensions { rows: i32, cols: i32 },
    EmptyMaze,
    RoundEnded,
    MalformedGrid { line: usize },
}

impl fmt::Display for RoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { rows, cols } => {
                write!(f, "maze dimensions too small: {rows} rows x {cols} cols")
            }
            Self::EmptyMaze => write!(f, "generated maze has no open cells"),
            Self::RoundEnded => write!(f, "round has ended; restart before ticking"),
            Self::MalformedGrid { line } => write!(f, "malformed grid text at line {line}"),
        }
    }
}

impl std::error::Error for RoundError {}

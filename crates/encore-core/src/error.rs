use encore_domain_eval::CompareError;
use encore_domain_score::MidiImportError;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("{side} input: {source}")]
    Import {
        side: Side,
        #[source]
        source: MidiImportError,
    },
    #[error(transparent)]
    Compare(#[from] CompareError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Generated,
    Reference,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Generated => write!(f, "generated"),
            Side::Reference => write!(f, "reference"),
        }
    }
}

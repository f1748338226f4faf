use crate::alphabet::Symbol;

/// Oracle result type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a query. Expected "no answer" outcomes such as a rejected membership word
/// or a path that yields no probed symbol are reported through query results instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The exploration engine failed. There is no meaningful partial answer to salvage so the
    /// whole query fails.
    #[error("exploration engine failure: {0}")]
    Engine(Box<dyn std::error::Error + Send + Sync>),

    /// The query word contains a symbol that has no encoding in the alphabet
    #[error("symbol {0} is not part of the alphabet")]
    SymbolNotInAlphabet(Symbol),

    /// Two symbols share the same byte encoding so observed output cannot be mapped back
    #[error("symbols {first} and {second} share the same encoding")]
    AmbiguousEncoding { first: Symbol, second: Symbol },

    /// Symbols must be encoded by at least one byte
    #[error("symbol {0} has an empty encoding")]
    EmptyEncoding(Symbol),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured step limit was reached before the query completed
    #[error("query exceeded step limit of {limit}")]
    StepLimitExceeded { limit: usize },
}

impl Error {
    pub(crate) fn engine(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Engine(Box::new(err))
    }
}

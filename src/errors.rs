use thiserror::Error;

/// Everything that can go wrong while decoding one invocation.
///
/// None of these abort a decode: the orchestrator renders them inline
/// next to the argument they belong to and moves on.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no signature known for syscall {0}")]
    UnknownSyscall(u64),

    #[error("register for argument {index} was not supplied")]
    MissingRegister { index: usize },

    #[error("register for argument {index} is not a hex value: {value:?}")]
    MalformedRegister { index: usize, value: String },

    #[error("type \"{0}\" is unknown to the introspection engine")]
    TypeCastFailure(String),

    #[error("cannot read 0x{address:x}: {reason}")]
    DereferenceFailure { address: u64, reason: String },

    #[error("{0}")]
    ResolutionFailure(String),

    #[error("symbol \"{0}\" not found")]
    SymbolNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn dereference(address: u64, reason: impl Into<String>) -> Self {
        DecodeError::DereferenceFailure {
            address,
            reason: reason.into(),
        }
    }

    pub fn resolution(reason: impl Into<String>) -> Self {
        DecodeError::ResolutionFailure(reason.into())
    }

    // unreadable memory may be explained by lazily populated mappings
    pub fn is_dereference(&self) -> bool {
        matches!(self, DecodeError::DereferenceFailure { .. })
    }
}

impl From<procfs::ProcError> for DecodeError {
    fn from(error: procfs::ProcError) -> Self {
        DecodeError::ResolutionFailure(format!("procfs: {error}"))
    }
}

use thiserror::Error;

/// Errors that can arise while resolving scripts or mutating game state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A script name was invoked that no content module registered.
    #[error("no script registered under '{0}'")]
    ScriptNotFound(String),

    /// A content module tried to register a script name twice.
    #[error("script '{0}' is already registered")]
    DuplicateScript(String),

    /// A content module tried to register a definition id twice.
    #[error("{kind} definition '{id}' is already registered")]
    DuplicateDefinition { kind: &'static str, id: String },

    /// A referenced card/location/NPC id has no registered definition.
    /// Always fatal to the operation that looked it up: it is an
    /// authoring defect, not a runtime condition.
    #[error("no {kind} definition registered under '{id}'")]
    DefinitionNotFound { kind: &'static str, id: String },

    /// Expression chaining was attempted on a script result that does
    /// not implement the accessor protocol.
    #[error("script '{0}' does not return an accessor")]
    NotAnAccessor(String),

    /// Out-of-range argument (negative duration, probability outside
    /// 0..=1, missing required parameter). Raised immediately rather
    /// than clamped so authoring mistakes surface early.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Instruction resolution recursed past the sanity limit.
    #[error("script recursion exceeded {0} levels")]
    RecursionLimit(u32),

    /// A single action drained more scene pages than the sanity limit,
    /// usually a menu frame that re-enqueues itself without offering
    /// any options.
    #[error("more than {0} scene pages ran in one action")]
    PageLimit(u32),

    /// A snapshot could not be used: wrong shape or newer format.
    #[error("unusable save data: {0}")]
    BadSave(String),

    #[error("save i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unexpected conditions that indicate an engine bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn definition(kind: &'static str, id: impl Into<String>) -> Self {
        EngineError::DefinitionNotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidParameter(msg.into())
    }
}

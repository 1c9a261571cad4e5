use std::fmt;

/// Failure raised by a single-node rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{{ path }}` slot could not be resolved against the node.
    Undefined { path: String },
    /// The node lacks something the collaborator needs (e.g. no page template).
    MissingAttribute { name: String },
    Syntax { message: String },
}

impl TemplateError {
    pub fn code(&self) -> &'static str {
        match self {
            TemplateError::Undefined { .. } => "E_TEMPLATE_UNDEFINED",
            TemplateError::MissingAttribute { .. } => "E_TEMPLATE_MISSING_ATTR",
            TemplateError::Syntax { .. } => "E_TEMPLATE_SYNTAX",
        }
    }

    /// Failures the tree walk absorbs by dropping the child's fragment.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            TemplateError::Undefined { .. } | TemplateError::MissingAttribute { .. }
        )
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Undefined { path } => write!(f, "undefined template slot: {}", path),
            TemplateError::MissingAttribute { name } => write!(f, "missing attribute: {}", name),
            TemplateError::Syntax { message } => write!(f, "template syntax: {}", message),
        }
    }
}

impl std::error::Error for TemplateError {}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeError {
    Template { stable_id: String, source: TemplateError },
    NoMap,
    UnknownNode { id: usize },
    NotADualMap { id: usize },
    Scene { message: String },
    Json { message: String },
}

impl TranscodeError {
    pub fn code(&self) -> &'static str {
        match self {
            TranscodeError::Template { source, .. } => source.code(),
            TranscodeError::NoMap => "E_TRANSCODE_NO_MAP",
            TranscodeError::UnknownNode { .. } => "E_TRANSCODE_UNKNOWN_NODE",
            TranscodeError::NotADualMap { .. } => "E_TRANSCODE_NOT_DUAL",
            TranscodeError::Scene { .. } => "E_SCENE",
            TranscodeError::Json { .. } => "E_JSON",
        }
    }
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeError::Template { stable_id, source } => {
                write!(f, "failed to render node '{}': {}", stable_id, source)
            }
            TranscodeError::NoMap => write!(f, "tree has no map to render"),
            TranscodeError::UnknownNode { id } => write!(f, "node #{} is not in the tree", id),
            TranscodeError::NotADualMap { id } => {
                write!(f, "node #{} is not a dual map with two panes", id)
            }
            TranscodeError::Scene { message } => write!(f, "invalid scene: {}", message),
            TranscodeError::Json { message } => write!(f, "json: {}", message),
        }
    }
}

impl std::error::Error for TranscodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranscodeError::Template { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TranscodeError {
    fn from(err: serde_json::Error) -> Self {
        TranscodeError::Json {
            message: err.to_string(),
        }
    }
}

use crate::span::Span;

/// A failure raised anywhere between reading a query and re-assembling its
/// rows. Carries the spot in the query text it refers to, when known, and
/// any suggested fixes; the `nestql` crate renders it as an annotated
/// message.
#[derive(Debug, Clone)]
pub struct Error {
    pub reason: Reason,
    /// Character offsets of the failure within the query text.
    pub span: Option<Span>,
    /// Suggested fixes, shown after the reason.
    pub hints: Vec<String>,
}

/// The ways a query can fail, from the scanner through the relational
/// driver. Each variant owns one stable error code.
#[derive(Debug, Clone)]
pub enum Reason {
    /// Broken lexical structure, eg an argument list that never closes.
    Lexical { message: String },
    /// A token out of place.
    Syntax {
        who: Option<String>,
        expected: String,
        found: String,
    },
    /// A malformed argument part or collector entry.
    Argument { message: String },
    /// Non-integer text where an integer was required.
    Numeric { tag: String, found: String },
    /// A nested selection with no `with` rule binding it to its parent.
    MissingRelation { child: String, parent: String },
    /// A collector kind with no registered operator.
    OperatorMissing { kind: String },
    /// The relational driver refused the statement.
    Execution { message: String },
    /// The driver handed back rows that do not fit the projection.
    RowShape { returned: usize, expected: usize },
    /// An invariant broken inside the compiler itself.
    Internal { message: String },
    /// A `with` value that does not name a child and a parent column.
    RelationPair { found: String },
}

impl Reason {
    /// Machine readable identifier, stable across message rewording.
    pub fn code(&self) -> &'static str {
        match self {
            Reason::Lexical { .. } => "E0001",
            Reason::Syntax { .. } => "E0002",
            Reason::Argument { .. } => "E0003",
            Reason::Numeric { .. } => "E0004",
            Reason::MissingRelation { .. } => "E0005",
            Reason::OperatorMissing { .. } => "E0006",
            Reason::Execution { .. } => "E0007",
            Reason::RowShape { .. } => "E0008",
            Reason::Internal { .. } => "E0009",
            Reason::RelationPair { .. } => "E0010",
        }
    }
}

impl Error {
    pub fn new(reason: Reason) -> Self {
        Error {
            reason,
            span: None,
            hints: Vec::new(),
        }
    }

    pub fn lexical(message: impl Into<String>) -> Self {
        Error::new(Reason::Lexical {
            message: message.into(),
        })
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Error::new(Reason::Argument {
            message: message.into(),
        })
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Error::new(Reason::Execution {
            message: message.into(),
        })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::new(Reason::Internal {
            message: message.into(),
        })
    }

    pub fn code(&self) -> &'static str {
        self.reason.code()
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reason::Lexical { message }
            | Reason::Argument { message }
            | Reason::Execution { message } => f.write_str(message),
            Reason::Syntax {
                who,
                expected,
                found,
            } => {
                if let Some(who) = who {
                    write!(f, "{who} ")?;
                }
                write!(f, "expected {expected}, but found {found}")
            }
            Reason::Numeric { tag, found } => {
                write!(f, "`{tag}` expects an integer value, but found `{found}`")
            }
            Reason::MissingRelation { child, parent } => write!(
                f,
                "query for `{child}` is a child of `{parent}` and needs a \
                 `{child}(with: [child_column parent_column])` rule relating the two"
            ),
            Reason::OperatorMissing { kind } => {
                write!(f, "no operator registered for collector kind `{kind}`")
            }
            Reason::RowShape { returned, expected } => write!(
                f,
                "driver returned a row of {returned} cells where the statement projects {expected}"
            ),
            Reason::Internal { message } => {
                write!(f, "internal compiler error; {message}")
            }
            Reason::RelationPair { found } => write!(
                f,
                "malformed relation pair `{found}`, expected `with: [child_column parent_column]`"
            ),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for Error {}

/// Attaches context to errors bubbling up through `?` chains, on both
/// [Error] itself and any `Result` carrying one.
pub trait Annotate: Sized {
    /// Pins the error to `span`, unless an inner stage already pinned a more
    /// precise one.
    fn locate(self, span: Span) -> Self;

    /// Appends a suggested fix.
    fn hint(self, hint: impl Into<String>) -> Self;
}

impl Annotate for Error {
    fn locate(mut self, span: Span) -> Self {
        self.span = self.span.or(Some(span));
        self
    }

    fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl<T> Annotate for Result<T, Error> {
    fn locate(self, span: Span) -> Self {
        self.map_err(|e| e.locate(span))
    }

    fn hint(self, hint: impl Into<String>) -> Self {
        self.map_err(|e| e.hint(hint))
    }
}

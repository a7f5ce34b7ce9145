use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    TooManyRecipients { max: usize, actual: usize },
    LengthMismatch { contents: usize, mobiles: usize },
    InvalidPhoneNumber { input: String },
    NonPositive { field: &'static str, actual: i64 },
    UnknownAccountClass { value: i64 },
    UnknownTemplate { id: i64 },
    TemplateArguments { expected: usize, actual: usize },
    UnknownCarrier { value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::TooManyRecipients { max, actual } => {
                write!(f, "too many recipients: {actual} (max {max})")
            }
            Self::LengthMismatch { contents, mobiles } => {
                write!(
                    f,
                    "content count {contents} does not match mobile count {mobiles}"
                )
            }
            Self::InvalidPhoneNumber { input } => write!(f, "invalid phone number: {input}"),
            Self::NonPositive { field, actual } => {
                write!(f, "{field} must be positive, got {actual}")
            }
            Self::UnknownAccountClass { value } => {
                write!(f, "unknown account class: {value} (expected 1 or 2)")
            }
            Self::UnknownTemplate { id } => write!(f, "template {id} not found"),
            Self::TemplateArguments { expected, actual } => {
                write!(f, "template expects {expected} arguments, got {actual}")
            }
            Self::UnknownCarrier { value } => write!(f, "unknown carrier: {value}"),
        }
    }
}

impl std::error::Error for ValidationError {}

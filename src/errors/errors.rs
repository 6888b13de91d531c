use std::fmt::Display;

use thiserror::Error;

use crate::{lexer::tokens::TokenKind, Position};

/// A fatal error raised while lexing or parsing.
#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnalignedIndentation { .. } => "UnalignedIndentation",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::ExpectedToken { .. } => "ExpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::InvalidExpression { .. } => "InvalidExpression",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::BadAssignmentTarget => "BadAssignmentTarget",
            ErrorImpl::NoSideEffect { .. } => "NoSideEffect",
            ErrorImpl::InvalidCallTarget => "InvalidCallTarget",
            ErrorImpl::InvalidSubType { .. } => "InvalidSubType",
            ErrorImpl::MissingSubType { .. } => "MissingSubType",
            ErrorImpl::SubTypeCount { .. } => "SubTypeCount",
            ErrorImpl::RequiredAfterOptional { .. } => "RequiredAfterOptional",
            ErrorImpl::AbstractWithValue { .. } => "AbstractWithValue",
            ErrorImpl::AbstractWithBody { .. } => "AbstractWithBody",
            ErrorImpl::DuplicateField { .. } => "DuplicateField",
            ErrorImpl::DuplicateMember { .. } => "DuplicateMember",
            ErrorImpl::DuplicateModifier { .. } => "DuplicateModifier",
            ErrorImpl::ConflictingVisibility => "ConflictingVisibility",
            ErrorImpl::InvalidModifier { .. } => "InvalidModifier",
            ErrorImpl::AmbiguousClassMember { .. } => "AmbiguousClassMember",
            ErrorImpl::InvalidSpecialMethod { .. } => "InvalidSpecialMethod",
            ErrorImpl::MissingIf { .. } => "MissingIf",
            ErrorImpl::UntypedComprehensionIndex { .. } => "UntypedComprehensionIndex",
            ErrorImpl::TooManyRangeSlots => "TooManyRangeSlots",
            ErrorImpl::InternalError { .. } => "InternalError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::InternalError { .. }
            | ErrorImpl::TooManyRangeSlots => ErrorTip::None,
            ErrorImpl::UnalignedIndentation { .. } => ErrorTip::Suggestion(String::from(
                "indentation must return to the width of an enclosing block",
            )),
            ErrorImpl::UnexpectedToken { token } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`", token))
            }
            ErrorImpl::ExpectedToken { expected, found } => {
                ErrorTip::Suggestion(format!("Expected {} but got {}", expected, found))
            }
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::NoSideEffect { .. } => ErrorTip::Suggestion(String::from(
                "an expression statement must assign, call, increment, decrement, new or del",
            )),
            ErrorImpl::RequiredAfterOptional { .. } => ErrorTip::Suggestion(String::from(
                "move parameters with default values to the end",
            )),
            ErrorImpl::AmbiguousClassMember { .. } => ErrorTip::Suggestion(String::from(
                "a class member starts with its type followed by its name",
            )),
            ErrorImpl::MissingIf { .. } => ErrorTip::Suggestion(String::from(
                "`elif` and `else` must follow the body of an `if`",
            )),
            other => ErrorTip::Suggestion(other.to_string()),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.internal_error, self.position)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("Unrecognised token: {token}")]
    UnrecognisedToken { token: String },
    #[error("Unaligned indentation of width {width}")]
    UnalignedIndentation { width: usize },
    #[error("Unexpected token: {token}")]
    UnexpectedToken { token: String },
    #[error("Expected {expected} but got {found}")]
    ExpectedToken { expected: TokenKind, found: TokenKind },
    #[error("Unexpected token: {token}, {message}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("Invalid expression starting with {token}")]
    InvalidExpression { token: String },
    #[error("Invalid number: {token}")]
    NumberParseError { token: String },
    #[error("Bad left hand value for assignment")]
    BadAssignmentTarget,
    #[error("Expression statement without side effect: {expression}")]
    NoSideEffect { expression: String },
    #[error("Only names, members, indexes, calls, casts and ternaries can be called")]
    InvalidCallTarget,
    #[error("Cannot have sub type {sub} for {parent}")]
    InvalidSubType { parent: String, sub: String },
    #[error("Missing sub type for {parent}")]
    MissingSubType { parent: String },
    #[error("{parent} cannot have {count} sub types")]
    SubTypeCount { parent: String, count: usize },
    #[error("Required parameter {name} after optional parameter")]
    RequiredAfterOptional { name: String },
    #[error("Abstract declaration {name} cannot have a value")]
    AbstractWithValue { name: String },
    #[error("Abstract function {name} cannot have a body")]
    AbstractWithBody { name: String },
    #[error("Duplicate field {name}")]
    DuplicateField { name: String },
    #[error("Duplicate class member {name}")]
    DuplicateMember { name: String },
    #[error("Multiple {modifier} modifiers")]
    DuplicateModifier { modifier: String },
    #[error("Multiple visibility modifiers")]
    ConflictingVisibility,
    #[error("Modifier {modifier} is not allowed here")]
    InvalidModifier { modifier: String },
    #[error("Ambiguous syntax in class body at {name}")]
    AmbiguousClassMember { name: String },
    #[error("Invalid {kind} declaration: {message}")]
    InvalidSpecialMethod { kind: String, message: String },
    #[error("No if statement found for {keyword}")]
    MissingIf { keyword: String },
    #[error("Index {name} in list comprehensions must have a type")]
    UntypedComprehensionIndex { name: String },
    #[error("A range takes at most three slots")]
    TooManyRangeSlots,
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

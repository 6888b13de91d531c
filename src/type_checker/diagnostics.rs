//! Semantic diagnostics collected while checking a module.
//!
//! Every [`DiagnosticKind`] message is a template whose fields are the
//! substitution data. Diagnostics never abort checking on their own, the
//! resolver decides whether the current obligation continues.

use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    // Scope construction
    #[error("Re-definition of \"{name}\", originally {mode} at line {line}, col {col}")]
    Redefinition {
        name: String,
        mode: &'static str,
        line: u32,
        col: u32,
    },
    #[error("Dead code after return statement, {next} is never reached")]
    DeadCode { next: &'static str },
    #[error("Return statement outside of function")]
    ReturnOutsideFunction,
    #[error("{keyword} statement outside of loop")]
    LoopControlOutsideLoop { keyword: &'static str },
    #[error("Exported name \"{name}\" is not defined in this module")]
    UndefinedExport { name: String },

    // Names
    #[error("Reference to undefined name \"{name}\"")]
    UndefinedName { name: String },
    #[error("Reference to name \"{name}\" before definition at line {line}, col {col}")]
    ReferenceBeforeDefinition { name: String, line: u32, col: u32 },
    #[error("Reference to undefined type \"{name}\"")]
    UnknownType { name: String },
    #[error("Base class \"{name}\" is not a class")]
    InvalidBaseClass { name: String },
    #[error("Member access via @{name} outside of class")]
    SelfMemberOutsideClass { name: String },

    // Conditions and iteration
    #[error("Implicit cast from \"{from}\" to \"{to}\" in condition")]
    ImplicitCastInCondition { from: String, to: String },
    #[error("Invalid condition, result of expression is \"{found}\" and not \"bool\"")]
    InvalidCondition { found: String },
    #[error("Invalid type for {container} iteration, \"{found}\" is not a {container}")]
    InvalidIterator {
        container: &'static str,
        found: String,
    },
    #[error("Incompatible type for iteration {slot} on {container}, \"{found}\" != \"{expected}\"")]
    IncompatibleIterationIndex {
        slot: &'static str,
        container: &'static str,
        found: String,
        expected: String,
    },
    #[error("Too many indexes for iteration, found {count} but at most 2 are supported")]
    TooManyIndexes { count: usize },

    // Access
    #[error("Invalid {container} index, expected \"{expected}\" but got \"{found}\"")]
    InvalidIndex {
        container: &'static str,
        expected: String,
        found: String,
    },
    #[error("Invalid left-hand operand for indexing, \"{found}\" is neither a list nor a map")]
    InvalidIndexTarget { found: String },
    #[error("Invalid range {slot}, expected \"{expected}\" but got \"{found}\"")]
    InvalidRangeSlot {
        slot: &'static str,
        expected: String,
        found: String,
    },
    #[error("Reverse map lookup requires exactly the middle range slot")]
    InvalidReverseLookup,
    #[error("Invalid left-hand operand for range, \"{found}\" is neither a list nor a map")]
    InvalidRangeTarget { found: String },
    #[error("Invalid right-hand operand for {op} operator, \"{found}\" is neither a list nor a map")]
    InvalidContainer { op: &'static str, found: String },
    #[error("Invalid item for {op} operator, \"{found}\" != \"{expected}\"")]
    InvalidContainerItem {
        op: &'static str,
        found: String,
        expected: String,
    },
    #[error("Type \"{ty}\" has no member \"{property}\"")]
    UnknownMember { ty: String, property: String },

    // Casts
    #[error("Cast from \"{from}\" to \"{to}\" has no effect")]
    UselessCast { from: String, to: String },
    #[error("Invalid cast from \"{from}\" to \"{to}\"")]
    InvalidCast { from: String, to: String },
    #[error("Cast to non-builtin type \"{to}\" is not supported")]
    UnsupportedCast { to: String },

    // Calls
    #[error("Cannot call non-function type \"{ty}\"")]
    NotCallable { ty: String },
    #[error("Parameter count mismatch, call to \"{name}\" with {given} arguments, but requires at least {required}")]
    TooFewArguments {
        name: String,
        given: usize,
        required: usize,
    },
    #[error("Parameter count mismatch, call to \"{name}\" with {given} arguments, but takes {max} at maximum")]
    TooManyArguments {
        name: String,
        given: usize,
        max: usize,
    },
    #[error("Argument type mismatch for argument {index}, \"{found}\" != \"{expected}\"")]
    ArgumentMismatch {
        index: usize,
        found: String,
        expected: String,
    },
    #[error("Implicit cast from \"{from}\" to \"{to}\" for argument {index}")]
    ImplicitCastInArgument {
        index: usize,
        from: String,
        to: String,
    },
    #[error("Cannot instantiate \"{name}\", it is not a class")]
    InvalidNew { name: String },

    // Literals
    #[error("Item at index {index} in list does not have the expected type of \"{expected}\"")]
    ListItemMismatch { index: usize, expected: String },
    #[error("{slot} at index {index} in map does not have the expected type of \"{expected}\"")]
    MapEntryMismatch {
        slot: &'static str,
        index: usize,
        expected: String,
    },
    #[error("Unbalanced number of return indexes in comprehension, {then} != {otherwise}")]
    UnbalancedComprehension { then: usize, otherwise: usize },
    #[error("Invalid number of return indexes for comprehension, found {count}")]
    InvalidComprehensionReturns { count: usize },
    #[error("Comprehension branches return different types, \"{then}\" != \"{otherwise}\"")]
    ComprehensionBranchMismatch { then: String, otherwise: String },
    #[error("Hash type \"{ty}\" has no field \"{field}\"")]
    UnknownHashField { ty: String, field: String },
    #[error("Missing field \"{field}\" of hash type \"{ty}\", it has no default")]
    MissingHashField { ty: String, field: String },

    // Operators
    #[error("Incompatible type for unary {op} operator, result for operand \"{operand}\" is undefined")]
    InvalidUnary { op: &'static str, operand: String },
    #[error("Modification of constant \"{ty}\" by unary {op} operator")]
    ConstModification { op: &'static str, ty: String },
    #[error("Incompatible types for {op} operator, result for operands \"{left}\" and \"{right}\" is undefined")]
    InvalidBinary {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("Ternary branches have different types, \"{then}\" != \"{otherwise}\"")]
    TernaryBranchMismatch { then: String, otherwise: String },

    // Assignments and returns
    #[error("Self-assignment of \"{name}\" has no effect")]
    SelfAssignment { name: String },
    #[error("Assignment to constant of type \"{ty}\"")]
    ConstAssignment { ty: String },
    #[error("Implicit cast from \"{from}\" to \"{to}\" in assignment")]
    ImplicitCastInAssignment { from: String, to: String },
    #[error("Invalid assignment, incompatible types \"{target}\" = \"{value}\"")]
    InvalidAssignment { target: String, value: String },
    #[error("Invalid return of type \"{found}\", type does not match parent function type \"{expected}\"")]
    InvalidReturn { found: String, expected: String },
    #[error("Implicit cast from \"{from}\" to \"{to}\" in return")]
    ImplicitCastInReturn { from: String, to: String },
    #[error("Missing return value, function returns \"{expected}\"")]
    MissingReturnValue { expected: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub position: Position,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.severity, self.kind, self.position)
    }
}

/// Diagnostics of one module in the order they were recorded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    fn push(&mut self, severity: Severity, kind: DiagnosticKind, position: &Position) {
        tracing::trace!(%severity, %kind, %position, "recording diagnostic");
        self.items.push(Diagnostic {
            severity,
            kind,
            position: position.clone(),
        });
    }

    pub fn warning(&mut self, kind: DiagnosticKind, position: &Position) {
        self.push(Severity::Warning, kind, position);
    }

    pub fn error(&mut self, kind: DiagnosticKind, position: &Position) {
        self.push(Severity::Error, kind, position);
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Sorted by line, then column. Diagnostics at the same position keep
    /// their recording order.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items
            .sort_by(|a, b| (a.position.line, a.position.col).cmp(&(b.position.line, b.position.col)));
        self.items
    }
}

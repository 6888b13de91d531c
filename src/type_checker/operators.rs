//! Operator compatibility and cast tables.
//!
//! Operand types are matched by their scalar builtin, ignoring constness.
//! The first matching row of a binary table wins.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::{
    expressions::{BinaryOp, UnaryOp},
    types::BuiltinType,
};

use BuiltinType::{Bool, Float, Int, String};

/// Result of a binary operator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Scalar(BuiltinType),
    ListOf(BuiltinType),
}

type BinaryRow = (BuiltinType, BuiltinType, Operand);

const fn row(left: BuiltinType, right: BuiltinType, result: BuiltinType) -> BinaryRow {
    (left, right, Operand::Scalar(result))
}

const INT_ONLY: [BinaryRow; 1] = [row(Int, Int, Int)];

const NUMERIC: [BinaryRow; 4] = [
    row(Int, Int, Int),
    row(Int, Float, Float),
    row(Float, Int, Float),
    row(Float, Float, Float),
];

const COMPARISON: [BinaryRow; 5] = [
    row(Int, Int, Bool),
    row(Int, Float, Bool),
    row(Float, Int, Bool),
    row(Float, Float, Bool),
    row(String, String, Bool),
];

lazy_static! {
    static ref BINARY_OPERATORS: HashMap<BinaryOp, Vec<BinaryRow>> = {
        let mut table = HashMap::new();

        let equality = vec![
            row(Int, Int, Bool),
            row(Float, Float, Bool),
            row(String, String, Bool),
            row(Bool, Bool, Bool),
        ];
        table.insert(BinaryOp::Equal, equality.clone());
        table.insert(BinaryOp::NotEqual, equality);

        for op in [
            BinaryOp::Less,
            BinaryOp::LessEqual,
            BinaryOp::Greater,
            BinaryOp::GreaterEqual,
        ] {
            table.insert(op, COMPARISON.to_vec());
        }

        let mut plus = NUMERIC.to_vec();
        plus.push(row(String, String, String));
        table.insert(BinaryOp::Plus, plus);

        let mut mul = NUMERIC.to_vec();
        mul.push(row(String, Int, String));
        table.insert(BinaryOp::Mul, mul);

        table.insert(BinaryOp::Minus, NUMERIC.to_vec());
        table.insert(BinaryOp::Exp, NUMERIC.to_vec());
        table.insert(BinaryOp::Div, NUMERIC.to_vec());

        table.insert(
            BinaryOp::DivInt,
            vec![
                row(Int, Int, Int),
                row(Int, Float, Int),
                row(Float, Int, Int),
                row(Float, Float, Int),
            ],
        );

        for op in [
            BinaryOp::Mod,
            BinaryOp::BitAnd,
            BinaryOp::BitOr,
            BinaryOp::BitXor,
            BinaryOp::LeftShift,
            BinaryOp::RightShift,
            BinaryOp::UnsignedRightShift,
        ] {
            table.insert(op, INT_ONLY.to_vec());
        }

        table.insert(BinaryOp::And, vec![row(Bool, Bool, Bool)]);
        table.insert(BinaryOp::Or, vec![row(Bool, Bool, Bool)]);
        table.insert(BinaryOp::Range, vec![(Int, Int, Operand::ListOf(Int))]);

        table
    };

    static ref UNARY_OPERATORS: HashMap<UnaryOp, Vec<(BuiltinType, BuiltinType)>> = {
        let numeric = vec![(Int, Int), (Float, Float)];

        let mut table = HashMap::new();
        table.insert(UnaryOp::BitNot, vec![(Int, Int)]);
        table.insert(UnaryOp::Not, vec![(Bool, Bool)]);
        table.insert(UnaryOp::Plus, numeric.clone());
        table.insert(UnaryOp::Minus, numeric.clone());
        table.insert(UnaryOp::Increment, numeric.clone());
        table.insert(UnaryOp::Decrement, numeric);
        table
    };

    static ref IMPLICIT_CASTS: HashMap<BuiltinType, Vec<BuiltinType>> = HashMap::from([
        (Int, vec![Float, Bool]),
        (Float, vec![Int, Bool]),
        (String, vec![Bool]),
    ]);

    static ref EXPLICIT_CASTS: HashMap<BuiltinType, Vec<BuiltinType>> = HashMap::from([
        (Bool, vec![Int, String]),
        (Int, vec![Bool, Float, String]),
        (Float, vec![Int, String]),
        (String, vec![Int, Float, Bool]),
    ]);
}

pub fn binary_result(op: BinaryOp, left: BuiltinType, right: BuiltinType) -> Option<Operand> {
    BINARY_OPERATORS
        .get(&op)?
        .iter()
        .find(|(l, r, _)| *l == left && *r == right)
        .map(|(_, _, result)| *result)
}

pub fn unary_result(op: UnaryOp, operand: BuiltinType) -> Option<BuiltinType> {
    UNARY_OPERATORS
        .get(&op)?
        .iter()
        .find(|(accepted, _)| *accepted == operand)
        .map(|(_, result)| *result)
}

pub fn is_implicit_cast(from: BuiltinType, to: BuiltinType) -> bool {
    IMPLICIT_CASTS
        .get(&from)
        .is_some_and(|targets| targets.contains(&to))
}

/// Explicit casts include every implicit one.
pub fn is_explicit_cast(from: BuiltinType, to: BuiltinType) -> bool {
    is_implicit_cast(from, to)
        || EXPLICIT_CASTS
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
}

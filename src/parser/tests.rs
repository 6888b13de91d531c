//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Operator precedence and associativity through the symbol table
//! - Assignment targets and side-effect rules for expression statements
//! - Literals, containers, comprehensions, casts and type annotations
//! - Declarations, control flow, classes, imports and exports

use std::rc::Rc;

use crate::{
    ast::{
        ast::{Arity, Expr, Stmt},
        expressions::{BinaryOp, Literal, UnaryOp},
        statements::{LoopIndex, Visibility},
        types::{BuiltinType, TypeKind},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
};

use super::parser::{parse, Program};

fn parse_source(source: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some("test.lufa".to_string()))?;
    parse(tokens, Rc::new("test.lufa".to_string()))
}

fn parse_ok(source: &str) -> Vec<Stmt> {
    match parse_source(source) {
        Ok(program) => program.body,
        Err(error) => panic!("failed to parse {:?}: {}", source, error),
    }
}

fn parse_err(source: &str) -> ErrorImpl {
    match parse_source(source) {
        Ok(program) => panic!("expected an error, got {:?}", program.body),
        Err(error) => error.get_internal_error().clone(),
    }
}

/// The initializer of a single variable declaration, or the expression of
/// a single expression statement.
fn single_expr(source: &str) -> Expr {
    let mut body = parse_ok(source);
    assert_eq!(body.len(), 1);
    match body.remove(0) {
        Stmt::Variable(decl) => decl.value.expect("declaration without value"),
        Stmt::Expression(stmt) => stmt.expression,
        other => panic!("unexpected statement {:?}", other),
    }
}

fn binary(expr: &Expr) -> (BinaryOp, &Expr, &Expr) {
    match expr {
        Expr::Binary(binary) => (binary.op, binary.left.as_ref(), binary.right.as_ref()),
        other => panic!("expected a binary expression, got {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let expr = single_expr("int x = 1 + 2 * 3");
    let (op, left, right) = binary(&expr);

    assert_eq!(op, BinaryOp::Plus);
    assert!(matches!(left, Expr::Literal(_)));
    assert_eq!(binary(right).0, BinaryOp::Mul);
}

#[test]
fn test_left_associative_operators() {
    let expr = single_expr("int x = 1 - 2 - 3");
    let (op, left, right) = binary(&expr);

    assert_eq!(op, BinaryOp::Minus);
    assert_eq!(binary(left).0, BinaryOp::Minus);
    assert!(matches!(right, Expr::Literal(_)));

    let expr = single_expr("int x = 2 ** 3 ** 2");
    let (_, left, _) = binary(&expr);
    assert_eq!(binary(left).0, BinaryOp::Exp);
}

#[test]
fn test_logical_operators_group_right() {
    let expr = single_expr("bool x = a && b || c");
    let (op, left, right) = binary(&expr);

    assert_eq!(op, BinaryOp::And);
    assert!(matches!(left, Expr::Name(_)));
    assert_eq!(binary(right).0, BinaryOp::Or);
}

#[test]
fn test_comparison_below_arithmetic() {
    let expr = single_expr("bool x = a + 1 < b << 2");
    let (op, left, right) = binary(&expr);

    assert_eq!(op, BinaryOp::Less);
    assert_eq!(binary(left).0, BinaryOp::Plus);
    assert_eq!(binary(right).0, BinaryOp::LeftShift);
}

#[test]
fn test_chained_assignment_groups_right() {
    let expr = single_expr("a = b = c");

    let Expr::Assignment(outer) = expr else {
        panic!("expected an assignment");
    };
    assert!(matches!(*outer.target, Expr::Name(ref name) if name.name == "a"));
    assert!(outer.operator.is_none());

    let Expr::Assignment(inner) = *outer.value else {
        panic!("expected a nested assignment");
    };
    assert!(matches!(*inner.target, Expr::Name(ref name) if name.name == "b"));
    assert!(matches!(*inner.value, Expr::Name(ref name) if name.name == "c"));
}

#[test]
fn test_compound_assignment_operator() {
    let Expr::Assignment(assignment) = single_expr("x += 2") else {
        panic!("expected an assignment");
    };
    assert_eq!(assignment.operator, Some(BinaryOp::Plus));
}

#[test]
fn test_bad_assignment_target() {
    assert_eq!(parse_err("1 = 2"), ErrorImpl::BadAssignmentTarget);
    assert_eq!(parse_err("a + b = 2"), ErrorImpl::BadAssignmentTarget);
    assert_eq!(parse_err("f() = 2"), ErrorImpl::BadAssignmentTarget);
    assert_eq!(parse_err("-a = 2"), ErrorImpl::BadAssignmentTarget);

    let body = parse_ok("@x = 1
a.b = 2
a[0] = 3
a[1:2] = b
");
    assert_eq!(body.len(), 4);
}

#[test]
fn test_expression_arity() {
    let cases = [
        ("int x = 1", Arity::Literal),
        ("list[int] x = [1, 2]", Arity::Literal),
        ("hash[Point] p = {:x = 1}", Arity::Literal),
        ("int x = a", Arity::Name),
        ("int x = @a", Arity::Name),
        ("int x = -a", Arity::Unary),
        ("int x = (int)a", Arity::Unary),
        ("int x = a + b", Arity::Binary),
        ("int x = f(a)", Arity::Binary),
        ("int x = a.b", Arity::Binary),
        ("int x = a ? 1 : 2", Arity::Ternary),
        ("Point p = {int x = 0}", Arity::Declaration),
    ];

    for (source, arity) in cases {
        assert_eq!(single_expr(source).arity(), arity, "{}", source);
    }
}

#[test]
fn test_expression_statement_needs_side_effect() {
    assert!(matches!(
        parse_err("a + 1"),
        ErrorImpl::NoSideEffect { .. }
    ));

    let body = parse_ok("a && f()\n++counter\n");
    assert_eq!(body.len(), 2);
}

#[test]
fn test_ternary() {
    let Expr::Ternary(ternary) = single_expr("int x = a ? 1 : 2") else {
        panic!("expected a ternary");
    };
    assert!(matches!(*ternary.condition, Expr::Name(_)));
    assert!(matches!(*ternary.else_branch, Expr::Literal(_)));
}

#[test]
fn test_member_call_and_index_chain() {
    let Expr::Index(index) = single_expr("int x = a.b(1, 2)[0]") else {
        panic!("expected an index");
    };
    let Expr::Call(call) = *index.target else {
        panic!("expected a call");
    };
    assert_eq!(call.arguments.len(), 2);
    assert!(matches!(*call.callee, Expr::Member(ref member) if member.property == "b"));
}

#[test]
fn test_literal_cannot_be_called() {
    assert_eq!(parse_err("1(2)"), ErrorImpl::InvalidCallTarget);
}

#[test]
fn test_range_slots() {
    let Expr::Range(range) = single_expr("list[int] y = x[1:2]") else {
        panic!("expected a range");
    };
    assert_eq!(range.slots.len(), 2);
    assert!(range.slots.iter().all(Option::is_some));

    let Expr::Range(range) = single_expr("list[int] y = x[::2]") else {
        panic!("expected a range");
    };
    assert_eq!(range.slots.len(), 3);
    assert!(range.slots[0].is_none() && range.slots[1].is_none());
    assert!(range.slots[2].is_some());

    assert_eq!(parse_err("y = x[1:2:3:4]"), ErrorImpl::TooManyRangeSlots);
    assert!(matches!(
        parse_err("y = x[]"),
        ErrorImpl::UnexpectedTokenDetailed { .. }
    ));
}

#[test]
fn test_hex_and_float_literals() {
    let Expr::Literal(literal) = single_expr("int x = 0xff") else {
        panic!("expected a literal");
    };
    assert_eq!(literal.value, Literal::Integer(255));

    let Expr::Literal(literal) = single_expr("float x = 1.5") else {
        panic!("expected a literal");
    };
    assert_eq!(literal.value, Literal::Float(1.5));
}

#[test]
fn test_prefix_operators() {
    let Expr::Unary(unary) = single_expr("int x = -a.b") else {
        panic!("expected a unary expression");
    };
    assert_eq!(unary.op, UnaryOp::Minus);
    assert!(matches!(*unary.operand, Expr::Member(_)));

    let Expr::Unary(unary) = single_expr("Foo f = new Foo(1)") else {
        panic!("expected a unary expression");
    };
    assert_eq!(unary.op, UnaryOp::New);
    assert!(matches!(*unary.operand, Expr::Call(_)));
}

#[test]
fn test_casts() {
    let Expr::Cast(cast) = single_expr("int x = (int)\"4\"") else {
        panic!("expected a cast");
    };
    assert_eq!(cast.ty.as_builtin(), Some(BuiltinType::Int));

    let Expr::Cast(cast) = single_expr("Foo x = (Foo)y") else {
        panic!("expected a cast");
    };
    assert_eq!(cast.ty.kind, TypeKind::Named("Foo".to_string()));

    let Expr::Binary(grouped) = single_expr("int x = (1 + 2) * 3") else {
        panic!("expected a binary expression");
    };
    assert_eq!(grouped.op, BinaryOp::Mul);
}

#[test]
fn test_is_expression() {
    let Expr::Is(is) = single_expr("bool x = y is list[int]") else {
        panic!("expected an is expression");
    };
    assert_eq!(is.ty.to_string(), "list[int]");
}

#[test]
fn test_list_comprehension() {
    let Expr::Comprehension(comprehension) =
        single_expr("list[int] y = [x * 2 for int x in xs if x > 1 else 0]")
    else {
        panic!("expected a comprehension");
    };

    assert_eq!(comprehension.returns.len(), 1);
    assert_eq!(comprehension.header.indexes.len(), 1);
    assert!(matches!(comprehension.header.indexes[0], LoopIndex::Declared(_)));
    assert!(comprehension.condition.is_some());
    assert_eq!(comprehension.else_returns.len(), 1);
}

#[test]
fn test_comprehension_index_needs_type() {
    assert_eq!(
        parse_err("list[int] y = [x for x in xs]"),
        ErrorImpl::UntypedComprehensionIndex {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_curly_literals() {
    assert!(matches!(
        single_expr("map[string, int] m = {}"),
        Expr::Map(ref map) if map.entries.is_empty()
    ));
    assert!(matches!(
        single_expr("map[string, int] m = {\"a\": 1, \"b\": 2,}"),
        Expr::Map(ref map) if map.entries.len() == 2
    ));
    assert!(matches!(
        single_expr("hash[Point] p = {:x = 1, :y = 2}"),
        Expr::HashValue(ref hash) if hash.fields.len() == 2
    ));

    let Expr::HashDeclaration(declaration) =
        single_expr("Point p = {int x = 0, const float y}")
    else {
        panic!("expected a hash declaration");
    };
    assert_eq!(declaration.fields.len(), 2);
    assert!(declaration.fields[1].is_const());

    assert_eq!(
        parse_err("hash[Point] p = {:x = 1, :x = 2}"),
        ErrorImpl::DuplicateField {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_type_annotations() {
    let body = parse_ok("map[string, list[int]] m\nint(string, float...) f\n");

    let Stmt::Variable(map) = &body[0] else {
        panic!("expected a variable");
    };
    assert_eq!(map.ty.to_string(), "map[string, list[int]]");

    let Stmt::Variable(function) = &body[1] else {
        panic!("expected a variable");
    };
    let TypeKind::Function {
        params,
        required,
        variadic,
        ..
    } = &function.ty.kind
    else {
        panic!("expected a function type");
    };
    assert_eq!(params.len(), 2);
    assert_eq!(*required, 1);
    assert!(*variadic);
}

#[test]
fn test_invalid_type_annotations() {
    assert!(matches!(
        parse_err("list l"),
        ErrorImpl::MissingSubType { .. }
    ));
    assert!(matches!(
        parse_err("int[int] x"),
        ErrorImpl::InvalidSubType { .. }
    ));
    assert!(matches!(
        parse_err("hash[int] x"),
        ErrorImpl::InvalidSubType { .. }
    ));
    assert!(matches!(
        parse_err("list[int, int] x"),
        ErrorImpl::SubTypeCount { count: 2, .. }
    ));
}

#[test]
fn test_function_declaration() {
    let body = parse_ok("int add(int a, int b = 1, int rest...):\n    ret a + b\n");

    let Stmt::Function(function) = &body[0] else {
        panic!("expected a function");
    };
    assert_eq!(function.name, "add");
    assert_eq!(function.params.len(), 3);
    assert_eq!(function.required_params, 1);
    assert!(function.is_variadic());
    assert_eq!(function.body.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_required_parameter_after_optional() {
    assert_eq!(
        parse_err("void f(int a = 1, int b):\n    ret\n"),
        ErrorImpl::RequiredAfterOptional {
            name: "b".to_string()
        }
    );
}

#[test]
fn test_empty_function_body() {
    let body = parse_ok("void f():\nf()\n");
    assert_eq!(body.len(), 2);

    let Stmt::Function(function) = &body[0] else {
        panic!("expected a function");
    };
    assert_eq!(function.body.as_ref().map(Vec::len), Some(0));
}

#[test]
fn test_if_elif_else() {
    let body = parse_ok("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");

    let Stmt::If(stmt) = &body[0] else {
        panic!("expected an if statement");
    };
    assert_eq!(stmt.branches.len(), 2);
    assert!(stmt.else_body.is_some());
    assert_eq!(stmt.branches[1].position.line, 3);
}

#[test]
fn test_else_without_if() {
    assert_eq!(
        parse_err("else:\n    x = 1\n"),
        ErrorImpl::MissingIf {
            keyword: "else".to_string()
        }
    );
}

#[test]
fn test_loops() {
    let body = parse_ok("while a < 3:\n    a += 1\n    break\nfor k, v in m:\n    continue\n");

    assert!(matches!(body[0], Stmt::While(ref stmt) if stmt.body.len() == 2));
    let Stmt::For(stmt) = &body[1] else {
        panic!("expected a for statement");
    };
    assert_eq!(stmt.header.indexes.len(), 2);
    assert!(matches!(stmt.header.indexes[0], LoopIndex::Name(_)));
}

#[test]
fn test_class_declaration() {
    let source = "\
class Point extends Shape:
    private int x = 0
    const float scale = 1.0
    abstract int area()
    new Point(int x):
        @x = x
    int getX():
        ret @x
";
    let body = parse_ok(source);

    let Stmt::Class(class) = &body[0] else {
        panic!("expected a class");
    };
    assert_eq!(class.name, "Point");
    assert_eq!(class.base.as_ref().map(|base| base.name.as_str()), Some("Shape"));
    assert_eq!(class.members.len(), 2);
    assert_eq!(class.methods.len(), 2);
    assert!(class.constructor.is_some());
    assert!(class.destructor.is_none());

    let x = class.member("x").expect("member x");
    assert_eq!(x.modifiers.visibility, Visibility::Private);
    assert!(class.member("scale").expect("member scale").decl.is_const());

    let area = class.method("area").expect("method area");
    assert!(area.modifiers.is_abstract);
    assert!(area.decl.body.is_none());
}

#[test]
fn test_class_errors() {
    assert_eq!(
        parse_err("class A:\n    static static int x\n"),
        ErrorImpl::DuplicateModifier {
            modifier: "static".to_string()
        }
    );
    assert_eq!(
        parse_err("class A:\n    public private int x\n"),
        ErrorImpl::ConflictingVisibility
    );
    assert_eq!(
        parse_err("class A:\n    x = 1\n"),
        ErrorImpl::AmbiguousClassMember {
            name: "x".to_string()
        }
    );
    assert_eq!(
        parse_err("class A:\n    int x\n    float x\n"),
        ErrorImpl::DuplicateMember {
            name: "x".to_string()
        }
    );
    assert!(matches!(
        parse_err("class A:\n    new B():\n"),
        ErrorImpl::InvalidSpecialMethod { .. }
    ));
    assert!(matches!(
        parse_err("class A:\n    abstract int f():\n        ret 1\n"),
        ErrorImpl::AbstractWithBody { .. }
    ));
}

#[test]
fn test_imports_and_exports() {
    let body = parse_ok("import std.io as io, math\nfrom util import log\nexport foo, bar\n");

    let Stmt::Import(import) = &body[0] else {
        panic!("expected an import");
    };
    assert!(import.from.is_none());
    assert_eq!(import.names.len(), 2);
    assert_eq!(import.names[0].path.to_string(), "std.io");
    assert_eq!(import.names[0].bound_name(), "io");
    assert_eq!(import.names[1].bound_name(), "math");

    let Stmt::Import(from) = &body[1] else {
        panic!("expected an import");
    };
    assert_eq!(from.from.as_ref().map(ToString::to_string), Some("util".to_string()));

    assert!(matches!(body[2], Stmt::Export(ref export) if export.names.len() == 2));
}

#[test]
fn test_const_declaration() {
    let body = parse_ok("const int limit = 10\n");

    let Stmt::Variable(decl) = &body[0] else {
        panic!("expected a variable");
    };
    assert!(decl.is_const());
    assert_eq!(decl.name, "limit");

    assert!(matches!(
        parse_err("static int x = 1\n"),
        ErrorImpl::InvalidModifier { .. }
    ));
}

#[test]
fn test_scope_blocks() {
    let body = parse_ok("scope:\n    int x = 1\nint x = 2\n");

    assert_eq!(body.len(), 2);
    assert!(matches!(body[0], Stmt::Block(ref block) if block.body.len() == 1));
}

#[test]
fn test_missing_closing_bracket() {
    assert!(matches!(
        parse_err("f(1, 2\n"),
        ErrorImpl::ExpectedToken { .. }
    ));
}

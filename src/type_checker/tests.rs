//! Unit tests for the type checker module.
//!
//! Covers the type cache and operator tables, scope tree construction and
//! name resolution, and the diagnostics recorded for each kind of
//! obligation, including how failures stay contained to one obligation.

use std::rc::Rc;

use crate::{
    ast::{
        ast::Stmt,
        expressions::{BinaryOp, UnaryOp},
        types::BuiltinType,
    },
    lexer::lexer::tokenize,
    parser::parser::{parse, Program},
    Position,
};

use super::{
    diagnostics::{Diagnostic, DiagnosticKind, Severity},
    operators::{binary_result, is_explicit_cast, is_implicit_cast, unary_result, Operand},
    scope::ScopeKind,
    type_cache::TypeCache,
    type_checker::{type_check, Module},
};

fn parse_program(source: &str) -> Program {
    let tokens = match tokenize(source.to_string(), Some("test.lufa".to_string())) {
        Ok(tokens) => tokens,
        Err(error) => panic!("failed to tokenize {:?}: {}", source, error),
    };
    match parse(tokens, Rc::new("test.lufa".to_string())) {
        Ok(program) => program,
        Err(error) => panic!("failed to parse {:?}: {}", source, error),
    }
}

fn check(source: &str) -> Vec<Diagnostic> {
    let program = parse_program(source);
    match type_check(&program) {
        Ok(module) => module.diagnostics.into_sorted(),
        Err(error) => panic!("type checker failed on {:?}: {}", source, error),
    }
}

fn with_severity(source: &str, severity: Severity) -> Vec<DiagnosticKind> {
    check(source)
        .into_iter()
        .filter(|diagnostic| diagnostic.severity == severity)
        .map(|diagnostic| diagnostic.kind)
        .collect()
}

fn errors(source: &str) -> Vec<DiagnosticKind> {
    with_severity(source, Severity::Error)
}

fn warnings(source: &str) -> Vec<DiagnosticKind> {
    with_severity(source, Severity::Warning)
}

fn assert_clean(source: &str) {
    let diagnostics = check(source);
    assert!(
        diagnostics.is_empty(),
        "expected no diagnostics for {:?}, got {:?}",
        source,
        diagnostics
    );
}

#[test]
fn test_type_cache_interns_structural_types() {
    let mut types = TypeCache::new();
    let int = types.builtin(BuiltinType::Int);
    let string = types.builtin(BuiltinType::String);
    let float = types.builtin(BuiltinType::Float);

    let list = types.list_of(int);
    assert_eq!(types.list_of(int), list);
    assert_eq!(types.name(list), "list[int]");

    let map = types.map_of(string, int);
    assert_eq!(types.name(map), "map[string,int]");

    let function = types.function_of(int, vec![string, float], 2, false);
    assert_eq!(types.name(function), "int<function(string,float)");
    assert!(types.get(function).is_function());
}

#[test]
fn test_type_cache_compare() {
    let mut types = TypeCache::new();
    let int = types.builtin(BuiltinType::Int);
    let float = types.builtin(BuiltinType::Float);
    let const_int = types.make_const(int);

    assert_eq!(types.name(const_int), "const~int");
    assert!(types.compare(int, Some(const_int)));
    assert!(!types.compare(int, Some(float)));
    assert!(!types.compare(int, None));
    assert_eq!(types.strip_const(const_int), int);

    let function = types.function_of(int, vec![], 0, false);
    let const_function = types.make_const(function);
    assert!(!types.compare(function, Some(const_function)));
}

#[test]
fn test_type_cache_from_descriptor() {
    let program = parse_program("map[string, list[int]] m\nmap[int] ids\n");
    let mut types = TypeCache::new();

    let names = program
        .body
        .iter()
        .map(|stmt| match stmt {
            Stmt::Variable(decl) => match types.from_descriptor(&decl.ty) {
                Ok(ty) => types.name(ty),
                Err(error) => panic!("unexpected error {}", error),
            },
            other => panic!("unexpected statement {:?}", other),
        })
        .collect::<Vec<_>>();

    assert_eq!(names, vec!["map[string,list[int]]", "map[int,int]"]);
}

#[test]
fn test_type_cache_builtin_members() {
    let mut types = TypeCache::new();
    let int = types.builtin(BuiltinType::Int);
    let string = types.builtin(BuiltinType::String);
    let map = types.map_of(string, int);
    let list = types.list_of(int);

    assert_eq!(types.member(list, "length"), Some(int));

    let keys = types.member(map, "keys").expect("map has keys");
    assert_eq!(types.name(keys), "list[string]<function()");

    let values = types.member(map, "values").expect("map has values");
    assert_eq!(types.name(values), "list[int]<function()");

    assert_eq!(types.member(int, "length"), None);
    assert_eq!(types.member(list, "keys"), None);
}

#[test]
fn test_operator_tables() {
    use BuiltinType::{Bool, Float, Int, String};

    assert_eq!(binary_result(BinaryOp::Plus, Int, Float), Some(Operand::Scalar(Float)));
    assert_eq!(binary_result(BinaryOp::Plus, String, String), Some(Operand::Scalar(String)));
    assert_eq!(binary_result(BinaryOp::Mul, String, Int), Some(Operand::Scalar(String)));
    assert_eq!(binary_result(BinaryOp::DivInt, Float, Float), Some(Operand::Scalar(Int)));
    assert_eq!(binary_result(BinaryOp::Less, Int, Float), Some(Operand::Scalar(Bool)));
    assert_eq!(binary_result(BinaryOp::Range, Int, Int), Some(Operand::ListOf(Int)));
    assert_eq!(binary_result(BinaryOp::Plus, Bool, Bool), None);
    assert_eq!(binary_result(BinaryOp::Mod, Float, Int), None);

    assert_eq!(unary_result(UnaryOp::Not, Bool), Some(Bool));
    assert_eq!(unary_result(UnaryOp::Minus, String), None);

    assert!(is_implicit_cast(Int, Float));
    assert!(is_implicit_cast(String, Bool));
    assert!(!is_implicit_cast(Bool, Int));
    assert!(is_explicit_cast(Bool, Int));
    assert!(is_explicit_cast(String, Int));
    assert!(is_explicit_cast(Float, Bool));
    assert!(!is_explicit_cast(Bool, Float));
}

#[test]
fn test_valid_program_has_no_diagnostics() {
    assert_clean(
        "\
int add(int a, int b = 1):
    ret a + b
int x = add(1)
float y = x * 2.5
string s = \"a\" + \"b\"
bool big = y > 3
",
    );
}

#[test]
fn test_list_items_must_match_first_item() {
    assert_eq!(
        errors("list[int] x = [1, 2, \"s\"]\n"),
        vec![DiagnosticKind::ListItemMismatch {
            index: 2,
            expected: "int".to_string()
        }]
    );
    assert_clean("list[int] x = [1, 2, 3]\n");
}

#[test]
fn test_undefined_name() {
    assert_eq!(
        errors("int x = y\n"),
        vec![DiagnosticKind::UndefinedName {
            name: "y".to_string()
        }]
    );
}

#[test]
fn test_reference_before_definition_in_same_scope() {
    let errors = errors("int x = y\nint y = 1\n");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        DiagnosticKind::ReferenceBeforeDefinition { name, line: 2, .. } if name == "y"
    ));
}

#[test]
fn test_forward_reference_from_function_body() {
    assert_clean("void main():\n    helper()\nvoid helper():\n    ret\n");
}

#[test]
fn test_redefinition() {
    let errors = errors("int x = 1\nfloat x = 2.0\n");
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        DiagnosticKind::Redefinition { name, mode: "defined", line: 1, .. } if name == "x"
    ));
}

#[test]
fn test_dead_code_after_return() {
    assert_eq!(
        errors("int f():\n    ret 1\n    int x = 2\n"),
        vec![DiagnosticKind::DeadCode { next: "VARIABLE" }]
    );
}

#[test]
fn test_statements_outside_of_their_context() {
    assert_eq!(errors("ret 1\n"), vec![DiagnosticKind::ReturnOutsideFunction]);
    assert_eq!(
        errors("break\n"),
        vec![DiagnosticKind::LoopControlOutsideLoop { keyword: "break" }]
    );
    assert_clean("int n = 0\nwhile n < 3:\n    n += 1\n    continue\n");
}

#[test]
fn test_call_arity() {
    let source = "\
int f(int a, int b, int c = 0):
    ret a
int w = f(1)
int x = f(1, 2)
int y = f(1, 2, 3)
int z = f(1, 2, 3, 4)
";

    assert_eq!(
        errors(source),
        vec![
            DiagnosticKind::TooFewArguments {
                name: "f".to_string(),
                given: 1,
                required: 2
            },
            DiagnosticKind::TooManyArguments {
                name: "f".to_string(),
                given: 4,
                max: 3
            },
        ]
    );
}

#[test]
fn test_argument_types() {
    assert_eq!(
        errors("void g(int a):\n    ret\ng(\"s\")\n"),
        vec![DiagnosticKind::ArgumentMismatch {
            index: 1,
            found: "string".to_string(),
            expected: "int".to_string()
        }]
    );

    assert_eq!(
        warnings("void g(float a):\n    ret\ng(1)\n"),
        vec![DiagnosticKind::ImplicitCastInArgument {
            index: 1,
            from: "int".to_string(),
            to: "float".to_string()
        }]
    );
}

#[test]
fn test_variadic_parameters() {
    let source = "\
int sum(int first, int rest...):
    ret first + rest.length
int a = sum(1)
int b = sum(1, 2, 3)
";
    assert_clean(source);

    let errors = errors("int sum(int first, int rest...):\n    ret first\nint t = sum(1, \"a\")\n");
    assert!(matches!(
        errors.as_slice(),
        [DiagnosticKind::ArgumentMismatch { index: 2, .. }]
    ));
}

#[test]
fn test_casts() {
    assert_clean("int x = (int)\"4\"\n");

    assert_eq!(
        errors("bool b = (bool)[1, 2]\n"),
        vec![DiagnosticKind::InvalidCast {
            from: "list[int]".to_string(),
            to: "bool".to_string()
        }]
    );

    assert_eq!(
        warnings("int y = (int)5\n"),
        vec![DiagnosticKind::UselessCast {
            from: "int".to_string(),
            to: "int".to_string()
        }]
    );
}

#[test]
fn test_conditions() {
    assert_eq!(
        warnings("int n = 3\nif n:\n    n = 1\n"),
        vec![DiagnosticKind::ImplicitCastInCondition {
            from: "int".to_string(),
            to: "bool".to_string()
        }]
    );

    assert_eq!(
        errors("list[int] xs = [1]\nwhile xs:\n    xs = [2]\n"),
        vec![DiagnosticKind::InvalidCondition {
            found: "list[int]".to_string()
        }]
    );
}

#[test]
fn test_failures_are_contained_per_obligation() {
    let diagnostics = check("int a = missing\nfloat b = 1\n");
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[1].severity, Severity::Warning);
    assert!(matches!(
        diagnostics[1].kind,
        DiagnosticKind::ImplicitCastInAssignment { .. }
    ));
}

#[test]
fn test_assignments() {
    assert_eq!(
        errors("const int limit = 10\nlimit = 11\n"),
        vec![DiagnosticKind::ConstAssignment {
            ty: "const~int".to_string()
        }]
    );

    assert_eq!(
        warnings("int x = 1\nx = x\n"),
        vec![DiagnosticKind::SelfAssignment {
            name: "x".to_string()
        }]
    );

    assert_eq!(
        errors("string s = \"a\"\ns -= 1\n"),
        vec![DiagnosticKind::InvalidBinary {
            op: "-",
            left: "string".to_string(),
            right: "int".to_string()
        }]
    );

    assert_eq!(
        errors("int x = 1\nx = \"s\"\n"),
        vec![DiagnosticKind::InvalidAssignment {
            target: "int".to_string(),
            value: "string".to_string()
        }]
    );

    assert_clean("list[int] xs = []\nmap[string, int] m = {}\nxs = []\n");
}

#[test]
fn test_unary_operators() {
    assert_eq!(
        errors("const int c = 1\n++c\n"),
        vec![DiagnosticKind::ConstModification {
            op: "++",
            ty: "const~int".to_string()
        }]
    );

    assert_eq!(
        errors("int n = -\"s\"\n"),
        vec![DiagnosticKind::InvalidUnary {
            op: "-",
            operand: "string".to_string()
        }]
    );
}

#[test]
fn test_for_loop_indexes() {
    let source = "\
list[int] xs = [1, 2]
for int x in xs:
    x += 1
for string s in xs:
    s += \"a\"
";

    assert_eq!(
        errors(source),
        vec![DiagnosticKind::IncompatibleIterationIndex {
            slot: "item",
            container: "list",
            found: "string".to_string(),
            expected: "int".to_string()
        }]
    );

    assert_clean("map[string, int] m = {\"a\": 1}\nfor string k, int v in m:\n    v += 1\n");

    assert!(matches!(
        errors("map[string, int] m = {\"a\": 1}\nfor int v in m:\n    v += 1\n").as_slice(),
        [DiagnosticKind::InvalidIterator { container: "list", .. }]
    ));
}

#[test]
fn test_index_range_and_membership() {
    let source = "\
list[int] xs = [1, 2]
map[string, int] m = {\"a\": 1}
int a = xs[0]
int b = m[\"a\"]
string k = m[:1]
list[int] head = xs[0:1]
bool found = 2 in xs
bool key = m has \"a\"
";
    assert_clean(source);

    assert!(matches!(
        errors("list[int] xs = [1]\nint a = xs[\"0\"]\n").as_slice(),
        [DiagnosticKind::InvalidIndex { container: "list", .. }]
    ));

    assert!(matches!(
        errors("list[int] xs = [1]\nbool bad = \"s\" in xs\n").as_slice(),
        [DiagnosticKind::InvalidContainerItem { op: "in", .. }]
    ));

    assert!(matches!(
        errors("int n = 1\nint a = n[0]\n").as_slice(),
        [DiagnosticKind::InvalidIndexTarget { .. }]
    ));

    assert_eq!(
        errors("list[int] xs = [1, 2]\nlist[int] ys = xs[\"a\":2]\n"),
        vec![DiagnosticKind::InvalidRangeSlot {
            slot: "start",
            expected: "int".to_string(),
            found: "string".to_string()
        }]
    );

    assert_eq!(
        errors("map[string, int] m = {\"a\": 1}\nstring k = m[\"a\":1]\n"),
        vec![DiagnosticKind::InvalidReverseLookup]
    );

    assert_eq!(
        errors("map[string, int] m = {\"a\": 1}\nstring k = m[:\"one\"]\n"),
        vec![DiagnosticKind::InvalidRangeSlot {
            slot: "value",
            expected: "int".to_string(),
            found: "string".to_string()
        }]
    );

    assert_eq!(
        errors("int n = 5\nint s = n[1:2]\n"),
        vec![DiagnosticKind::InvalidRangeTarget {
            found: "int".to_string()
        }]
    );
}

#[test]
fn test_map_entries_match_first_entry() {
    assert_eq!(
        errors("map[string, int] m = {\"a\": 1, \"b\": \"two\"}\n"),
        vec![DiagnosticKind::MapEntryMismatch {
            slot: "Value",
            index: 1,
            expected: "int".to_string()
        }]
    );

    assert_eq!(
        errors("map[string, int] m = {\"a\": 1, 2: 3}\n"),
        vec![DiagnosticKind::MapEntryMismatch {
            slot: "Key",
            index: 1,
            expected: "string".to_string()
        }]
    );
}

#[test]
fn test_iteration_index_count() {
    assert_eq!(
        errors("list[int] xs = [1]\nfor int a, int b, int c in xs:\n    a += 1\n"),
        vec![DiagnosticKind::TooManyIndexes { count: 3 }]
    );
}

#[test]
fn test_calls_and_instantiation_need_the_right_kind_of_name() {
    assert_eq!(
        errors("int n = 1\nint m = n()\n"),
        vec![DiagnosticKind::NotCallable {
            ty: "int".to_string()
        }]
    );

    assert_eq!(
        errors("int n = 1\nint m = new n()\n"),
        vec![DiagnosticKind::InvalidNew {
            name: "n".to_string()
        }]
    );

    assert_eq!(
        errors("Missing m = null\n"),
        vec![DiagnosticKind::UnknownType {
            name: "Missing".to_string()
        }]
    );
}

#[test]
fn test_builtin_members() {
    assert_clean(
        "string s = \"abc\"\nint n = s.length\nmap[string, int] m = {\"a\": 1}\nlist[string] keys = m.keys()\n",
    );

    assert_eq!(
        errors("string s = \"abc\"\nint n = s.size\n"),
        vec![DiagnosticKind::UnknownMember {
            ty: "string".to_string(),
            property: "size".to_string()
        }]
    );
}

#[test]
fn test_comprehensions() {
    assert_clean("list[int] xs = [1, 2]\nlist[int] ys = [x * 2 for int x in xs if x > 1 else 0]\n");

    assert_eq!(
        errors("list[int] xs = [1, 2]\nlist[int] ys = [x for int x in xs if x > 1 else \"no\"]\n"),
        vec![DiagnosticKind::ComprehensionBranchMismatch {
            then: "int".to_string(),
            otherwise: "string".to_string()
        }]
    );

    assert_eq!(
        errors("list[int] xs = [1, 2]\nmap[int, int] m = [x, x for int x in xs if x > 1 else 0]\n"),
        vec![DiagnosticKind::UnbalancedComprehension {
            then: 2,
            otherwise: 1
        }]
    );
}

#[test]
fn test_two_return_comprehension_builds_a_map() {
    assert_clean("list[int] xs = [1, 2]\nmap[int, string] m = [x, \"v\" for int x in xs]\n");

    assert_eq!(
        errors("list[int] xs = [1, 2]\nlist[int] ys = [x, \"v\" for int x in xs]\n"),
        vec![DiagnosticKind::InvalidAssignment {
            target: "list[int]".to_string(),
            value: "map[int,string]".to_string()
        }]
    );
}

#[test]
fn test_classes() {
    let source = "\
class Point:
    int x = 0
    new Point(int x):
        @x = x
    int getX():
        ret @x
Point p = new Point(1)
int v = p.getX()
int w = p.x
Point q = null
";
    assert_clean(source);

    assert_eq!(
        errors("class Point:\n    int x = 0\nPoint p = new Point()\nint y = p.y\n"),
        vec![DiagnosticKind::UnknownMember {
            ty: "Point".to_string(),
            property: "y".to_string()
        }]
    );

    assert_eq!(
        errors("int y = @x\n"),
        vec![DiagnosticKind::SelfMemberOutsideClass {
            name: "x".to_string()
        }]
    );
}

#[test]
fn test_inherited_members() {
    let source = "\
class Base:
    int v = 0
class Child extends Base:
    int w = 1
Child c = new Child()
int total = c.v + c.w
";
    assert_clean(source);

    assert_eq!(
        errors("int A = 1\nclass B extends A:\n    int v = 0\n"),
        vec![DiagnosticKind::InvalidBaseClass {
            name: "A".to_string()
        }]
    );
}

#[test]
fn test_hash_types() {
    assert_clean("hash Point = {int x = 0, float y}\nPoint p = {:x = 1, :y = 2.0}\nint px = p.x\n");

    assert_eq!(
        errors("hash Point = {int x = \"zero\"}\n"),
        vec![DiagnosticKind::InvalidAssignment {
            target: "int".to_string(),
            value: "string".to_string()
        }]
    );

    let point = "hash Point = {int x = 0, float y}\n";

    assert_eq!(
        errors(&format!("{}Point p = {{:x = \"not an int\", :y = 1.5}}\n", point)),
        vec![DiagnosticKind::InvalidAssignment {
            target: "int".to_string(),
            value: "string".to_string()
        }]
    );

    assert_eq!(
        errors(&format!("{}Point p = {{:y = 1.5, :nope = 1.5}}\n", point)),
        vec![DiagnosticKind::UnknownHashField {
            ty: "Point".to_string(),
            field: "nope".to_string()
        }]
    );

    assert_eq!(
        errors(&format!("{}Point p = {{:x = 1}}\n", point)),
        vec![DiagnosticKind::MissingHashField {
            ty: "Point".to_string(),
            field: "y".to_string()
        }]
    );

    // Fields with a default may be left out
    assert_clean(&format!("{}Point p = {{:y = 1.5}}\n", point));

    // Arguments, assignments and returns are checked the same way
    let functions = "\
int norm(Point p):
    ret p.x
Point origin():
    ret {:y = 0.0}
";
    assert_clean(&format!(
        "{}{}int n = norm({{:x = 2, :y = 1.0}})\nPoint q = origin()\nq = {{:y = 2.0}}\n",
        point, functions
    ));
    assert_eq!(
        errors(&format!("{}{}int n = norm({{:z = 2}})\n", point, functions)),
        vec![DiagnosticKind::UnknownHashField {
            ty: "Point".to_string(),
            field: "z".to_string()
        }]
    );
    assert_eq!(
        errors(&format!("{}Point q = {{:y = 1.0}}\nq = {{:x = 1}}\n", point)),
        vec![DiagnosticKind::MissingHashField {
            ty: "Point".to_string(),
            field: "y".to_string()
        }]
    );

    assert_eq!(
        errors("class A:\n    int x = 1\nA a = {:x = \"s\"}\n"),
        vec![DiagnosticKind::InvalidAssignment {
            target: "A".to_string(),
            value: "hash".to_string()
        }]
    );

    assert_eq!(
        errors("class A:\n    int x = 1\nA a = {:x = 2}\n"),
        vec![DiagnosticKind::InvalidAssignment {
            target: "A".to_string(),
            value: "hash".to_string()
        }]
    );
}

#[test]
fn test_returns() {
    assert_eq!(
        errors("void f():\n    ret 1\n"),
        vec![DiagnosticKind::InvalidReturn {
            found: "int".to_string(),
            expected: "void".to_string()
        }]
    );

    assert_eq!(
        errors("int g():\n    ret\n"),
        vec![DiagnosticKind::MissingReturnValue {
            expected: "int".to_string()
        }]
    );

    assert_eq!(
        warnings("float h():\n    ret 1\n"),
        vec![DiagnosticKind::ImplicitCastInReturn {
            from: "int".to_string(),
            to: "float".to_string()
        }]
    );

    assert_clean("int k(bool b):\n    if b:\n        ret 1\n    ret 2\n");
}

#[test]
fn test_ternary() {
    assert_clean("int n = true ? 1 : 2\n");
    assert!(matches!(
        errors("int m = true ? 1 : \"a\"\n").as_slice(),
        [DiagnosticKind::TernaryBranchMismatch { .. }]
    ));
}

#[test]
fn test_imports_and_exports() {
    assert_clean("import math\nint x = math.floor(1)\nexport x\n");

    assert_eq!(
        errors("export foo\n"),
        vec![DiagnosticKind::UndefinedExport {
            name: "foo".to_string()
        }]
    );

    let program = parse_program("from util import log as write, read\n");
    let module = type_check(&program).expect("type check");
    let imports = module
        .imports
        .iter()
        .map(|import| (import.name, import.path.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(imports, vec![("write", "util.log"), ("read", "util.read")]);
}

#[test]
fn test_scope_tree_levels() {
    let source = "\
int f(int a):
    if a > 0:
        ret 1
    ret 0
list[int] ys = [y for int y in [1]]
";
    let program = parse_program(source);
    let module = type_check(&program).expect("type check");

    let root = module.scope(Module::ROOT);
    assert_eq!(root.kind, ScopeKind::Module);
    assert_eq!(root.children.len(), 2);

    let kinds = root
        .children
        .iter()
        .map(|child| module.scope(*child).kind)
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec![ScopeKind::Function, ScopeKind::Comprehension]);

    assert_eq!(module.levels.len(), 3);
    assert_eq!(module.scope(root.children[0]).returns.len(), 2);
    assert!(module.diagnostics.is_empty());
}

#[test]
fn test_name_resolution_is_memoized() {
    let program = parse_program("map[string, list[int]] table = {}\n");
    let mut module = type_check(&program).expect("type check");
    let position = Position::new(5, 1, Rc::new("test.lufa".to_string()));

    let first = module
        .resolve_name(Module::ROOT, "table", &position)
        .expect("no internal error");
    let second = module
        .resolve_name(Module::ROOT, "table", &position)
        .expect("no internal error");

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(module.types.name(first.expect("resolved")), "map[string,list[int]]");
}

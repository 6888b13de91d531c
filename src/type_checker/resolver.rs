//! Name and expression type resolution.
//!
//! Every resolution step returns a [`Resolution`]. Failures are reported
//! as a [`Signal`]: `Expression` and `Name` mean a diagnostic was recorded
//! and the current obligation should stop, `Internal` is a checker bug.
//! [`contain`] is the boundary that turns the first two into `None` so one
//! broken obligation never hides the diagnostics of the next.

use std::collections::HashMap;

use crate::{
    ast::{
        ast::Expr,
        expressions::{
            AssignmentExpr, BinaryExpr, BinaryOp, CallExpr, CastExpr, ComprehensionExpr,
            HashDeclarationExpr, IndexExpr, ListExpr, Literal, MapExpr, MemberExpr, RangeExpr,
            SelfMemberExpr, TernaryExpr, UnaryExpr, UnaryOp,
        },
        statements::{ClassDecl, ForHeader, FunctionDecl, LoopIndex, ReturnStmt, VariableDecl},
        types::{BuiltinType, TypeDescriptor, TypeKind},
    },
    Position,
};

use super::{
    diagnostics::{DiagnosticKind, Diagnostics},
    operators::{binary_result, is_explicit_cast, is_implicit_cast, unary_result, Operand},
    scope::{DefaultValue, Definition, Scope, ScopeHeader, ScopeId, ScopeKind},
    type_cache::{FunctionSignature, TypeCache, TypeError, TypeId},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A type, arity or constness violation was recorded
    Expression,
    /// An undefined name was recorded
    Name,
    Internal(TypeError),
}

impl From<TypeError> for Signal {
    fn from(error: TypeError) -> Self {
        Signal::Internal(error)
    }
}

pub type Resolution = Result<TypeId, Signal>;

/// Stops a failed obligation without stopping its siblings.
pub fn contain<T>(result: Result<T, Signal>) -> Result<Option<T>, TypeError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Signal::Expression | Signal::Name) => Ok(None),
        Err(Signal::Internal(error)) => Err(error),
    }
}

/// Where a value flows, selects the diagnostics of an incompatible type.
#[derive(Debug, Clone, Copy)]
enum Flow {
    Assignment,
    Argument(usize),
    Return,
}

pub struct Resolver<'m, 'ast> {
    scopes: &'m [Scope<'ast>],
    comprehensions: &'m HashMap<usize, ScopeId>,
    types: &'m mut TypeCache,
    diagnostics: &'m mut Diagnostics,
    memo: &'m mut HashMap<(ScopeId, &'ast str), TypeId>,
}

impl<'m, 'ast> Resolver<'m, 'ast> {
    pub fn new(
        scopes: &'m [Scope<'ast>],
        comprehensions: &'m HashMap<usize, ScopeId>,
        types: &'m mut TypeCache,
        diagnostics: &'m mut Diagnostics,
        memo: &'m mut HashMap<(ScopeId, &'ast str), TypeId>,
    ) -> Self {
        Resolver {
            scopes,
            comprehensions,
            types,
            diagnostics,
            memo,
        }
    }

    fn scope(&self, id: ScopeId) -> &'m Scope<'ast> {
        let scopes: &'m [Scope<'ast>] = self.scopes;
        &scopes[id.0]
    }

    fn error(&mut self, kind: DiagnosticKind, position: &Position) -> Signal {
        self.diagnostics.error(kind, position);
        Signal::Expression
    }

    fn name(&self, ty: TypeId) -> String {
        self.types.name(ty)
    }

    fn builtin(&mut self, builtin: BuiltinType) -> TypeId {
        self.types.builtin(builtin)
    }

    /// Checks every deferred obligation of one scope.
    pub fn validate_scope(&mut self, id: ScopeId) -> Result<(), TypeError> {
        let scope = self.scope(id);
        tracing::trace!(scope = id.0, kind = ?scope.kind, level = scope.level, "validating scope");

        match scope.header {
            ScopeHeader::Class(decl) => {
                contain(self.validate_base_class(id, decl))?;
            }
            ScopeHeader::For(header) => {
                if let Some(parent) = scope.parent {
                    contain(self.validate_iteration(parent, id, header))?;
                }
            }
            _ => {}
        }

        for default in &scope.defaults {
            contain(self.validate_default(id, *default))?;
        }

        for expression in &scope.expressions {
            contain(self.resolve_expr(id, expression))?;
        }

        for condition in &scope.conditions {
            contain(self.validate_condition(id, condition))?;
        }

        for (origin, ret) in &scope.returns {
            contain(self.validate_return(id, *origin, ret))?;
        }

        Ok(())
    }

    pub fn resolve_expression(
        &mut self,
        scope: ScopeId,
        expr: &Expr,
    ) -> Result<Option<TypeId>, TypeError> {
        let resolution = self.resolve_expr(scope, expr);
        contain(resolution)
    }

    fn find_definition(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, Definition<'ast>)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let candidate = self.scope(id);
            if let Some(definition) = candidate.defines.get(name) {
                return Some((id, definition));
            }
            current = candidate.parent;
        }
        None
    }

    /// Looks a name up through the enclosing scopes. A name may not be used
    /// before its definition unless a function or class boundary lies in
    /// between.
    pub fn resolve_name(&mut self, scope: ScopeId, name: &str, position: &Position) -> Resolution {
        let mut current = Some(scope);
        let mut crossed_boundary = false;

        while let Some(id) = current {
            let candidate = self.scope(id);

            if let Some(definition) = candidate.defines.get(name) {
                let defined = definition.position();
                if !crossed_boundary
                    && candidate.kind != ScopeKind::Comprehension
                    && (position.line, position.col) < (defined.line, defined.col)
                {
                    return Err(self.error(
                        DiagnosticKind::ReferenceBeforeDefinition {
                            name: name.to_string(),
                            line: defined.line,
                            col: defined.col,
                        },
                        position,
                    ));
                }

                return self.definition_type(id, definition);
            }

            crossed_boundary |= matches!(candidate.kind, ScopeKind::Function | ScopeKind::Class);
            current = candidate.parent;
        }

        self.diagnostics.error(
            DiagnosticKind::UndefinedName {
                name: name.to_string(),
            },
            position,
        );
        Err(Signal::Name)
    }

    /// The declared type of a definition, memoized per defining scope.
    fn definition_type(&mut self, scope: ScopeId, definition: Definition<'ast>) -> Resolution {
        let key = (scope, definition.name());
        if let Some(ty) = self.memo.get(&key) {
            return Ok(*ty);
        }

        let ty = match definition {
            Definition::Variable(decl) => self.resolve_descriptor(scope, &decl.ty)?,
            Definition::Parameter(param) => {
                let ty = self.resolve_descriptor(scope, &param.ty)?;
                if param.is_variadic {
                    self.types.list_of(ty)
                } else {
                    ty
                }
            }
            Definition::Function(decl) => self.function_type(scope, decl)?,
            Definition::Class { decl, .. } => self.types.user_type(&decl.name),
            Definition::HashType(decl) => self.types.user_type(&decl.name),
            // Types of other modules are unknown here, skip without a diagnostic
            Definition::Import(_) => return Err(Signal::Expression),
        };

        self.memo.insert(key, ty);
        Ok(ty)
    }

    fn function_type(&mut self, scope: ScopeId, decl: &FunctionDecl) -> Resolution {
        let returns = self.resolve_descriptor(scope, &decl.return_type)?;
        let params = decl
            .params
            .iter()
            .map(|param| self.resolve_descriptor(scope, &param.ty))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self
            .types
            .function_of(returns, params, decl.required_params, decl.is_variadic()))
    }

    /// Like [`TypeCache::from_descriptor`], but user type names must refer to
    /// a visible class or hash type.
    pub fn resolve_descriptor(&mut self, scope: ScopeId, descriptor: &TypeDescriptor) -> Resolution {
        self.check_named_types(scope, descriptor)?;
        Ok(self.types.from_descriptor(descriptor)?)
    }

    fn check_named_types(&mut self, scope: ScopeId, descriptor: &TypeDescriptor) -> Result<(), Signal> {
        match &descriptor.kind {
            TypeKind::Named(name) => match self.find_definition(scope, name) {
                Some((_, Definition::Class { .. } | Definition::HashType(_))) => Ok(()),
                Some((_, Definition::Import(_))) => Err(Signal::Expression),
                _ => Err(self.error(
                    DiagnosticKind::UnknownType { name: name.clone() },
                    &descriptor.position,
                )),
            },
            TypeKind::Builtin { sub, .. } => sub
                .iter()
                .try_for_each(|sub| self.check_named_types(scope, sub)),
            TypeKind::Function {
                returns, params, ..
            } => {
                self.check_named_types(scope, returns)?;
                params
                    .iter()
                    .try_for_each(|param| self.check_named_types(scope, param))
            }
        }
    }

    pub fn resolve_expr(&mut self, scope: ScopeId, expr: &Expr) -> Resolution {
        match expr {
            Expr::Literal(literal) => Ok(match literal.value {
                Literal::Integer(_) => self.builtin(BuiltinType::Int),
                Literal::Float(_) => self.builtin(BuiltinType::Float),
                Literal::String(_) => self.builtin(BuiltinType::String),
                Literal::Bool(_) => self.builtin(BuiltinType::Bool),
                Literal::Null => self.types.null(),
            }),
            Expr::Name(name) => self.resolve_name(scope, &name.name, &name.position),
            Expr::SelfMember(member) => self.resolve_self_member(scope, member),
            Expr::Unary(unary) => self.resolve_unary(scope, unary),
            Expr::Binary(binary) => self.resolve_binary(scope, binary),
            Expr::Is(is) => {
                self.resolve_expr(scope, &is.value)?;
                self.resolve_descriptor(scope, &is.ty)?;
                Ok(self.builtin(BuiltinType::Bool))
            }
            Expr::Ternary(ternary) => self.resolve_ternary(scope, ternary),
            Expr::Assignment(assignment) => self.resolve_assignment(scope, assignment),
            Expr::Call(call) => self.resolve_call(scope, call),
            Expr::Member(member) => self.resolve_member(scope, member),
            Expr::Index(index) => self.resolve_index(scope, index),
            Expr::Range(range) => self.resolve_range(scope, range),
            Expr::List(list) => self.resolve_list(scope, list),
            Expr::Map(map) => self.resolve_map(scope, map),
            Expr::HashValue(hash) => {
                for field in &hash.fields {
                    self.resolve_expr(scope, &field.value)?;
                }
                Ok(self.builtin(BuiltinType::Hash))
            }
            Expr::HashDeclaration(hash) => {
                for field in &hash.fields {
                    self.validate_variable_default(scope, field)?;
                }
                Ok(self.builtin(BuiltinType::Hash))
            }
            Expr::Comprehension(comprehension) => self.resolve_comprehension(scope, comprehension),
            Expr::Cast(cast) => self.resolve_cast(scope, cast),
        }
    }

    fn resolve_self_member(&mut self, scope: ScopeId, member: &SelfMemberExpr) -> Resolution {
        let class = self.scope(scope).member_scope.map(|id| (id, self.scope(id).header));

        let Some((class_scope, ScopeHeader::Class(decl))) = class else {
            return Err(self.error(
                DiagnosticKind::SelfMemberOutsideClass {
                    name: member.name.clone(),
                },
                &member.position,
            ));
        };

        match self.find_class_member(class_scope, decl, &member.name) {
            Some((owner, definition)) => self.definition_type(owner, definition),
            None => Err(self.error(
                DiagnosticKind::UnknownMember {
                    ty: decl.name.clone(),
                    property: member.name.clone(),
                },
                &member.position,
            )),
        }
    }

    /// Searches a class and then its base classes.
    fn find_class_member(
        &self,
        class_scope: ScopeId,
        decl: &'ast ClassDecl,
        property: &str,
    ) -> Option<(ScopeId, Definition<'ast>)> {
        let mut visited = vec![];
        let mut current = (class_scope, decl);

        loop {
            let (scope, decl) = current;
            if let Some(definition) = self.scope(scope).defines.get(property) {
                return Some((scope, definition));
            }
            visited.push(scope);

            let base = decl.base.as_ref()?;
            let parent = self.scope(scope).parent?;
            match self.find_definition(parent, &base.name) {
                Some((_, Definition::Class { decl, scope })) if !visited.contains(&scope) => {
                    current = (scope, decl);
                }
                _ => return None,
            }
        }
    }

    fn validate_base_class(&mut self, scope: ScopeId, decl: &ClassDecl) -> Result<(), Signal> {
        let (Some(base), Some(parent)) = (&decl.base, self.scope(scope).parent) else {
            return Ok(());
        };

        match self.find_definition(parent, &base.name) {
            Some((_, Definition::Class { .. })) => Ok(()),
            Some((_, Definition::Import(_))) => Err(Signal::Expression),
            Some(_) => Err(self.error(
                DiagnosticKind::InvalidBaseClass {
                    name: base.name.clone(),
                },
                &base.position,
            )),
            None => {
                self.diagnostics.error(
                    DiagnosticKind::UndefinedName {
                        name: base.name.clone(),
                    },
                    &base.position,
                );
                Err(Signal::Name)
            }
        }
    }

    fn resolve_member(&mut self, scope: ScopeId, member: &MemberExpr) -> Resolution {
        let object = self.resolve_expr(scope, &member.object)?;
        if let Some(ty) = self.types.member(object, &member.property) {
            return Ok(ty);
        }

        if let Some(name) = self.types.get(object).user.clone() {
            match self.find_definition(scope, &name) {
                Some((_, Definition::Class { decl, scope: class_scope })) => {
                    if let Some((owner, definition)) =
                        self.find_class_member(class_scope, decl, &member.property)
                    {
                        return self.definition_type(owner, definition);
                    }
                }
                Some((defining_scope, Definition::HashType(decl))) => {
                    if let Some(Expr::HashDeclaration(hash)) = &decl.value {
                        if let Some(field) =
                            hash.fields.iter().find(|field| field.name == member.property)
                        {
                            return self.resolve_descriptor(defining_scope, &field.ty);
                        }
                    }
                }
                _ => {}
            }
        }

        Err(self.error(
            DiagnosticKind::UnknownMember {
                ty: self.name(object),
                property: member.property.clone(),
            },
            &member.position,
        ))
    }

    fn resolve_unary(&mut self, scope: ScopeId, unary: &UnaryExpr) -> Resolution {
        match unary.op {
            UnaryOp::New => return self.resolve_new(scope, unary),
            UnaryOp::Delete => {
                self.resolve_expr(scope, &unary.operand)?;
                return Ok(self.builtin(BuiltinType::Void));
            }
            _ => {}
        }

        let operand = self.resolve_expr(scope, &unary.operand)?;

        if unary.op == UnaryOp::Spread {
            return if self.types.get(operand).is_list() {
                Ok(operand)
            } else {
                Err(self.error(
                    DiagnosticKind::InvalidUnary {
                        op: unary.op.symbol(),
                        operand: self.name(operand),
                    },
                    &unary.position,
                ))
            };
        }

        let result = self
            .types
            .scalar(operand)
            .and_then(|builtin| unary_result(unary.op, builtin));

        let Some(result) = result else {
            return Err(self.error(
                DiagnosticKind::InvalidUnary {
                    op: unary.op.symbol(),
                    operand: self.name(operand),
                },
                &unary.position,
            ));
        };

        if unary.op.has_side_effect() && self.types.get(operand).is_const {
            self.diagnostics.error(
                DiagnosticKind::ConstModification {
                    op: unary.op.symbol(),
                    ty: self.name(operand),
                },
                &unary.position,
            );
        }

        Ok(self.builtin(result))
    }

    /// `new Name(args)` checks the arguments against the constructor.
    fn resolve_new(&mut self, scope: ScopeId, unary: &UnaryExpr) -> Resolution {
        let (name, arguments) = match unary.operand.as_ref() {
            Expr::Call(call) => match call.callee.as_ref() {
                Expr::Name(name) => (name, call.arguments.as_slice()),
                callee => {
                    return Err(self.error(
                        DiagnosticKind::InvalidNew {
                            name: callee.kind_name().to_string(),
                        },
                        callee.position(),
                    ))
                }
            },
            Expr::Name(name) => (name, &[][..]),
            operand => {
                return Err(self.error(
                    DiagnosticKind::InvalidNew {
                        name: operand.kind_name().to_string(),
                    },
                    operand.position(),
                ))
            }
        };

        match self.find_definition(scope, &name.name) {
            Some((_, Definition::Class { decl, scope: class_scope })) => {
                let instance = self.types.user_type(&decl.name);
                let signature = match &decl.constructor {
                    Some(constructor) => self.function_type(class_scope, constructor)?,
                    None => self.types.function_of(instance, vec![], 0, false),
                };

                if let Some(signature) = self.types.get(signature).function.clone() {
                    self.check_arguments(scope, &name.name, &signature, arguments, &unary.position)?;
                }

                Ok(instance)
            }
            Some((_, Definition::Import(_))) => Err(Signal::Expression),
            Some(_) => Err(self.error(
                DiagnosticKind::InvalidNew {
                    name: name.name.clone(),
                },
                &name.position,
            )),
            None => {
                self.diagnostics.error(
                    DiagnosticKind::UndefinedName {
                        name: name.name.clone(),
                    },
                    &name.position,
                );
                Err(Signal::Name)
            }
        }
    }

    fn resolve_binary(&mut self, scope: ScopeId, binary: &BinaryExpr) -> Resolution {
        let left = self.resolve_expr(scope, &binary.left)?;
        let right = self.resolve_expr(scope, &binary.right)?;

        match binary.op {
            BinaryOp::In => return self.check_membership(binary.op, left, right, &binary.position),
            BinaryOp::Has => return self.check_membership(binary.op, right, left, &binary.position),
            BinaryOp::Equal | BinaryOp::NotEqual
                if self.types.compare(left, Some(right))
                    || self.is_null_comparison(left, right) =>
            {
                return Ok(self.builtin(BuiltinType::Bool));
            }
            _ => {}
        }

        let result = match (self.types.scalar(left), self.types.scalar(right)) {
            (Some(l), Some(r)) => binary_result(binary.op, l, r),
            _ => None,
        };

        match result {
            Some(result) => Ok(self.operand_type(result)),
            None => Err(self.error(
                DiagnosticKind::InvalidBinary {
                    op: binary.op.symbol(),
                    left: self.name(left),
                    right: self.name(right),
                },
                &binary.position,
            )),
        }
    }

    fn operand_type(&mut self, operand: Operand) -> TypeId {
        match operand {
            Operand::Scalar(builtin) => self.builtin(builtin),
            Operand::ListOf(builtin) => {
                let item = self.builtin(builtin);
                self.types.list_of(item)
            }
        }
    }

    fn is_null_comparison(&self, left: TypeId, right: TypeId) -> bool {
        let (left, right) = (self.types.get(left), self.types.get(right));
        (left.is_null() && right.is_reference()) || (right.is_null() && left.is_reference())
    }

    /// `item in container` and `container has item`.
    fn check_membership(
        &mut self,
        op: BinaryOp,
        item: TypeId,
        container: TypeId,
        position: &Position,
    ) -> Resolution {
        let identifier = self.types.get(container);
        let (is_container, expected) = (
            identifier.is_list() || identifier.is_map(),
            identifier.sub.first().copied(),
        );

        if !is_container {
            return Err(self.error(
                DiagnosticKind::InvalidContainer {
                    op: op.symbol(),
                    found: self.name(container),
                },
                position,
            ));
        }

        if let Some(expected) = expected {
            if !self.types.compare(expected, Some(item)) {
                return Err(self.error(
                    DiagnosticKind::InvalidContainerItem {
                        op: op.symbol(),
                        found: self.name(item),
                        expected: self.name(expected),
                    },
                    position,
                ));
            }
        }

        Ok(self.builtin(BuiltinType::Bool))
    }

    fn resolve_ternary(&mut self, scope: ScopeId, ternary: &TernaryExpr) -> Resolution {
        self.validate_condition(scope, &ternary.condition)?;
        let then = self.resolve_expr(scope, &ternary.then_branch)?;
        let otherwise = self.resolve_expr(scope, &ternary.else_branch)?;

        if self.types.compare(then, Some(otherwise)) {
            return Ok(then);
        }

        let (then_id, otherwise_id) = (self.types.get(then), self.types.get(otherwise));
        if then_id.is_null() && otherwise_id.is_reference() {
            return Ok(otherwise);
        }
        if otherwise_id.is_null() && then_id.is_reference() {
            return Ok(then);
        }

        Err(self.error(
            DiagnosticKind::TernaryBranchMismatch {
                then: self.name(then),
                otherwise: self.name(otherwise),
            },
            &ternary.position,
        ))
    }

    /// Conditions must be `bool`, an implicit cast is only a warning.
    pub fn validate_condition(&mut self, scope: ScopeId, condition: &Expr) -> Result<(), Signal> {
        let ty = self.resolve_expr(scope, condition)?;
        let boolean = self.builtin(BuiltinType::Bool);

        if self.types.compare(boolean, Some(ty)) {
            return Ok(());
        }

        if self
            .types
            .scalar(ty)
            .is_some_and(|from| is_implicit_cast(from, BuiltinType::Bool))
        {
            self.diagnostics.warning(
                DiagnosticKind::ImplicitCastInCondition {
                    from: self.name(ty),
                    to: self.name(boolean),
                },
                condition.position(),
            );
            return Ok(());
        }

        Err(self.error(
            DiagnosticKind::InvalidCondition {
                found: self.name(ty),
            },
            condition.position(),
        ))
    }

    fn resolve_assignment(&mut self, scope: ScopeId, assignment: &AssignmentExpr) -> Resolution {
        let target = self.resolve_expr(scope, &assignment.target)?;
        let mut value = self.resolve_value(scope, target, &assignment.value)?;

        if let Some(name) = self_assigned_name(&assignment.target, &assignment.value) {
            self.diagnostics.warning(
                DiagnosticKind::SelfAssignment {
                    name: name.to_string(),
                },
                &assignment.position,
            );
        }

        if self.types.get(target).is_const {
            self.diagnostics.error(
                DiagnosticKind::ConstAssignment {
                    ty: self.name(target),
                },
                &assignment.position,
            );
        }

        if let Some(op) = assignment.operator {
            let result = match (self.types.scalar(target), self.types.scalar(value)) {
                (Some(l), Some(r)) => binary_result(op, l, r),
                _ => None,
            };

            value = match result {
                Some(result) => self.operand_type(result),
                None => {
                    return Err(self.error(
                        DiagnosticKind::InvalidBinary {
                            op: op.symbol(),
                            left: self.name(target),
                            right: self.name(value),
                        },
                        &assignment.position,
                    ))
                }
            };
        }

        self.check_flow(target, value, Flow::Assignment, &assignment.position)?;
        Ok(target)
    }

    fn is_assignable(&self, target: TypeId, value: TypeId) -> bool {
        if self.types.compare(target, Some(value)) {
            return true;
        }

        let (target, value) = (self.types.get(target), self.types.get(value));
        (value.is_empty_container() && value.builtin == target.builtin)
            || (value.is_null() && target.is_reference())
    }

    /// Resolves a value about to flow into `target`. A `{:field = value}`
    /// literal flowing into a declared hash type is checked field by field
    /// and takes the hash type. Anything else resolves as usual and is left
    /// to [`Self::check_flow`].
    fn resolve_value(&mut self, scope: ScopeId, target: TypeId, value: &Expr) -> Resolution {
        let Expr::HashValue(hash) = value else {
            return self.resolve_expr(scope, value);
        };
        let Some((defining_scope, ty, declaration)) = self.hash_declaration(scope, target) else {
            return self.resolve_expr(scope, value);
        };

        for field in &hash.fields {
            let Some(declared) = declaration.fields.iter().find(|d| d.name == field.name) else {
                return Err(self.error(
                    DiagnosticKind::UnknownHashField {
                        ty,
                        field: field.name.clone(),
                    },
                    &field.position,
                ));
            };

            let expected = self.resolve_descriptor(defining_scope, &declared.ty)?;
            let found = self.resolve_value(scope, expected, &field.value)?;
            self.check_flow(expected, found, Flow::Assignment, &field.position)?;
        }

        let missing = declaration.fields.iter().find(|declared| {
            declared.value.is_none() && !hash.fields.iter().any(|f| f.name == declared.name)
        });
        if let Some(missing) = missing {
            return Err(self.error(
                DiagnosticKind::MissingHashField {
                    ty,
                    field: missing.name.clone(),
                },
                &hash.position,
            ));
        }

        Ok(target)
    }

    /// The `hash Name = {...}` declaration behind a user type, if it is one.
    fn hash_declaration(
        &self,
        scope: ScopeId,
        target: TypeId,
    ) -> Option<(ScopeId, String, &'ast HashDeclarationExpr)> {
        let name = self.types.get(target).user.clone()?;
        match self.find_definition(scope, &name)? {
            (defining_scope, Definition::HashType(decl)) => match &decl.value {
                Some(Expr::HashDeclaration(declaration)) => Some((defining_scope, name, declaration)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Checks that a value of type `value` may flow into `target`. Implicit
    /// casts are warned about and accepted.
    fn check_flow(
        &mut self,
        target: TypeId,
        value: TypeId,
        flow: Flow,
        position: &Position,
    ) -> Result<(), Signal> {
        if self.is_assignable(target, value) {
            return Ok(());
        }

        let implicit = match (self.types.scalar(value), self.types.scalar(target)) {
            (Some(from), Some(to)) => is_implicit_cast(from, to),
            _ => false,
        };

        let (from, to) = (self.name(value), self.name(target));

        if implicit {
            let warning = match flow {
                Flow::Assignment => DiagnosticKind::ImplicitCastInAssignment { from, to },
                Flow::Argument(index) => DiagnosticKind::ImplicitCastInArgument { index, from, to },
                Flow::Return => DiagnosticKind::ImplicitCastInReturn { from, to },
            };
            self.diagnostics.warning(warning, position);
            return Ok(());
        }

        match flow {
            Flow::Assignment => Err(self.error(
                DiagnosticKind::InvalidAssignment {
                    target: to,
                    value: from,
                },
                position,
            )),
            // Recorded without aborting, the call still has its return type
            Flow::Argument(index) => {
                self.diagnostics.error(
                    DiagnosticKind::ArgumentMismatch {
                        index,
                        found: from,
                        expected: to,
                    },
                    position,
                );
                Ok(())
            }
            Flow::Return => Err(self.error(
                DiagnosticKind::InvalidReturn {
                    found: from,
                    expected: to,
                },
                position,
            )),
        }
    }

    fn resolve_call(&mut self, scope: ScopeId, call: &CallExpr) -> Resolution {
        let callee = self.resolve_expr(scope, &call.callee)?;

        let Some(signature) = self.types.get(callee).function.clone() else {
            return Err(self.error(
                DiagnosticKind::NotCallable {
                    ty: self.name(callee),
                },
                &call.position,
            ));
        };

        let name = callee_name(&call.callee);
        self.check_arguments(scope, &name, &signature, &call.arguments, &call.position)?;
        Ok(signature.returns)
    }

    /// Count mismatches and argument type mismatches are recorded without
    /// aborting the call.
    fn check_arguments(
        &mut self,
        scope: ScopeId,
        name: &str,
        signature: &FunctionSignature,
        arguments: &[Expr],
        position: &Position,
    ) -> Result<(), Signal> {
        let given = arguments.len();
        let max = signature.params.len();

        if given < signature.required {
            self.diagnostics.error(
                DiagnosticKind::TooFewArguments {
                    name: name.to_string(),
                    given,
                    required: signature.required,
                },
                position,
            );
        } else if !signature.variadic && given > max {
            self.diagnostics.error(
                DiagnosticKind::TooManyArguments {
                    name: name.to_string(),
                    given,
                    max,
                },
                arguments[max].position(),
            );
        }

        for (index, argument) in arguments.iter().enumerate() {
            let expected = match signature.params.get(index) {
                Some(param) => *param,
                None if signature.variadic => match signature.params.last() {
                    Some(param) => *param,
                    None => break,
                },
                None => break,
            };

            let value = self.resolve_value(scope, expected, argument)?;
            let is_spread = matches!(
                argument,
                Expr::Unary(UnaryExpr {
                    op: UnaryOp::Spread,
                    ..
                })
            );
            let expected = if is_spread {
                self.types.list_of(expected)
            } else {
                expected
            };

            self.check_flow(expected, value, Flow::Argument(index + 1), argument.position())?;
        }

        Ok(())
    }

    fn resolve_index(&mut self, scope: ScopeId, index: &IndexExpr) -> Resolution {
        let target = self.resolve_expr(scope, &index.target)?;
        let key = self.resolve_expr(scope, &index.index)?;
        let identifier = self.types.get(target).clone();

        if identifier.is_list() {
            let int = self.builtin(BuiltinType::Int);
            if !self.types.compare(int, Some(key)) {
                return Err(self.error(
                    DiagnosticKind::InvalidIndex {
                        container: "list",
                        expected: self.name(int),
                        found: self.name(key),
                    },
                    index.index.position(),
                ));
            }

            if let Some(item) = identifier.sub.first() {
                return Ok(*item);
            }
        }

        if let (true, [expected, value]) = (identifier.is_map(), identifier.sub.as_slice()) {
            if !self.types.compare(*expected, Some(key)) {
                return Err(self.error(
                    DiagnosticKind::InvalidIndex {
                        container: "map",
                        expected: self.name(*expected),
                        found: self.name(key),
                    },
                    index.index.position(),
                ));
            }
            return Ok(*value);
        }

        Err(self.error(
            DiagnosticKind::InvalidIndexTarget {
                found: self.name(target),
            },
            &index.position,
        ))
    }

    /// A slice of a list, or a reverse lookup of a key by value on a map.
    fn resolve_range(&mut self, scope: ScopeId, range: &RangeExpr) -> Resolution {
        let target = self.resolve_expr(scope, &range.target)?;
        let identifier = self.types.get(target).clone();

        if identifier.is_list() {
            let int = self.builtin(BuiltinType::Int);
            for (slot, name) in range.slots.iter().zip(["start", "end", "step"]) {
                let Some(slot) = slot else {
                    continue;
                };

                let ty = self.resolve_expr(scope, slot)?;
                if !self.types.compare(int, Some(ty)) {
                    return Err(self.error(
                        DiagnosticKind::InvalidRangeSlot {
                            slot: name,
                            expected: self.name(int),
                            found: self.name(ty),
                        },
                        slot.position(),
                    ));
                }
            }
            return Ok(target);
        }

        if let (true, [key, expected]) = (identifier.is_map(), identifier.sub.as_slice()) {
            let value = match range.slots.as_slice() {
                [None, Some(value)] | [None, Some(value), None] => value,
                _ => {
                    return Err(self.error(DiagnosticKind::InvalidReverseLookup, &range.position))
                }
            };

            let ty = self.resolve_expr(scope, value)?;
            if !self.types.compare(*expected, Some(ty)) {
                return Err(self.error(
                    DiagnosticKind::InvalidRangeSlot {
                        slot: "value",
                        expected: self.name(*expected),
                        found: self.name(ty),
                    },
                    value.position(),
                ));
            }
            return Ok(*key);
        }

        Err(self.error(
            DiagnosticKind::InvalidRangeTarget {
                found: self.name(target),
            },
            &range.position,
        ))
    }

    /// `list[T]` of the first item's type. Mismatching items are recorded
    /// without failing the list.
    fn resolve_list(&mut self, scope: ScopeId, list: &ListExpr) -> Resolution {
        let Some((first, rest)) = list.items.split_first() else {
            return Ok(self.builtin(BuiltinType::List));
        };

        let item = self.resolve_expr(scope, first)?;
        for (index, other) in rest.iter().enumerate() {
            let ty = self.resolve_expr(scope, other)?;
            if !self.types.compare(item, Some(ty)) {
                self.diagnostics.error(
                    DiagnosticKind::ListItemMismatch {
                        index: index + 1,
                        expected: self.name(item),
                    },
                    other.position(),
                );
            }
        }

        let item = self.types.strip_const(item);
        Ok(self.types.list_of(item))
    }

    fn resolve_map(&mut self, scope: ScopeId, map: &MapExpr) -> Resolution {
        let Some(((first_key, first_value), rest)) = map.entries.split_first() else {
            return Ok(self.builtin(BuiltinType::Map));
        };

        let key = self.resolve_expr(scope, first_key)?;
        let value = self.resolve_expr(scope, first_value)?;

        for (index, (other_key, other_value)) in rest.iter().enumerate() {
            for (slot, expected, expr) in [("Key", key, other_key), ("Value", value, other_value)] {
                let ty = self.resolve_expr(scope, expr)?;
                if !self.types.compare(expected, Some(ty)) {
                    self.diagnostics.error(
                        DiagnosticKind::MapEntryMismatch {
                            slot,
                            index: index + 1,
                            expected: self.name(expected),
                        },
                        expr.position(),
                    );
                }
            }
        }

        let key = self.types.strip_const(key);
        let value = self.types.strip_const(value);
        Ok(self.types.map_of(key, value))
    }

    fn resolve_comprehension(
        &mut self,
        scope: ScopeId,
        comprehension: &ComprehensionExpr,
    ) -> Resolution {
        let Some(inner) = self.comprehensions.get(&comprehension.id).copied() else {
            return Err(TypeError::MissingComprehensionScope {
                id: comprehension.id,
            }
            .into());
        };

        self.validate_iteration(scope, inner, &comprehension.header)?;

        if let Some(condition) = &comprehension.condition {
            self.validate_condition(inner, condition)?;
        }

        let (returns, else_returns) = (&comprehension.returns, &comprehension.else_returns);
        if !else_returns.is_empty() && else_returns.len() != returns.len() {
            return Err(self.error(
                DiagnosticKind::UnbalancedComprehension {
                    then: returns.len(),
                    otherwise: else_returns.len(),
                },
                &comprehension.position,
            ));
        }

        let then = self.resolve_all(inner, returns)?;
        let otherwise = self.resolve_all(inner, else_returns)?;

        for (then, otherwise) in then.iter().zip(&otherwise) {
            if !self.types.compare(*then, Some(*otherwise)) {
                return Err(self.error(
                    DiagnosticKind::ComprehensionBranchMismatch {
                        then: self.name(*then),
                        otherwise: self.name(*otherwise),
                    },
                    &comprehension.position,
                ));
            }
        }

        match then.as_slice() {
            [item] => {
                let item = self.types.strip_const(*item);
                Ok(self.types.list_of(item))
            }
            [key, value] => {
                let key = self.types.strip_const(*key);
                let value = self.types.strip_const(*value);
                Ok(self.types.map_of(key, value))
            }
            _ => Err(self.error(
                DiagnosticKind::InvalidComprehensionReturns { count: then.len() },
                &comprehension.position,
            )),
        }
    }

    fn resolve_all(&mut self, scope: ScopeId, exprs: &[Expr]) -> Result<Vec<TypeId>, Signal> {
        exprs
            .iter()
            .map(|expr| self.resolve_expr(scope, expr))
            .collect()
    }

    /// One index iterates a list, two iterate the keys and values of a map.
    /// The iterator belongs to `outer`, the indexes to `inner`.
    fn validate_iteration(
        &mut self,
        outer: ScopeId,
        inner: ScopeId,
        header: &ForHeader,
    ) -> Result<(), Signal> {
        let iterator = self.resolve_expr(outer, &header.iterator)?;
        let identifier = self.types.get(iterator).clone();

        let (container, slots, matches) = match header.indexes.len() {
            1 => ("list", &["item"][..], identifier.is_list()),
            2 => ("map", &["key", "value"][..], identifier.is_map()),
            count => {
                return Err(self.error(
                    DiagnosticKind::TooManyIndexes { count },
                    &header.position,
                ))
            }
        };

        if !matches {
            return Err(self.error(
                DiagnosticKind::InvalidIterator {
                    container,
                    found: self.name(iterator),
                },
                header.iterator.position(),
            ));
        }

        for ((index, expected), slot) in header.indexes.iter().zip(&identifier.sub).zip(slots) {
            let ty = match index {
                LoopIndex::Declared(decl) => self.resolve_descriptor(inner, &decl.ty)?,
                LoopIndex::Name(name) => self.resolve_name(inner, &name.name, &name.position)?,
            };

            if !self.types.compare(*expected, Some(ty)) {
                return Err(self.error(
                    DiagnosticKind::IncompatibleIterationIndex {
                        slot: *slot,
                        container,
                        found: self.name(ty),
                        expected: self.name(*expected),
                    },
                    index.position(),
                ));
            }
        }

        Ok(())
    }

    fn resolve_cast(&mut self, scope: ScopeId, cast: &CastExpr) -> Resolution {
        let value = self.resolve_expr(scope, &cast.value)?;

        if !matches!(cast.ty.kind, TypeKind::Builtin { .. }) {
            return Err(self.error(
                DiagnosticKind::UnsupportedCast {
                    to: cast.ty.to_string(),
                },
                &cast.position,
            ));
        }

        let target = self.resolve_descriptor(scope, &cast.ty)?;

        if self.types.compare(target, Some(value)) {
            self.diagnostics.warning(
                DiagnosticKind::UselessCast {
                    from: self.name(value),
                    to: self.name(target),
                },
                &cast.position,
            );
            return Ok(target);
        }

        let legal = match (self.types.scalar(value), self.types.scalar(target)) {
            (Some(from), Some(to)) => is_explicit_cast(from, to),
            _ => false,
        };

        if !legal {
            return Err(self.error(
                DiagnosticKind::InvalidCast {
                    from: self.name(value),
                    to: self.name(target),
                },
                &cast.position,
            ));
        }

        Ok(target)
    }

    fn validate_default(&mut self, scope: ScopeId, default: DefaultValue<'ast>) -> Result<(), Signal> {
        match default {
            DefaultValue::Variable(decl) => self.validate_variable_default(scope, decl),
            DefaultValue::Parameter(param) => {
                let Some(value) = &param.default else {
                    return Ok(());
                };

                let target = self.resolve_descriptor(scope, &param.ty)?;
                let ty = self.resolve_value(scope, target, value)?;
                self.check_flow(target, ty, Flow::Assignment, value.position())
            }
        }
    }

    /// Initializers are checked like assignments, minus the constness rule.
    fn validate_variable_default(&mut self, scope: ScopeId, decl: &VariableDecl) -> Result<(), Signal> {
        let Some(value) = &decl.value else {
            return Ok(());
        };

        let target = self.resolve_descriptor(scope, &decl.ty)?;
        let ty = self.resolve_value(scope, target, value)?;
        self.check_flow(target, ty, Flow::Assignment, &decl.position)
    }

    fn validate_return(
        &mut self,
        function: ScopeId,
        origin: ScopeId,
        ret: &ReturnStmt,
    ) -> Result<(), Signal> {
        let ScopeHeader::Function(decl) = self.scope(function).header else {
            return Ok(());
        };

        let expected = self.resolve_descriptor(function, &decl.return_type)?;
        let void = self.builtin(BuiltinType::Void);
        let returns_void = self.types.compare(void, Some(expected));

        match &ret.value {
            None if returns_void || decl.name == "new" => Ok(()),
            None => Err(self.error(
                DiagnosticKind::MissingReturnValue {
                    expected: self.name(expected),
                },
                &ret.position,
            )),
            Some(value) => {
                let found = self.resolve_value(origin, expected, value)?;
                if returns_void {
                    return Err(self.error(
                        DiagnosticKind::InvalidReturn {
                            found: self.name(found),
                            expected: self.name(expected),
                        },
                        value.position(),
                    ));
                }
                self.check_flow(expected, found, Flow::Return, value.position())
            }
        }
    }
}

/// `x = x` and `@x = @x`.
fn self_assigned_name<'a>(target: &'a Expr, value: &Expr) -> Option<&'a str> {
    match (target, value) {
        (Expr::Name(target), Expr::Name(value)) if target.name == value.name => Some(&target.name),
        (Expr::SelfMember(target), Expr::SelfMember(value)) if target.name == value.name => {
            Some(&target.name)
        }
        _ => None,
    }
}

fn callee_name(callee: &Expr) -> String {
    match callee {
        Expr::Name(name) => name.name.clone(),
        Expr::SelfMember(member) => format!("@{}", member.name),
        Expr::Member(member) => member.property.clone(),
        other => other.kind_name().to_lowercase(),
    }
}

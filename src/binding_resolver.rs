//! Compiles binding expressions into reactive-API call chains.
//!
//! ## Key Invariants
//!
//! 1. **Operands first**: an operand's temporaries are emitted before the statement that consumes it, left
//!    operand before right operand.
//! 2. **Direct before helper**: an operator is first looked up as an instance method on the left operand,
//!    every synonym in order, and only then as a static helper on `javafx.beans.binding.Bindings`.
//! 3. **Inlined leaves**: literals and variables never introduce temporaries.

use tracing::debug;

use crate::bind::BindExpression;
use crate::code::{CodeType, CodeValue, Literal, Statement};
use crate::error::{CompileError, Result};
use crate::introspect::{well_known, JavaType, MethodInfo, Primitive};
use crate::resolver::Resolvers;

/// Value of a compiled expression together with the statements that must run before it is read.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionResult {
    pub ty: JavaType,
    pub value: CodeValue,
    pub statements: Vec<Statement>,
}

impl ExpressionResult {
    fn inline(ty: JavaType, value: impl Into<CodeValue>) -> Self {
        ExpressionResult {
            ty,
            value: value.into(),
            statements: Vec::new(),
        }
    }
}

pub struct BindingResolver<'r> {
    resolvers: &'r mut Resolvers,
}

impl<'r> BindingResolver<'r> {
    pub fn new(resolvers: &'r mut Resolvers) -> Self {
        BindingResolver { resolvers }
    }

    pub fn resolve_expression(&mut self, expression: &BindExpression) -> Result<ExpressionResult> {
        match expression {
            BindExpression::Null => Ok(ExpressionResult::inline(JavaType::object(), Literal::Null)),
            BindExpression::Whole { value } => Ok(match i32::try_from(*value) {
                Ok(int) => ExpressionResult::inline(JavaType::primitive(Primitive::Int), Literal::Int(int)),
                Err(_) => ExpressionResult::inline(JavaType::primitive(Primitive::Long), Literal::Long(*value)),
            }),
            BindExpression::Fraction { value } => {
                if value.is_finite() && value.abs() <= f32::MAX as f64 {
                    Ok(ExpressionResult::inline(
                        JavaType::primitive(Primitive::Float),
                        Literal::Float(*value as f32),
                    ))
                } else {
                    Ok(ExpressionResult::inline(
                        JavaType::primitive(Primitive::Double),
                        Literal::Double(*value),
                    ))
                }
            }
            BindExpression::Boolean { value } => Ok(ExpressionResult::inline(
                JavaType::primitive(Primitive::Boolean),
                Literal::Bool(*value),
            )),
            BindExpression::Str { value } => Ok(ExpressionResult::inline(
                JavaType::string(),
                Literal::Str(value.clone()),
            )),
            BindExpression::Variable { name } => {
                let ty = self.resolvers.names.resolve_type_by_id(name)?;
                Ok(ExpressionResult::inline(ty, CodeValue::var(name.clone())))
            }
            BindExpression::PropertyRead { receiver, property } => self.property_read(receiver, property),
            BindExpression::MethodCall { receiver, method, args } => self.method_call(receiver, method, args),
            BindExpression::CollectionAccess { collection, key } => self.collection_access(collection, key),
            BindExpression::Negate { operand } => self.unary(operand, "negate"),
            BindExpression::Invert { operand } => self.unary(operand, "not"),
            BindExpression::Modulo { .. } => Err(CompileError::UnsupportedExpression(format!(
                "modulo is not supported in `{}`",
                expression
            ))),
            binary => match binary.as_binary() {
                Some((operator, left, right)) => self.binary(left, right, operator_methods(operator)),
                None => Err(CompileError::UnsupportedExpression(binary.to_string())),
            },
        }
    }

    fn property_read(&mut self, receiver: &BindExpression, property: &str) -> Result<ExpressionResult> {
        let receiver = self.resolve_expression(receiver)?;
        let accessor = self
            .resolvers
            .methods
            .resolve_property(&receiver.ty, property)?
            .ok_or_else(|| CompileError::unknown_property(property, &receiver.ty))?;
        let value = CodeValue::call(receiver.value, accessor.name.clone(), Vec::new());
        self.declare_temporary(receiver.statements, &accessor, value)
    }

    fn method_call(
        &mut self,
        receiver: &BindExpression,
        method: &str,
        args: &[BindExpression],
    ) -> Result<ExpressionResult> {
        let receiver = self.resolve_expression(receiver)?;
        let mut statements = receiver.statements;
        let mut arg_types = Vec::with_capacity(args.len());
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            let result = self.resolve_expression(arg)?;
            statements.extend(result.statements);
            arg_types.push(result.ty);
            arg_values.push(result.value);
        }

        if let Some(direct) = self.resolvers.methods.find_method(&receiver.ty, method, &arg_types) {
            let value = CodeValue::call(receiver.value, direct.name.clone(), arg_values);
            return self.declare_temporary(statements, &direct, value);
        }

        let mut helper_types = vec![receiver.ty.clone()];
        helper_types.extend(arg_types);
        let helper = self
            .find_bindings_helper(method, &helper_types)
            .ok_or_else(|| CompileError::unknown_member(format!("{}({})", method, join(&helper_types[1..])), &receiver.ty))?;
        let mut helper_args = vec![receiver.value];
        helper_args.extend(arg_values);
        let value = CodeValue::static_call(CodeType::class(well_known::BINDINGS), helper.name.clone(), helper_args);
        self.declare_temporary(statements, &helper, value)
    }

    fn collection_access(&mut self, collection: &BindExpression, key: &BindExpression) -> Result<ExpressionResult> {
        let collection = self.resolve_expression(collection)?;
        let key = self.resolve_expression(key)?;
        let mut statements = collection.statements;
        statements.extend(key.statements);

        let value_at = self
            .find_bindings_helper("valueAt", &[collection.ty.clone(), key.ty.clone()])
            .ok_or_else(|| CompileError::UnsupportedExpression(format!(
                "cannot index `{}` with `{}`",
                collection.ty, key.ty
            )))?;
        let value = CodeValue::static_call(
            CodeType::class(well_known::BINDINGS),
            value_at.name.clone(),
            vec![collection.value, key.value],
        );
        self.declare_temporary(statements, &value_at, value)
    }

    fn binary(
        &mut self,
        left: &BindExpression,
        right: &BindExpression,
        methods: &[&str],
    ) -> Result<ExpressionResult> {
        let left_result = self.resolve_expression(left)?;
        let right_result = self.resolve_expression(right)?;
        let mut statements = left_result.statements;
        statements.extend(right_result.statements);

        let direct = methods.iter().find_map(|name| {
            self.resolvers
                .methods
                .find_method(&left_result.ty, name, std::slice::from_ref(&right_result.ty))
        });
        if let Some(direct) = direct {
            let value = CodeValue::call(left_result.value, direct.name.clone(), vec![right_result.value]);
            return self.declare_temporary(statements, &direct, value);
        }

        let operand_types = [left_result.ty.clone(), right_result.ty.clone()];
        let helper = methods
            .iter()
            .find_map(|name| self.find_bindings_helper(name, &operand_types));
        match helper {
            Some(helper) => {
                let value = CodeValue::static_call(
                    CodeType::class(well_known::BINDINGS),
                    helper.name.clone(),
                    vec![left_result.value, right_result.value],
                );
                self.declare_temporary(statements, &helper, value)
            }
            None => Err(CompileError::UnsupportedExpression(format!(
                "cannot {} `{}` and `{}`",
                methods.join(" or "),
                left,
                right
            ))),
        }
    }

    fn unary(&mut self, operand: &BindExpression, method: &str) -> Result<ExpressionResult> {
        let result = self.resolve_expression(operand)?;

        if let Some(direct) = self.resolvers.methods.find_method(&result.ty, method, &[]) {
            let value = CodeValue::call(result.value, direct.name.clone(), Vec::new());
            return self.declare_temporary(result.statements, &direct, value);
        }

        match self.find_bindings_helper(method, std::slice::from_ref(&result.ty)) {
            Some(helper) => {
                let value = CodeValue::static_call(
                    CodeType::class(well_known::BINDINGS),
                    helper.name.clone(),
                    vec![result.value],
                );
                self.declare_temporary(result.statements, &helper, value)
            }
            None => Err(CompileError::UnsupportedExpression(format!("cannot {} `{}`", method, operand))),
        }
    }

    fn find_bindings_helper(&mut self, name: &str, args: &[JavaType]) -> Option<std::sync::Arc<MethodInfo>> {
        self.resolvers
            .methods
            .find_method(&JavaType::class(well_known::BINDINGS), name, args)
            .filter(|method| method.is_static)
    }

    /// `T tN = value;` appended to `statements`, typed by the method's generic return type.
    fn declare_temporary(
        &mut self,
        mut statements: Vec<Statement>,
        method: &MethodInfo,
        value: CodeValue,
    ) -> Result<ExpressionResult> {
        let ty = method.return_type.clone();
        let identifier = self.resolvers.names.resolve_unique_name(&ty)?;
        debug!(method = %method.name, temporary = %identifier, "binding step");
        statements.push(Statement::declare(CodeType::declarable(&ty), identifier.clone(), value));
        Ok(ExpressionResult {
            ty,
            value: CodeValue::var(identifier),
            statements,
        })
    }
}

/// Method names tried for a binary operator, in order.
fn operator_methods(operator: &str) -> &'static [&'static str] {
    match operator {
        "+" => &["add", "concat"],
        "-" => &["subtract"],
        "*" => &["multiply"],
        "/" => &["divide"],
        ">" => &["greaterThan"],
        ">=" => &["greaterThanOrEqualTo", "greaterThanOrEqual"],
        "<" => &["lessThan"],
        "<=" => &["lessThanOrEqualTo", "lessThanOrEqual"],
        "==" => &["isEqualTo", "equal"],
        "!=" => &["isNotEqualTo", "notEqual"],
        "&&" => &["and"],
        "||" => &["or"],
        _ => &[],
    }
}

fn join(types: &[JavaType]) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

//! Coercion of markup values into typed IR values.
//!
//! ## Key Invariants
//!
//! 1. **Coercion order**: string-compatible target, array, character, primitive or boxed, `valueOf`.
//! 2. **Java parse rules**: numeric text is parsed the way the boxed type's `parseX` would parse it, so
//!    nothing that would throw at run time is accepted at compile time.
//! 3. **Non-finite constants**: infinities and NaN become field accesses on the boxed type, never literals.

use crate::code::{ArrayValue, CodeType, CodeValue, Literal};
use crate::document::RESOURCES_NAME;
use crate::error::{CompileError, Result};
use crate::introspect::{JavaType, MethodInfo, Primitive};
use crate::markup::{Attribute, Value};
use crate::method_resolver::NamedArgValue;
use crate::resolver::Resolvers;

pub struct ValueResolver<'r> {
    resolvers: &'r mut Resolvers,
}

impl<'r> ValueResolver<'r> {
    pub fn new(resolvers: &'r mut Resolvers) -> Self {
        ValueResolver { resolvers }
    }

    /// Coerces a simple markup value. Nested elements are the node processor's business.
    pub fn resolve_value(&mut self, target: &JavaType, value: &Value) -> Result<CodeValue> {
        match value {
            Value::Empty => Ok(CodeValue::null()),
            Value::Literal(text) => self.coerce_literal(target, text),
            Value::Reference(id) => {
                let referenced = self.resolvers.names.resolve_type_by_id(id)?;
                if !self.resolvers.types.is_assignable_from(target, &referenced) {
                    return Err(CompileError::mismatch(target, referenced));
                }
                Ok(CodeValue::var(id.clone()))
            }
            Value::Resource(key) if self.resolvers.types.is_assignable_from(target, &JavaType::string()) => {
                Ok(CodeValue::call(
                    CodeValue::var(RESOURCES_NAME),
                    "getString",
                    vec![CodeValue::str(key.clone())],
                ))
            }
            Value::Resource(key) => Err(CompileError::Unsupported(format!(
                "resource `%{}` cannot produce `{}`",
                key, target
            ))),
            Value::Location(path) => Err(CompileError::Unsupported(format!(
                "location `@{}` resolution",
                path.display()
            ))),
            Value::Expression(expression) => Err(CompileError::Unsupported(format!(
                "expression `${{{}}}` where a concrete value is required",
                expression
            ))),
            other => Err(CompileError::Unsupported(format!(
                "cannot create `{}` from `{}`",
                target, other
            ))),
        }
    }

    /// Coerces literal text to `target`.
    pub fn coerce_literal(&mut self, target: &JavaType, text: &str) -> Result<CodeValue> {
        let types = self.resolvers.types.clone();
        let erased = types.erasure(target);

        if types.is_assignable_from(&erased, &JavaType::string()) {
            return Ok(CodeValue::str(text));
        }

        if let JavaType::Array { component } = &erased {
            let values = text
                .split(',')
                .map(|part| self.coerce_literal(component, part))
                .collect::<Result<Vec<_>>>()?;
            return Ok(CodeValue::Array(ArrayValue::Declared {
                component: CodeType::declarable(component),
                values,
            }));
        }

        if let Some(primitive) = types.as_primitive_or_boxed(&erased) {
            return parse_primitive(primitive, text);
        }

        if types.is_enum(&erased) {
            return self.enum_constant(&erased, text);
        }

        let value_of = self
            .resolvers
            .methods
            .find_method(&erased, "valueOf", &[JavaType::string()]);
        match value_of {
            Some(method) if method.is_static => self.coerce_with_factory(&erased, &method, text),
            _ => Err(CompileError::unparseable(text, target)),
        }
    }

    /// Applies a static single-`String` factory of `owner` to `text`.
    pub fn coerce_with_factory(&mut self, owner: &JavaType, method: &MethodInfo, text: &str) -> Result<CodeValue> {
        if !method.is_static {
            return Err(CompileError::Unsupported(format!(
                "`{}.{}` is not static",
                owner, method.name
            )));
        }
        if method.parameters.len() != 1 || self.resolvers.types.erasure(&method.parameters[0]) != JavaType::string() {
            return Err(CompileError::Unsupported(format!(
                "`{}.{}` does not take a single String",
                owner, method.name
            )));
        }

        let types = self.resolvers.types.clone();
        if let Some(primitive) = types.as_primitive_or_boxed(owner) {
            return parse_primitive(primitive, text);
        }
        if types.is_enum(owner) {
            return self.enum_constant(owner, text);
        }
        if text.trim().is_empty() {
            return Err(CompileError::unparseable(text, owner));
        }
        Ok(CodeValue::static_call(
            CodeType::from(&types.erasure(owner)),
            method.name.clone(),
            vec![CodeValue::str(text)],
        ))
    }

    fn enum_constant(&self, ty: &JavaType, text: &str) -> Result<CodeValue> {
        let known = self
            .resolvers
            .types
            .raw_class_name(ty)
            .and_then(|name| self.resolvers.types.class_info(&name))
            .map(|info| info.enum_constants.iter().any(|constant| constant == text))
            .unwrap_or(false);
        if !known {
            return Err(CompileError::unparseable(text, ty));
        }
        Ok(CodeValue::Enum {
            ty: CodeType::from(ty),
            constant: text.to_string(),
        })
    }

    /// Value used for a named constructor argument absent from the markup.
    pub fn coerce_default_value(&mut self, arg: &NamedArgValue) -> Result<CodeValue> {
        if arg.default_value.trim().is_empty() {
            return Ok(match arg.ty.as_primitive() {
                Some(primitive) => CodeValue::Literal(zero_value(primitive)),
                None => CodeValue::null(),
            });
        }
        self.coerce_literal(&arg.ty, &arg.default_value)
    }
}

/// Unwraps a value that must come from exactly one source.
pub fn extract_single_value(value: &Value) -> Result<&Value> {
    match value {
        Value::Multi(values) if values.len() == 1 => extract_single_value(&values[0]),
        Value::Multi(_) => Err(CompileError::Unsupported(
            "value assembled from multiple sources".to_string(),
        )),
        Value::Property(element) => extract_single_value(&element.value),
        Value::Attribute(attribute) => match attribute.as_ref() {
            Attribute::Instance { value, .. } => extract_single_value(value),
            other => Err(CompileError::Unsupported(format!(
                "value taken from non property attribute `{}`",
                other
            ))),
        },
        other => Ok(other),
    }
}

pub fn zero_value(primitive: Primitive) -> Literal {
    match primitive {
        Primitive::Boolean => Literal::Bool(false),
        Primitive::Byte => Literal::Byte(0),
        Primitive::Short => Literal::Short(0),
        Primitive::Int => Literal::Int(0),
        Primitive::Long => Literal::Long(0),
        Primitive::Float => Literal::Float(0.0),
        Primitive::Double => Literal::Double(0.0),
        Primitive::Char => Literal::Char('\u{0}'),
        Primitive::Void => Literal::Null,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRIMITIVE PARSING
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_primitive(primitive: Primitive, text: &str) -> Result<CodeValue> {
    let unparseable = || CompileError::unparseable(text, primitive.keyword());
    let literal = match primitive {
        Primitive::Boolean => Literal::Bool(text.eq_ignore_ascii_case("true")),
        Primitive::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Literal::Char(c),
                _ => return Err(unparseable()),
            }
        }
        Primitive::Byte => Literal::Byte(text.parse().map_err(|_| unparseable())?),
        Primitive::Short => Literal::Short(text.parse().map_err(|_| unparseable())?),
        Primitive::Int => Literal::Int(text.parse().map_err(|_| unparseable())?),
        Primitive::Long => Literal::Long(text.parse().map_err(|_| unparseable())?),
        Primitive::Float | Primitive::Double => return parse_floating(primitive, text),
        Primitive::Void => return Err(unparseable()),
    };
    Ok(CodeValue::Literal(literal))
}

fn parse_floating(primitive: Primitive, text: &str) -> Result<CodeValue> {
    let unparseable = || CompileError::unparseable(text, primitive.keyword());
    let trimmed = text.trim();
    let special = match trimmed {
        "Infinity" | "+Infinity" => Some("POSITIVE_INFINITY"),
        "-Infinity" => Some("NEGATIVE_INFINITY"),
        "NaN" | "+NaN" | "-NaN" => Some("NaN"),
        _ => None,
    };

    let number = trimmed
        .strip_suffix(['f', 'F', 'd', 'D'])
        .unwrap_or(trimmed);
    let well_formed = !number.is_empty()
        && number
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));

    let field = match special {
        Some(field) => field,
        None if !well_formed => return Err(unparseable()),
        None if primitive == Primitive::Float => {
            let value: f32 = number.parse().map_err(|_| unparseable())?;
            match non_finite_field(value.is_nan(), value.is_infinite(), value.is_sign_positive()) {
                Some(field) => field,
                None => return Ok(CodeValue::Literal(Literal::Float(value))),
            }
        }
        None => {
            let value: f64 = number.parse().map_err(|_| unparseable())?;
            match non_finite_field(value.is_nan(), value.is_infinite(), value.is_sign_positive()) {
                Some(field) => field,
                None => return Ok(CodeValue::Literal(Literal::Double(value))),
            }
        }
    };

    Ok(CodeValue::field(
        CodeValue::ty(CodeType::class(primitive.wrapper())),
        field,
    ))
}

fn non_finite_field(nan: bool, infinite: bool, positive: bool) -> Option<&'static str> {
    match (nan, infinite, positive) {
        (true, _, _) => Some("NaN"),
        (false, true, true) => Some("POSITIVE_INFINITY"),
        (false, true, false) => Some("NEGATIVE_INFINITY"),
        _ => None,
    }
}

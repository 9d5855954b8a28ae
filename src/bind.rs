//! Parsed binding expressions (`${...}` attribute values).
//!
//! The grammar lives upstream; this is the tree the binding resolver walks.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BindExpression {
    Null,
    Whole { value: i64 },
    Fraction { value: f64 },
    Boolean { value: bool },
    Str { value: String },
    Variable { name: String },
    PropertyRead { receiver: Box<BindExpression>, property: String },
    MethodCall { receiver: Box<BindExpression>, method: String, args: Vec<BindExpression> },
    CollectionAccess { collection: Box<BindExpression>, key: Box<BindExpression> },
    Negate { operand: Box<BindExpression> },
    Invert { operand: Box<BindExpression> },
    Add { left: Box<BindExpression>, right: Box<BindExpression> },
    Subtract { left: Box<BindExpression>, right: Box<BindExpression> },
    Multiply { left: Box<BindExpression>, right: Box<BindExpression> },
    Divide { left: Box<BindExpression>, right: Box<BindExpression> },
    Modulo { left: Box<BindExpression>, right: Box<BindExpression> },
    GreaterThan { left: Box<BindExpression>, right: Box<BindExpression> },
    GreaterThanEqual { left: Box<BindExpression>, right: Box<BindExpression> },
    LessThan { left: Box<BindExpression>, right: Box<BindExpression> },
    LessThanEqual { left: Box<BindExpression>, right: Box<BindExpression> },
    Equal { left: Box<BindExpression>, right: Box<BindExpression> },
    NotEqual { left: Box<BindExpression>, right: Box<BindExpression> },
    And { left: Box<BindExpression>, right: Box<BindExpression> },
    Or { left: Box<BindExpression>, right: Box<BindExpression> },
}

impl BindExpression {
    pub fn variable(name: impl Into<String>) -> Self {
        BindExpression::Variable { name: name.into() }
    }

    pub fn read(self, property: impl Into<String>) -> Self {
        BindExpression::PropertyRead {
            receiver: Box::new(self),
            property: property.into(),
        }
    }

    pub fn call(self, method: impl Into<String>, args: Vec<BindExpression>) -> Self {
        BindExpression::MethodCall {
            receiver: Box::new(self),
            method: method.into(),
            args,
        }
    }

    pub fn index(self, key: BindExpression) -> Self {
        BindExpression::CollectionAccess {
            collection: Box::new(self),
            key: Box::new(key),
        }
    }

    /// Operator symbol and operands of a binary node.
    pub fn as_binary(&self) -> Option<(&'static str, &BindExpression, &BindExpression)> {
        let (symbol, left, right) = match self {
            BindExpression::Add { left, right } => ("+", left, right),
            BindExpression::Subtract { left, right } => ("-", left, right),
            BindExpression::Multiply { left, right } => ("*", left, right),
            BindExpression::Divide { left, right } => ("/", left, right),
            BindExpression::Modulo { left, right } => ("%", left, right),
            BindExpression::GreaterThan { left, right } => (">", left, right),
            BindExpression::GreaterThanEqual { left, right } => (">=", left, right),
            BindExpression::LessThan { left, right } => ("<", left, right),
            BindExpression::LessThanEqual { left, right } => ("<=", left, right),
            BindExpression::Equal { left, right } => ("==", left, right),
            BindExpression::NotEqual { left, right } => ("!=", left, right),
            BindExpression::And { left, right } => ("&&", left, right),
            BindExpression::Or { left, right } => ("||", left, right),
            _ => return None,
        };
        Some((symbol, left, right))
    }
}

impl fmt::Display for BindExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((symbol, left, right)) = self.as_binary() {
            return write!(f, "({} {} {})", left, symbol, right);
        }
        match self {
            BindExpression::Null => f.write_str("null"),
            BindExpression::Whole { value } => write!(f, "{}", value),
            BindExpression::Fraction { value } => write!(f, "{:?}", value),
            BindExpression::Boolean { value } => write!(f, "{}", value),
            BindExpression::Str { value } => write!(f, "\"{}\"", value),
            BindExpression::Variable { name } => f.write_str(name),
            BindExpression::PropertyRead { receiver, property } => write!(f, "{}.{}", receiver, property),
            BindExpression::MethodCall {
                receiver,
                method,
                args,
            } => {
                write!(f, "{}.{}(", receiver, method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            BindExpression::CollectionAccess { collection, key } => write!(f, "{}[{}]", collection, key),
            BindExpression::Negate { operand } => write!(f, "-{}", operand),
            BindExpression::Invert { operand } => write!(f, "!{}", operand),
            _ => Ok(()),
        }
    }
}

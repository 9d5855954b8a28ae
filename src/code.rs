//! Code IR emitted by the node processor.
//!
//! A closed set of type, expression and statement nodes. Every value that refers to a type carries a
//! structural [`CodeType`], never a bare name, so a renderer can print it without further lookups.
//!
//! ## Key Invariants
//!
//! 1. **Structural types**: nested classes are `Nested { owner, name }` chains rooted at a `TopLevel`.
//! 2. **Declarable types**: declarations never mention a type variable; [`CodeType::declarable`] turns
//!    variables into wildcards bounded the same way.
//! 3. **No rendering here**: the IR is data. It serializes as JSON for downstream printers.

use serde::{Deserialize, Serialize};

use crate::introspect::{JavaType, Primitive};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum RawType {
    TopLevel { package: String, name: String },
    Nested { owner: Box<RawType>, name: String },
    Primitive(Primitive),
    Array(Box<CodeType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum CodeType {
    Raw(RawType),
    Parameterized { raw: RawType, args: Vec<CodeType> },
    Wildcard { upper: Vec<CodeType>, lower: Vec<CodeType> },
    Variable { name: String, bounds: Vec<CodeType> },
}

impl RawType {
    /// Splits a binary name (`a.b.Outer$Inner`) into its structural form.
    pub fn from_binary_name(binary_name: &str) -> RawType {
        let (package, simple) = match binary_name.rfind('.') {
            Some(index) => (&binary_name[..index], &binary_name[index + 1..]),
            None => ("", binary_name),
        };
        let mut parts = simple.split('$');
        let top = parts.next().unwrap_or(simple);
        let mut raw = RawType::TopLevel {
            package: package.to_string(),
            name: top.to_string(),
        };
        for nested in parts {
            raw = RawType::Nested {
                owner: Box::new(raw),
                name: nested.to_string(),
            };
        }
        raw
    }

    pub fn simple_name(&self) -> String {
        match self {
            RawType::TopLevel { name, .. } | RawType::Nested { name, .. } => name.clone(),
            RawType::Primitive(primitive) => primitive.keyword().to_string(),
            RawType::Array(component) => format!("{}[]", component.simple_name()),
        }
    }
}

impl CodeType {
    pub fn class(binary_name: &str) -> CodeType {
        CodeType::Raw(RawType::from_binary_name(binary_name))
    }

    pub fn primitive(primitive: Primitive) -> CodeType {
        CodeType::Raw(RawType::Primitive(primitive))
    }

    pub fn array(component: CodeType) -> CodeType {
        CodeType::Raw(RawType::Array(Box::new(component)))
    }

    pub fn object() -> CodeType {
        CodeType::class(crate::introspect::well_known::OBJECT)
    }

    /// The type as it may appear in a declaration: type variables become wildcards.
    pub fn declarable(ty: &JavaType) -> CodeType {
        match ty {
            JavaType::Variable { bounds, .. } => CodeType::Wildcard {
                upper: bounds.iter().map(CodeType::declarable).collect(),
                lower: vec![],
            },
            JavaType::Parameterized { raw, args } => CodeType::Parameterized {
                raw: RawType::from_binary_name(raw),
                args: args.iter().map(CodeType::declarable).collect(),
            },
            JavaType::Array { component } => CodeType::array(CodeType::declarable(component)),
            JavaType::Wildcard { upper, lower } => CodeType::Wildcard {
                upper: upper.iter().map(CodeType::declarable).collect(),
                lower: lower.iter().map(CodeType::declarable).collect(),
            },
            other => CodeType::from(other),
        }
    }

    pub fn simple_name(&self) -> String {
        match self {
            CodeType::Raw(raw) | CodeType::Parameterized { raw, .. } => raw.simple_name(),
            CodeType::Wildcard { .. } => "?".to_string(),
            CodeType::Variable { name, .. } => name.clone(),
        }
    }
}

impl From<&JavaType> for CodeType {
    fn from(ty: &JavaType) -> Self {
        match ty {
            JavaType::Primitive { name } => CodeType::primitive(*name),
            JavaType::Class { name } => CodeType::class(name),
            JavaType::Array { component } => CodeType::array(CodeType::from(component.as_ref())),
            JavaType::Parameterized { raw, args } => CodeType::Parameterized {
                raw: RawType::from_binary_name(raw),
                args: args.iter().map(CodeType::from).collect(),
            },
            JavaType::Wildcard { upper, lower } => CodeType::Wildcard {
                upper: upper.iter().map(CodeType::from).collect(),
                lower: lower.iter().map(CodeType::from).collect(),
            },
            JavaType::Variable { name, bounds } => CodeType::Variable {
                name: name.clone(),
                bounds: bounds.iter().map(CodeType::from).collect(),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Literal {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ArrayValue {
    Declared { component: CodeType, values: Vec<CodeValue> },
    Sized { component: CodeType, size: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(rename = "type")]
    pub ty: CodeType,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum LambdaParameters {
    Untyped(Vec<String>),
    Typed(Vec<Parameter>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum LambdaBody {
    Expression(Box<CodeValue>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Lambda {
    Arrow {
        parameters: LambdaParameters,
        body: LambdaBody,
    },
    MethodReference {
        receiver: Box<CodeValue>,
        method: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum CodeValue {
    Literal(Literal),
    Variable(String),
    Type(CodeType),
    Enum {
        #[serde(rename = "type")]
        ty: CodeType,
        constant: String,
    },
    FieldAccess {
        receiver: Box<CodeValue>,
        field: String,
    },
    ArrayAccess {
        receiver: Box<CodeValue>,
        accessor: Box<CodeValue>,
    },
    Array(ArrayValue),
    NewInstance {
        #[serde(rename = "type")]
        ty: CodeType,
        args: Vec<CodeValue>,
    },
    MethodCall {
        receiver: Box<CodeValue>,
        method: String,
        args: Vec<CodeValue>,
    },
    Assignment {
        receiver: Box<CodeValue>,
        value: Box<CodeValue>,
    },
    Lambda(Lambda),
    PreIncrement(Box<CodeValue>),
    PostIncrement(Box<CodeValue>),
    PreDecrement(Box<CodeValue>),
    PostDecrement(Box<CodeValue>),
}

impl CodeValue {
    pub fn null() -> CodeValue {
        CodeValue::Literal(Literal::Null)
    }

    pub fn str(value: impl Into<String>) -> CodeValue {
        CodeValue::Literal(Literal::Str(value.into()))
    }

    pub fn var(identifier: impl Into<String>) -> CodeValue {
        CodeValue::Variable(identifier.into())
    }

    pub fn ty(ty: CodeType) -> CodeValue {
        CodeValue::Type(ty)
    }

    pub fn call(receiver: CodeValue, method: impl Into<String>, args: Vec<CodeValue>) -> CodeValue {
        CodeValue::MethodCall {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
        }
    }

    pub fn static_call(owner: CodeType, method: impl Into<String>, args: Vec<CodeValue>) -> CodeValue {
        Self::call(CodeValue::Type(owner), method, args)
    }

    pub fn field(receiver: CodeValue, field: impl Into<String>) -> CodeValue {
        CodeValue::FieldAccess {
            receiver: Box::new(receiver),
            field: field.into(),
        }
    }

    pub fn new_instance(ty: CodeType, args: Vec<CodeValue>) -> CodeValue {
        CodeValue::NewInstance { ty, args }
    }

    pub fn assign(receiver: CodeValue, value: CodeValue) -> CodeValue {
        CodeValue::Assignment {
            receiver: Box::new(receiver),
            value: Box::new(value),
        }
    }

    pub fn method_reference(receiver: CodeValue, method: impl Into<String>) -> CodeValue {
        CodeValue::Lambda(Lambda::MethodReference {
            receiver: Box::new(receiver),
            method: method.into(),
        })
    }

    pub fn arrow(parameters: Vec<String>, body: LambdaBody) -> CodeValue {
        CodeValue::Lambda(Lambda::Arrow {
            parameters: LambdaParameters::Untyped(parameters),
            body,
        })
    }

    pub fn declared_array(component: CodeType, values: Vec<CodeValue>) -> CodeValue {
        CodeValue::Array(ArrayValue::Declared { component, values })
    }
}

impl From<Literal> for CodeValue {
    fn from(literal: Literal) -> Self {
        CodeValue::Literal(literal)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block(pub Vec<Statement>);

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Block(statements)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Declarator {
    Variable(String),
    Assignment { identifier: String, value: CodeValue },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Resource {
    Variable(String),
    Declaration {
        #[serde(rename = "type")]
        ty: CodeType,
        identifier: String,
        initializer: CodeValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catch {
    pub identifier: String,
    pub exception_types: Vec<CodeType>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Try {
    pub resources: Vec<Resource>,
    pub body: Block,
    pub catches: Vec<Catch>,
    pub finally: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum For {
    Loop {
        initializer: CodeValue,
        termination: CodeValue,
        incrementors: Vec<CodeValue>,
        body: Block,
    },
    Each {
        parameter: Parameter,
        iterable: CodeValue,
        body: Block,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Statement {
    Expression(CodeValue),
    Declaration {
        #[serde(rename = "type")]
        ty: CodeType,
        declarators: Vec<Declarator>,
    },
    LineBreak,
    Block(Block),
    Try(Try),
    Throw(CodeValue),
    Return(Option<CodeValue>),
    Break(Option<String>),
    Continue(Option<String>),
    For(For),
}

impl Statement {
    /// `T identifier = value;`
    pub fn declare(ty: CodeType, identifier: impl Into<String>, value: CodeValue) -> Statement {
        Statement::Declaration {
            ty,
            declarators: vec![Declarator::Assignment {
                identifier: identifier.into(),
                value,
            }],
        }
    }

    pub fn expr(value: CodeValue) -> Statement {
        Statement::Expression(value)
    }

    /// Identifier introduced by a single-declarator declaration.
    pub fn declared_identifier(&self) -> Option<&str> {
        match self {
            Statement::Declaration { declarators, .. } => match declarators.as_slice() {
                [Declarator::Assignment { identifier, .. }] | [Declarator::Variable(identifier)] => {
                    Some(identifier)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<CodeValue> for Statement {
    fn from(value: CodeValue) -> Self {
        Statement::Expression(value)
    }
}

/// `try { statement } catch (Exception exception) { throw new RuntimeException(exception); }`
pub fn rethrow(statement: Statement) -> Statement {
    Statement::Try(Try {
        resources: vec![],
        body: Block(vec![statement]),
        catches: vec![Catch {
            identifier: "exception".to_string(),
            exception_types: vec![CodeType::class(crate::introspect::well_known::EXCEPTION)],
            body: Block(vec![Statement::Throw(CodeValue::new_instance(
                CodeType::class(crate::introspect::well_known::RUNTIME_EXCEPTION),
                vec![CodeValue::var("exception")],
            ))]),
        }],
        finally: None,
    })
}

//! Markup tree consumed by the compiler.
//!
//! Produced upstream by the document parser and handed over as JSON. Element-form property content is
//! already folded into a single [`Value`]: one child becomes [`Value::Element`], text becomes
//! [`Value::Literal`], nested property elements become [`Value::Property`] and mixed content becomes
//! [`Value::Multi`].
//!
//! `Display` reconstructs markup text for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::bind::BindExpression;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub root: ClassInstance,
    #[serde(default)]
    pub instructions: Vec<ProcessingInstruction>,
}

impl Document {
    pub fn new(root: ClassInstance) -> Self {
        Document {
            root,
            instructions: vec![],
        }
    }

    pub fn with_instruction(mut self, instruction: ProcessingInstruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().filter_map(|instruction| match instruction {
            ProcessingInstruction::Import { class_name } => Some(class_name.as_str()),
            _ => None,
        })
    }

    pub fn custom(&self, name: &str) -> Option<&str> {
        self.instructions.iter().find_map(|instruction| match instruction {
            ProcessingInstruction::Custom { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProcessingInstruction {
    #[serde(rename_all = "camelCase")]
    Import { class_name: String },
    Language { language: String },
    Compile { enabled: bool },
    Custom { name: String, value: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InstanceKind {
    /// `<fx:root type="...">`
    Root {
        #[serde(rename = "class")]
        ty: String,
    },
    /// `<fx:reference source="...">`
    Reference { source: String },
    /// `<fx:copy source="...">`
    Copy { source: String },
    /// `<fx:include source="...">`
    Include {
        source: PathBuf,
        #[serde(default)]
        resources: Option<PathBuf>,
        #[serde(default)]
        charset: Option<String>,
    },
    /// `<Class fx:factory="...">`
    Factory { class: String, method: String },
    /// `<Class fx:constant="...">`
    Constant { class: String, member: String },
    /// `<Class fx:value="...">`
    Value { class: String, value: String },
    /// `<Class>`
    Instance { class: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInstance {
    pub kind: InstanceKind,
    #[serde(default)]
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Attribute {
    /// `fx:id`
    Id { value: String },
    /// `fx:controller`
    Controller { class: String },
    Instance { property: String, value: Value },
    Static { class: String, property: String, value: Value },
    EventHandler { event: String, handler: Handler },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Child {
    Property { property: String, value: Value },
    StaticProperty { class: String, property: String, value: Value },
    Define { elements: Vec<ClassInstance> },
    Object { instance: ClassInstance },
    Script { source: ScriptSource },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScriptSource {
    Inline { value: String },
    Reference { path: PathBuf },
}

/// A property element nested in another property element: a map entry or a listener holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyElement {
    pub property: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Value {
    #[default]
    Empty,
    Literal(String),
    /// `%key`
    Resource(String),
    /// `@path`
    Location(PathBuf),
    /// `$id`
    Reference(String),
    /// `${...}`
    Expression(BindExpression),
    Element(Box<ClassInstance>),
    Property(Box<PropertyElement>),
    Attribute(Box<Attribute>),
    Multi(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Handler {
    #[default]
    Empty,
    /// `#method`
    Method(String),
    /// `$reference`
    Reference(String),
    Script(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTION HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

impl ClassInstance {
    pub fn new(kind: InstanceKind) -> Self {
        ClassInstance {
            kind,
            content: Content::default(),
        }
    }

    pub fn instance(class: impl Into<String>) -> Self {
        Self::new(InstanceKind::Instance { class: class.into() })
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute(Attribute::Id { value: id.into() })
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.content.attributes.push(attribute);
        self
    }

    pub fn with_property(self, property: impl Into<String>, value: Value) -> Self {
        self.with_attribute(Attribute::Instance {
            property: property.into(),
            value,
        })
    }

    pub fn with_handler(self, event: impl Into<String>, handler: Handler) -> Self {
        self.with_attribute(Attribute::EventHandler {
            event: event.into(),
            handler,
        })
    }

    pub fn with_child(mut self, child: Child) -> Self {
        self.content.children.push(child);
        self
    }

    pub fn with_object(self, instance: ClassInstance) -> Self {
        self.with_child(Child::Object { instance })
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.content.body = body;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.content.attributes.iter().find_map(|attribute| match attribute {
            Attribute::Id { value } => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn controller(&self) -> Option<&str> {
        self.content.attributes.iter().find_map(|attribute| match attribute {
            Attribute::Controller { class } => Some(class.as_str()),
            _ => None,
        })
    }

    /// `fx:include` sources anywhere in this subtree, in document order.
    pub fn include_sources(&self) -> Vec<&Path> {
        let mut sources = Vec::new();
        self.collect_includes(&mut sources);
        sources
    }

    fn collect_includes<'a>(&'a self, sources: &mut Vec<&'a Path>) {
        if let InstanceKind::Include { source, .. } = &self.kind {
            sources.push(source);
        }
        for attribute in &self.content.attributes {
            attribute.collect_includes(sources);
        }
        for child in &self.content.children {
            match child {
                Child::Property { value, .. } | Child::StaticProperty { value, .. } => value.collect_includes(sources),
                Child::Define { elements } => elements.iter().for_each(|element| element.collect_includes(sources)),
                Child::Object { instance } => instance.collect_includes(sources),
                Child::Script { .. } => {}
            }
        }
        self.content.body.collect_includes(sources);
    }
}

impl Attribute {
    fn collect_includes<'a>(&'a self, sources: &mut Vec<&'a Path>) {
        if let Attribute::Instance { value, .. } | Attribute::Static { value, .. } = self {
            value.collect_includes(sources);
        }
    }
}

impl Value {
    pub fn literal(value: impl Into<String>) -> Self {
        Value::Literal(value.into())
    }

    pub fn element(instance: ClassInstance) -> Self {
        Value::Element(Box::new(instance))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    fn collect_includes<'a>(&'a self, sources: &mut Vec<&'a Path>) {
        match self {
            Value::Element(instance) => instance.collect_includes(sources),
            Value::Property(element) => element.value.collect_includes(sources),
            Value::Attribute(attribute) => attribute.collect_includes(sources),
            Value::Multi(values) => values.iter().for_each(|value| value.collect_includes(sources)),
            _ => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP TEXT
// ═══════════════════════════════════════════════════════════════════════════════

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Empty => Ok(()),
            Handler::Method(name) => write!(f, "#{}", name),
            Handler::Reference(name) => write!(f, "${}", name),
            Handler::Script(script) => f.write_str(script),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Literal(value) => f.write_str(value),
            Value::Resource(key) => write!(f, "%{}", key),
            Value::Location(path) => write!(f, "@{}", path.display()),
            Value::Reference(id) => write!(f, "${}", id),
            Value::Expression(expression) => write!(f, "${{{}}}", expression),
            Value::Element(instance) => write!(f, "{}", instance),
            Value::Property(element) => write_element(f, &element.property, &element.value),
            Value::Attribute(attribute) => write!(f, "{}", attribute),
            Value::Multi(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{}", value)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Id { value } => write!(f, "fx:id=\"{}\"", value),
            Attribute::Controller { class } => write!(f, "fx:controller=\"{}\"", class),
            Attribute::Instance { property, value } => write!(f, "{}=\"{}\"", property, value),
            Attribute::Static {
                class,
                property,
                value,
            } => write!(f, "{}.{}=\"{}\"", class, property, value),
            Attribute::EventHandler { event, handler } => write!(f, "{}=\"{}\"", event, handler),
        }
    }
}

impl fmt::Display for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Property { property, value } => write_element(f, property, value),
            Child::StaticProperty {
                class,
                property,
                value,
            } => write_element(f, &format!("{}.{}", class, property), value),
            Child::Define { elements } => {
                if elements.is_empty() {
                    return f.write_str("<fx:define/>");
                }
                f.write_str("<fx:define>\n")?;
                for element in elements {
                    writeln!(f, "{}", element)?;
                }
                f.write_str("</fx:define>")
            }
            Child::Object { instance } => write!(f, "{}", instance),
            Child::Script { source } => match source {
                ScriptSource::Inline { value } => write!(f, "<fx:script>\n{}\n</fx:script>", value),
                ScriptSource::Reference { path } => write!(f, "<fx:script source=\"{}\"/>", path.display()),
            },
        }
    }
}

impl fmt::Display for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, extra): (&str, Vec<(&str, String)>) = match &self.kind {
            InstanceKind::Root { ty } => ("fx:root", vec![("type", ty.clone())]),
            InstanceKind::Reference { source } => ("fx:reference", vec![("source", source.clone())]),
            InstanceKind::Copy { source } => ("fx:copy", vec![("source", source.clone())]),
            InstanceKind::Include { source, .. } => {
                ("fx:include", vec![("source", source.display().to_string())])
            }
            InstanceKind::Factory { class, method } => (class.as_str(), vec![("fx:factory", method.clone())]),
            InstanceKind::Constant { class, member } => (class.as_str(), vec![("fx:constant", member.clone())]),
            InstanceKind::Value { class, value } => (class.as_str(), vec![("fx:value", value.clone())]),
            InstanceKind::Instance { class } => (class.as_str(), vec![]),
        };

        write!(f, "<{}", name)?;
        for (key, value) in &extra {
            write!(f, " {}=\"{}\"", key, value)?;
        }
        for attribute in &self.content.attributes {
            write!(f, " {}", attribute)?;
        }
        if self.content.children.is_empty() && self.content.body.is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">\n")?;
        for child in &self.content.children {
            writeln!(f, "{}", child)?;
        }
        if !self.content.body.is_empty() {
            writeln!(f, "{}", self.content.body)?;
        }
        write!(f, "</{}>", name)
    }
}

fn write_element(f: &mut fmt::Formatter<'_>, name: &str, value: &Value) -> fmt::Result {
    write!(f, "<{}", name)?;
    if value.is_empty() {
        return f.write_str("/>");
    }
    write!(f, ">\n{}\n</{}>", value, name)
}

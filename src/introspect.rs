//! Introspection surface over the component framework.
//!
//! The compiler never loads classes. Everything it knows about constructors, members, generic
//! signatures and annotations comes through [`Introspector`]. The bundled back-end is
//! [`MetadataTable`], a static table deserialized from JSON or assembled with [`ClassBuilder`].
//!
//! ## Key Invariants
//!
//! 1. **Binary names**: classes are keyed by binary name (`javafx.collections.ListChangeListener$Change`).
//! 2. **Public view includes inherited members**: most-derived first, each signature reported once.
//! 3. **Declared view is local**: only the class itself, any visibility.
//! 4. **Unknown stays unknown**: a class missing from the table is related to nothing but itself.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::{CompileError, Result};

pub mod well_known {
    pub const OBJECT: &str = "java.lang.Object";
    pub const STRING: &str = "java.lang.String";
    pub const ENUM: &str = "java.lang.Enum";
    pub const EXCEPTION: &str = "java.lang.Exception";
    pub const RUNTIME_EXCEPTION: &str = "java.lang.RuntimeException";
    pub const ERROR: &str = "java.lang.Error";
    pub const COLLECTION: &str = "java.util.Collection";
    pub const MAP: &str = "java.util.Map";
    pub const RESOURCE_BUNDLE: &str = "java.util.ResourceBundle";
    pub const BINDINGS: &str = "javafx.beans.binding.Bindings";
    pub const EVENT_HANDLER: &str = "javafx.event.EventHandler";
    pub const OBSERVABLE_VALUE: &str = "javafx.beans.value.ObservableValue";
    pub const OBSERVABLE_LIST: &str = "javafx.collections.ObservableList";
    pub const OBSERVABLE_SET: &str = "javafx.collections.ObservableSet";
    pub const OBSERVABLE_MAP: &str = "javafx.collections.ObservableMap";
    pub const LIST_CHANGE: &str = "javafx.collections.ListChangeListener$Change";
    pub const SET_CHANGE: &str = "javafx.collections.SetChangeListener$Change";
    pub const MAP_CHANGE: &str = "javafx.collections.MapChangeListener$Change";
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    Void,
}

impl Primitive {
    pub const ALL: [Primitive; 9] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Char,
        Primitive::Void,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
            Primitive::Void => "void",
        }
    }

    pub fn wrapper(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
            Primitive::Char => "java.lang.Character",
            Primitive::Void => "java.lang.Void",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Primitive> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    pub fn from_wrapper(name: &str) -> Option<Primitive> {
        Self::ALL.into_iter().find(|p| p.wrapper() == name)
    }
}

/// A generic type as it appears in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JavaType {
    Primitive {
        name: Primitive,
    },
    Class {
        name: String,
    },
    Array {
        component: Box<JavaType>,
    },
    Parameterized {
        raw: String,
        args: Vec<JavaType>,
    },
    Wildcard {
        #[serde(default)]
        upper: Vec<JavaType>,
        #[serde(default)]
        lower: Vec<JavaType>,
    },
    Variable {
        name: String,
        #[serde(default)]
        bounds: Vec<JavaType>,
    },
}

impl JavaType {
    pub fn class(name: impl Into<String>) -> Self {
        JavaType::Class { name: name.into() }
    }

    pub fn object() -> Self {
        Self::class(well_known::OBJECT)
    }

    pub fn string() -> Self {
        Self::class(well_known::STRING)
    }

    pub fn primitive(name: Primitive) -> Self {
        JavaType::Primitive { name }
    }

    pub fn void() -> Self {
        Self::primitive(Primitive::Void)
    }

    pub fn array(component: JavaType) -> Self {
        JavaType::Array {
            component: Box::new(component),
        }
    }

    pub fn parameterized(raw: impl Into<String>, args: Vec<JavaType>) -> Self {
        JavaType::Parameterized {
            raw: raw.into(),
            args,
        }
    }

    pub fn extends(upper: JavaType) -> Self {
        JavaType::Wildcard {
            upper: vec![upper],
            lower: vec![],
        }
    }

    pub fn super_of(lower: JavaType) -> Self {
        JavaType::Wildcard {
            upper: vec![JavaType::object()],
            lower: vec![lower],
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        JavaType::Variable {
            name: name.into(),
            bounds: vec![],
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            JavaType::Primitive { name } => Some(*name),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Class { name } => Some(name),
            JavaType::Parameterized { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn type_arguments(&self) -> &[JavaType] {
        match self {
            JavaType::Parameterized { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JavaType::Class { name } if name == well_known::OBJECT)
    }
}

fn canonical(binary_name: &str) -> String {
    binary_name.replace('$', ".")
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Primitive { name } => f.write_str(name.keyword()),
            JavaType::Class { name } => f.write_str(&canonical(name)),
            JavaType::Array { component } => write!(f, "{}[]", component),
            JavaType::Parameterized { raw, args } => {
                write!(f, "{}<", canonical(raw))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
            JavaType::Wildcard { upper, lower } => {
                if let Some(lower) = lower.first() {
                    write!(f, "? super {}", lower)
                } else if let Some(upper) = upper.first().filter(|u| !u.is_object()) {
                    write!(f, "? extends {}", upper)
                } else {
                    f.write_str("?")
                }
            }
            JavaType::Variable { name, .. } => f.write_str(name),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DESCRIPTORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

/// `@NamedArg` metadata on a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedArg {
    pub name: String,
    #[serde(default)]
    pub default_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    #[serde(rename = "type")]
    pub ty: JavaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_arg: Option<NamedArg>,
}

impl ParameterInfo {
    pub fn named(name: impl Into<String>, ty: JavaType) -> Self {
        ParameterInfo {
            ty,
            named_arg: Some(NamedArg {
                name: name.into(),
                default_value: String::new(),
            }),
        }
    }

    pub fn unnamed(ty: JavaType) -> Self {
        ParameterInfo { ty, named_arg: None }
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        if let Some(named_arg) = self.named_arg.as_mut() {
            named_arg.default_value = default_value.into();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorInfo {
    #[serde(default)]
    pub parameters: Vec<ParameterInfo>,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<JavaType>,
    #[serde(default = "JavaType::void")]
    pub return_type: JavaType,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub bridge: bool,
    #[serde(default)]
    pub exceptions: Vec<JavaType>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, parameters: Vec<JavaType>, return_type: JavaType) -> Self {
        MethodInfo {
            name: name.into(),
            parameters,
            return_type,
            is_static: false,
            visibility: Visibility::Public,
            bridge: false,
            exceptions: vec![],
        }
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn throws(mut self, exception: JavaType) -> Self {
        self.exceptions.push(exception);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn bridge(mut self) -> Self {
        self.bridge = true;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: JavaType,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, ty: JavaType) -> Self {
        FieldInfo {
            name: name.into(),
            ty,
            is_static: false,
            visibility: Visibility::Public,
        }
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub constructors: Vec<ConstructorInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub default_property: Option<String>,
    #[serde(default)]
    pub enum_constants: Vec<String>,
}

impl ClassInfo {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            info: ClassInfo {
                name: name.into(),
                kind: ClassKind::Class,
                visibility: Visibility::Public,
                is_abstract: false,
                superclass: None,
                interfaces: vec![],
                constructors: vec![],
                methods: vec![],
                fields: vec![],
                default_property: None,
                enum_constants: vec![],
            },
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    /// Supertypes in lookup order: superclass first, then interfaces.
    fn supertypes(&self) -> Vec<&str> {
        let mut supertypes = Vec::with_capacity(self.interfaces.len() + 1);
        match &self.superclass {
            Some(superclass) => supertypes.push(superclass.as_str()),
            None if self.kind != ClassKind::Interface
                && self.kind != ClassKind::Annotation
                && self.name != well_known::OBJECT =>
            {
                supertypes.push(well_known::OBJECT)
            }
            None => {}
        }
        supertypes.extend(self.interfaces.iter().map(String::as_str));
        supertypes
    }
}

/// Fluent construction of [`ClassInfo`] for embedders and fixtures.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    info: ClassInfo,
}

impl ClassBuilder {
    pub fn interface(mut self) -> Self {
        self.info.kind = ClassKind::Interface;
        self
    }

    pub fn enumeration(mut self, constants: &[&str]) -> Self {
        self.info.kind = ClassKind::Enum;
        self.info.superclass = Some(well_known::ENUM.to_string());
        self.info.enum_constants = constants.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn abstract_(mut self) -> Self {
        self.info.is_abstract = true;
        self
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.info.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.info.interfaces.push(interface.into());
        self
    }

    pub fn default_property(mut self, property: impl Into<String>) -> Self {
        self.info.default_property = Some(property.into());
        self
    }

    pub fn constructor(mut self, parameters: Vec<ParameterInfo>) -> Self {
        self.info.constructors.push(ConstructorInfo {
            parameters,
            visibility: Visibility::Public,
        });
        self
    }

    pub fn constructor_with_visibility(
        mut self,
        parameters: Vec<ParameterInfo>,
        visibility: Visibility,
    ) -> Self {
        self.info.constructors.push(ConstructorInfo {
            parameters,
            visibility,
        });
        self
    }

    pub fn method(mut self, method: MethodInfo) -> Self {
        self.info.methods.push(method);
        self
    }

    pub fn field(mut self, field: FieldInfo) -> Self {
        self.info.fields.push(field);
        self
    }

    pub fn build(self) -> ClassInfo {
        self.info
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTROSPECTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Capability interface over a type universe.
///
/// Only [`Introspector::resolve_class`] is required; the hierarchy-aware queries are derived from it.
pub trait Introspector: Send + Sync {
    fn resolve_class(&self, binary_name: &str) -> Option<Arc<ClassInfo>>;

    fn public_constructors(&self, class: &str) -> Vec<ConstructorInfo> {
        self.resolve_class(class)
            .map(|info| {
                info.constructors
                    .iter()
                    .filter(|c| c.visibility == Visibility::Public)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn public_methods(&self, class: &str) -> Vec<MethodInfo> {
        let mut seen: HashSet<(String, Vec<JavaType>)> = HashSet::new();
        let mut methods = Vec::new();
        for info in self.hierarchy(class) {
            let inherited = info.name != class;
            for method in &info.methods {
                if !method.is_public() {
                    continue;
                }
                if inherited && info.is_interface() && method.is_static {
                    continue;
                }
                if seen.insert((method.name.clone(), method.parameters.clone())) {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    fn declared_methods(&self, class: &str) -> Vec<MethodInfo> {
        self.resolve_class(class)
            .map(|info| info.methods.clone())
            .unwrap_or_default()
    }

    fn public_fields(&self, class: &str) -> Vec<FieldInfo> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        for info in self.hierarchy(class) {
            for field in info.fields.iter().filter(|f| f.is_public()) {
                if seen.insert(field.name.clone()) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }

    fn declared_fields(&self, class: &str) -> Vec<FieldInfo> {
        self.resolve_class(class)
            .map(|info| info.fields.clone())
            .unwrap_or_default()
    }

    /// Class-level default content property, inherited through superclasses.
    fn default_property(&self, class: &str) -> Option<String> {
        let mut current = self.resolve_class(class);
        while let Some(info) = current {
            if let Some(property) = &info.default_property {
                return Some(property.clone());
            }
            current = info
                .superclass
                .as_deref()
                .and_then(|superclass| self.resolve_class(superclass));
        }
        None
    }

    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        if class == ancestor {
            return true;
        }
        self.hierarchy(class).iter().any(|info| info.name == ancestor)
    }

    /// The class followed by every known supertype, breadth first, each once.
    fn hierarchy(&self, class: &str) -> Vec<Arc<ClassInfo>> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([class.to_string()]);
        let mut out = Vec::new();
        while let Some(name) = queue.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(info) = self.resolve_class(&name) {
                queue.extend(info.supertypes().into_iter().map(str::to_string));
                out.push(info);
            }
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC METADATA TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetadataFile {
    classes: Vec<ClassInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    classes: HashMap<String, Arc<ClassInfo>>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: ClassInfo) {
        self.classes.insert(info.name.clone(), Arc::new(info));
    }

    pub fn with(mut self, info: ClassInfo) -> Self {
        self.insert(info);
        self
    }

    pub fn merge(&mut self, other: MetadataTable) {
        self.classes.extend(other.classes);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        let file: MetadataFile = serde_json::from_str(json)?;
        let mut table = MetadataTable::new();
        for info in file.classes {
            table.insert(info);
        }
        Ok(table)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        let mut classes: Vec<ClassInfo> = self.classes.values().map(|c| (**c).clone()).collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        serde_json::to_string_pretty(&MetadataFile { classes })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
        Self::from_json_str(&text).map_err(|e| CompileError::json(path, e))
    }
}

impl Introspector for MetadataTable {
    fn resolve_class(&self, binary_name: &str) -> Option<Arc<ClassInfo>> {
        self.classes.get(binary_name).cloned()
    }
}

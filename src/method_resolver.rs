//! Method, field and constructor resolution.
//!
//! ## Key Invariants
//!
//! 1. **Cached by key**: lookups are keyed by (erased receiver, member name, arity or argument types) and
//!    return the same `Arc` for the same key within a compilation unit.
//! 2. **Bridges are invisible**: bridge methods never match.
//! 3. **Public if declared**: the `*_required_public_if_exists` lookups fall back to declared members and
//!    raise `Access` when the only match is not public. Absence is not an error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CompileError, Result};
use crate::introspect::{ConstructorInfo, FieldInfo, JavaType, MethodInfo, Visibility};
use crate::name_resolver::{camel_case, capitalize};
use crate::type_resolver::TypeSystem;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Signature {
    Arity(usize),
    Params(Vec<JavaType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodKey {
    receiver: JavaType,
    name: String,
    signature: Signature,
}

/// A constructor parameter described by its named-argument metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArgValue {
    pub ty: JavaType,
    pub name: String,
    pub default_value: String,
}

pub struct MethodResolver {
    types: TypeSystem,
    methods: HashMap<MethodKey, Option<Arc<MethodInfo>>>,
    required_methods: HashMap<MethodKey, Option<Arc<MethodInfo>>>,
    fields: HashMap<(JavaType, String), Option<Arc<FieldInfo>>>,
    required_fields: HashMap<(JavaType, String), Option<Arc<FieldInfo>>>,
    default_properties: HashMap<JavaType, Option<String>>,
}

impl MethodResolver {
    pub fn new(types: TypeSystem) -> Self {
        MethodResolver {
            types,
            methods: HashMap::new(),
            required_methods: HashMap::new(),
            fields: HashMap::new(),
            required_fields: HashMap::new(),
            default_properties: HashMap::new(),
        }
    }

    fn key(&self, receiver: &JavaType, name: &str, signature: Signature) -> MethodKey {
        MethodKey {
            receiver: self.types.erasure(receiver),
            name: name.to_string(),
            signature,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // METHODS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Public method by name and parameter count. More than one match is an error.
    pub fn find_method_by_count(
        &mut self,
        receiver: &JavaType,
        name: &str,
        count: usize,
    ) -> Result<Option<Arc<MethodInfo>>> {
        let key = self.key(receiver, name, Signature::Arity(count));
        if let Some(found) = self.methods.get(&key) {
            return Ok(found.clone());
        }
        let candidates = self.public_methods(&key.receiver);
        let found = self.match_by_count(&key, &candidates, count)?;
        self.methods.insert(key, found.clone());
        Ok(found)
    }

    /// First public method whose every parameter accepts the matching argument type.
    pub fn find_method(&mut self, receiver: &JavaType, name: &str, args: &[JavaType]) -> Option<Arc<MethodInfo>> {
        let key = self.key(receiver, name, Signature::Params(args.to_vec()));
        if let Some(found) = self.methods.get(&key) {
            return found.clone();
        }
        let candidates = self.public_methods(&key.receiver);
        let found = self.match_by_params(name, &candidates, args);
        self.methods.insert(key, found.clone());
        found
    }

    /// Like [`MethodResolver::find_method`], falling back to declared methods which must then be public.
    pub fn find_method_required_public_if_exists(
        &mut self,
        receiver: &JavaType,
        name: &str,
        args: &[JavaType],
    ) -> Result<Option<Arc<MethodInfo>>> {
        let key = self.key(receiver, name, Signature::Params(args.to_vec()));
        if let Some(found) = self.required_methods.get(&key) {
            return Ok(found.clone());
        }
        let found = match self.find_method(receiver, name, args) {
            Some(found) => Some(found),
            None => {
                let declared = self.declared_methods(&key.receiver);
                match self.match_by_params(name, &declared, args) {
                    Some(method) if !method.is_public() => {
                        return Err(CompileError::Access {
                            member: format!("{}({})", method.name, join_types(&method.parameters)),
                            owner: key.receiver.to_string(),
                        });
                    }
                    other => other,
                }
            }
        };
        self.required_methods.insert(key, found.clone());
        Ok(found)
    }

    fn public_methods(&self, receiver: &JavaType) -> Vec<MethodInfo> {
        match receiver.class_name() {
            Some(name) => self.types.introspector().public_methods(name),
            None => Vec::new(),
        }
    }

    fn declared_methods(&self, receiver: &JavaType) -> Vec<MethodInfo> {
        match receiver.class_name() {
            Some(name) => self.types.introspector().declared_methods(name),
            None => Vec::new(),
        }
    }

    fn match_by_count(
        &self,
        key: &MethodKey,
        candidates: &[MethodInfo],
        count: usize,
    ) -> Result<Option<Arc<MethodInfo>>> {
        let mut matching = candidates
            .iter()
            .filter(|m| m.name == key.name && m.parameters.len() == count && !m.bridge);
        let first = matching.next();
        if matching.next().is_some() {
            return Err(CompileError::AmbiguousMethod {
                owner: key.receiver.to_string(),
                name: key.name.clone(),
                arity: count,
            });
        }
        Ok(first.cloned().map(Arc::new))
    }

    fn match_by_params(&self, name: &str, candidates: &[MethodInfo], args: &[JavaType]) -> Option<Arc<MethodInfo>> {
        candidates
            .iter()
            .filter(|m| m.name == name && m.parameters.len() == args.len() && !m.bridge)
            .find(|m| {
                m.parameters
                    .iter()
                    .zip(args)
                    .all(|(param, arg)| self.types.is_assignable_from(param, arg))
            })
            .cloned()
            .map(Arc::new)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // NAMING CONVENTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// `get<Property>()`
    pub fn resolve_getter(&mut self, receiver: &JavaType, property: &str) -> Result<Option<Arc<MethodInfo>>> {
        self.find_method_by_count(receiver, &format!("get{}", capitalize(property)), 0)
    }

    /// `<property>Property()`
    pub fn resolve_property(&mut self, receiver: &JavaType, property: &str) -> Result<Option<Arc<MethodInfo>>> {
        self.find_method_by_count(receiver, &format!("{}Property", camel_case(property)), 0)
    }

    /// `set<Property>(x)`
    pub fn resolve_setter(&mut self, receiver: &JavaType, property: &str) -> Result<Option<Arc<MethodInfo>>> {
        self.find_method_by_count(receiver, &format!("set{}", capitalize(property)), 1)
    }

    /// `set<Property>(T)` accepting `value`.
    pub fn resolve_setter_accepting(
        &mut self,
        receiver: &JavaType,
        property: &str,
        value: &JavaType,
    ) -> Option<Arc<MethodInfo>> {
        self.find_method(receiver, &format!("set{}", capitalize(property)), std::slice::from_ref(value))
    }

    pub fn resolve_setter_required_public_if_exists(
        &mut self,
        receiver: &JavaType,
        property: &str,
        value: &JavaType,
    ) -> Result<Option<Arc<MethodInfo>>> {
        self.find_method_required_public_if_exists(
            receiver,
            &format!("set{}", capitalize(property)),
            std::slice::from_ref(value),
        )
    }

    /// `static set<Property>(node, value)`
    pub fn resolve_static_setter(&mut self, owner: &JavaType, property: &str) -> Result<Option<Arc<MethodInfo>>> {
        let found = self.find_method_by_count(owner, &format!("set{}", capitalize(property)), 2)?;
        Ok(found.filter(|method| method.is_static))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FIELDS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Public field, inherited or declared.
    pub fn resolve_field(&mut self, receiver: &JavaType, name: &str) -> Option<Arc<FieldInfo>> {
        let key = (self.types.erasure(receiver), name.to_string());
        if let Some(found) = self.fields.get(&key) {
            return found.clone();
        }
        let found = key
            .0
            .class_name()
            .and_then(|class| {
                self.types
                    .introspector()
                    .public_fields(class)
                    .into_iter()
                    .find(|field| field.name == name)
            })
            .map(Arc::new);
        self.fields.insert(key, found.clone());
        found
    }

    pub fn resolve_field_required_public_if_exists(
        &mut self,
        receiver: &JavaType,
        name: &str,
    ) -> Result<Option<Arc<FieldInfo>>> {
        let key = (self.types.erasure(receiver), name.to_string());
        if let Some(found) = self.required_fields.get(&key) {
            return Ok(found.clone());
        }
        let found = match self.resolve_field(receiver, name) {
            Some(field) => Some(field),
            None => {
                let declared = key.0.class_name().and_then(|class| {
                    self.types
                        .introspector()
                        .declared_fields(class)
                        .into_iter()
                        .find(|field| field.name == name)
                });
                match declared {
                    Some(field) if !field.is_public() => {
                        return Err(CompileError::Access {
                            member: field.name,
                            owner: key.0.to_string(),
                        });
                    }
                    other => other.map(Arc::new),
                }
            }
        };
        self.required_fields.insert(key, found.clone());
        Ok(found)
    }

    /// Public field that must exist.
    pub fn resolve_field_required(&mut self, receiver: &JavaType, name: &str) -> Result<Arc<FieldInfo>> {
        self.resolve_field_required_public_if_exists(receiver, name)?
            .ok_or_else(|| CompileError::unknown_member(name, receiver))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CLASS METADATA
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn default_property(&mut self, ty: &JavaType) -> Option<String> {
        let key = self.types.erasure(ty);
        if let Some(found) = self.default_properties.get(&key) {
            return found.clone();
        }
        let found = key
            .class_name()
            .and_then(|class| self.types.introspector().default_property(class));
        self.default_properties.insert(key, found.clone());
        found
    }

    pub fn constructors(&self, ty: &JavaType) -> Vec<ConstructorInfo> {
        self.types
            .raw_class_name(ty)
            .map(|class| self.types.introspector().public_constructors(&class))
            .unwrap_or_default()
    }

    pub fn has_all_named_args(&self, constructor: &ConstructorInfo) -> bool {
        constructor.parameters.iter().all(|p| p.named_arg.is_some())
    }

    pub fn named_args(&self, constructor: &ConstructorInfo) -> Result<Vec<NamedArgValue>> {
        constructor
            .parameters
            .iter()
            .map(|parameter| {
                let named_arg = parameter
                    .named_arg
                    .as_ref()
                    .ok_or_else(|| CompileError::Unsupported("constructor parameter without a name".into()))?;
                Ok(NamedArgValue {
                    ty: parameter.ty.clone(),
                    name: named_arg.name.clone(),
                    default_value: named_arg.default_value.clone(),
                })
            })
            .collect()
    }

    /// Public single-argument constructor taking the type itself.
    pub fn has_copy_constructor(&self, ty: &JavaType) -> bool {
        let erased = self.types.erasure(ty);
        self.constructors(ty).iter().any(|constructor| {
            constructor.visibility == Visibility::Public
                && constructor.parameters.len() == 1
                && self.types.erasure(&constructor.parameters[0].ty) == erased
        })
    }

    pub fn has_default_constructor(&self, ty: &JavaType) -> bool {
        self.constructors(ty)
            .iter()
            .any(|constructor| constructor.parameters.is_empty())
    }
}

fn join_types(types: &[JavaType]) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

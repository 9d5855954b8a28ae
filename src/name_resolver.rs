//! Unique identifiers and the id → type registry of a compilation unit.

use std::collections::HashMap;

use crate::error::{CompileError, Result};
use crate::introspect::JavaType;
use crate::type_resolver::TypeSystem;

/// Cloned to snapshot the registry before a construction attempt that may be rolled back.
#[derive(Clone)]
pub struct NameResolver {
    types: TypeSystem,
    counts: HashMap<String, usize>,
    ids: HashMap<String, JavaType>,
}

impl NameResolver {
    pub fn new(types: TypeSystem) -> Self {
        NameResolver {
            types,
            counts: HashMap::new(),
            ids: HashMap::new(),
        }
    }

    /// `label0`, `label1`, ... registered against `ty`.
    pub fn resolve_unique_name(&mut self, ty: &JavaType) -> Result<String> {
        let base = camel_case(&self.base_name(ty));
        let count = self
            .counts
            .entry(base.clone())
            .and_modify(|count| *count += 1)
            .or_insert(0);
        let identifier = format!("{}{}", base, count);
        self.store_id_type(&identifier, ty.clone())?;
        Ok(identifier)
    }

    fn base_name(&self, ty: &JavaType) -> String {
        match self.types.erasure(ty) {
            JavaType::Primitive { name } => name.keyword().to_string(),
            JavaType::Class { name } => simple_name(&name).to_string(),
            JavaType::Array { component } => format!("{}Array", self.base_name(&component)),
            other => other.to_string(),
        }
    }

    pub fn store_id_type(&mut self, id: &str, ty: JavaType) -> Result<()> {
        if let Some(existing) = self.ids.get(id) {
            return Err(CompileError::DuplicateIdentifier {
                id: id.to_string(),
                existing: existing.to_string(),
            });
        }
        self.ids.insert(id.to_string(), ty);
        Ok(())
    }

    pub fn resolve_type_by_id(&self, id: &str) -> Result<JavaType> {
        self.ids
            .get(id)
            .cloned()
            .ok_or_else(|| CompileError::UnknownIdentifier { id: id.to_string() })
    }
}

/// Simple name of a binary class name: `javafx.collections.ListChangeListener$Change` → `Change`.
pub fn simple_name(binary_name: &str) -> &str {
    let after_package = binary_name.rsplit('.').next().unwrap_or(binary_name);
    after_package.rsplit('$').next().unwrap_or(after_package)
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-cases the first character.
pub fn camel_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `main-view_panel` → `MainViewPanel`
pub fn delimited_to_capitalized(text: &str) -> String {
    text.split(['_', '-']).map(capitalize).collect()
}

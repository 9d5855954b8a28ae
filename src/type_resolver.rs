//! Type resolution and type algebra.
//!
//! ## Key Invariants
//!
//! 1. **Resolution order**: exact name, then each wildcard import prefix in declaration order, then the
//!    nested-type rewrite (last `.` becomes `$`, repeated).
//! 2. **Memoized**: a name resolves once per compilation unit. Failures are not cached.
//! 3. **Erasure before assignability**: generic arguments never take part in assignability checks.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CompileError, Result};
use crate::introspect::{well_known, ClassInfo, Introspector, JavaType, Primitive};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPE SYSTEM
// ═══════════════════════════════════════════════════════════════════════════════

/// Hierarchy-aware queries over [`JavaType`] values.
#[derive(Clone)]
pub struct TypeSystem {
    introspector: Arc<dyn Introspector>,
}

impl TypeSystem {
    pub fn new(introspector: Arc<dyn Introspector>) -> Self {
        TypeSystem { introspector }
    }

    pub fn introspector(&self) -> &dyn Introspector {
        self.introspector.as_ref()
    }

    pub fn class_info(&self, name: &str) -> Option<Arc<ClassInfo>> {
        self.introspector.resolve_class(name)
    }

    /// Raw form of a type: parameterized types lose their arguments, wildcards and variables collapse to
    /// their first upper bound.
    pub fn erasure(&self, ty: &JavaType) -> JavaType {
        match ty {
            JavaType::Primitive { .. } | JavaType::Class { .. } => ty.clone(),
            JavaType::Array { component } => JavaType::array(self.erasure(component)),
            JavaType::Parameterized { raw, .. } => JavaType::class(raw.clone()),
            JavaType::Wildcard { upper, .. } => upper
                .first()
                .map(|bound| self.erasure(bound))
                .unwrap_or_else(JavaType::object),
            JavaType::Variable { bounds, .. } => bounds
                .first()
                .map(|bound| self.erasure(bound))
                .unwrap_or_else(JavaType::object),
        }
    }

    /// Binary name of the erased class, `None` for primitives and arrays.
    pub fn raw_class_name(&self, ty: &JavaType) -> Option<String> {
        match self.erasure(ty) {
            JavaType::Class { name } => Some(name),
            _ => None,
        }
    }

    pub fn upper_bound(&self, ty: &JavaType) -> JavaType {
        self.erasure(ty)
    }

    pub fn lower_bound(&self, ty: &JavaType) -> JavaType {
        match ty {
            JavaType::Wildcard { lower, .. } if !lower.is_empty() => self.erasure(&lower[0]),
            other => self.erasure(other),
        }
    }

    /// Erased upper bounds of the type arguments, `None` when the type is not parameterized.
    pub fn upper_bound_type_arguments(&self, ty: &JavaType) -> Option<Vec<JavaType>> {
        match ty {
            JavaType::Parameterized { args, .. } => Some(args.iter().map(|a| self.upper_bound(a)).collect()),
            _ => None,
        }
    }

    pub fn lower_bound_type_arguments(&self, ty: &JavaType) -> Option<Vec<JavaType>> {
        match ty {
            JavaType::Parameterized { args, .. } => Some(args.iter().map(|a| self.lower_bound(a)).collect()),
            _ => None,
        }
    }

    /// Whether a value of `checked` can be assigned to a slot of type `base`.
    pub fn is_assignable_from(&self, base: &JavaType, checked: &JavaType) -> bool {
        let base = self.erasure(base);
        let checked = self.erasure(checked);
        if base == checked {
            return true;
        }
        match (&base, &checked) {
            (JavaType::Primitive { .. }, _) | (_, JavaType::Primitive { .. }) => false,
            (JavaType::Class { name }, _) if name == well_known::OBJECT => true,
            (JavaType::Array { component: base }, JavaType::Array { component: checked }) => {
                base.as_primitive().is_none()
                    && checked.as_primitive().is_none()
                    && self.is_assignable_from(base, checked)
            }
            (JavaType::Class { name: base }, JavaType::Class { name: checked }) => {
                self.introspector.is_subclass_of(checked, base)
            }
            _ => false,
        }
    }

    /// Shorthand for assignability to a named class.
    pub fn is_subtype(&self, checked: &JavaType, class_name: &str) -> bool {
        self.is_assignable_from(&JavaType::class(class_name), checked)
    }

    /// Primitive types become their wrapper class, everything else is returned erased.
    pub fn wrap(&self, ty: &JavaType) -> JavaType {
        match ty.as_primitive() {
            Some(primitive) => JavaType::class(primitive.wrapper()),
            None => self.erasure(ty),
        }
    }

    /// Primitive keyword or its wrapper class.
    pub fn as_primitive_or_boxed(&self, ty: &JavaType) -> Option<Primitive> {
        match self.erasure(ty) {
            JavaType::Primitive { name } => Some(name),
            JavaType::Class { name } => Primitive::from_wrapper(&name),
            _ => None,
        }
    }

    pub fn is_primitive_or_boxed(&self, ty: &JavaType) -> bool {
        self.as_primitive_or_boxed(ty).is_some()
    }

    pub fn is_enum(&self, ty: &JavaType) -> bool {
        self.raw_class_name(ty)
            .and_then(|name| self.class_info(&name))
            .map(|info| info.kind == crate::introspect::ClassKind::Enum)
            .unwrap_or(false)
    }

    /// Whether the first type argument is something other than `? extends expected`.
    pub fn has_non_matching_wildcard_upper_bounds(&self, ty: &JavaType, expected: &JavaType) -> bool {
        let Some(first) = ty.type_arguments().first() else {
            return true;
        };
        match first {
            JavaType::Wildcard { upper, lower } if lower.is_empty() && upper.len() <= 1 => {
                let bound = upper.first().cloned().unwrap_or_else(JavaType::object);
                self.erasure(&bound) != self.erasure(expected)
            }
            _ => true,
        }
    }

    /// Whether every type argument of `ty` is compatible with the matching bound.
    pub fn type_arguments_meet_bounds(&self, ty: &JavaType, bounds: &[JavaType]) -> bool {
        let JavaType::Parameterized { args, .. } = ty else {
            return true;
        };
        if args.len() != bounds.len() {
            return false;
        }
        args.iter().zip(bounds).all(|(arg, bound)| match arg {
            JavaType::Parameterized { .. } => !self.has_non_matching_wildcard_upper_bounds(arg, bound),
            JavaType::Wildcard { upper, .. } => match upper.first() {
                Some(upper) if !upper.is_object() => self.erasure(upper) == self.erasure(bound),
                _ => true,
            },
            JavaType::Class { .. } => self.erasure(arg) == self.erasure(bound),
            _ => true,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAME → TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves markup class names against the introspection surface and the document imports.
pub struct TypeResolver {
    types: TypeSystem,
    import_prefixes: Vec<String>,
    resolved: HashMap<String, JavaType>,
}

impl TypeResolver {
    pub fn new<'a>(types: TypeSystem, imports: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut resolver = TypeResolver {
            types,
            import_prefixes: Vec::new(),
            resolved: HashMap::new(),
        };
        let mut single: Vec<&str> = Vec::new();
        for import in imports {
            match import.strip_suffix(".*") {
                Some(prefix) => resolver.import_prefixes.push(prefix.to_string()),
                None => single.push(import),
            }
        }
        for import in single {
            let ty = resolver.resolve(import)?;
            let simple_name = import.rsplit('.').next().unwrap_or(import).to_string();
            if let Some(previous) = resolver.resolved.insert(simple_name, ty.clone()) {
                if previous != ty {
                    return Err(CompileError::ImportCollision {
                        first: previous.to_string(),
                        second: ty.to_string(),
                    });
                }
            }
        }
        Ok(resolver)
    }

    pub fn types(&self) -> &TypeSystem {
        &self.types
    }

    /// Resolves a class name, failing with `UnresolvedType`.
    pub fn resolve(&mut self, name: &str) -> Result<JavaType> {
        if let Some(ty) = self.resolved.get(name) {
            return Ok(ty.clone());
        }
        let ty = self
            .resolve_uncached(name)
            .ok_or_else(|| CompileError::UnresolvedType { name: name.to_string() })?;
        self.resolved.insert(name.to_string(), ty.clone());
        Ok(ty)
    }

    fn resolve_uncached(&self, name: &str) -> Option<JavaType> {
        if let Some(primitive) = Primitive::from_keyword(name) {
            return Some(JavaType::primitive(primitive));
        }
        if let Some(component) = name.strip_suffix("[]") {
            return self.resolve_uncached(component).map(JavaType::array);
        }
        if self.types.class_info(name).is_some() {
            return Some(JavaType::class(name));
        }
        for prefix in &self.import_prefixes {
            let full_name = format!("{}.{}", prefix, name);
            if self.types.class_info(&full_name).is_some() {
                return Some(JavaType::class(full_name));
            }
        }
        let mut nested = name.to_string();
        while let Some(index) = nested.rfind('.') {
            nested.replace_range(index..index + 1, "$");
            if let Some(ty) = self.resolve_uncached(&nested) {
                return Some(ty);
            }
        }
        None
    }
}

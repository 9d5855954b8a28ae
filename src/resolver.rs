//! The per-document bundle of resolvers.

use std::sync::Arc;

use crate::binding_resolver::BindingResolver;
use crate::error::Result;
use crate::introspect::{Introspector, JavaType};
use crate::method_resolver::MethodResolver;
use crate::name_resolver::NameResolver;
use crate::type_resolver::{TypeResolver, TypeSystem};
use crate::value_resolver::ValueResolver;

/// Everything a node processor needs to turn names into types and values into IR.
///
/// One bundle lives for exactly one compilation unit. Nothing here is shared across documents.
pub struct Resolvers {
    pub types: TypeSystem,
    pub type_resolver: TypeResolver,
    pub methods: MethodResolver,
    pub names: NameResolver,
}

impl Resolvers {
    pub fn new<'a>(introspector: Arc<dyn Introspector>, imports: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let types = TypeSystem::new(introspector);
        Ok(Resolvers {
            type_resolver: TypeResolver::new(types.clone(), imports)?,
            methods: MethodResolver::new(types.clone()),
            names: NameResolver::new(types.clone()),
            types,
        })
    }

    pub fn resolve_type(&mut self, name: &str) -> Result<JavaType> {
        self.type_resolver.resolve(name)
    }

    pub fn values(&mut self) -> ValueResolver<'_> {
        ValueResolver::new(self)
    }

    pub fn bindings(&mut self) -> BindingResolver<'_> {
        BindingResolver::new(self)
    }
}

//! Node processor: turns one markup node into construction statements.
//!
//! ## Key Invariants
//!
//! 1. **One construction branch per node**, chosen by [`InstanceKind`].
//! 2. **Fixed processing order**: object initialization, `fx:define` children, default content, instance
//!    properties, static properties, handlers.
//! 3. **Attempts leave no trace**: every constructor attempt runs against a snapshot of the name registry
//!    and a private statement buffer. Only the first successful attempt is committed.
//! 4. **Ids are bound before use**: a node's id is registered before its properties are processed, so
//!    children may reference it, but later siblings are never visible to earlier ones.
//!
//! Property rules live in `properties.rs`, handler wiring in `events.rs`.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::code::{CodeType, CodeValue, Statement};
use crate::constructor::{rank_constructors, PropertyPartition};
use crate::document::{BUILDER_PROVIDED_ROOT_NAME, CONTROLLER_FACTORY_NAME, CONTROLLER_NAME, RESOURCES_NAME};
use crate::error::{CompileError, Result};
use crate::introspect::{well_known, JavaType};
use crate::markup::{Attribute, Child, ClassInstance, Handler, InstanceKind, Value};
use crate::method_resolver::NamedArgValue;
use crate::resolver::Resolvers;
use crate::value_resolver::extract_single_value;

/// Statements building one node, plus the variable and type of the built object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCode {
    pub identifier: String,
    #[serde(rename = "type")]
    pub ty: JavaType,
    pub statements: Vec<Statement>,
}

/// What an enclosing document needs to know about an included one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedUnit {
    /// Binary name of the included document's builder class.
    pub builder: String,
    pub root_type: JavaType,
    /// `java.lang.Object` when the included document has no controller.
    pub controller_type: JavaType,
}

/// Compiles `fx:include` targets. Implemented by the document driver.
pub trait IncludeCompiler {
    fn compile_include(&self, source: &Path) -> Result<IncludedUnit>;
}

/// For compiling detached nodes: every include fails.
pub struct NoIncludes;

impl IncludeCompiler for NoIncludes {
    fn compile_include(&self, source: &Path) -> Result<IncludedUnit> {
        Err(CompileError::Unsupported(format!(
            "include of `{}` outside of a document",
            source.display()
        )))
    }
}

/// Compiles `node` and everything below it.
pub fn compile_node(
    node: &ClassInstance,
    controller: &JavaType,
    resolvers: &mut Resolvers,
    includes: &dyn IncludeCompiler,
) -> Result<NodeCode> {
    NodeProcessor::new(node, controller, resolvers, includes).process()
}

pub(crate) struct StaticProperty {
    pub(crate) class: String,
    pub(crate) property: String,
    pub(crate) value: Value,
}

pub(crate) struct NodeProcessor<'a> {
    pub(crate) node: &'a ClassInstance,
    pub(crate) controller: &'a JavaType,
    pub(crate) resolvers: &'a mut Resolvers,
    pub(crate) includes: &'a dyn IncludeCompiler,
    pub(crate) id: Option<String>,
    pub(crate) instance_properties: IndexMap<String, Value>,
    pub(crate) static_properties: Vec<StaticProperty>,
    pub(crate) handlers: Vec<(String, Handler)>,
    pub(crate) defined_children: Vec<&'a ClassInstance>,
    pub(crate) default_children: Vec<Value>,
    pub(crate) has_scripts: bool,
    pub(crate) statements: Vec<Statement>,
    pub(crate) object_type: JavaType,
    pub(crate) identifier: String,
    /// Element, key and value bounds taken from the controller's declaration of this node.
    pub(crate) type_arguments: Option<Vec<JavaType>>,
}

impl<'a> NodeProcessor<'a> {
    pub(crate) fn new(
        node: &'a ClassInstance,
        controller: &'a JavaType,
        resolvers: &'a mut Resolvers,
        includes: &'a dyn IncludeCompiler,
    ) -> Self {
        let mut processor = NodeProcessor {
            node,
            controller,
            resolvers,
            includes,
            id: node.id().map(str::to_string),
            instance_properties: IndexMap::new(),
            static_properties: Vec::new(),
            handlers: Vec::new(),
            defined_children: Vec::new(),
            default_children: Vec::new(),
            has_scripts: false,
            statements: Vec::new(),
            object_type: JavaType::object(),
            identifier: String::new(),
            type_arguments: None,
        };
        processor.classify();
        processor
    }

    fn classify(&mut self) {
        let node = self.node;
        let content = &node.content;
        for attribute in &content.attributes {
            match attribute {
                Attribute::Instance { property, value } => {
                    self.instance_properties.insert(property.clone(), value.clone());
                }
                Attribute::Static { class, property, value } => self.static_properties.push(StaticProperty {
                    class: class.clone(),
                    property: property.clone(),
                    value: value.clone(),
                }),
                Attribute::EventHandler { event, handler } => self.handlers.push((event.clone(), handler.clone())),
                Attribute::Id { .. } | Attribute::Controller { .. } => {}
            }
        }

        for child in &content.children {
            match child {
                Child::Property { property, value } => {
                    self.instance_properties.insert(property.clone(), value.clone());
                }
                Child::StaticProperty { class, property, value } => self.static_properties.push(StaticProperty {
                    class: class.clone(),
                    property: property.clone(),
                    value: value.clone(),
                }),
                Child::Define { elements } => self.defined_children.extend(elements.iter()),
                Child::Object { instance } => self.default_children.push(Value::element(instance.clone())),
                Child::Script { .. } => self.has_scripts = true,
            }
        }

        if !content.body.is_empty() {
            self.default_children.push(content.body.clone());
        }
    }

    /// Runs the processor, wrapping the first failure with this node's markup.
    pub(crate) fn process(mut self) -> Result<NodeCode> {
        let node = self.node;
        match self.process_steps() {
            Ok(()) => Ok(NodeCode {
                identifier: self.identifier,
                ty: self.object_type,
                statements: self.statements,
            }),
            Err(error @ CompileError::Node { .. }) => Err(error),
            Err(error) => Err(CompileError::Node {
                markup: node.to_string(),
                source: Box::new(error),
            }),
        }
    }

    fn process_steps(&mut self) -> Result<()> {
        if self.has_scripts {
            return Err(CompileError::Unsupported("fx:script elements".to_string()));
        }
        self.initialize_object()?;
        self.process_defined_children()?;
        self.process_default_content()?;
        self.process_instance_properties()?;
        self.process_static_properties()?;
        self.process_handlers()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SHARED HELPERS
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn emit(&mut self, statement: impl Into<Statement>) {
        self.statements.push(statement.into());
    }

    pub(crate) fn receiver(&self) -> CodeValue {
        CodeValue::var(self.identifier.clone())
    }

    pub(crate) fn is_subtype(&self, ty: &JavaType, class_name: &str) -> bool {
        self.resolvers.types.is_subtype(ty, class_name)
    }

    /// Builds a nested node in place and returns its variable and type.
    pub(crate) fn build_child(&mut self, child: &ClassInstance) -> Result<(String, JavaType)> {
        let code = NodeProcessor::new(child, self.controller, &mut *self.resolvers, self.includes).process()?;
        self.statements.extend(code.statements);
        Ok((code.identifier, code.ty))
    }

    /// Coerces a single value to `target`, building nested elements as children.
    pub(crate) fn coerce_value(&mut self, target: &JavaType, value: &Value) -> Result<CodeValue> {
        match value {
            Value::Element(child) => {
                let (identifier, ty) = self.build_child(child)?;
                if !self.resolvers.types.is_assignable_from(target, &ty) {
                    return Err(CompileError::mismatch(target, ty));
                }
                Ok(CodeValue::var(identifier))
            }
            other => self.resolvers.values().resolve_value(target, other),
        }
    }

    fn declare_object(&mut self, value: CodeValue) {
        let declaration = Statement::declare(CodeType::declarable(&self.object_type), self.identifier.clone(), value);
        self.emit(declaration);
    }

    fn erased_code_type(&self, ty: &JavaType) -> CodeType {
        CodeType::from(&self.resolvers.types.erasure(ty))
    }

    fn resolve_identifier(&mut self) -> Result<()> {
        self.identifier = match &self.id {
            Some(id) => {
                self.resolvers.names.store_id_type(id, self.object_type.clone())?;
                id.clone()
            }
            None => self.resolvers.names.resolve_unique_name(&self.object_type)?,
        };
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OBJECT INITIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    fn initialize_object(&mut self) -> Result<()> {
        self.emit(Statement::LineBreak);
        let node = self.node;
        match &node.kind {
            InstanceKind::Root { ty } => self.initialize_root(ty)?,
            InstanceKind::Reference { source } => self.initialize_reference(source)?,
            InstanceKind::Copy { source } => self.initialize_copy(source)?,
            InstanceKind::Include { source, .. } => self.initialize_include(source)?,
            InstanceKind::Factory { class, method } => self.initialize_with_factory(class, method)?,
            InstanceKind::Constant { class, member } => self.initialize_constant(class, member)?,
            InstanceKind::Value { class, value } => self.initialize_value(class, value)?,
            InstanceKind::Instance { class } => self.initialize_with_constructor(class)?,
        }

        if self.id.is_some() {
            let identifier = self.identifier.clone();
            let object_type = self.object_type.clone();
            self.inject_into_controller(&identifier, &object_type)?;
            if let Some(set_id) =
                self.resolvers
                    .methods
                    .resolve_setter_accepting(&object_type, "id", &JavaType::string())
            {
                let call = CodeValue::call(self.receiver(), set_id.name.clone(), vec![CodeValue::str(identifier)]);
                self.emit(call);
            }
            self.type_arguments = self.extract_type_arguments();
        }
        Ok(())
    }

    fn initialize_root(&mut self, ty: &str) -> Result<()> {
        self.object_type = self.resolvers.resolve_type(ty)?;
        self.identifier = BUILDER_PROVIDED_ROOT_NAME.to_string();
        Ok(())
    }

    fn initialize_reference(&mut self, source: &str) -> Result<()> {
        let node = self.node;
        let content = &node.content;
        if !content.attributes.is_empty() || !content.children.is_empty() {
            return Err(CompileError::Unsupported(format!(
                "reference to `{}` with attributes or children",
                source
            )));
        }
        self.object_type = self.resolvers.names.resolve_type_by_id(source)?;
        self.identifier = source.to_string();
        Ok(())
    }

    fn initialize_copy(&mut self, source: &str) -> Result<()> {
        self.object_type = self.resolvers.names.resolve_type_by_id(source)?;
        if !self.resolvers.methods.has_copy_constructor(&self.object_type) {
            return Err(CompileError::unknown_member("copy constructor", &self.object_type));
        }
        self.identifier = format!("{}Copy", source);
        self.resolvers
            .names
            .store_id_type(&self.identifier, self.object_type.clone())?;
        let value = CodeValue::new_instance(self.erased_code_type(&self.object_type), vec![CodeValue::var(source)]);
        self.declare_object(value);
        Ok(())
    }

    fn initialize_include(&mut self, source: &Path) -> Result<()> {
        let unit = self.includes.compile_include(source)?;
        self.object_type = unit.root_type.clone();
        self.resolve_identifier()?;

        let builder = format!("{}Builder", self.identifier);
        let builder_type = CodeType::class(&unit.builder);
        self.emit(Statement::declare(
            builder_type.clone(),
            builder.clone(),
            CodeValue::new_instance(builder_type, Vec::new()),
        ));
        self.emit(CodeValue::call(
            CodeValue::var(builder.clone()),
            "build",
            vec![
                CodeValue::null(),
                CodeValue::null(),
                CodeValue::var(RESOURCES_NAME),
                CodeValue::var(CONTROLLER_FACTORY_NAME),
            ],
        ));
        self.declare_object(CodeValue::call(CodeValue::var(builder.clone()), "getRoot", Vec::new()));

        if !unit.controller_type.is_object() && self.id.is_some() {
            let controller = format!("{}Controller", self.identifier);
            self.emit(Statement::declare(
                CodeType::declarable(&unit.controller_type),
                controller.clone(),
                CodeValue::call(CodeValue::var(builder), "getController", Vec::new()),
            ));
            self.inject_into_controller(&controller, &unit.controller_type)?;
        }
        Ok(())
    }

    fn initialize_with_factory(&mut self, class: &str, method: &str) -> Result<()> {
        let owner = self.resolvers.resolve_type(class)?;
        let factory = self
            .resolvers
            .methods
            .find_method_by_count(&owner, method, 0)?
            .filter(|factory| factory.is_static)
            .ok_or_else(|| CompileError::unknown_member(format!("{}()", method), &owner))?;
        self.object_type = factory.return_type.clone();
        self.resolve_identifier()?;
        let value = CodeValue::static_call(self.erased_code_type(&owner), factory.name.clone(), Vec::new());
        self.declare_object(value);
        Ok(())
    }

    fn initialize_constant(&mut self, class: &str, member: &str) -> Result<()> {
        let owner = self.resolvers.resolve_type(class)?;
        let field = self.resolvers.methods.resolve_field_required(&owner, member)?;
        self.object_type = field.ty.clone();
        self.resolve_identifier()?;
        let value = CodeValue::field(CodeValue::ty(self.erased_code_type(&owner)), member);
        self.declare_object(value);
        Ok(())
    }

    fn initialize_value(&mut self, class: &str, text: &str) -> Result<()> {
        self.object_type = self.resolvers.resolve_type(class)?;
        self.resolve_identifier()?;
        let object_type = self.object_type.clone();
        let value = if self.resolvers.types.erasure(&object_type) == JavaType::string() {
            CodeValue::str(text)
        } else {
            let value_of = self
                .resolvers
                .methods
                .find_method_required_public_if_exists(&object_type, "valueOf", &[JavaType::string()])?
                .ok_or_else(|| CompileError::unknown_member("valueOf(String)", &object_type))?;
            self.resolvers
                .values()
                .coerce_with_factory(&object_type, &value_of, text)?
        };
        self.declare_object(value);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONSTRUCTOR SELECTION
    // ═══════════════════════════════════════════════════════════════════════════

    fn initialize_with_constructor(&mut self, class: &str) -> Result<()> {
        self.object_type = self.resolvers.resolve_type(class)?;
        self.resolve_identifier()?;

        let partition = self.partition_properties()?;
        let methods = &self.resolvers.methods;
        let candidates = methods
            .constructors(&self.object_type)
            .iter()
            .filter(|constructor| methods.has_all_named_args(constructor))
            .map(|constructor| methods.named_args(constructor))
            .collect::<Result<Vec<_>>>()?;

        let mut last_failure = None;
        for parameters in rank_constructors(candidates, &partition) {
            let names = self.resolvers.names.clone();
            let committed = std::mem::take(&mut self.statements);
            let attempt = self.build_with_constructor(&parameters);
            let buffered = std::mem::replace(&mut self.statements, committed);
            match attempt {
                Ok(()) => {
                    debug!(class = %self.object_type, parameters = ?parameter_names(&parameters), "constructor selected");
                    self.statements.extend(buffered);
                    return Ok(());
                }
                Err(error) if error.is_resolution_failure() => {
                    debug!(class = %self.object_type, parameters = ?parameter_names(&parameters), %error, "constructor rejected");
                    self.resolvers.names = names;
                    last_failure = Some(Box::new(error));
                }
                Err(error) => return Err(error),
            }
        }

        Err(CompileError::AmbiguousConstructor {
            class: self.object_type.to_string(),
            last_failure,
        })
    }

    fn partition_properties(&mut self) -> Result<PropertyPartition> {
        let mut partition = PropertyPartition::default();
        let defined: Vec<String> = self.instance_properties.keys().cloned().collect();
        for property in defined {
            if self.is_mutable(&property)? {
                partition.mutable.insert(property.clone());
            }
            partition.defined.push(property);
        }
        Ok(partition)
    }

    /// Settable after construction: a map entry, a setter, or a getter returning a collection or map.
    fn is_mutable(&mut self, property: &str) -> Result<bool> {
        let object_type = self.object_type.clone();
        if self.is_subtype(&object_type, well_known::MAP) {
            return Ok(true);
        }
        match self.resolvers.methods.resolve_setter(&object_type, property) {
            Ok(Some(_)) | Err(CompileError::AmbiguousMethod { .. }) => return Ok(true),
            Ok(None) => {}
            Err(error) => return Err(error),
        }
        Ok(match self.resolvers.methods.resolve_getter(&object_type, property)? {
            Some(getter) => {
                self.is_subtype(&getter.return_type, well_known::COLLECTION)
                    || self.is_subtype(&getter.return_type, well_known::MAP)
            }
            None => false,
        })
    }

    fn build_with_constructor(&mut self, parameters: &[NamedArgValue]) -> Result<()> {
        let args = parameters
            .iter()
            .map(|parameter| self.resolve_parameter_value(parameter))
            .collect::<Result<Vec<_>>>()?;
        for parameter in parameters {
            self.instance_properties.shift_remove(&parameter.name);
        }
        let value = CodeValue::new_instance(self.erased_code_type(&self.object_type), args);
        self.declare_object(value);
        Ok(())
    }

    fn resolve_parameter_value(&mut self, parameter: &NamedArgValue) -> Result<CodeValue> {
        match self.instance_properties.get(&parameter.name).cloned() {
            Some(value) => {
                let single = extract_single_value(&value)?;
                self.coerce_value(&parameter.ty, single)
            }
            None => self.resolvers.values().coerce_default_value(parameter),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONTROLLER
    // ═══════════════════════════════════════════════════════════════════════════

    /// `controller.setX(x)` or `controller.x = x` when the controller declares a matching member.
    fn inject_into_controller(&mut self, identifier: &str, ty: &JavaType) -> Result<()> {
        if self.controller.is_object() {
            return Ok(());
        }
        let controller = self.controller.clone();
        let methods = &mut self.resolvers.methods;
        let injection = if let Some(setter) = methods.resolve_setter_required_public_if_exists(&controller, identifier, ty)? {
            CodeValue::call(
                CodeValue::var(CONTROLLER_NAME),
                setter.name.clone(),
                vec![CodeValue::var(identifier)],
            )
        } else {
            let field = methods
                .resolve_field_required_public_if_exists(&controller, identifier)?
                .filter(|field| self.resolvers.types.is_assignable_from(&field.ty, ty));
            match field {
                Some(field) => CodeValue::assign(
                    CodeValue::field(CodeValue::var(CONTROLLER_NAME), field.name.clone()),
                    CodeValue::var(identifier),
                ),
                None => return Ok(()),
            }
        };
        self.emit(injection);
        Ok(())
    }

    fn extract_type_arguments(&mut self) -> Option<Vec<JavaType>> {
        if self.controller.is_object() {
            return None;
        }
        let controller = self.controller.clone();
        let declared = self
            .resolvers
            .methods
            .resolve_setter_accepting(&controller, &self.identifier, &self.object_type)
            .and_then(|setter| setter.parameters.first().cloned())
            .or_else(|| {
                self.resolvers
                    .methods
                    .resolve_field(&controller, &self.identifier)
                    .map(|field| field.ty.clone())
            })?;
        self.resolvers.types.upper_bound_type_arguments(&declared)
    }

    fn process_defined_children(&mut self) -> Result<()> {
        for child in self.defined_children.clone() {
            self.build_child(child)?;
        }
        Ok(())
    }
}

fn parameter_names(parameters: &[NamedArgValue]) -> Vec<&str> {
    parameters.iter().map(|p| p.name.as_str()).collect()
}

//! Property rules of the node processor.
//!
//! ## Key Invariants
//!
//! 1. **Setter first**: a property with a public setter is always assigned through it. Getter-based
//!    collection appends and map entries are only tried when no setter applies.
//! 2. **Bounds from declarations**: collection elements and map entries are coerced to the upper bounds of
//!    the declared type arguments, falling back to `Object`.
//! 3. **Markup order**: instance properties are applied in the order they appear in the markup.

use lazy_static::lazy_static;
use regex::Regex;

use crate::code::CodeValue;
use crate::error::{CompileError, Result};
use crate::introspect::{well_known, JavaType, MethodInfo};
use crate::markup::{Attribute, ClassInstance, Handler, Value};
use crate::node::NodeProcessor;

lazy_static! {
    static ref LIST_SEPARATOR: Regex = Regex::new(r",\s*").unwrap();
}

const ON_CHANGE: &str = "onChange";

/// A nested property on a property: a map entry or an `onChange` listener.
enum PropertyEntry {
    Entry { key: String, value: Value },
    Listener { event: String, handler: Handler },
}

impl PropertyEntry {
    fn from_value(value: &Value) -> Option<PropertyEntry> {
        match value {
            Value::Property(element) => Some(PropertyEntry::Entry {
                key: element.property.clone(),
                value: element.value.clone(),
            }),
            Value::Attribute(attribute) => match attribute.as_ref() {
                Attribute::Instance { property, value } => Some(PropertyEntry::Entry {
                    key: property.clone(),
                    value: value.clone(),
                }),
                Attribute::EventHandler { event, handler } => Some(PropertyEntry::Listener {
                    event: event.clone(),
                    handler: handler.clone(),
                }),
                _ => None,
            },
            _ => None,
        }
    }
}

impl<'a> NodeProcessor<'a> {
    fn bound(&self, index: usize) -> JavaType {
        self.type_arguments
            .as_ref()
            .and_then(|arguments| arguments.get(index).cloned())
            .unwrap_or_else(JavaType::object)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INSTANCE PROPERTIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn process_instance_properties(&mut self) -> Result<()> {
        let properties = std::mem::take(&mut self.instance_properties);
        let object_type = self.object_type.clone();
        if self.is_subtype(&object_type, well_known::MAP) {
            let (key_bound, value_bound) = (self.bound(0), self.bound(1));
            for (property, value) in properties {
                self.add_map_entry(self.receiver(), &property, &value, &key_bound, &value_bound)?;
            }
            return Ok(());
        }

        for (property, value) in properties {
            self.process_instance_property(&property, &value)?;
        }
        Ok(())
    }

    pub(crate) fn process_instance_property(&mut self, property: &str, value: &Value) -> Result<()> {
        match value {
            Value::Element(element) => self.process_property_element(property, element),
            Value::Attribute(_) | Value::Property(_) => {
                let entries = PropertyEntry::from_value(value).into_iter().collect();
                self.process_properties_on_property(property, entries)
            }
            Value::Multi(values) => {
                let mut elements = Vec::new();
                let mut entries = Vec::new();
                let mut singles = Vec::new();
                for value in values {
                    match value {
                        Value::Element(element) => elements.push(element.as_ref()),
                        Value::Attribute(_) | Value::Property(_) => {
                            entries.extend(PropertyEntry::from_value(value));
                        }
                        Value::Multi(_) => {
                            return Err(CompileError::Unsupported(format!(
                                "nested multi value for property `{}`",
                                property
                            )))
                        }
                        single => singles.push(single),
                    }
                }

                for single in singles {
                    self.process_instance_property_single(property, single)?;
                }
                match elements.as_slice() {
                    [] => {}
                    [element] if only_elements(values) => self.process_property_element(property, element)?,
                    _ => self.process_property_elements(property, &elements)?,
                }
                if !entries.is_empty() {
                    self.process_properties_on_property(property, entries)?;
                }
                Ok(())
            }
            single => self.process_instance_property_single(property, single),
        }
    }

    fn process_instance_property_single(&mut self, property: &str, value: &Value) -> Result<()> {
        let object_type = self.object_type.clone();
        match value {
            Value::Empty => return Ok(()),
            Value::Expression(expression) => {
                let accessor = self
                    .resolvers
                    .methods
                    .resolve_property(&object_type, property)?
                    .ok_or_else(|| CompileError::unknown_property(property, &object_type))?;
                let result = self.resolvers.bindings().resolve_expression(expression)?;
                self.statements.extend(result.statements);
                let target = CodeValue::call(self.receiver(), accessor.name.clone(), Vec::new());
                self.emit(CodeValue::call(target, "bind", vec![result.value]));
                return Ok(());
            }
            _ => {}
        }

        if let Some(setter) = self.resolvers.methods.resolve_setter(&object_type, property)? {
            return self.apply_setter(&setter, value);
        }

        let Some(getter) = self.resolvers.methods.resolve_getter(&object_type, property)? else {
            return Err(CompileError::unknown_property(property, &object_type));
        };
        match value {
            Value::Literal(text) if self.is_subtype(&getter.return_type, well_known::COLLECTION) => {
                self.add_literal_list(&getter, text)
            }
            _ => Err(read_only(property, &object_type, &getter, "only comma separated literals can be appended")),
        }
    }

    fn apply_setter(&mut self, setter: &MethodInfo, value: &Value) -> Result<()> {
        let Some(parameter) = setter.parameters.first() else {
            return Err(CompileError::unknown_member(setter.name.clone(), &self.object_type));
        };
        let coerced = self.coerce_value(parameter, value)?;
        let call = CodeValue::call(self.receiver(), setter.name.clone(), vec![coerced]);
        self.emit(call);
        Ok(())
    }

    /// `getX().add(v)` for every `,\s*` separated token.
    fn add_literal_list(&mut self, getter: &MethodInfo, text: &str) -> Result<()> {
        let element_bound = match self.resolvers.types.upper_bound_type_arguments(&getter.return_type) {
            Some(arguments) if arguments.len() == 1 => arguments[0].clone(),
            _ => {
                return Err(CompileError::Unsupported(format!(
                    "cannot determine the element type of `{}`",
                    getter.return_type
                )))
            }
        };
        for token in LIST_SEPARATOR.split(text) {
            let element = self.resolvers.values().coerce_literal(&element_bound, token)?;
            let collection = CodeValue::call(self.receiver(), getter.name.clone(), Vec::new());
            self.emit(CodeValue::call(collection, "add", vec![element]));
        }
        Ok(())
    }

    /// A single element: through the setter when there is one, appended to the getter's collection otherwise.
    fn process_property_element(&mut self, property: &str, element: &ClassInstance) -> Result<()> {
        let object_type = self.object_type.clone();
        match self.resolvers.methods.resolve_setter(&object_type, property)? {
            Some(setter) => {
                let Some(parameter) = setter.parameters.first().cloned() else {
                    return Err(CompileError::unknown_member(setter.name.clone(), &object_type));
                };
                let (identifier, ty) = self.build_child(element)?;
                if !self.resolvers.types.is_assignable_from(&parameter, &ty) {
                    return Err(CompileError::mismatch(&parameter, ty));
                }
                let call = CodeValue::call(self.receiver(), setter.name.clone(), vec![CodeValue::var(identifier)]);
                self.emit(call);
                Ok(())
            }
            None => self.process_property_elements(property, &[element]),
        }
    }

    fn process_property_elements(&mut self, property: &str, elements: &[&ClassInstance]) -> Result<()> {
        let object_type = self.object_type.clone();
        let getter = self
            .resolvers
            .methods
            .resolve_getter(&object_type, property)?
            .ok_or_else(|| CompileError::unknown_property(property, &object_type))?;
        if !self.is_subtype(&getter.return_type, well_known::COLLECTION) {
            return Err(read_only(property, &object_type, &getter, "elements can only be added to collections"));
        }
        let element_bound = match self.resolvers.types.upper_bound_type_arguments(&getter.return_type) {
            Some(arguments) if arguments.len() == 1 => arguments[0].clone(),
            _ => {
                return Err(CompileError::Unsupported(format!(
                    "cannot determine the element type of `{}`",
                    getter.return_type
                )))
            }
        };

        for element in elements {
            let (identifier, ty) = self.build_child(element)?;
            if !self.resolvers.types.is_assignable_from(&element_bound, &ty) {
                return Err(CompileError::mismatch(&element_bound, ty));
            }
            let collection = CodeValue::call(self.receiver(), getter.name.clone(), Vec::new());
            self.emit(CodeValue::call(collection, "add", vec![CodeValue::var(identifier)]));
        }
        Ok(())
    }

    /// Map entries on a getter returning a two argument map, or `onChange` listeners.
    fn process_properties_on_property(&mut self, property: &str, entries: Vec<PropertyEntry>) -> Result<()> {
        let object_type = self.object_type.clone();
        let getter = self
            .resolvers
            .methods
            .resolve_getter(&object_type, property)?
            .ok_or_else(|| CompileError::unknown_property(property, &object_type))?;

        for entry in entries {
            match entry {
                PropertyEntry::Listener { event, handler } if event == ON_CHANGE => {
                    self.add_change_listener(&handler, property)?;
                }
                PropertyEntry::Listener { event, .. } => {
                    return Err(CompileError::UnknownEvent {
                        event,
                        owner: getter.return_type.to_string(),
                    })
                }
                PropertyEntry::Entry { key, value } => {
                    let (key_bound, value_bound) =
                        match self.resolvers.types.upper_bound_type_arguments(&getter.return_type) {
                            Some(arguments) if arguments.len() == 2 => (arguments[0].clone(), arguments[1].clone()),
                            _ => {
                                return Err(CompileError::Unsupported(format!(
                                    "property `{}` is not a map with two type arguments",
                                    property
                                )))
                            }
                        };
                    let map = CodeValue::call(self.receiver(), getter.name.clone(), Vec::new());
                    self.add_map_entry(map, &key, &value, &key_bound, &value_bound)?;
                }
            }
        }
        Ok(())
    }

    /// `map.put(key, value)` with the key coerced from the property name.
    fn add_map_entry(
        &mut self,
        map: CodeValue,
        key: &str,
        value: &Value,
        key_bound: &JavaType,
        value_bound: &JavaType,
    ) -> Result<()> {
        if matches!(value, Value::Expression(_) | Value::Multi(_) | Value::Property(_) | Value::Attribute(_)) {
            return Err(CompileError::Unsupported(format!(
                "map entry `{}` needs a concrete value, got `{}`",
                key, value
            )));
        }
        let key = self.resolvers.values().coerce_literal(key_bound, key)?;
        let value = self.coerce_value(value_bound, value)?;
        self.emit(CodeValue::call(map, "put", vec![key, value]));
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DEFAULT CONTENT
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn process_default_content(&mut self) -> Result<()> {
        if self.default_children.is_empty() {
            return Ok(());
        }
        let children = std::mem::take(&mut self.default_children);
        let object_type = self.object_type.clone();

        if self.is_subtype(&object_type, well_known::COLLECTION) {
            let element_bound = self.bound(0);
            for child in &children {
                if matches!(child, Value::Expression(_) | Value::Multi(_) | Value::Property(_) | Value::Attribute(_)) {
                    return Err(CompileError::Unsupported(format!(
                        "cannot add `{}` to a collection",
                        child
                    )));
                }
                let element = self.coerce_value(&element_bound, child)?;
                self.emit(CodeValue::call(self.receiver(), "add", vec![element]));
            }
            return Ok(());
        }

        if self.is_subtype(&object_type, well_known::MAP) {
            let (key_bound, value_bound) = (self.bound(0), self.bound(1));
            for child in &children {
                match PropertyEntry::from_value(child) {
                    Some(PropertyEntry::Entry { key, value }) => {
                        self.add_map_entry(self.receiver(), &key, &value, &key_bound, &value_bound)?
                    }
                    _ => {
                        return Err(CompileError::Unsupported(format!(
                            "map content `{}` is not a property",
                            child
                        )))
                    }
                }
            }
            return Ok(());
        }

        match self.resolvers.methods.default_property(&object_type) {
            Some(property) => self.process_instance_property(&property, &Value::Multi(children)),
            None => Err(CompileError::NoDefaultProperty {
                owner: object_type.to_string(),
            }),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATIC PROPERTIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn process_static_properties(&mut self) -> Result<()> {
        for property in std::mem::take(&mut self.static_properties) {
            self.process_static_property(&property.class, &property.property, &property.value)?;
        }
        Ok(())
    }

    /// `Owner.setX(node, value)`
    fn process_static_property(&mut self, class: &str, property: &str, value: &Value) -> Result<()> {
        if matches!(value, Value::Expression(_) | Value::Multi(_) | Value::Property(_) | Value::Attribute(_)) {
            return Err(CompileError::Unsupported(format!(
                "static property `{}.{}` needs a concrete value",
                class, property
            )));
        }
        let owner = self.resolvers.resolve_type(class)?;
        let setter = self
            .resolvers
            .methods
            .resolve_static_setter(&owner, property)?
            .ok_or_else(|| CompileError::unknown_property(property, &owner))?;
        let (node_parameter, value_parameter) = match setter.parameters.as_slice() {
            [node, value] => (node.clone(), value.clone()),
            _ => return Err(CompileError::unknown_member(setter.name.clone(), &owner)),
        };

        if !self.resolvers.types.is_assignable_from(&node_parameter, &self.object_type) {
            return Err(CompileError::mismatch(&node_parameter, &self.object_type));
        }
        let value = self.coerce_value(&value_parameter, value)?;
        let owner_type = crate::code::CodeType::from(&self.resolvers.types.erasure(&owner));
        let call = CodeValue::static_call(owner_type, setter.name.clone(), vec![self.receiver(), value]);
        self.emit(call);
        Ok(())
    }
}

fn only_elements(values: &[Value]) -> bool {
    values
        .iter()
        .all(|value| matches!(value, Value::Element(_) | Value::Empty))
}

fn read_only(property: &str, owner: &JavaType, getter: &MethodInfo, reason: &str) -> CompileError {
    CompileError::ReadOnlyProperty {
        property: property.to_string(),
        owner: owner.to_string(),
        reason: format!("`{}` returns `{}`: {}", getter.name, getter.return_type, reason),
    }
}

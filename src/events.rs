//! Event handler and change listener wiring.
//!
//! ## Key Invariants
//!
//! 1. **Event setter first**: `on<Event>` resolves to a setter taking an `EventHandler`. The
//!    `on<Property>Change` convention is only tried when no such setter exists.
//! 2. **Checked exceptions are rethrown**: a handler method declaring a checked exception is always called
//!    inside a try/catch that rethrows as `RuntimeException`. A method declaring none is never wrapped.
//! 3. **Controller methods only**: handlers must name a controller method (`#method`).

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::code::{rethrow, Block, CodeValue, LambdaBody, Statement};
use crate::document::CONTROLLER_NAME;
use crate::error::{CompileError, Result};
use crate::introspect::{well_known, JavaType, MethodInfo};
use crate::markup::Handler;
use crate::name_resolver::camel_case;
use crate::node::NodeProcessor;

lazy_static! {
    static ref CHANGE_PROPERTY: Regex = Regex::new(r"^on(?P<property>.+)Change$").unwrap();
}

const EVENT_PARAMETER: &str = "event";
const CHANGE_PARAMETERS: [&str; 3] = ["observable", "oldValue", "newValue"];
const CONTAINER_CHANGE_PARAMETER: &str = "change";

/// Observable container interfaces and the change type their listeners receive.
const CONTAINER_CHANGES: [(&str, &str); 3] = [
    (well_known::OBSERVABLE_LIST, well_known::LIST_CHANGE),
    (well_known::OBSERVABLE_SET, well_known::SET_CHANGE),
    (well_known::OBSERVABLE_MAP, well_known::MAP_CHANGE),
];

fn method_name<'h>(handler: &'h Handler, owner: &JavaType) -> Result<&'h str> {
    match handler {
        Handler::Method(name) => Ok(name),
        other => Err(CompileError::Unsupported(format!(
            "handler `{}` on `{}`: only controller methods can handle events",
            other, owner
        ))),
    }
}

impl<'a> NodeProcessor<'a> {
    pub(crate) fn process_handlers(&mut self) -> Result<()> {
        for (event, handler) in std::mem::take(&mut self.handlers) {
            self.process_handler(&event, &handler)?;
        }
        Ok(())
    }

    fn process_handler(&mut self, event: &str, handler: &Handler) -> Result<()> {
        let object_type = self.object_type.clone();
        let handler_type = JavaType::class(well_known::EVENT_HANDLER);
        if let Some(setter) =
            self.resolvers
                .methods
                .resolve_setter_required_public_if_exists(&object_type, event, &handler_type)?
        {
            return self.add_event_handler(&setter, handler);
        }

        if let Some(captures) = CHANGE_PROPERTY.captures(event) {
            let property = camel_case(&captures["property"]);
            return self.add_change_listener(handler, &property);
        }

        Err(CompileError::UnknownEvent {
            event: event.to_string(),
            owner: object_type.to_string(),
        })
    }

    /// `node.setOnX(handler)` with the event type taken from `EventHandler<? super E>`.
    fn add_event_handler(&mut self, setter: &MethodInfo, handler: &Handler) -> Result<()> {
        let Some(handler_type) = setter.parameters.first() else {
            return Err(CompileError::unknown_member(setter.name.clone(), &self.object_type));
        };
        let event_type = match self.resolvers.types.lower_bound_type_arguments(handler_type) {
            Some(bounds) if bounds.len() == 1 => bounds[0].clone(),
            Some(_) => {
                return Err(CompileError::Unsupported(format!(
                    "cannot determine the event type of `{}`",
                    handler_type
                )))
            }
            None => JavaType::object(),
        };
        let callback = self.controller_event_handler(&event_type, handler)?;
        let call = CodeValue::call(self.receiver(), setter.name.clone(), vec![callback]);
        self.emit(call);
        Ok(())
    }

    fn controller_event_handler(&mut self, event_type: &JavaType, handler: &Handler) -> Result<CodeValue> {
        let controller = self.controller.clone();
        let name = method_name(handler, &controller)?;
        let controller_ref = CodeValue::var(CONTROLLER_NAME);

        if let Some(method) = self
            .resolvers
            .methods
            .find_method(&controller, name, std::slice::from_ref(event_type))
        {
            if !self.declares_checked_exception(&method) {
                return Ok(CodeValue::method_reference(controller_ref, method.name.clone()));
            }
            let call = CodeValue::call(controller_ref, method.name.clone(), vec![CodeValue::var(EVENT_PARAMETER)]);
            return Ok(rethrowing_lambda(call));
        }

        if let Some(method) = self.resolvers.methods.find_method(&controller, name, &[]) {
            let call = CodeValue::call(controller_ref, method.name.clone(), Vec::new());
            if !self.declares_checked_exception(&method) {
                return Ok(CodeValue::arrow(
                    vec![EVENT_PARAMETER.to_string()],
                    LambdaBody::Expression(Box::new(call)),
                ));
            }
            return Ok(rethrowing_lambda(call));
        }

        Err(CompileError::unknown_member(format!("{}({})", name, event_type), &controller))
    }

    fn declares_checked_exception(&self, method: &MethodInfo) -> bool {
        let checked = method.exceptions.iter().any(|exception| {
            !self.is_subtype(exception, well_known::RUNTIME_EXCEPTION) && !self.is_subtype(exception, well_known::ERROR)
        });
        if checked {
            debug!(method = %method.name, "handler declares checked exceptions");
        }
        checked
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CHANGE LISTENERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A property change listener when `xProperty()` exists, otherwise a container listener on `getX()`.
    pub(crate) fn add_change_listener(&mut self, handler: &Handler, property: &str) -> Result<()> {
        let object_type = self.object_type.clone();
        if self.resolvers.methods.resolve_property(&object_type, property)?.is_some() {
            return self.add_property_change_listener(handler, property);
        }
        let getter = self
            .resolvers
            .methods
            .resolve_getter(&object_type, property)?
            .ok_or_else(|| CompileError::unknown_property(property, &object_type))?;
        self.add_container_listener(&getter, handler)
    }

    /// `node.xProperty().addListener(controller::m)`
    fn add_property_change_listener(&mut self, handler: &Handler, property: &str) -> Result<()> {
        let object_type = self.object_type.clone();
        let accessor = self
            .resolvers
            .methods
            .resolve_property(&object_type, property)?
            .ok_or_else(|| CompileError::unknown_property(property, &object_type))?;
        let getter = self
            .resolvers
            .methods
            .resolve_getter(&object_type, property)?
            .ok_or_else(|| CompileError::unknown_property(property, &object_type))?;
        let value_type = self.resolvers.types.erasure(&getter.return_type);

        let listener = self.controller_change_listener(&value_type, handler)?;
        let observable = CodeValue::call(self.receiver(), accessor.name.clone(), Vec::new());
        self.emit(CodeValue::call(observable, "addListener", vec![listener]));
        Ok(())
    }

    /// Controller method `(ObservableValue<? extends T>, T, T)`.
    fn controller_change_listener(&mut self, value_type: &JavaType, handler: &Handler) -> Result<CodeValue> {
        let controller = self.controller.clone();
        let name = method_name(handler, &controller)?;
        let parameters = [
            JavaType::class(well_known::OBSERVABLE_VALUE),
            value_type.clone(),
            value_type.clone(),
        ];
        let method = self
            .resolvers
            .methods
            .find_method(&controller, name, &parameters)
            .ok_or_else(|| {
                CompileError::unknown_member(
                    format!("{}(ObservableValue, {}, {})", name, value_type, value_type),
                    &controller,
                )
            })?;

        if let Some(observable) = method.parameters.first() {
            if matches!(observable, JavaType::Parameterized { .. })
                && self
                    .resolvers
                    .types
                    .has_non_matching_wildcard_upper_bounds(observable, value_type)
            {
                return Err(CompileError::mismatch(
                    format!("ObservableValue<? extends {}>", value_type),
                    observable,
                ));
            }
        }
        Ok(self.listener_callback(&method, &CHANGE_PARAMETERS))
    }

    /// `node.getX().addListener(controller::m)` for observable lists, sets and maps.
    fn add_container_listener(&mut self, getter: &MethodInfo, handler: &Handler) -> Result<()> {
        let listener = self.controller_container_listener(&getter.return_type, handler)?;
        let container = CodeValue::call(self.receiver(), getter.name.clone(), Vec::new());
        self.emit(CodeValue::call(container, "addListener", vec![listener]));
        Ok(())
    }

    fn controller_container_listener(&mut self, container_type: &JavaType, handler: &Handler) -> Result<CodeValue> {
        let controller = self.controller.clone();
        let name = method_name(handler, &controller)?;
        let bounds = self
            .resolvers
            .types
            .upper_bound_type_arguments(container_type)
            .unwrap_or_default();

        let change_type = CONTAINER_CHANGES
            .iter()
            .find(|(observable, _)| self.is_subtype(container_type, observable))
            .map(|(_, change)| JavaType::class(*change))
            .ok_or_else(|| {
                CompileError::Unsupported(format!("`{}` is not an observable container", container_type))
            })?;

        self.resolvers
            .methods
            .find_method(&controller, name, std::slice::from_ref(&change_type))
            .filter(|method| {
                method
                    .parameters
                    .first()
                    .map(|parameter| self.resolvers.types.type_arguments_meet_bounds(parameter, &bounds))
                    .unwrap_or(false)
            })
            .map(|method| self.listener_callback(&method, &[CONTAINER_CHANGE_PARAMETER]))
            .ok_or_else(|| CompileError::unknown_member(format!("{}({})", name, change_type), &controller))
    }

    /// `controller::m`, or a lambda over `parameters` rethrowing when `m` declares a checked exception.
    fn listener_callback(&self, method: &MethodInfo, parameters: &[&str]) -> CodeValue {
        let controller_ref = CodeValue::var(CONTROLLER_NAME);
        if !self.declares_checked_exception(method) {
            return CodeValue::method_reference(controller_ref, method.name.clone());
        }
        let args = parameters.iter().map(|parameter| CodeValue::var(*parameter)).collect();
        let call = CodeValue::call(controller_ref, method.name.clone(), args);
        CodeValue::arrow(
            parameters.iter().map(|parameter| parameter.to_string()).collect(),
            LambdaBody::Block(Block::new(vec![rethrow(Statement::expr(call))])),
        )
    }
}

/// `event -> { try { call; } catch (Exception exception) { throw new RuntimeException(exception); } }`
fn rethrowing_lambda(call: CodeValue) -> CodeValue {
    CodeValue::arrow(
        vec![EVENT_PARAMETER.to_string()],
        LambdaBody::Block(Block::new(vec![rethrow(Statement::expr(call))])),
    )
}

#[cfg(test)]
mod tests {
    use crate::code::{rethrow, Block, CodeValue, LambdaBody, Statement};
    use crate::document::CONTROLLER_NAME;
    use crate::error::CompileError;
    use crate::markup::{Attribute, Child, ClassInstance, Handler, Value};
    use crate::test_fixtures::*;

    fn method(name: &str) -> Handler {
        Handler::Method(name.to_string())
    }

    fn button_with_action(handler: &str) -> ClassInstance {
        ClassInstance::instance("Button").with_handler("onAction", method(handler))
    }

    fn controller() -> CodeValue {
        CodeValue::var(CONTROLLER_NAME)
    }

    fn set_on_action(callback: CodeValue) -> Statement {
        Statement::expr(CodeValue::call(CodeValue::var("button0"), "setOnAction", vec![callback]))
    }

    fn rethrowing(call: CodeValue) -> CodeValue {
        CodeValue::arrow(
            vec!["event".to_string()],
            LambdaBody::Block(Block::new(vec![rethrow(Statement::expr(call))])),
        )
    }

    fn on_change(handler: &str) -> Value {
        Value::Attribute(Box::new(Attribute::EventHandler {
            event: "onChange".to_string(),
            handler: method(handler),
        }))
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // EVENT HANDLERS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_handler_taking_event_is_method_reference() {
        let code = compile_with(&button_with_action("onClick"), Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &set_on_action(CodeValue::method_reference(controller(), "onClick"))
        );
    }

    #[test]
    fn test_handler_without_parameters_is_wrapped() {
        let code = compile_with(&button_with_action("onReset"), Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &set_on_action(CodeValue::arrow(
                vec!["event".to_string()],
                LambdaBody::Expression(Box::new(CodeValue::call(controller(), "onReset", vec![]))),
            ))
        );
    }

    #[test]
    fn test_checked_exception_is_rethrown() {
        let code = compile_with(&button_with_action("onLoad"), Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &set_on_action(rethrowing(CodeValue::call(
                controller(),
                "onLoad",
                vec![CodeValue::var("event")],
            )))
        );

        let code = compile_with(&button_with_action("onExport"), Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &set_on_action(rethrowing(CodeValue::call(controller(), "onExport", vec![])))
        );
    }

    #[test]
    fn test_runtime_exception_is_not_wrapped() {
        let code = compile_with(&button_with_action("onSave"), Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &set_on_action(CodeValue::arrow(
                vec!["event".to_string()],
                LambdaBody::Expression(Box::new(CodeValue::call(controller(), "onSave", vec![]))),
            ))
        );
    }

    #[test]
    fn test_unknown_handler_method() {
        let err = compile_with(&button_with_action("missing"), Some(CONTROLLER)).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::UnknownMember { member, .. } if member.starts_with("missing(")));
    }

    #[test]
    fn test_handler_must_name_controller_method() {
        let node = ClassInstance::instance("Button").with_handler("onAction", Handler::Script("go()".to_string()));
        let err = compile_with(&node, Some(CONTROLLER)).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::Unsupported(_)));
    }

    #[test]
    fn test_unknown_event() {
        let node = ClassInstance::instance("Button").with_handler("onHover", method("onClick"));
        let err = compile_with(&node, Some(CONTROLLER)).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::UnknownEvent { event, .. } if event == "onHover"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // PROPERTY CHANGE LISTENERS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_property_change_listener() {
        let node = ClassInstance::instance("Label").with_handler("onTextChange", method("onTextChanged"));
        let code = compile_with(&node, Some(CONTROLLER)).unwrap();

        assert_eq!(
            code.statements.last().unwrap(),
            &Statement::expr(CodeValue::call(
                CodeValue::call(CodeValue::var("label0"), "textProperty", vec![]),
                "addListener",
                vec![CodeValue::method_reference(controller(), "onTextChanged")],
            ))
        );
    }

    #[test]
    fn test_property_change_listener_with_wrong_observable_bound() {
        let node = ClassInstance::instance("Label").with_handler("onTextChange", method("onLooseTextChanged"));
        let err = compile_with(&node, Some(CONTROLLER)).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::TypeMismatch { .. }));
    }

    #[test]
    fn test_change_listener_for_unknown_property() {
        let node = ClassInstance::instance("Label").with_handler("onColorChange", method("onTextChanged"));
        let err = compile_with(&node, Some(CONTROLLER)).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::UnknownProperty { property, .. } if property == "color"));
    }

    #[test]
    fn test_on_change_on_property_element() {
        let node = ClassInstance::instance("Label").with_child(Child::Property {
            property: "text".to_string(),
            value: on_change("onTextChanged"),
        });
        let code = compile_with(&node, Some(CONTROLLER)).unwrap();

        assert_eq!(
            code.statements.last().unwrap(),
            &Statement::expr(CodeValue::call(
                CodeValue::call(CodeValue::var("label0"), "textProperty", vec![]),
                "addListener",
                vec![CodeValue::method_reference(controller(), "onTextChanged")],
            ))
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // CONTAINER LISTENERS
    // ═══════════════════════════════════════════════════════════════════════════════

    fn tag_box_listening(handler: &str) -> ClassInstance {
        ClassInstance::instance("TagBox").with_child(Child::Property {
            property: "tags".to_string(),
            value: on_change(handler),
        })
    }

    #[test]
    fn test_list_change_listener() {
        let code = compile_with(&tag_box_listening("onTagsChanged"), Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &Statement::expr(CodeValue::call(
                CodeValue::call(CodeValue::var("tagBox0"), "getTags", vec![]),
                "addListener",
                vec![CodeValue::method_reference(controller(), "onTagsChanged")],
            ))
        );
    }

    #[test]
    fn test_list_change_listener_with_wrong_element_bound() {
        let err = compile_with(&tag_box_listening("onNumbersChanged"), Some(CONTROLLER)).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::UnknownMember { member, .. } if member.starts_with("onNumbersChanged")));
    }

    #[test]
    fn test_other_events_on_property_element() {
        let node = ClassInstance::instance("TagBox").with_child(Child::Property {
            property: "tags".to_string(),
            value: Value::Attribute(Box::new(Attribute::EventHandler {
                event: "onAdd".to_string(),
                handler: method("onTagsChanged"),
            })),
        });
        let err = compile_with(&node, Some(CONTROLLER)).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::UnknownEvent { event, .. } if event == "onAdd"));
    }

    #[test]
    fn test_change_convention_on_collection_getter() {
        let node = ClassInstance::instance("TagBox").with_handler("onTagsChange", method("onTagsChanged"));
        let code = compile_with(&node, Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &Statement::expr(CodeValue::call(
                CodeValue::call(CodeValue::var("tagBox0"), "getTags", vec![]),
                "addListener",
                vec![CodeValue::method_reference(controller(), "onTagsChanged")],
            ))
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // LISTENERS DECLARING CHECKED EXCEPTIONS
    // ═══════════════════════════════════════════════════════════════════════════════

    fn rethrowing_listener(parameters: &[&str], method: &str) -> CodeValue {
        let args = parameters.iter().map(|parameter| CodeValue::var(*parameter)).collect();
        CodeValue::arrow(
            parameters.iter().map(|parameter| parameter.to_string()).collect(),
            LambdaBody::Block(Block::new(vec![rethrow(Statement::expr(CodeValue::call(
                controller(),
                method,
                args,
            )))])),
        )
    }

    #[test]
    fn test_property_change_listener_rethrows_checked_exception() {
        let node = ClassInstance::instance("Label").with_handler("onTextChange", method("onTextSaved"));
        let code = compile_with(&node, Some(CONTROLLER)).unwrap();

        assert_eq!(
            code.statements.last().unwrap(),
            &Statement::expr(CodeValue::call(
                CodeValue::call(CodeValue::var("label0"), "textProperty", vec![]),
                "addListener",
                vec![rethrowing_listener(&["observable", "oldValue", "newValue"], "onTextSaved")],
            ))
        );
    }

    #[test]
    fn test_container_listener_rethrows_checked_exception() {
        let code = compile_with(&tag_box_listening("onTagsSaved"), Some(CONTROLLER)).unwrap();
        assert_eq!(
            code.statements.last().unwrap(),
            &Statement::expr(CodeValue::call(
                CodeValue::call(CodeValue::var("tagBox0"), "getTags", vec![]),
                "addListener",
                vec![rethrowing_listener(&["change"], "onTagsSaved")],
            ))
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::bind::BindExpression;
    use crate::code::{CodeType, CodeValue, Literal, Statement};
    use crate::document::{CONTROLLER_NAME, RESOURCES_NAME};
    use crate::error::CompileError;
    use crate::markup::{Attribute, Child, ClassInstance, PropertyElement, Value};
    use crate::test_fixtures::*;

    fn call(receiver: &str, method: &str, args: Vec<CodeValue>) -> Statement {
        Statement::expr(CodeValue::call(CodeValue::var(receiver), method, args))
    }

    fn call_on_getter(receiver: &str, getter: &str, method: &str, args: Vec<CodeValue>) -> Statement {
        Statement::expr(CodeValue::call(
            CodeValue::call(CodeValue::var(receiver), getter, vec![]),
            method,
            args,
        ))
    }

    fn new_object(ty: &str, identifier: &str, args: Vec<CodeValue>) -> Statement {
        Statement::declare(CodeType::class(ty), identifier, CodeValue::new_instance(CodeType::class(ty), args))
    }

    fn static_property(class: &str, property: &str, value: Value) -> Attribute {
        Attribute::Static {
            class: class.to_string(),
            property: property.to_string(),
            value,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // SETTERS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_default_property_receives_body_text() {
        let node = ClassInstance::instance("Button").with_body(Value::literal("Click"));
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements,
            vec![
                Statement::LineBreak,
                new_object(BUTTON, "button0", vec![]),
                call("button0", "setText", vec![CodeValue::str("Click")]),
            ]
        );
    }

    #[test]
    fn test_enum_and_boolean_setters() {
        let node = ClassInstance::instance("VBox").with_property("alignment", Value::literal("CENTER"));
        let code = compile(&node).unwrap();
        assert_eq!(
            code.statements[2],
            call(
                "vBox0",
                "setAlignment",
                vec![CodeValue::Enum {
                    ty: CodeType::class(POS),
                    constant: "CENTER".to_string(),
                }],
            )
        );

        let node = ClassInstance::instance("CheckBox").with_property("selected", Value::literal("true"));
        let code = compile(&node).unwrap();
        assert_eq!(
            code.statements[2],
            call("checkBox0", "setSelected", vec![CodeValue::Literal(Literal::Bool(true))])
        );
    }

    #[test]
    fn test_properties_apply_in_markup_order() {
        let node = ClassInstance::instance("VBox")
            .with_property("opacity", Value::literal("0.5"))
            .with_property("visible", Value::literal("false"));
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements[2..],
            [
                call("vBox0", "setOpacity", vec![CodeValue::Literal(Literal::Double(0.5))]),
                call("vBox0", "setVisible", vec![CodeValue::Literal(Literal::Bool(false))]),
            ]
        );
    }

    #[test]
    fn test_resource_value_in_constructor() {
        let node = ClassInstance::instance("Label").with_property("text", Value::Resource("greeting".to_string()));
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements[1],
            new_object(
                LABEL,
                "label0",
                vec![CodeValue::call(
                    CodeValue::var(RESOURCES_NAME),
                    "getString",
                    vec![CodeValue::str("greeting")],
                )],
            )
        );
    }

    #[test]
    fn test_element_goes_through_setter() {
        let insets = ClassInstance::instance("Insets").with_property("topRightBottomLeft", Value::literal("5"));
        let node = ClassInstance::instance("VBox").with_child(Child::Property {
            property: "padding".to_string(),
            value: Value::element(insets),
        });
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements,
            vec![
                Statement::LineBreak,
                new_object(VBOX, "vBox0", vec![]),
                Statement::LineBreak,
                new_object(INSETS, "insets0", vec![CodeValue::Literal(Literal::Double(5.0))]),
                call("vBox0", "setPadding", vec![CodeValue::var("insets0")]),
            ]
        );
    }

    #[test]
    fn test_element_of_wrong_type_for_setter() {
        let node = ClassInstance::instance("VBox").with_child(Child::Property {
            property: "padding".to_string(),
            value: Value::element(ClassInstance::instance("Label")),
        });
        let err = compile(&node).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::TypeMismatch { .. }));
    }

    #[test]
    fn test_no_default_property() {
        let node = ClassInstance::instance("javafx.scene.effect.DropShadow").with_object(ClassInstance::instance("Label"));
        let err = compile(&node).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::NoDefaultProperty { .. }));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // COLLECTIONS AND MAPS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_literal_list_is_appended() {
        let node = ClassInstance::instance("Label").with_property("styleClass", Value::literal("title,  big"));
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements[2..],
            [
                call_on_getter("label0", "getStyleClass", "add", vec![CodeValue::str("title")]),
                call_on_getter("label0", "getStyleClass", "add", vec![CodeValue::str("big")]),
            ]
        );
    }

    #[test]
    fn test_read_only_collection_rejects_reference() {
        let node = ClassInstance::instance("Label").with_property("styleClass", Value::Reference("x".to_string()));
        let err = compile(&node).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            CompileError::ReadOnlyProperty { property, .. } if property == "styleClass"
        ));
    }

    #[test]
    fn test_map_entries_on_property() {
        let node = ClassInstance::instance("TagBox").with_child(Child::Property {
            property: "limits".to_string(),
            value: Value::Property(Box::new(PropertyElement {
                property: "max".to_string(),
                value: Value::literal("5"),
            })),
        });
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements[2],
            call_on_getter(
                "tagBox0",
                "getLimits",
                "put",
                vec![CodeValue::str("max"), CodeValue::Literal(Literal::Int(5))],
            )
        );
    }

    #[test]
    fn test_map_bounds_come_from_controller_declaration() {
        let node = ClassInstance::instance("HashMap")
            .with_id("limits")
            .with_property("a", Value::literal("1"));

        let typed = compile_with(&node, Some(CONTROLLER)).unwrap();
        assert_eq!(
            typed.statements,
            vec![
                Statement::LineBreak,
                new_object(HASH_MAP, "limits", vec![]),
                Statement::expr(CodeValue::assign(
                    CodeValue::field(CodeValue::var(CONTROLLER_NAME), "limits"),
                    CodeValue::var("limits"),
                )),
                call("limits", "put", vec![CodeValue::str("a"), CodeValue::Literal(Literal::Int(1))]),
            ]
        );

        let untyped = compile(&node).unwrap();
        assert_eq!(
            untyped.statements.last().unwrap(),
            &call("limits", "put", vec![CodeValue::str("a"), CodeValue::str("1")])
        );
    }

    #[test]
    fn test_collection_content() {
        let node = ClassInstance::instance("ArrayList")
            .with_id("items")
            .with_body(Value::literal("x"));
        let code = compile_with(&node, Some(CONTROLLER)).unwrap();
        assert_eq!(code.statements.last().unwrap(), &call("items", "add", vec![CodeValue::str("x")]));
    }

    #[test]
    fn test_default_content_compiles_identically_twice() {
        let map = ClassInstance::instance("HashMap")
            .with_id("limits")
            .with_body(Value::Property(Box::new(PropertyElement {
                property: "a".to_string(),
                value: Value::literal("1"),
            })));
        let list = ClassInstance::instance("ArrayList")
            .with_object(ClassInstance::instance("Label"))
            .with_object(ClassInstance::instance("Button"));

        let first = compile_with(&map, Some(CONTROLLER)).unwrap();
        assert_eq!(first, compile_with(&map, Some(CONTROLLER)).unwrap());
        assert_eq!(
            first.statements.last().unwrap(),
            &call("limits", "put", vec![CodeValue::str("a"), CodeValue::Literal(Literal::Int(1))])
        );

        let first = compile(&list).unwrap();
        assert_eq!(first, compile(&list).unwrap());
        let adds: Vec<&Statement> = first
            .statements
            .iter()
            .filter(|statement| matches!(statement, Statement::Expression(_)))
            .collect();
        assert_eq!(
            adds,
            [
                &call("arrayList0", "add", vec![CodeValue::var("label0")]),
                &call("arrayList0", "add", vec![CodeValue::var("button0")]),
            ]
        );
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // STATIC PROPERTIES
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_static_property_attribute() {
        let node = ClassInstance::instance("Label").with_attribute(static_property("VBox", "vgrow", Value::literal("ALWAYS")));
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements[2],
            Statement::expr(CodeValue::static_call(
                CodeType::class(VBOX),
                "setVgrow",
                vec![
                    CodeValue::var("label0"),
                    CodeValue::Enum {
                        ty: CodeType::class(PRIORITY),
                        constant: "ALWAYS".to_string(),
                    },
                ],
            ))
        );
    }

    #[test]
    fn test_static_property_element() {
        let insets = ClassInstance::instance("Insets").with_property("topRightBottomLeft", Value::literal("2"));
        let node = ClassInstance::instance("Label").with_child(Child::StaticProperty {
            class: "VBox".to_string(),
            property: "margin".to_string(),
            value: Value::element(insets),
        });
        let code = compile(&node).unwrap();

        assert_eq!(
            code.statements.last().unwrap(),
            &Statement::expr(CodeValue::static_call(
                CodeType::class(VBOX),
                "setMargin",
                vec![CodeValue::var("label0"), CodeValue::var("insets0")],
            ))
        );
    }

    #[test]
    fn test_static_property_on_incompatible_node() {
        let node = ClassInstance::instance("javafx.scene.effect.DropShadow")
            .with_attribute(static_property("VBox", "vgrow", Value::literal("ALWAYS")));
        let err = compile(&node).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::TypeMismatch { .. }));
    }

    #[test]
    fn test_unknown_static_property() {
        let node = ClassInstance::instance("Label").with_attribute(static_property("VBox", "hgrow", Value::literal("ALWAYS")));
        let err = compile(&node).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::UnknownProperty { property, .. } if property == "hgrow"));
    }

    // ═══════════════════════════════════════════════════════════════════════════════
    // BINDINGS
    // ═══════════════════════════════════════════════════════════════════════════════

    #[test]
    fn test_expression_binds_property() {
        let label = ClassInstance::instance("Label").with_property(
            "opacity",
            Value::Expression(BindExpression::variable("slider").read("value")),
        );
        let node = ClassInstance::instance("VBox")
            .with_object(ClassInstance::instance("Slider").with_id("slider"))
            .with_object(label);
        let code = compile(&node).unwrap();

        let label_start = code
            .statements
            .iter()
            .position(|statement| statement.declared_identifier() == Some("label0"))
            .unwrap();
        assert_eq!(
            code.statements[label_start..],
            [
                new_object(LABEL, "label0", vec![]),
                Statement::declare(
                    CodeType::class(DOUBLE_PROPERTY),
                    "doubleProperty0",
                    CodeValue::call(CodeValue::var("slider"), "valueProperty", vec![]),
                ),
                call_on_getter("label0", "opacityProperty", "bind", vec![CodeValue::var("doubleProperty0")]),
                Statement::expr(CodeValue::call(
                    CodeValue::call(CodeValue::var("vBox0"), "getChildren", vec![]),
                    "add",
                    vec![CodeValue::var("label0")],
                )),
            ]
        );
    }

    #[test]
    fn test_expression_on_property_without_accessor() {
        let node = ClassInstance::instance("VBox")
            .with_object(ClassInstance::instance("Slider").with_id("slider"))
            .with_object(ClassInstance::instance("Button").with_property(
                "onAction",
                Value::Expression(BindExpression::variable("slider")),
            ));
        let err = compile(&node).unwrap_err();
        assert!(matches!(err.root_cause(), CompileError::UnknownProperty { property, .. } if property == "onAction"));
    }
}

//! A small JavaFX-shaped type universe shared by the unit tests.

use std::sync::Arc;

use crate::error::Result;
use crate::introspect::{well_known, ClassInfo, FieldInfo, JavaType, MetadataTable, MethodInfo, ParameterInfo, Primitive, Visibility};
use crate::markup::ClassInstance;
use crate::node::{compile_node, NoIncludes, NodeCode};
use crate::resolver::Resolvers;

pub const NODE: &str = "javafx.scene.Node";
pub const PANE: &str = "javafx.scene.layout.Pane";
pub const VBOX: &str = "javafx.scene.layout.VBox";
pub const INSETS: &str = "javafx.geometry.Insets";
pub const POS: &str = "javafx.geometry.Pos";
pub const PRIORITY: &str = "javafx.scene.layout.Priority";
pub const LABEL: &str = "javafx.scene.control.Label";
pub const BUTTON: &str = "javafx.scene.control.Button";
pub const SLIDER: &str = "javafx.scene.control.Slider";
pub const CHECK_BOX: &str = "javafx.scene.control.CheckBox";
pub const COLOR: &str = "javafx.scene.paint.Color";
pub const DROP_SHADOW: &str = "javafx.scene.effect.DropShadow";
pub const ACTION_EVENT: &str = "javafx.event.ActionEvent";
pub const STRING_PROPERTY: &str = "javafx.beans.property.StringProperty";
pub const DOUBLE_PROPERTY: &str = "javafx.beans.property.DoubleProperty";
pub const BOOLEAN_PROPERTY: &str = "javafx.beans.property.BooleanProperty";
pub const DOUBLE_BINDING: &str = "javafx.beans.binding.DoubleBinding";
pub const INTEGER_PROPERTY: &str = "javafx.beans.property.IntegerProperty";
pub const INTEGER_BINDING: &str = "javafx.beans.binding.IntegerBinding";
pub const NUMBER_BINDING: &str = "javafx.beans.binding.NumberBinding";
pub const OBSERVABLE_NUMBER: &str = "javafx.beans.value.ObservableNumberValue";
pub const BOOLEAN_BINDING: &str = "javafx.beans.binding.BooleanBinding";
pub const STRING_EXPRESSION: &str = "javafx.beans.binding.StringExpression";
pub const OBJECT_BINDING: &str = "javafx.beans.binding.ObjectBinding";
pub const FX_COLLECTIONS: &str = "javafx.collections.FXCollections";
pub const ARRAY_LIST: &str = "java.util.ArrayList";
pub const HASH_MAP: &str = "java.util.HashMap";
pub const IO_EXCEPTION: &str = "java.io.IOException";
pub const TAG_BOX: &str = "com.example.TagBox";
pub const GAUGE: &str = "com.example.Gauge";
pub const BADGE: &str = "com.example.Badge";
pub const CONTROLLER: &str = "com.example.MainController";
pub const VIEW_CONTROLLER: &str = "com.example.ViewController";

pub const IMPORTS: [&str; 7] = [
    "java.lang.*",
    "java.util.*",
    "javafx.geometry.*",
    "javafx.scene.control.*",
    "javafx.scene.layout.*",
    "javafx.scene.paint.*",
    "com.example.*",
];

pub fn class(name: &str) -> JavaType {
    JavaType::class(name)
}

pub fn double() -> JavaType {
    JavaType::primitive(Primitive::Double)
}

pub fn boolean() -> JavaType {
    JavaType::primitive(Primitive::Boolean)
}

pub fn int() -> JavaType {
    JavaType::primitive(Primitive::Int)
}

pub fn observable_list(element: JavaType) -> JavaType {
    JavaType::parameterized(well_known::OBSERVABLE_LIST, vec![element])
}

fn getter(name: &str, ty: JavaType) -> MethodInfo {
    MethodInfo::new(name, vec![], ty)
}

fn setter(name: &str, ty: JavaType) -> MethodInfo {
    MethodInfo::new(name, vec![ty], JavaType::void())
}

fn interface(name: &str) -> ClassInfo {
    ClassInfo::builder(name).interface().build()
}

fn sub_interface(name: &str, parent: &str) -> ClassInfo {
    ClassInfo::builder(name).interface().implements(parent).build()
}

fn abstract_class(name: &str, superclass: &str) -> ClassInfo {
    ClassInfo::builder(name).abstract_().extends(superclass).build()
}

fn language() -> Vec<ClassInfo> {
    vec![
        ClassInfo::builder(well_known::OBJECT).constructor(vec![]).build(),
        ClassInfo::builder(well_known::STRING).constructor(vec![]).build(),
        ClassInfo::builder(well_known::ENUM).abstract_().build(),
        ClassInfo::builder("java.lang.Integer")
            .method(MethodInfo::new("valueOf", vec![JavaType::string()], class("java.lang.Integer")).static_())
            .build(),
        ClassInfo::builder("java.lang.Double")
            .method(MethodInfo::new("valueOf", vec![JavaType::string()], class("java.lang.Double")).static_())
            .build(),
        ClassInfo::builder(well_known::EXCEPTION).build(),
        ClassInfo::builder(well_known::RUNTIME_EXCEPTION).extends(well_known::EXCEPTION).build(),
        ClassInfo::builder("java.lang.IllegalStateException")
            .extends(well_known::RUNTIME_EXCEPTION)
            .build(),
        ClassInfo::builder(well_known::ERROR).build(),
        ClassInfo::builder(IO_EXCEPTION).extends(well_known::EXCEPTION).build(),
        interface(well_known::COLLECTION),
        sub_interface("java.util.List", well_known::COLLECTION),
        sub_interface("java.util.Set", well_known::COLLECTION),
        interface(well_known::MAP),
        ClassInfo::builder(ARRAY_LIST)
            .implements("java.util.List")
            .constructor(vec![])
            .build(),
        ClassInfo::builder(HASH_MAP).implements(well_known::MAP).constructor(vec![]).build(),
        ClassInfo::builder(well_known::RESOURCE_BUNDLE)
            .abstract_()
            .method(MethodInfo::new("getString", vec![JavaType::string()], JavaType::string()))
            .build(),
    ]
}

fn collections() -> Vec<ClassInfo> {
    let element = JavaType::variable("E");
    vec![
        sub_interface(well_known::OBSERVABLE_LIST, "java.util.List"),
        sub_interface(well_known::OBSERVABLE_SET, "java.util.Set"),
        sub_interface(well_known::OBSERVABLE_MAP, well_known::MAP),
        ClassInfo::builder(well_known::LIST_CHANGE).abstract_().build(),
        ClassInfo::builder(well_known::SET_CHANGE).abstract_().build(),
        ClassInfo::builder(well_known::MAP_CHANGE).abstract_().build(),
        ClassInfo::builder(FX_COLLECTIONS)
            .method(MethodInfo::new("observableArrayList", vec![], observable_list(element)).static_())
            .build(),
    ]
}

fn beans() -> Vec<ClassInfo> {
    let observable_boolean = "javafx.beans.value.ObservableBooleanValue";
    let observable_number = OBSERVABLE_NUMBER;
    let observable_string = "javafx.beans.value.ObservableStringValue";
    let bind = || setter("bind", class(well_known::OBSERVABLE_VALUE));

    vec![
        interface(well_known::OBSERVABLE_VALUE),
        sub_interface(observable_boolean, well_known::OBSERVABLE_VALUE),
        sub_interface(observable_number, well_known::OBSERVABLE_VALUE),
        sub_interface(observable_string, well_known::OBSERVABLE_VALUE),
        ClassInfo::builder("javafx.beans.binding.BooleanExpression")
            .abstract_()
            .implements(observable_boolean)
            .method(getter("not", class(BOOLEAN_BINDING)))
            .method(MethodInfo::new("and", vec![class(observable_boolean)], class(BOOLEAN_BINDING)))
            .build(),
        abstract_class(BOOLEAN_BINDING, "javafx.beans.binding.BooleanExpression"),
        ClassInfo::builder(BOOLEAN_PROPERTY)
            .abstract_()
            .extends("javafx.beans.binding.BooleanExpression")
            .method(bind())
            .build(),
        ClassInfo::builder("javafx.beans.binding.DoubleExpression")
            .abstract_()
            .implements(observable_number)
            .method(MethodInfo::new("add", vec![double()], class(DOUBLE_BINDING)))
            .method(MethodInfo::new("add", vec![class(observable_number)], class(DOUBLE_BINDING)))
            .method(MethodInfo::new("multiply", vec![double()], class(DOUBLE_BINDING)))
            .method(getter("negate", class(DOUBLE_BINDING)))
            .method(MethodInfo::new("greaterThan", vec![double()], class(BOOLEAN_BINDING)))
            .build(),
        abstract_class(DOUBLE_BINDING, "javafx.beans.binding.DoubleExpression"),
        ClassInfo::builder(DOUBLE_PROPERTY)
            .abstract_()
            .extends("javafx.beans.binding.DoubleExpression")
            .method(bind())
            .build(),
        ClassInfo::builder("javafx.beans.binding.IntegerExpression")
            .abstract_()
            .implements(observable_number)
            .method(MethodInfo::new("add", vec![int()], class(INTEGER_BINDING)))
            .method(MethodInfo::new("subtract", vec![int()], class(INTEGER_BINDING)))
            .method(MethodInfo::new("multiply", vec![int()], class(INTEGER_BINDING)))
            .method(getter("negate", class(INTEGER_BINDING)))
            .method(MethodInfo::new("greaterThan", vec![int()], class(BOOLEAN_BINDING)))
            .method(MethodInfo::new("greaterThanOrEqualTo", vec![int()], class(BOOLEAN_BINDING)))
            .build(),
        abstract_class(INTEGER_BINDING, "javafx.beans.binding.IntegerExpression"),
        ClassInfo::builder(INTEGER_PROPERTY)
            .abstract_()
            .extends("javafx.beans.binding.IntegerExpression")
            .method(bind())
            .build(),
        sub_interface(NUMBER_BINDING, observable_number),
        ClassInfo::builder(STRING_EXPRESSION)
            .abstract_()
            .implements(observable_string)
            .method(MethodInfo::new("concat", vec![JavaType::object()], class(STRING_EXPRESSION)))
            .method(MethodInfo::new("isEqualTo", vec![JavaType::string()], class(BOOLEAN_BINDING)))
            .build(),
        ClassInfo::builder(STRING_PROPERTY)
            .abstract_()
            .extends(STRING_EXPRESSION)
            .method(bind())
            .build(),
        ClassInfo::builder(OBJECT_BINDING).abstract_().build(),
        ClassInfo::builder(well_known::BINDINGS)
            .method(
                MethodInfo::new("valueAt", vec![class(well_known::OBSERVABLE_LIST), int()], class(OBJECT_BINDING))
                    .static_(),
            )
            .method(MethodInfo::new("not", vec![class(observable_boolean)], class(BOOLEAN_BINDING)).static_())
            .method(MethodInfo::new("negate", vec![class(observable_number)], class(NUMBER_BINDING)).static_())
            .method(
                MethodInfo::new("add", vec![class(observable_number), int()], class(NUMBER_BINDING)).static_(),
            )
            .method(
                MethodInfo::new(
                    "greaterThanOrEqual",
                    vec![class(observable_number), double()],
                    class(BOOLEAN_BINDING),
                )
                .static_(),
            )
            .build(),
    ]
}

fn events() -> Vec<ClassInfo> {
    vec![
        ClassInfo::builder("javafx.event.Event").build(),
        ClassInfo::builder(ACTION_EVENT).extends("javafx.event.Event").build(),
        interface(well_known::EVENT_HANDLER),
    ]
}

fn scene() -> Vec<ClassInfo> {
    let on_action = JavaType::parameterized(well_known::EVENT_HANDLER, vec![JavaType::super_of(class(ACTION_EVENT))]);
    vec![
        ClassInfo::builder(NODE)
            .abstract_()
            .method(setter("setId", JavaType::string()))
            .method(getter("getId", JavaType::string()))
            .method(getter("idProperty", class(STRING_PROPERTY)))
            .method(setter("setOpacity", double()))
            .method(getter("getOpacity", double()))
            .method(getter("opacityProperty", class(DOUBLE_PROPERTY)))
            .method(setter("setVisible", boolean()))
            .method(getter("getVisible", boolean()))
            .method(getter("visibleProperty", class(BOOLEAN_PROPERTY)))
            .method(getter("getStyleClass", observable_list(JavaType::string())))
            .build(),
        abstract_class("javafx.scene.Parent", NODE),
        ClassInfo::builder("javafx.scene.layout.Region")
            .extends("javafx.scene.Parent")
            .constructor(vec![])
            .method(setter("setPadding", class(INSETS)))
            .method(getter("getPadding", class(INSETS)))
            .build(),
        ClassInfo::builder(PANE)
            .extends("javafx.scene.layout.Region")
            .default_property("children")
            .constructor(vec![])
            .method(getter("getChildren", observable_list(class(NODE))))
            .build(),
        ClassInfo::builder(VBOX)
            .extends(PANE)
            .constructor(vec![])
            .constructor(vec![ParameterInfo::named("spacing", double())])
            .method(setter("setSpacing", double()))
            .method(getter("getSpacing", double()))
            .method(getter("spacingProperty", class(DOUBLE_PROPERTY)))
            .method(setter("setAlignment", class(POS)))
            .method(MethodInfo::new("setMargin", vec![class(NODE), class(INSETS)], JavaType::void()).static_())
            .method(MethodInfo::new("setVgrow", vec![class(NODE), class(PRIORITY)], JavaType::void()).static_())
            .build(),
        ClassInfo::builder(PRIORITY).enumeration(&["ALWAYS", "SOMETIMES", "NEVER"]).build(),
        ClassInfo::builder(POS).enumeration(&["CENTER", "TOP_LEFT"]).build(),
        ClassInfo::builder(INSETS)
            .constructor(vec![
                ParameterInfo::named("top", double()),
                ParameterInfo::named("right", double()),
                ParameterInfo::named("bottom", double()),
                ParameterInfo::named("left", double()),
            ])
            .constructor(vec![ParameterInfo::named("topRightBottomLeft", double())])
            .method(getter("getTop", double()))
            .method(getter("getRight", double()))
            .method(getter("getBottom", double()))
            .method(getter("getLeft", double()))
            .build(),
        ClassInfo::builder("javafx.scene.control.Control")
            .abstract_()
            .extends("javafx.scene.layout.Region")
            .build(),
        ClassInfo::builder("javafx.scene.control.Labeled")
            .abstract_()
            .extends("javafx.scene.control.Control")
            .default_property("text")
            .method(setter("setText", JavaType::string()))
            .method(getter("getText", JavaType::string()))
            .method(getter("textProperty", class(STRING_PROPERTY)))
            .method(setter("setAlignment", class(POS)))
            .build(),
        ClassInfo::builder(LABEL)
            .extends("javafx.scene.control.Labeled")
            .constructor(vec![])
            .constructor(vec![ParameterInfo::named("text", JavaType::string())])
            .build(),
        ClassInfo::builder(BUTTON)
            .extends("javafx.scene.control.Labeled")
            .constructor(vec![])
            .constructor(vec![ParameterInfo::unnamed(JavaType::string())])
            .method(setter("setOnAction", on_action))
            .build(),
        ClassInfo::builder(CHECK_BOX)
            .extends("javafx.scene.control.Labeled")
            .constructor(vec![])
            .method(setter("setSelected", boolean()))
            .method(getter("getSelected", boolean()))
            .method(getter("selectedProperty", class(BOOLEAN_PROPERTY)))
            .build(),
        ClassInfo::builder(SLIDER)
            .extends("javafx.scene.control.Control")
            .constructor(vec![])
            .constructor(vec![
                ParameterInfo::named("min", double()),
                ParameterInfo::named("max", double()),
                ParameterInfo::named("value", double()),
            ])
            .method(setter("setValue", double()))
            .method(getter("getValue", double()))
            .method(getter("valueProperty", class(DOUBLE_PROPERTY)))
            .build(),
        ClassInfo::builder(COLOR)
            .method(MethodInfo::new("valueOf", vec![JavaType::string()], class(COLOR)).static_())
            .field(FieldInfo::new("RED", class(COLOR)).static_())
            .build(),
        ClassInfo::builder(DROP_SHADOW)
            .constructor(vec![])
            .constructor(vec![ParameterInfo::unnamed(class(DROP_SHADOW))])
            .method(setter("setRadius", double()))
            .method(getter("getRadius", double()))
            .build(),
    ]
}

fn application() -> Vec<ClassInfo> {
    let string_change = JavaType::parameterized(
        well_known::LIST_CHANGE,
        vec![JavaType::extends(JavaType::string())],
    );
    let integer_change = JavaType::parameterized(
        well_known::LIST_CHANGE,
        vec![JavaType::extends(class("java.lang.Integer"))],
    );
    let observable_string = JavaType::parameterized(
        well_known::OBSERVABLE_VALUE,
        vec![JavaType::extends(JavaType::string())],
    );
    let observable_number = JavaType::parameterized(
        well_known::OBSERVABLE_VALUE,
        vec![JavaType::extends(class("java.lang.Number"))],
    );

    vec![
        ClassInfo::builder(TAG_BOX)
            .extends(PANE)
            .constructor(vec![])
            .method(getter("getTags", observable_list(JavaType::string())))
            .method(getter(
                "getLimits",
                JavaType::parameterized(well_known::OBSERVABLE_MAP, vec![JavaType::string(), class("java.lang.Integer")]),
            ))
            .method(getter("getLabel", class(LABEL)))
            .build(),
        ClassInfo::builder(GAUGE)
            .constructor(vec![
                ParameterInfo::named("min", double()).with_default("0"),
                ParameterInfo::named("max", double()).with_default("100"),
            ])
            .method(getter("getMin", double()))
            .method(getter("getMax", double()))
            .method(setter("setValue", double()))
            .method(getter("getValue", double()))
            .build(),
        ClassInfo::builder(BADGE)
            .constructor(vec![ParameterInfo::named("level", class(PRIORITY))])
            .constructor(vec![ParameterInfo::named("level", int())])
            .method(getter("getLevel", int()))
            .build(),
        ClassInfo::builder(CONTROLLER)
            .constructor(vec![])
            .field(FieldInfo::new("title", class(LABEL)))
            .field(FieldInfo::new("hidden", class(BUTTON)).with_visibility(Visibility::Private))
            .field(FieldInfo::new("items", JavaType::parameterized(ARRAY_LIST, vec![JavaType::string()])))
            .field(FieldInfo::new(
                "limits",
                JavaType::parameterized(HASH_MAP, vec![JavaType::string(), class("java.lang.Integer")]),
            ))
            .method(setter("setOkButton", class(BUTTON)))
            .method(MethodInfo::new("onClick", vec![class(ACTION_EVENT)], JavaType::void()))
            .method(getter("onReset", JavaType::void()))
            .method(MethodInfo::new("onLoad", vec![class(ACTION_EVENT)], JavaType::void()).throws(class(IO_EXCEPTION)))
            .method(getter("onSave", JavaType::void()).throws(class("java.lang.IllegalStateException")))
            .method(getter("onExport", JavaType::void()).throws(class(IO_EXCEPTION)))
            .method(MethodInfo::new(
                "onTextChanged",
                vec![observable_string.clone(), JavaType::string(), JavaType::string()],
                JavaType::void(),
            ))
            .method(MethodInfo::new(
                "onLooseTextChanged",
                vec![observable_number, JavaType::string(), JavaType::string()],
                JavaType::void(),
            ))
            .method(
                MethodInfo::new(
                    "onTextSaved",
                    vec![observable_string, JavaType::string(), JavaType::string()],
                    JavaType::void(),
                )
                .throws(class(IO_EXCEPTION)),
            )
            .method(MethodInfo::new("onTagsSaved", vec![string_change.clone()], JavaType::void()).throws(class(IO_EXCEPTION)))
            .method(MethodInfo::new("onTagsChanged", vec![string_change], JavaType::void()))
            .method(MethodInfo::new("onNumbersChanged", vec![integer_change], JavaType::void()))
            .method(getter("initialize", JavaType::void()))
            .build(),
        ClassInfo::builder("java.lang.Number").abstract_().build(),
        interface(VIEW_CONTROLLER),
    ]
}

pub fn table() -> MetadataTable {
    let mut table = MetadataTable::new();
    for info in language()
        .into_iter()
        .chain(collections())
        .chain(beans())
        .chain(events())
        .chain(scene())
        .chain(application())
    {
        table.insert(info);
    }
    table
}

pub fn resolvers() -> Resolvers {
    Resolvers::new(Arc::new(table()), IMPORTS).expect("fixture imports resolve")
}

/// Compiles a detached node against `controller`, `None` meaning no controller.
pub fn compile_with(node: &ClassInstance, controller: Option<&str>) -> Result<NodeCode> {
    let mut resolvers = resolvers();
    let controller = match controller {
        Some(name) => resolvers.resolve_type(name)?,
        None => JavaType::object(),
    };
    compile_node(node, &controller, &mut resolvers, &NoIncludes)
}

pub fn compile(node: &ClassInstance) -> Result<NodeCode> {
    compile_with(node, None)
}

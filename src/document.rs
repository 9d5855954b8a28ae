//! # Document Compilation
//!
//! Drives one markup document through the node processor and assembles the builder plan: the body of the
//! generated builder's `build` method plus what is needed to declare the builder class around it.
//!
//! ## Key Invariants
//!
//! 1. **Controller discovery**: `fx:controller` on the root node wins, then the `fx2jControllerType`
//!    processing instruction, then `java.lang.Object`, which means "no controller".
//! 2. **Build order**: `setController(...)`, the root node's statements, `setRoot(root)`, then
//!    `controller.initialize()` when the controller declares it.
//! 3. **Fresh resolvers per document**: included documents never share caches or names with their includer.
//! 4. **Acyclic includes**: a document that includes itself, directly or transitively, fails with
//!    [`CompileError::IncludeCycle`].

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::code::{CodeValue, Statement};
use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::introspect::{Introspector, JavaType};
use crate::markup::Document;
use crate::name_resolver::delimited_to_capitalized;
use crate::node::{compile_node, IncludeCompiler, IncludedUnit};
use crate::resolver::Resolvers;

pub const CONTROLLER_NAME: &str = "controller";
pub const RESOURCES_NAME: &str = "resources";
pub const CONTROLLER_FACTORY_NAME: &str = "controllerFactory";
pub const BUILDER_PROVIDED_CONTROLLER_NAME: &str = "builderProvidedController";
pub const BUILDER_PROVIDED_ROOT_NAME: &str = "builderProvidedRoot";

/// Processing instruction naming the controller type when the root carries no `fx:controller`.
pub const CONTROLLER_TYPE_INSTRUCTION: &str = "fx2jControllerType";

const MARKUP_EXTENSION: &str = ".fxml";
const BUILDER_SUFFIX: &str = "Builder";
const INITIALIZE: &str = "initialize";

/// Everything needed to emit the builder class for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderPlan {
    pub package: String,
    pub class_name: String,
    pub controller_type: JavaType,
    /// Boxed when the root node is a primitive value.
    pub root_type: JavaType,
    /// Whether `setController` may fall back to `new Controller()`.
    pub controller_default_constructible: bool,
    pub root_identifier: String,
    pub build: Vec<Statement>,
}

impl BuilderPlan {
    pub fn binary_name(&self) -> String {
        if self.package.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.package, self.class_name)
        }
    }

    pub fn included_unit(&self) -> IncludedUnit {
        IncludedUnit {
            builder: self.binary_name(),
            root_type: self.root_type.clone(),
            controller_type: self.controller_type.clone(),
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn load_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| CompileError::json(path, e))
}

/// Controller class named by the document, if any.
pub fn controller_class_name(document: &Document) -> Option<&str> {
    document
        .root
        .controller()
        .or_else(|| document.custom(CONTROLLER_TYPE_INSTRUCTION))
}

/// `main-view.fxml` → `MainViewBuilder`
pub fn builder_class_name(markup_name: &str) -> String {
    let stem = markup_name.replace(MARKUP_EXTENSION, "");
    format!("{}{}", delimited_to_capitalized(&stem), BUILDER_SUFFIX)
}

/// `root_package` followed by the lower-cased directories of `relative_dir`.
pub fn builder_package(relative_dir: &Path, root_package: &str) -> String {
    let relative: Vec<String> = relative_dir
        .components()
        .map(|component| component.as_os_str().to_string_lossy().to_lowercase())
        .filter(|part| !part.is_empty() && part != ".")
        .collect();
    std::iter::once(root_package.to_string())
        .filter(|package| !package.is_empty())
        .chain(relative)
        .collect::<Vec<_>>()
        .join(".")
}

/// Serialized tree of a markup file referenced by `fx:include` from a document in `base`.
pub fn include_tree_path(base: &Path, source: &Path, config: &CompilerConfig) -> PathBuf {
    let markup = base.join(source);
    let name = markup.to_string_lossy();
    if name.ends_with(&config.document_suffix) {
        markup
    } else {
        PathBuf::from(format!("{}{}", name, config.tree_extension()))
    }
}

/// Text of every document `path` includes, transitively and in document order, each preceded by its path.
///
/// An unreadable include contributes only its path, so it changes the result once it appears.
pub fn included_sources(path: &Path, document: &Document, config: &CompilerConfig) -> String {
    let mut visited = HashSet::from([canonical(path)]);
    let mut text = String::new();
    collect_included_sources(path, document, config, &mut visited, &mut text);
    text
}

fn collect_included_sources(
    path: &Path,
    document: &Document,
    config: &CompilerConfig,
    visited: &mut HashSet<PathBuf>,
    text: &mut String,
) {
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for source in document.root.include_sources() {
        let include = include_tree_path(base, source, config);
        if !visited.insert(canonical(&include)) {
            continue;
        }
        text.push('\0');
        text.push_str(&include.to_string_lossy());
        text.push('\0');
        let Ok(included_text) = fs::read_to_string(&include) else {
            continue;
        };
        text.push_str(&included_text);
        if let Ok(included) = serde_json::from_str::<Document>(&included_text) {
            collect_included_sources(&include, &included, config, visited, text);
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

// ═══════════════════════════════════════════════════════════════════════════════
// DRIVER
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles documents and the documents they include.
///
/// Holds per-run include state, so one driver serves one thread.
pub struct DocumentCompiler {
    introspector: Arc<dyn Introspector>,
    config: CompilerConfig,
    in_progress: RefCell<Vec<PathBuf>>,
    included: RefCell<HashMap<PathBuf, IncludedUnit>>,
}

impl DocumentCompiler {
    pub fn new(introspector: Arc<dyn Introspector>, config: &CompilerConfig) -> Self {
        DocumentCompiler {
            introspector,
            config: config.clone(),
            in_progress: RefCell::new(Vec::new()),
            included: RefCell::new(HashMap::new()),
        }
    }

    pub fn compile_file(&self, path: &Path) -> Result<BuilderPlan> {
        let document = load_document(path)?;
        self.compile_document(path, &document)
    }

    /// Compiles an already loaded document. `path` locates it for naming and include resolution.
    pub fn compile_document(&self, path: &Path, document: &Document) -> Result<BuilderPlan> {
        let key = canonical(path);
        if self.in_progress.borrow().contains(&key) {
            return Err(CompileError::IncludeCycle { path: path.to_path_buf() });
        }

        self.in_progress.borrow_mut().push(key);
        let result = self.compile_unit(path, document);
        self.in_progress.borrow_mut().pop();
        result
    }

    fn compile_unit(&self, path: &Path, document: &Document) -> Result<BuilderPlan> {
        info!(document = %path.display(), "compiling document");
        let mut resolvers = Resolvers::new(self.introspector.clone(), document.imports())?;

        let controller_type = match controller_class_name(document) {
            Some(name) => resolvers.resolve_type(name)?,
            None => JavaType::object(),
        };

        let code = compile_node(&document.root, &controller_type, &mut resolvers, self)?;
        let root_type = resolvers.types.wrap(&code.ty);

        let mut build = vec![Statement::expr(CodeValue::call(
            CodeValue::var("this"),
            "setController",
            vec![
                CodeValue::var(BUILDER_PROVIDED_CONTROLLER_NAME),
                CodeValue::var(CONTROLLER_FACTORY_NAME),
            ],
        ))];
        build.extend(code.statements);
        build.push(Statement::LineBreak);
        build.push(Statement::expr(CodeValue::call(
            CodeValue::var("this"),
            "setRoot",
            vec![CodeValue::var(code.identifier.clone())],
        )));

        if !controller_type.is_object() {
            if let Some(initialize) =
                resolvers
                    .methods
                    .find_method_required_public_if_exists(&controller_type, INITIALIZE, &[])?
            {
                build.push(Statement::expr(CodeValue::call(
                    CodeValue::var(CONTROLLER_NAME),
                    initialize.name.clone(),
                    Vec::new(),
                )));
            }
        }

        let plan = BuilderPlan {
            package: self.package_of(path),
            class_name: self.class_name_of(path),
            controller_default_constructible: self.is_default_constructible(&resolvers, &controller_type),
            controller_type,
            root_type,
            root_identifier: code.identifier,
            build,
        };
        info!(document = %path.display(), builder = %plan.binary_name(), "compiled document");
        Ok(plan)
    }

    fn is_default_constructible(&self, resolvers: &Resolvers, controller: &JavaType) -> bool {
        let Some(info) = resolvers
            .types
            .raw_class_name(controller)
            .and_then(|name| resolvers.types.class_info(&name))
        else {
            return false;
        };
        !info.is_interface() && !info.is_abstract && resolvers.methods.has_default_constructor(controller)
    }

    fn package_of(&self, path: &Path) -> String {
        let directory = canonical(path.parent().unwrap_or_else(|| Path::new("")));
        let root = canonical(&self.config.resource_root);
        let relative = directory.strip_prefix(&root).unwrap_or_else(|_| Path::new(""));
        builder_package(relative, &self.config.root_package)
    }

    fn class_name_of(&self, path: &Path) -> String {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        builder_class_name(self.config.markup_name(&file_name))
    }

    fn include_path(&self, source: &Path) -> PathBuf {
        let base = self
            .in_progress
            .borrow()
            .last()
            .and_then(|current| current.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| self.config.resource_root.clone());
        include_tree_path(&base, source, &self.config)
    }
}

impl IncludeCompiler for DocumentCompiler {
    fn compile_include(&self, source: &Path) -> Result<IncludedUnit> {
        let path = self.include_path(source);
        let key = canonical(&path);
        if let Some(unit) = self.included.borrow().get(&key) {
            return Ok(unit.clone());
        }

        debug!(include = %path.display(), "compiling included document");
        let unit = self.compile_file(&path)?.included_unit();
        self.included.borrow_mut().insert(key, unit.clone());
        Ok(unit)
    }
}

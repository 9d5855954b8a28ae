//! Whole-project compilation.
//!
//! ## Key Invariants
//!
//! 1. **Independent units**: every document is compiled on its own driver with its own resolvers. A failing
//!    document never affects another one.
//! 2. **Deterministic report**: units are reported in discovery order regardless of scheduling.
//! 3. **Include-aware cache**: a cached plan is reused only while the document and every tree it includes are
//!    unchanged.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::cache::IncrementalCache;
use crate::config::CompilerConfig;
use crate::discovery::{find_documents, relative_path};
use crate::document::{included_sources, BuilderPlan, DocumentCompiler};
use crate::error::{CompileError, Result};
use crate::introspect::{Introspector, MetadataTable};
use crate::markup::Document;

/// Outcome of one document.
#[derive(Debug)]
pub struct UnitReport {
    pub document: PathBuf,
    pub result: Result<BuilderPlan>,
    pub cached: bool,
}

#[derive(Debug, Default)]
pub struct ProjectReport {
    pub units: Vec<UnitReport>,
}

impl ProjectReport {
    pub fn plans(&self) -> impl Iterator<Item = (&Path, &BuilderPlan)> {
        self.units
            .iter()
            .filter_map(|unit| unit.result.as_ref().ok().map(|plan| (unit.document.as_path(), plan)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &CompileError)> {
        self.units
            .iter()
            .filter_map(|unit| unit.result.as_ref().err().map(|error| (unit.document.as_path(), error)))
    }

    pub fn has_failures(&self) -> bool {
        self.units.iter().any(|unit| unit.result.is_err())
    }
}

/// Merges every configured metadata table, later tables overriding earlier ones.
pub fn load_metadata(paths: &[PathBuf]) -> Result<MetadataTable> {
    let mut table = MetadataTable::new();
    for path in paths {
        table.merge(MetadataTable::load(path)?);
    }
    Ok(table)
}

pub fn compile_project(config: &CompilerConfig, introspector: Arc<dyn Introspector>) -> ProjectReport {
    let documents = find_documents(&config.resource_root, &config.document_suffix);
    info!(count = documents.len(), root = %config.resource_root.display(), "compiling project");

    let cache = config.use_cache.then(|| {
        IncrementalCache::new(
            &config.cache_dir,
            IncrementalCache::fingerprint_files(&config.metadata),
        )
    });

    let units: Vec<UnitReport> = documents
        .par_iter()
        .map(|document| compile_unit(config, introspector.clone(), cache.as_ref(), document))
        .collect();

    for unit in &units {
        if let Err(error) = &unit.result {
            error!(document = %unit.document.display(), %error, "document failed");
        }
    }
    ProjectReport { units }
}

fn compile_unit(
    config: &CompilerConfig,
    introspector: Arc<dyn Introspector>,
    cache: Option<&IncrementalCache>,
    document: &Path,
) -> UnitReport {
    let source = match fs::read_to_string(document) {
        Ok(source) => source,
        Err(e) => {
            return UnitReport {
                document: document.to_path_buf(),
                result: Err(CompileError::io(document, e)),
                cached: false,
            }
        }
    };

    let tree = match serde_json::from_str::<Document>(&source) {
        Ok(tree) => tree,
        Err(e) => {
            return UnitReport {
                document: document.to_path_buf(),
                result: Err(CompileError::json(document, e)),
                cached: false,
            }
        }
    };

    // Included trees are part of the plan, so their text is part of the key.
    let key = relative_path(document, &config.resource_root);
    let cache_source = cache.map(|_| format!("{}{}", source, included_sources(document, &tree, config)));
    if let Some(plan) = cache
        .zip(cache_source.as_deref())
        .and_then(|(cache, cache_source)| cache.get(&key, cache_source))
    {
        return UnitReport {
            document: document.to_path_buf(),
            result: Ok(plan),
            cached: true,
        };
    }

    let result = DocumentCompiler::new(introspector, config).compile_document(document, &tree);

    if let (Some(cache), Some(cache_source), Ok(plan)) = (cache, cache_source.as_deref(), &result) {
        cache.set(&key, cache_source, plan);
    }
    UnitReport {
        document: document.to_path_buf(),
        result,
        cached: false,
    }
}

/// Writes one `<binary name>.json` per compiled plan and returns the written paths.
pub fn write_plans(report: &ProjectReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| CompileError::io(output_dir, e))?;
    let mut written = Vec::new();
    for (_, plan) in report.plans() {
        let path = output_dir.join(format!("{}.json", plan.binary_name()));
        let json = plan.to_json_string().map_err(|e| CompileError::json(&path, e))?;
        fs::write(&path, json).map_err(|e| CompileError::io(&path, e))?;
        written.push(path);
    }
    Ok(written)
}

//! Emission order and output writing.
//!
//! Backends render types in [`emission_order`]: every type follows the types
//! it depends on, except across back-references, which the backend declares
//! with whatever forward-reference support its language has.

use crate::error::{Error, Result};
use crate::ir::{Field, Model, TypeId};
use crate::options::FieldOrder;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Types in dependency order.
///
/// Depth-first post-order over dependencies, starting from each type in arena
/// order. Back-reference edges and edges into a type still being visited are
/// skipped, so the result is the same on every run.
pub fn emission_order(model: &Model) -> Vec<TypeId> {
    let mut marks = vec![Mark::Unvisited; model.types().len()];
    let mut order = Vec::with_capacity(marks.len());
    for ty in model.types() {
        visit(model, ty.id, &mut marks, &mut order);
    }
    order
}

fn visit(model: &Model, id: TypeId, marks: &mut [Mark], order: &mut Vec<TypeId>) {
    if marks[id.index()] != Mark::Unvisited {
        return;
    }
    marks[id.index()] = Mark::Visiting;
    for dependency in model.dependencies(id) {
        if !dependency.back_reference {
            visit(model, dependency.id, marks, order);
        }
    }
    marks[id.index()] = Mark::Done;
    order.push(id);
}

/// Types that mention themselves or a type emitted after them.
pub fn forward_references(model: &Model, order: &[TypeId]) -> Vec<TypeId> {
    let mut position = vec![0; model.types().len()];
    for (i, id) in order.iter().enumerate() {
        position[id.index()] = i;
    }
    order
        .iter()
        .copied()
        .filter(|id| {
            model
                .dependencies(*id)
                .iter()
                .any(|dep| position[dep.id.index()] >= position[id.index()])
        })
        .collect()
}

/// Fields in output order.
///
/// Declared order, unless required-first ordering is requested or the target
/// needs parameters with defaults to trail; both move defaulted fields after
/// the rest, keeping relative order.
pub fn order_fields(fields: &[Field], order: FieldOrder, defaults_last: bool) -> Vec<&Field> {
    let mut ordered: Vec<&Field> = fields.iter().collect();
    if order == FieldOrder::RequiredFirst || defaults_last {
        ordered.sort_by_key(|f| f.has_default());
    }
    ordered
}

/// Replace `path` with `contents` in one step.
///
/// Writes a temporary file beside the target and renames it into place, so a
/// failed write leaves any previous file untouched.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let io = |source: std::io::Error| Error::EmissionIo {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if !parent.exists() {
        tracing::debug!(dir = %parent.display(), "creating output directory");
        fs::create_dir_all(parent).map_err(io)?;
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(io)?;
    temp.write_all(contents.as_bytes()).map_err(io)?;
    temp.as_file().sync_all().map_err(io)?;
    temp.persist(path).map_err(|e| io(e.error))?;

    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote generated model");
    Ok(())
}

//! Import edges.
//!
//! Every imported specifier becomes a pseudo-module symbol plus an `import`
//! edge from the importing file's module. Pseudo-module ids depend on the
//! specifier alone, so files that import the same thing meet at one node
//! without any coordination.

use crate::error::Result;
use crate::facts::{EdgeKind, Symbol};
use crate::indexer::ast::{Import, ImportFrom};
use crate::indexer::emitter::FactEmitter;

/// Specifiers of `import a.b, c`, one per imported module
pub fn import_specifiers(import: &Import) -> Vec<String> {
    import.names.clone()
}

/// Specifier of a `from` import: the module path followed by one `.` per
/// relative level (`from ..pkg import x` gives `pkg..`).
pub fn from_specifier(import: &ImportFrom) -> String {
    let mut specifier = import.module.clone().unwrap_or_default();
    specifier.push_str(&".".repeat(import.level));
    specifier
}

pub(crate) fn emit_import(
    emitter: &mut FactEmitter<'_>,
    import: &Import,
    module_id: &str,
    language: &str,
) -> Result<()> {
    for specifier in import_specifiers(import) {
        emit_specifier(emitter, specifier, module_id, language)?;
    }
    Ok(())
}

pub(crate) fn emit_import_from(
    emitter: &mut FactEmitter<'_>,
    import: &ImportFrom,
    module_id: &str,
    language: &str,
) -> Result<()> {
    emit_specifier(emitter, from_specifier(import), module_id, language)
}

fn emit_specifier(
    emitter: &mut FactEmitter<'_>,
    specifier: String,
    module_id: &str,
    language: &str,
) -> Result<()> {
    let target = Symbol::pseudo_module(specifier, language);
    let target_id = target.id.clone();
    emitter.symbol(target)?;
    emitter.edge(module_id, EdgeKind::Import, &target_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(module: Option<&str>, level: usize) -> ImportFrom {
        ImportFrom {
            module: module.map(str::to_string),
            level,
        }
    }

    #[test]
    fn test_from_specifier_absolute() {
        assert_eq!(from_specifier(&from(Some("os.path"), 0)), "os.path");
    }

    #[test]
    fn test_from_specifier_relative_appends_levels() {
        assert_eq!(from_specifier(&from(Some("utils"), 1)), "utils.");
        assert_eq!(from_specifier(&from(Some("pkg.mod"), 2)), "pkg.mod..");
    }

    #[test]
    fn test_from_specifier_bare_relative() {
        assert_eq!(from_specifier(&from(None, 1)), ".");
        assert_eq!(from_specifier(&from(None, 3)), "...");
    }

    #[test]
    fn test_import_specifiers_one_per_name() {
        let import = Import {
            names: vec!["os".to_string(), "xml.etree".to_string()],
        };
        assert_eq!(import_specifiers(&import), vec!["os", "xml.etree"]);
    }
}

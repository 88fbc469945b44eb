use super::{json_pretty, source_defaults, EXIT_CONTROL_ERROR, EXIT_SUCCESS};
use packwright_core::{extras_source, NameRegistry};
use packwright_schema::{Field, MetadataRecord};
use std::path::Path;

// Fields a bare control file cannot carry; they come from the package
// source directory.
const SOURCE_ONLY: [Field; 3] = [Field::Copyright, Field::ItemToPackage, Field::InstallTo];

/// Validate a control file, or a whole package source directory when
/// `path` is a directory.
pub fn run(config_path: &Path, path: &Path, json: bool) -> Result<u8, String> {
    let (record, whole_source) = if path.is_dir() {
        let defaults = source_defaults(config_path)?;
        let source = extras_source(path, &defaults, &mut NameRegistry::new())
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("control record error: no Control file in {}", path.display()))?;
        (source.record, true)
    } else {
        let mut record = MetadataRecord::new();
        record
            .read_control_file(path)
            .map_err(|e| format!("control record error: {e}"))?;
        (record, false)
    };

    let errors: Vec<(Field, &str)> = record
        .errors()
        .filter(|(field, _)| whole_source || !SOURCE_ONLY.contains(field))
        .collect();

    if json {
        let entries: Vec<_> = errors
            .iter()
            .map(|(field, message)| {
                serde_json::json!({
                    "field": field,
                    "label": field.label(),
                    "message": message,
                })
            })
            .collect();
        let payload = serde_json::json!({
            "package": record.package_name(),
            "version": record.version(),
            "valid": errors.is_empty(),
            "errors": entries,
        });
        println!("{}", json_pretty(&payload)?);
    } else if errors.is_empty() {
        println!("{}: no problems found", path.display());
    } else {
        println!("{}: {} problem(s) found", path.display(), errors.len());
        for (field, message) in &errors {
            println!("  {}: {message}", field.label());
        }
    }

    Ok(if errors.is_empty() {
        EXIT_SUCCESS
    } else {
        EXIT_CONTROL_ERROR
    })
}

use super::{json_pretty, EXIT_SUCCESS};
use packwright_schema::{parse_dependencies, MetadataRecord};
use std::path::Path;

pub fn run(control: &Path, json: bool) -> Result<u8, String> {
    let mut record = MetadataRecord::new();
    record
        .read_control_file(control)
        .map_err(|e| format!("control record error: {e}"))?;

    if json {
        let payload = serde_json::json!({
            "package": record.package_name(),
            "version": record.version(),
            "section": record.section(),
            "priority": record.priority(),
            "maintainer": record.maintainer(),
            "standards_version": record.standards_version(),
            "summary": record.summary(),
            "description": record.description(),
            "licence": record.licence(),
            "depends": relation_list(record.depends()),
            "recommends": relation_list(record.recommends()),
            "suggests": relation_list(record.suggests()),
            "conflicts": relation_list(record.conflicts()),
            "components": record.declared_components(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        let mut text = record.control_text();
        // a record read from disk has no payload items to derive this from
        if record.items().is_empty() && !record.declared_components().is_empty() {
            text.push_str(&format!(
                "Components: {}\n",
                record.declared_components().join(",")
            ));
        }
        print!("{text}");
    }
    Ok(EXIT_SUCCESS)
}

// One normalized clause per entry; text that does not parse is passed through.
fn relation_list(value: &str) -> Vec<String> {
    match parse_dependencies(value) {
        Ok(deps) => deps.iter().map(ToString::to_string).collect(),
        Err(_) => vec![value.to_owned()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_list_normalizes_each_clause() {
        assert_eq!(
            relation_list("PkgA(>=1.2),PkgB"),
            vec!["PkgA (>= 1.2)".to_owned(), "PkgB".to_owned()]
        );
        assert!(relation_list("").is_empty());
        assert_eq!(relation_list("PkgA (>= 1"), vec!["PkgA (>= 1".to_owned()]);
    }
}

use super::{json_pretty, load_config, EXIT_SUCCESS};
use packwright_schema::DebianVersionScheme;
use packwright_store::{PublishedIndex, PublishedPackages};
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> Result<u8, String> {
    let config = load_config(config_path)?;
    let index = PublishedIndex::scan(&config.layout(), &DebianVersionScheme)
        .map_err(|e| format!("store error: {e}"))?;

    let entries: Vec<_> = index
        .iter()
        .map(|(name, version)| {
            serde_json::json!({
                "package": name,
                "version": version.to_string(),
                "category": index.locate(name, version),
            })
        })
        .collect();

    if json {
        println!("{}", json_pretty(&entries)?);
    } else if index.is_empty() {
        println!("no published packages found");
    } else {
        println!("{:<32} {:<16} CATEGORY", "PACKAGE", "VERSION");
        for (name, version) in index.iter() {
            let category = index
                .locate(name, version)
                .map_or_else(|| "-".to_owned(), |c| c.to_string());
            println!("{name:<32} {:<16} {category}", version.to_string());
        }
    }
    Ok(EXIT_SUCCESS)
}

use super::{
    colorize_status, json_pretty, load_config, spin_fail, spin_ok, spinner, EXIT_FAILURE,
    EXIT_SUCCESS,
};
use packwright_core::{Publisher, RunSummary};
use packwright_store::StoreLock;
use std::path::Path;
use tracing::warn;

pub fn run(config_path: &Path, dry_run: bool, json: bool) -> Result<u8, String> {
    let config = load_config(config_path)?;
    let layout = config.layout();
    let lock = match StoreLock::try_acquire(&layout.lock_file()) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            warn!("packages root is locked by another run, waiting");
            StoreLock::acquire(&layout.lock_file()).map_err(|e| format!("store lock: {e}"))?
        }
        Err(e) => return Err(format!("store lock: {e}")),
    };

    let pb = (!json).then(|| spinner("scanning published packages..."));
    let publisher = match Publisher::open(&layout) {
        Ok(p) => p,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "scan failed");
            }
            return Err(e.to_string());
        }
    };
    if let Some(pb) = &pb {
        spin_ok(pb, &format!("{} published packages", publisher.index().len()));
    }

    let mut publisher = publisher.dry_run(dry_run);
    let mut summary = RunSummary::new(dry_run);
    publisher
        .run(&lock, &config, &mut summary)
        .map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "dry_run": dry_run,
            "counts": summary.counts(),
            "packages": summary.packages,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for report in &summary.packages {
            println!(
                "{:<32} {:<10} {}",
                report.name,
                colorize_status(report.status),
                report.message
            );
        }
        println!();
        if dry_run {
            println!("dry run: no archives written");
        }
        print!("{}", summary.render());
    }

    Ok(if summary.has_errors() {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    })
}

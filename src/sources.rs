use anyhow::Result;

use crate::config::Config;

pub fn list_sources(config: &Config) -> Result<()> {
    println!(
        "{:<16} {:<12} {:<40} STATUS",
        "CONNECTOR", "SOURCE", "ROOT"
    );

    if config.connectors.file_drop.is_empty() {
        println!("(no connectors configured)");
        return Ok(());
    }

    let mut names: Vec<&String> = config.connectors.file_drop.keys().collect();
    names.sort();

    for name in names {
        let cfg = &config.connectors.file_drop[name];
        let status = if cfg.root.exists() {
            "OK"
        } else {
            "WILL BE CREATED"
        };
        println!(
            "{:<16} {:<12} {:<40} {}",
            name,
            cfg.source_name,
            cfg.root.display(),
            status
        );
    }

    Ok(())
}

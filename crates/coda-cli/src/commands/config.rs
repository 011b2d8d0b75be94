use anyhow::Result;
use coda_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let path = config::config_file_path();
    println!("Config file: {}", path.display());
    println!(
        "File exists: {}\n",
        if path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    println!("  input_dir: {}", config.input_dir.display());
    println!("  output_dir: {}", config.output_dir.display());
    println!(
        "  cutoff_year: {}",
        config
            .cutoff_year
            .map_or_else(|| String::from("<not set>"), |y| y.to_string())
    );
    println!("  min_year: {}", config.min_year);
    println!("  matching.threshold: {}", config.matching.threshold);
    println!("  matching.top_k: {}", config.matching.top_k);
    println!("  matching.metric: {}", config.matching.metric);
    println!(
        "  anomaly_rules_path: {}",
        config
            .anomaly_rules_path
            .as_ref()
            .map_or_else(|| String::from("<built-in rules>"), |p| p.display().to_string())
    );

    println!("\nPriority: CLI args > ENV vars (CODA_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure coda.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

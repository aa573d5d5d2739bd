// driftwatch/src/commands/reference.rs
//
// USE CASE: Install a new reference distribution.

use std::path::PathBuf;

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use driftwatch_core::application::rebuild_reference;
use driftwatch_core::infrastructure::adapters::JsonReferenceStore;
use driftwatch_core::infrastructure::config::load_policy;

pub fn build(
    project_dir: PathBuf,
    source: PathBuf,
    generation: String,
    exclude: Vec<String>,
) -> anyhow::Result<()> {
    println!("📐 Building reference distribution from {}...", source.display());

    let policy = load_policy(&project_dir)?;
    let source = if source.is_relative() { project_dir.join(source) } else { source };
    let store = JsonReferenceStore::new(&policy.paths.reference);

    let reference = rebuild_reference(&store, &source, &generation, &exclude)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Feature", "Samples", "Min", "Max"]);
    for (name, values) in &reference.features {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        table.add_row(vec![
            name.clone(),
            values.len().to_string(),
            format!("{min:.3}"),
            format!("{max:.3}"),
        ]);
    }
    println!("{table}");
    println!(
        "✨ Reference '{}' saved to {}",
        reference.generation,
        store.path().display()
    );
    Ok(())
}

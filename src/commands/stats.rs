//! Stats command for displaying index statistics and metrics

use anyhow::Result;
use std::env;
use std::path::Path;

use crate::indexing::SkipStage;
use crate::metrics::{gather_metrics, MetricSnapshot};
use crate::Config;

/// Run the stats command
///
/// # Arguments
/// * `snapshot` - Snapshot file to index
/// * `prometheus` - If true, output in Prometheus text format
pub async fn run(snapshot: &Path, prometheus: bool) -> Result<()> {
    let root = env::current_dir()?;
    let config = Config::load(&root)?;
    let (index, report) = super::index_snapshot(snapshot, &config).await?;

    if prometheus {
        print!("{}", gather_metrics());
        return Ok(());
    }

    let metrics = MetricSnapshot::capture();

    println!("metascope Index Statistics");
    println!("==========================\n");

    println!("Index Contents:");
    println!("  Modules:          {}", report.modules);
    println!("  Type definitions: {}", report.type_definitions);
    println!("  Methods:          {}", report.methods);
    println!("  Fields:           {}", report.fields);
    println!("  Records:          {}", index.indexed_item_count());
    println!("  Keys:             {}", index.key_count());
    println!();

    println!("Build:");
    println!("  Id:       {}", report.build_id);
    println!("  Duration: {} ms", report.elapsed_ms);
    println!("  Skipped:  {}", report.skipped.total);
    for stage in [SkipStage::Domain, SkipStage::Module, SkipStage::Methods, SkipStage::Fields] {
        let count = report.skipped.count(stage);
        if count > 0 {
            println!("    {:<8} {}", stage, count);
        }
    }
    for branch in &report.skipped.samples {
        println!("    - [{}] {}: {}", branch.stage, branch.entity, branch.error);
    }
    println!();

    println!("Metrics:");
    println!("  Builds completed: {:.0}", metrics.builds_completed);
    println!("  Skipped branches: {:.0}", metrics.skipped_branches);

    Ok(())
}

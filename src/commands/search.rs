use anyhow::Result;
use std::env;
use std::path::Path;

use crate::cli::{search_flags, KindArg};
use crate::index::ResultEntry;
use crate::Config;

/// Run the search command
///
/// Indexes `snapshot` in memory and prints the matches for `query`.
pub async fn run(
    snapshot: &Path,
    query: &str,
    limit: Option<usize>,
    kinds: &[KindArg],
    exact: bool,
    case_sensitive: bool,
) -> Result<()> {
    let root = env::current_dir()?;
    let config = Config::load(&root)?;
    let limit = limit.unwrap_or(config.search.default_limit);

    let (index, report) = super::index_snapshot(snapshot, &config).await?;
    eprintln!("Indexed {}", report);

    let flags = search_flags(kinds, exact, case_sensitive);
    let results = index.search_async(query, flags, limit).await?;

    if results.is_empty() {
        println!("No results found for: {}", query);
        return Ok(());
    }

    println!("Found {} results for: \"{}\"\n", results.len(), query);
    for (i, result) in results.iter().enumerate() {
        let detail = match result.entry() {
            ResultEntry::Module => format!("base 0x{:x}", result.module().base_address),
            ResultEntry::TypeDefinition(type_def) => format!("token {}", type_def.token),
            ResultEntry::Method { method, .. } => match method.code_address {
                Some(address) => format!("code 0x{:x}", address),
                None => "not compiled".to_string(),
            },
            ResultEntry::Field { field, .. } => {
                format!("{} at +0x{:x}", field.type_name, field.offset)
            }
        };
        println!("{}. {} ({})", i + 1, result, detail);
    }

    Ok(())
}

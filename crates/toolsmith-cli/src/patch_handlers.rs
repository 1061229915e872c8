//! `toolsmith patch`: run the source patcher on two files.

use std::path::Path;

use toolsmith_core::Result;
use toolsmith_core::util::files;
use toolsmith_source::SourcePatcher;

/// Merge `fragment` into `existing`.
///
/// Returns the merged text. With `in_place` the text is also written back
/// to `existing`.
pub async fn handle_patch(existing: &Path, fragment: &Path, in_place: bool) -> Result<String> {
    let base = files::read_file(existing).await?;
    let addition = files::read_file(fragment).await?;
    let merged = SourcePatcher::python().merge(&base, &addition);
    if in_place {
        files::write_file(existing, &merged).await?;
        log::info!("patched {}", existing.display());
    }
    Ok(merged)
}

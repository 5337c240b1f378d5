//! The full run: build and merge, enrich, then aggregate again so method
//! counts reach every directory.

use tracing::info;

use crate::aggregate::aggregate;
use crate::builder::build;
use crate::config::Config;
use crate::enrich::enrich;
use crate::error::Result;
use crate::methods::ExtractorRegistry;
use crate::model::ParserResult;
use crate::tree::CoverageTree;

pub fn run(
    reports: &[ParserResult],
    config: &Config,
    registry: &ExtractorRegistry,
) -> Result<CoverageTree> {
    let mut tree = build(reports)?;
    let enriched = enrich(&mut tree, registry, config);
    info!(
        "Resolved {} of {} files, analyzed {}",
        enriched.resolved,
        enriched.resolved + enriched.unresolved,
        enriched.analyzed
    );
    aggregate(&mut tree);
    Ok(tree)
}

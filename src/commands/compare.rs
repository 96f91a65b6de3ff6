use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use chapterscan::baseline::{compare_chapters, compare_sections, load_baseline};
use chapterscan::chapters::{TracingSink, resolve_chapters};

use crate::cli::CompareArgs;
use crate::commands::{load_config, open_book};

pub fn run(args: CompareArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let baseline = load_baseline(&args.baseline)?;
    let document = open_book(&args.path)?;

    let mut sink = TracingSink;
    let plan = resolve_chapters(document.as_ref(), &config, &mut sink)
        .with_context(|| format!("chapter detection failed for {}", args.path.display()))?;

    let mut differences = compare_chapters(&baseline, &plan.chapters);
    differences.extend(compare_sections(&baseline, &plan.sections));

    if differences.is_empty() {
        info!(
            baseline = %args.baseline.display(),
            chapters = plan.chapters.len(),
            "chapters match baseline"
        );
        return Ok(());
    }

    for difference in &differences {
        warn!(difference = %difference, "baseline mismatch");
    }
    bail!(
        "{} differences against baseline {}",
        differences.len(),
        args.baseline.display()
    );
}

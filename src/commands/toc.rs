use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use chapterscan::chapters::toc_extractor::extract_toc;
use chapterscan::chapters::toc_locator::locate_toc_pages;
use chapterscan::chapters::{LinePatterns, TracingSink};

use crate::cli::TocArgs;
use crate::commands::{load_config, open_book};

pub fn run(args: TocArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let document = open_book(&args.path)?;
    let patterns = LinePatterns::new().context("failed to build chapter patterns")?;
    let mut sink = TracingSink;

    let Some(toc_pages) = locate_toc_pages(document.as_ref(), &patterns, &config, &mut sink)
    else {
        bail!("no table of contents found in {}", args.path.display());
    };
    let (chapters, sections) = extract_toc(document.as_ref(), &toc_pages, &patterns, &mut sink);
    info!(
        pages = ?toc_pages,
        chapters = chapters.len(),
        sections = sections.len(),
        "parsed table of contents"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "TOC pages: {toc_pages:?}")?;
    for section in sections.values() {
        writeln!(output, "Section {}: {}", section.id, section.full_title)?;
    }
    for chapter in &chapters {
        let page = chapter
            .page
            .map(|page| page.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            output,
            "{}\t{}\t{}\t{}",
            chapter.id,
            chapter.section.as_deref().unwrap_or("-"),
            page,
            chapter.title
        )?;
    }
    output.flush()?;

    Ok(())
}

use anyhow::Context;
use clap::Parser;
use img_press::cli::{Args, Commands};
use img_press::logger::init_logging;
use img_press::{run_link_pipeline, run_mirror_pipeline, FileConfig, LinkSettings, MirrorSettings};
use rayon::ThreadPoolBuilder;
use tracing::warn;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.quiet, args.verbose)?;
    setup_thread_pool(args.threads);

    let file_config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let summary = match &args.command {
        Commands::Links(links) => {
            let settings = LinkSettings::resolve(links, &file_config.links)?;
            run_link_pipeline(&settings).with_context(|| {
                format!("link workflow failed for {}", settings.document.display())
            })?
        }
        Commands::Mirror(mirror) => {
            let settings = MirrorSettings::resolve(mirror, &file_config.mirror)?;
            run_mirror_pipeline(&settings).with_context(|| {
                format!("mirror workflow failed for {}", settings.source.display())
            })?
        }
    };

    summary.log();
    Ok(())
}

fn setup_thread_pool(threads: Option<usize>) {
    if let Some(num_threads) = threads {
        if let Err(e) = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            warn!("Failed to set thread pool size: {}", e);
        }
    }
}

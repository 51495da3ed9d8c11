use anyhow::Context;
use marker_host::{config_path, initialize_logging, load_config, run, Stores};
use marker_logging::marker_info;

fn main() -> anyhow::Result<()> {
    let path = config_path(std::env::args());
    let config = load_config(&path)?;
    initialize_logging(&config);
    marker_logging::set_context("background");
    marker_info!(
        "marker_host starting, config {}, storage in {}",
        path.display(),
        config.storage_dir.display()
    );

    let stores = Stores::open(&config).context("opening storage")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    runtime.block_on(run(config, stores, tokio::io::stdin(), tokio::io::stdout()))
}

use anyhow::Result;

use framegraph::config::ViewerConfig;

mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    window::run(ViewerConfig::from_env())?;

    Ok(())
}

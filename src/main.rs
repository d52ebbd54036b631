use anyhow::Result;
use clap::{Parser, Subcommand};

use vitrine::logging::{LoggingConfig, init_logging};
use vitrine::{AppConfig, SceneSetup, demos};

/// Run one of the bundled rendering demos.
#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about)]
struct Cli {
    #[command(subcommand)]
    demo: Demo,

    /// Window width in logical pixels (overrides the demo default)
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Window height in logical pixels (overrides the demo default)
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Log filter, e.g. "debug" or "vitrine=trace" (defaults to RUST_LOG, then info)
    #[arg(long, global = true)]
    log: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Demo {
    /// Empty window cleared to slate
    Window,
    /// A colored quad
    Triangle,
    /// A spinning quad; 1 and 2 switch composition mode
    Transform,
    /// A cube edited from the keyboard (R/T/E, S F G H A D, W, V)
    Manipulate,
    /// A pyramid and a cube under perspective projection
    Projection,
    /// A cube lit with Phong shading
    Phong,
}

impl Demo {
    fn build(self) -> (AppConfig, SceneSetup) {
        match self {
            Demo::Window => demos::window(),
            Demo::Triangle => demos::triangle(),
            Demo::Transform => demos::transform(),
            Demo::Manipulate => demos::manipulate(),
            Demo::Projection => demos::projection(),
            Demo::Phong => demos::phong(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..Default::default()
    });

    let (mut config, setup) = cli.demo.build();
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }

    log::info!(
        "running {:?} demo at {}x{}",
        cli.demo,
        config.width,
        config.height
    );
    vitrine::run(config, setup)
}

use anyhow::Result;
use fragtoy::{
    logging::{init_logging, LoggingConfig},
    AppConfig, ShaderToyApp,
};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut config = AppConfig::default();
    // Optional logical path of a fragment shader, e.g. shaders/2dshaders/shaderToy.fs
    if let Some(fragment) = std::env::args().nth(1) {
        config = config.with_fragment_shader(&fragment);
    }
    log::info!("Resource root: {}", config.resource_root.display());

    ShaderToyApp::new(config).run().inspect_err(|err| {
        log::error!("{err:#}");
    })
}

use ccrm::app::bootstrap::{self, report_failure};
use ccrm::utils::logger;
use ccrm::{AppConfig, CliArgs, StartupError};
use clap::Parser;
use std::sync::Arc;

fn main() {
    let args = CliArgs::parse();

    let config = match AppConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            let err = StartupError::Config(e);
            let _ = report_failure(&err, args.debug, &mut std::io::stderr().lock());
            std::process::exit(bootstrap::EXIT_FAILURE);
        }
    };

    logger::init_cli_logger(config.verbose, config.log_format);
    tracing::info!("Starting ccrm");
    if config.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    let debug_mode = config.is_debug_mode();
    let result = bootstrap::run(Arc::new(config));

    if let Err(e) = &result {
        tracing::debug!("Application failed: {:?}", e);
        let _ = report_failure(e, debug_mode, &mut std::io::stderr().lock());
    }

    std::process::exit(bootstrap::exit_code(&result));
}

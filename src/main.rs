//! huv CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use huv::cli::{Cli, CommandDispatcher};
use huv::config::load_config;
use huv::shell::is_ci;
use huv::ui::{create_ui, OutputMode};
use huv::uv::{locate_uv, Uv};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr so stdout stays usable in scripts.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("huv=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("huv=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn active_env() -> Option<PathBuf> {
    std::env::var_os("VIRTUAL_ENV")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("huv starting with args: {:?}", cli);

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    let config = match load_config(&cwd, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    let output_mode = if cli.quiet {
        OutputMode::Quiet
    } else if cli.verbose {
        OutputMode::Verbose
    } else {
        config
            .default_output
            .map(OutputMode::from)
            .unwrap_or_default()
    };

    let mut ui = create_ui(!is_ci(), output_mode, cli.no_color);

    let uv = match locate_uv(config.uv_path.as_deref()) {
        Ok(path) => Uv::new(path).with_global_args(cli.uv_global_args()),
        Err(e) => {
            ui.error(&e.to_string());
            return exit_code(e.exit_code());
        }
    };

    let dispatcher = CommandDispatcher::new(&uv, config).with_active_env(active_env());

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => exit_code(result.exit_code),
        Err(e) => {
            ui.error(&e.to_string());
            exit_code(e.exit_code())
        }
    }
}

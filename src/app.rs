//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the interrupt handler,
//! validates settings, then strips every discovered input.

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use h5strip::cli::Args;
use h5strip::config::{CONFIG_ENV, resolve_config_path};
use h5strip::output as out;
use h5strip::{StripError, discover_inputs, load_config, shutdown, strip_all};

use crate::logging::init_tracing;

fn print_config_location(args: &Args) {
    match resolve_config_path(args.config.as_deref()) {
        Some((path, explicit)) => {
            let origin = if args.config.is_some() {
                "--config"
            } else if explicit {
                CONFIG_ENV
            } else {
                "default location"
            };
            out::print_info(&format!("Config file ({origin}): {}", path.display()));
            if path.exists() {
                out::print_info("The file exists and will be read.");
            } else {
                out::print_info("No file there yet; built-in defaults apply.");
            }
        }
        None => out::print_error("Could not determine a config location."),
    }
}

/// Run the CLI application. Returns an error only for configuration problems;
/// per-file failures are reported and do not change the exit status.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location(&args);
        return Ok(());
    }

    let mut cfg = load_config(args.config.as_deref())?;
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Dropped on interrupt too, so buffered file logs are flushed.
    let guard_slot = Arc::new(Mutex::new(guard));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Interrupt received; finishing the current file, then stopping.");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })
        .expect("failed to install signal handler");
    }

    debug!("Starting h5strip: {:?}", args);

    let result = (|| -> Result<()> {
        // Pattern and argument errors must surface before validate() creates out_folder.
        let matcher = cfg.matcher().map_err(|e| {
            error!(code = e.code(), "{e}");
            e
        })?;
        let Some(input) = args.resolved_input() else {
            return Err(StripError::Configuration("--input is required".into()).into());
        };
        cfg.validate()?;

        let inputs = discover_inputs(&input, cfg.format);
        if inputs.is_empty() {
            out::print_warn(&format!(
                "No .{} files found in {}",
                cfg.format.extension(),
                input.display()
            ));
            return Ok(());
        }

        let report = strip_all(&inputs, &cfg, &matcher);
        for failed in &report.failed {
            out::print_error(&format!(
                "failed to process {}: {}",
                failed.source.display(),
                failed.error
            ));
        }
        for file in &report.stripped {
            for node in &file.failures {
                let err = StripError::from(node.clone());
                debug!(code = err.code(), file = %file.source.display(), "{err}");
                out::print_warn(&format!("{}: {err}", file.source.display()));
            }
        }
        out::print_success(&report.summary());
        Ok(())
    })();

    // Flush file logs before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

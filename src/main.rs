/*!
 * dyn-inspector - Main Entry Point
 *
 * Prints `Hello world!` and the mode-change status to stdout, then runs the
 * dynamic-load cycle. Logs go to stderr.
 */

use std::process::ExitCode;
use tracing::info;

use dyn_inspector::monitoring::log_startup;
use dyn_inspector::{init_tracing, Inspector, InspectorConfig, FAILURE_EXIT_STATUS};

fn main() -> ExitCode {
    init_tracing();
    log_startup();

    let config = match InspectorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return ExitCode::from(FAILURE_EXIT_STATUS);
        }
    };

    let inspector = Inspector::new(config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let report = inspector.run(&mut out);
    info!(
        exit_status = report.exit_status(),
        loads = report.stats.loads,
        releases = report.stats.releases,
        "exiting"
    );
    ExitCode::from(report.exit_status())
}

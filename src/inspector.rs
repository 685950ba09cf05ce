/*!
 * Inspector Sequence
 *
 * Runs the three independent steps in program order:
 * console greeting plus mode change, then the library load/resolve/invoke/
 * release cycle. Each step has its own result; a failed mode change does not
 * stop the library step.
 */

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::core::errors::{InspectorError, InspectorResult};
use crate::core::InspectorConfig;
use crate::fs::{change_mode, PermissionStatus};
use crate::loader::{LibraryGuard, ModuleEntry, ModuleTable};
use crate::monitoring::{generate_trace_id, LoaderStats, LoaderStatsSnapshot, StepSpan};

/// Literal printed before the mode-change status
pub const GREETING: &str = "Hello world!";

/// Process exit status for a failed run (`-1` as seen by the parent)
pub const FAILURE_EXIT_STATUS: u8 = 255;

/// What the library step did when it succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSummary {
    pub library: PathBuf,
    pub symbol: String,
    pub address: usize,
    /// Objects mapped by the load, when module tracing is enabled
    pub mapped_by_load: Vec<ModuleEntry>,
}

/// Outcome of one full run
#[derive(Debug)]
pub struct RunReport {
    pub trace_id: String,
    /// First console write failure, if any
    pub console_error: Option<InspectorError>,
    pub permission_status: PermissionStatus,
    pub permission_error: Option<InspectorError>,
    pub library: InspectorResult<InvocationSummary>,
    pub stats: LoaderStatsSnapshot,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.console_error.is_none() && self.permission_error.is_none() && self.library.is_ok()
    }

    /// Every error of the run, in step order
    pub fn errors(&self) -> impl Iterator<Item = &InspectorError> {
        self.console_error
            .iter()
            .chain(&self.permission_error)
            .chain(self.library.as_ref().err())
    }

    /// Process exit status: 0 on success, 255 otherwise
    pub fn exit_status(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            FAILURE_EXIT_STATUS
        }
    }
}

/// Drives one run against a configuration
pub struct Inspector {
    config: InspectorConfig,
    stats: Arc<LoaderStats>,
}

impl Inspector {
    pub fn new(config: InspectorConfig) -> Self {
        Self {
            config,
            stats: Arc::new(LoaderStats::new()),
        }
    }

    pub fn stats(&self) -> &Arc<LoaderStats> {
        &self.stats
    }

    /// Run every step, writing console output to `out`
    ///
    /// Failures of `out` are recorded in the report like any other step
    /// failure; they never skip the mode change or the library step.
    pub fn run<W: Write>(&self, out: &mut W) -> RunReport {
        let trace_id = generate_trace_id();
        info!(
            trace_id = %trace_id,
            target = %self.config.target_path.display(),
            mode = %self.config.mode,
            library = %self.config.library_path.display(),
            symbol = %self.config.symbol,
            "inspector run started"
        );

        let console = out.write_all(GREETING.as_bytes());

        let permission = {
            let span = StepSpan::new("chmod", &trace_id);
            let _entered = span.enter();
            let result = change_mode(&self.config.target_path, self.config.mode);
            span.record_outcome(&result);
            result
        };
        let permission_status = PermissionStatus::from_result(&permission);
        // Every write is attempted; the first failure is kept
        let console = console
            .and(write!(out, "{permission_status}"))
            .and(out.flush());

        let library = self.invoke_entry(&trace_id);

        let report = RunReport {
            trace_id,
            console_error: console.err().map(InspectorError::Console),
            permission_status,
            permission_error: permission.err(),
            library,
            stats: self.stats.snapshot(),
        };

        for err in report.errors() {
            error!(trace_id = %report.trace_id, step = err.step(), error = %err, "step failed");
        }
        info!(
            trace_id = %report.trace_id,
            success = report.is_success(),
            invocations = report.stats.invocations,
            releases = report.stats.releases,
            "inspector run finished"
        );

        report
    }

    /// Load the library, resolve and invoke the entry point, release
    ///
    /// The library is released on every path out of this function.
    pub fn invoke_entry(&self, trace_id: &str) -> InspectorResult<InvocationSummary> {
        let span = StepSpan::new("dynload", trace_id);
        let _entered = span.enter();

        let result = self.load_and_invoke();
        span.record_outcome(&result);
        result
    }

    fn load_and_invoke(&self) -> InspectorResult<InvocationSummary> {
        let config = &self.config;
        let before = self.modules("before load");

        // SAFETY: the library and its entry point are named by the operator;
        // running them is the purpose of this program.
        let library = unsafe { LibraryGuard::open(&config.library_path, self.stats.clone()) }?;

        let after_load = self.modules("after load");
        let mapped_by_load = match (&before, &after_load) {
            (Some(before), Some(after)) => after.newly_mapped(before),
            _ => Vec::new(),
        };
        if !mapped_by_load.is_empty() {
            debug!(count = mapped_by_load.len(), "objects mapped by load");
        }

        let address = {
            // SAFETY: `EntryFn` is the documented contract for the symbol.
            let entry = unsafe { library.resolve(&config.symbol) }?;
            entry.invoke();
            entry.address()
        };

        library.close()?;
        self.modules("after release");

        Ok(InvocationSummary {
            library: config.library_path.clone(),
            symbol: config.symbol.clone(),
            address,
            mapped_by_load,
        })
    }

    fn modules(&self, stage: &str) -> Option<ModuleTable> {
        if !self.config.trace_modules {
            return None;
        }
        match ModuleTable::snapshot() {
            Ok(table) => {
                table.log(stage);
                Some(table)
            }
            Err(e) => {
                warn!(stage = stage, error = %e, "module table unavailable");
                None
            }
        }
    }
}

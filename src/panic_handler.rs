use log::error;
use std::panic;

/// Install the panic reporter.
///
/// Debug builds get `better_panic` backtraces, release builds the
/// `human_panic` crash report. Either way the panic is written to the log
/// first, since the log file outlives the terminal output.
pub fn initialize_panic_handler() {
    if cfg!(debug_assertions) {
        better_panic::install();
    } else {
        human_panic::setup_panic!();
    }

    let report_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!("{panic_info}");
        report_hook(panic_info);
    }));
}

//! Panic capture.
//!
//! The hook reports every panic to the coordinator's fault channel and then
//! chains to the previously installed hook, so the usual message and
//! backtrace still reach stderr.

use std::panic::{self, PanicHookInfo};
use tokio::sync::mpsc;

pub fn install_panic_hook(faults: mpsc::UnboundedSender<String>) {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        let _ = faults.send(describe_panic(info));
        original_hook(info);
    }));
}

fn describe_panic(info: &PanicHookInfo<'_>) -> String {
    let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    match info.location() {
        Some(location) => format!(
            "panic at {}:{}: {}",
            location.file(),
            location.line(),
            message
        ),
        None => format!("panic: {}", message),
    }
}

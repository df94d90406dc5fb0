use sysinfo::System;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[must_use]
pub fn available_memory_bytes() -> u64 {
    let mut system = System::new();
    system.refresh_memory();
    system.available_memory()
}

#[must_use]
pub fn format_available_memory(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let gib = bytes as f64 / BYTES_PER_GIB;
    format!("Available Memory: {gib:.1}GB")
}

#[must_use]
pub fn memory_report() -> String {
    format_available_memory(available_memory_bytes())
}

#[must_use]
pub fn version_line() -> String {
    format!("{} version: {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

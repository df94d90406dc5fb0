//! Console input on a dedicated thread.
//!
//! Blocking reads cannot be cancelled, so they run on a plain OS thread that
//! feeds a channel. Dropping the receiver never waits on a pending read and
//! the process can exit while the thread is still blocked.

use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;

pub type LineReceiver = mpsc::Receiver<io::Result<String>>;

/// Streams lines from `reader` until end of input, a read error, or the
/// receiver is dropped.
pub fn spawn_line_reader<R>(reader: R) -> LineReceiver
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    thread::spawn(move || {
        for line in reader.lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

#[must_use]
pub fn spawn_stdin_reader() -> LineReceiver {
    spawn_line_reader(io::BufReader::new(io::stdin()))
}

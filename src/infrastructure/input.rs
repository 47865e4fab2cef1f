//! Line input that Ctrl-C can end
//!
//! Reads happen on a helper thread, one line per request, so an interrupt
//! can wake a caller that is blocked on input. Nothing is read ahead of a
//! request: a child process started between prompts sees untouched stdin.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread;

use tracing::{debug, warn};

enum LineEvent {
    Line(io::Result<Option<String>>),
    Interrupted,
}

struct Inner {
    requests: Sender<()>,
    events: Receiver<LineEvent>,
    /// A request is in flight and its line has not been delivered yet
    outstanding: bool,
}

/// Line reader over any `BufRead`, ended early by an [`Interrupter`].
pub struct InterruptibleLines {
    inner: Mutex<Inner>,
    interrupts: Sender<LineEvent>,
}

/// Handle that ends the pending (or next) read with end-of-input.
#[derive(Clone)]
pub struct Interrupter(Sender<LineEvent>);

impl Interrupter {
    pub fn interrupt(&self) {
        // Receiver gone means nobody is reading any more
        let _ = self.0.send(LineEvent::Interrupted);
    }
}

impl InterruptibleLines {
    pub fn spawn<R>(mut reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<()>();
        let (event_tx, event_rx) = mpsc::channel();
        let line_tx = event_tx.clone();

        thread::spawn(move || {
            for () in request_rx {
                let mut line = String::new();
                let result = match reader.read_line(&mut line) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
                    Err(e) => Err(e),
                };
                if line_tx.send(LineEvent::Line(result)).is_err() {
                    break;
                }
            }
        });

        Self {
            inner: Mutex::new(Inner {
                requests: request_tx,
                events: event_rx,
                outstanding: false,
            }),
            interrupts: event_tx,
        }
    }

    /// Lines from stdin; SIGINT ends the current read instead of the process.
    pub fn stdin() -> Self {
        let lines = Self::spawn(io::BufReader::new(io::stdin()));
        let interrupter = lines.interrupter();
        match ctrlc::set_handler(move || interrupter.interrupt()) {
            Ok(()) => debug!("ctrl-c handler installed"),
            Err(e) => warn!("ctrl-c handler not installed: {}", e),
        }
        lines
    }

    pub fn interrupter(&self) -> Interrupter {
        Interrupter(self.interrupts.clone())
    }

    /// Next line without its line terminator. `None` on end-of-input or interrupt.
    pub fn next_line(&self) -> io::Result<Option<String>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("line reader poisoned"))?;

        if !inner.outstanding {
            if inner.requests.send(()).is_err() {
                return Ok(None);
            }
            inner.outstanding = true;
        }
        match inner.events.recv() {
            Ok(LineEvent::Line(result)) => {
                inner.outstanding = false;
                result
            }
            Ok(LineEvent::Interrupted) => {
                debug!("input interrupted");
                Ok(None)
            }
            Err(_) => Ok(None),
        }
    }
}

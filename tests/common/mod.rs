//! Integration test common infrastructure.
//!
//! A [`TestNetwork`] is a Matrix wired to an in-memory outbound channel, so
//! tests can feed it uplink lines and assert on what it would have sent.

#![allow(dead_code)]

use slservd::events::{Dispatch, Event, EventKind};
use slservd::state::{Matrix, ServerIdentity};
use slservd::wire::Message;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc;

pub const SID: &str = "0SV";

pub struct TestNetwork {
    pub matrix: Matrix,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl TestNetwork {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let me = ServerIdentity {
            name: "services.example.net".to_string(),
            sid: SID.to_string(),
            description: "Test Services".to_string(),
        };
        Self {
            matrix: Matrix::new(me, tx),
            rx,
        }
    }

    /// Feed lines as if they came from the uplink.
    pub fn feed(&mut self, lines: &[&str]) {
        for line in lines {
            self.matrix.handle_line(line);
        }
    }

    /// Introduce a remote user through a UID line. Returns the UID.
    pub fn remote_user(&mut self, nick: &str, uid: &str) -> String {
        let line = format!(":0AA UID {nick} 1 1000 +i {nick} example.org 192.0.2.1 {uid} :{nick}");
        self.matrix.handle_line(&line);
        uid.to_string()
    }

    /// Everything sent since the last call, formatted as wire lines.
    pub fn sent(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            lines.push(msg.to_string());
        }
        lines
    }

    /// Record every event of the given kinds, in dispatch order.
    pub fn record(&mut self, kinds: &[EventKind]) -> Rc<RefCell<Vec<Event>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for &kind in kinds {
            let log = Rc::clone(&log);
            self.matrix
                .handle(kind, move |_, event| log.borrow_mut().push(event.clone()));
        }
        log
    }
}

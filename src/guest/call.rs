use std::cell::RefCell;
use std::rc::Rc;

/// The host's call primitive as seen from inside a guest.
///
/// `call` receives one JSON-encoded `{type, data}` message. It returns
/// nothing: calls are fire-and-forget, and failures come back later, if at
/// all, as `call_error` events.
pub trait Host {
    fn call(&self, message: &[u8]);
}

impl<H: Host + ?Sized> Host for &H {
    fn call(&self, message: &[u8]) {
        (**self).call(message)
    }
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn call(&self, message: &[u8]) {
        (**self).call(message)
    }
}

/// A host that keeps every message it receives. Useful for running a guest
/// outside the sandbox.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    calls: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message received so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.borrow().clone()
    }

    pub fn decoded_calls(&self) -> Vec<serde_json::Value> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|bytes| serde_json::from_slice(bytes).ok())
            .collect()
    }
}

impl Host for RecordingHost {
    fn call(&self, message: &[u8]) {
        self.calls.borrow_mut().push(message.to_vec());
    }
}

//! Byte channel abstraction the session drives.

use std::io;

/// Raw byte channel to the cartridge, normally a serial port.
///
/// The session owns the transport for its whole lifetime and calls
/// `close` exactly once, whatever the outcome.
pub trait Transport {
    /// Write all of `bytes`
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of received bytes waiting to be read
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read a single byte
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Discard anything received but not yet read
    fn reset_input(&mut self) -> io::Result<()>;

    /// Discard anything queued but not yet sent
    fn reset_output(&mut self) -> io::Result<()>;

    /// Block until queued output has been sent
    fn flush(&mut self) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;
}

/// Owns a transport and closes it once, on `close()` or on drop.
pub(crate) struct Link<T: Transport> {
    inner: T,
    closed: bool,
}

impl<T: Transport> Link<T> {
    pub fn new(inner: T) -> Self {
        Link {
            inner,
            closed: false,
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.close()
    }
}

impl<T: Transport> Drop for Link<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("closing transport failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[test]
    fn test_link_closes_once_on_drop() {
        let mock = MockTransport::new(b"");
        let record = mock.record();
        {
            let _link = Link::new(mock);
        }
        assert_eq!(record.borrow().closes, 1);
    }

    #[test]
    fn test_explicit_close_is_not_repeated() {
        let mock = MockTransport::new(b"");
        let record = mock.record();
        let mut link = Link::new(mock);
        link.close().unwrap();
        link.close().unwrap();
        drop(link);
        assert_eq!(record.borrow().closes, 1);
    }

    #[test]
    fn test_link_closes_when_panic_unwinds() {
        let mock = MockTransport::new(b"");
        let record = mock.record();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _link = Link::new(mock);
            panic!("fault mid-transfer");
        }));
        assert!(result.is_err());
        assert_eq!(record.borrow().closes, 1);
    }
}

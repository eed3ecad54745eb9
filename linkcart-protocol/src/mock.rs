//! Scripted transport for session tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Instant;

use crate::Transport;

/// Timestamped transport call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Reset,
    Flush,
    /// n-th successful `write_all`
    Write(usize),
    Poll,
}

/// Everything the session did to the transport
#[derive(Debug, Default)]
pub struct Record {
    /// Each `write_all` call, in order
    pub writes: Vec<Vec<u8>>,
    pub flushes: usize,
    pub input_resets: usize,
    pub output_resets: usize,
    pub closes: usize,
    /// Number of writes made before the first reset/flush, if any
    pub writes_before_prepare: Option<usize>,
    pub events: Vec<(Event, Instant)>,
}

impl Record {
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }

    pub fn total_written(&self) -> usize {
        self.writes.iter().map(|w| w.len()).sum()
    }

    fn event(&mut self, event: Event) {
        self.events.push((event, Instant::now()));
    }
}

/// Replays reply bytes in order. An empty script means the device is silent.
pub struct MockTransport {
    replies: VecDeque<u8>,
    record: Rc<RefCell<Record>>,
    fail_write_at: Option<usize>,
    fail_read: bool,
}

impl MockTransport {
    pub fn new(replies: &[u8]) -> Self {
        MockTransport {
            replies: replies.iter().copied().collect(),
            record: Rc::new(RefCell::new(Record::default())),
            fail_write_at: None,
            fail_read: false,
        }
    }

    /// Device that answers every step correctly
    pub fn happy() -> Self {
        let mut replies = b"WWW".to_vec();
        replies.extend(std::iter::repeat(b'N').take(crate::CHUNK_COUNT));
        Self::new(&replies)
    }

    /// Make the n-th `write_all` call (0-based) fail
    pub fn fail_write_at(mut self, n: usize) -> Self {
        self.fail_write_at = Some(n);
        self
    }

    /// Report bytes available but fail to read them
    pub fn fail_read(mut self) -> Self {
        self.fail_read = true;
        self
    }

    pub fn record(&self) -> Rc<RefCell<Record>> {
        self.record.clone()
    }

    fn mark_prepare(&self) {
        let mut record = self.record.borrow_mut();
        if record.writes_before_prepare.is_none() {
            record.writes_before_prepare = Some(record.writes.len());
        }
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut record = self.record.borrow_mut();
        if self.fail_write_at == Some(record.writes.len()) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        let n = record.writes.len();
        record.writes.push(bytes.to_vec());
        record.event(Event::Write(n));
        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.record.borrow_mut().event(Event::Poll);
        if self.fail_read {
            return Ok(1);
        }
        Ok(self.replies.len())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        if self.fail_read {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
        }
        self.replies
            .pop_front()
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
    }

    fn reset_input(&mut self) -> io::Result<()> {
        self.mark_prepare();
        let mut record = self.record.borrow_mut();
        record.input_resets += 1;
        record.event(Event::Reset);
        Ok(())
    }

    fn reset_output(&mut self) -> io::Result<()> {
        self.mark_prepare();
        let mut record = self.record.borrow_mut();
        record.output_resets += 1;
        record.event(Event::Reset);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.mark_prepare();
        let mut record = self.record.borrow_mut();
        record.flushes += 1;
        record.event(Event::Flush);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.record.borrow_mut().closes += 1;
        Ok(())
    }
}

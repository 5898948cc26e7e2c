use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use std::{cell::RefCell, rc::Rc};

/// Buffered recorder.
///
/// Records are kept in memory. Clones share the same buffer, so a clone can be
/// given to an agent as its writer while the original is used to inspect
/// what the agent wrote.
#[derive(Default, Clone)]
pub struct BufferedRecorder {
    buf: Rc<RefCell<Vec<Record>>>,
    storage: Rc<RefCell<RecordStorage>>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records written so far.
    pub fn records(&self) -> Vec<Record> {
        self.buf.borrow().clone()
    }

    /// The number of records written so far.
    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.borrow().is_empty()
    }

    /// Collects the scalar of `key` in every record that has one.
    pub fn scalars(&self, key: &str) -> Vec<f32> {
        self.buf
            .borrow()
            .iter()
            .filter_map(|r| r.get_scalar(key).ok())
            .collect()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.borrow_mut().push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.borrow_mut().store(record);
    }

    fn flush(&mut self, step: i64) {
        let mut record = self.storage.borrow_mut().aggregate();
        record.insert("step", RecordValue::Scalar(step as f32));
        self.write(record);
    }
}

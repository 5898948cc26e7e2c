use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
///
/// The writer of an agent, set with [`Agent::set_writer`](crate::Agent::set_writer),
/// is a boxed [`Recorder`].
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);
}

/// A [`Recorder`] that stores records and writes values aggregated from them.
pub trait AggregateRecorder: Recorder {
    /// Store the record.
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    fn flush(&mut self, step: i64);
}

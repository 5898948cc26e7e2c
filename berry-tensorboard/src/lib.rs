//! Writes records of berry agents to TFRecord files readable by Tensorboard.
use berry_core::record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
    ignore_unsupported_value: bool,
    storage: RecordStorage,
    n_writes: usize,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`. The step of a record is its value at
    /// `step_key`, e.g., `"episode"`.
    pub fn new<P: AsRef<Path>>(logdir: P, step_key: impl Into<String>) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: step_key.into(),
            ignore_unsupported_value: true,
            storage: RecordStorage::new(),
            n_writes: 0,
        }
    }

    /// Construct a [`TensorboardRecorder`] warning about record values it cannot write.
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new_with_check_unsupported_value<P: AsRef<Path>>(
        logdir: P,
        step_key: impl Into<String>,
    ) -> Self {
        Self {
            ignore_unsupported_value: false,
            ..Self::new(logdir, step_key)
        }
    }

    /// Flushes the underlying writer.
    pub fn flush_writer(&mut self) {
        self.writer.flush();
    }

    fn step_of(&self, record: &Record) -> usize {
        match record.get(&self.step_key) {
            Some(RecordValue::Scalar(v)) if *v >= 0.0 => *v as usize,
            Some(v) => {
                warn!("Invalid step {:?}, the record count is used", v);
                self.n_writes
            }
            None => self.n_writes,
        }
    }

    fn add_image(&mut self, k: &str, data: &[f32], shape: &[usize; 2], step: usize) {
        if data.is_empty() || data.len() != shape[0] * shape[1] {
            warn!("Invalid image {} with shape {:?}", k, shape);
            return;
        }
        let (rgb, dim) = to_rgb(data, shape);
        self.writer.add_image(k, rgb.as_slice(), &dim, step)
    }
}

/// Converts a row-major `[n_rows, n_cols]` array to an interleaved RGB image.
///
/// Values are rescaled to `0..=255` and replicated in the three channels. The
/// returned dimensions are `[3, width, height]`, as expected by
/// [`SummaryWriter::add_image`].
fn to_rgb(data: &[f32], shape: &[usize; 2]) -> (Vec<u8>, [usize; 3]) {
    let min = data.iter().fold(f32::MAX, |m, v| v.min(m));
    let scale = data.iter().fold(-f32::MAX, |m, v| v.max(m)) - min;
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let mut rgb = Vec::with_capacity(3 * data.len());
    for &e in data.iter() {
        let g = ((e - min) / scale * 255f32) as u8;
        rgb.extend_from_slice(&[g, g, g]);
    }
    (rgb, [3, shape[1], shape[0]])
}

impl Recorder for TensorboardRecorder {
    /// Write a given [Record] into a TFRecord.
    ///
    /// This method writes [RecordValue::Scalar] and [RecordValue::Array2], the latter
    /// as a grayscale image. [RecordValue::DateTime] is discarded. Other variants are
    /// ignored, with a warning if the recorder was built with
    /// [`TensorboardRecorder::new_with_check_unsupported_value`].
    fn write(&mut self, record: Record) {
        let step = self.step_of(&record);
        self.n_writes += 1;

        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            match v {
                RecordValue::Scalar(v) => self.writer.add_scalar(k, *v, step),
                RecordValue::DateTime(_) => {}
                RecordValue::Array2(data, shape) => self.add_image(k, data, shape, step),
                _ => {
                    if !self.ignore_unsupported_value {
                        warn!("Unsupported value: {:?}", (k, v));
                    }
                }
            };
        }
    }
}

impl AggregateRecorder for TensorboardRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    /// Writes the aggregated values of the stored records at `step`.
    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let mut record = self.storage.aggregate();
        record.insert(self.step_key.clone(), RecordValue::Scalar(step as f32));
        self.write(record);
        self.writer.flush();
    }
}

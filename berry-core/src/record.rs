//! Types and traits for recording values obtained during training and evaluation.
//!
//! * [`Record`] - named values of various types
//! * [`Recorder`] - the writer interface agents send records to
//! * [`AggregateRecorder`] - a recorder that stores and aggregates records
//! * [`RecordStorage`] - aggregation of stored records
//! * [`BufferedRecorder`] - an in-memory recorder
//! * [`NullRecorder`] - a recorder that discards all records
//!
//! ```rust
//! use berry_core::record::{BufferedRecorder, Record, RecordValue, Recorder};
//!
//! let mut recorder = BufferedRecorder::new();
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(0.0));
//! record.insert("episode_reward", RecordValue::Scalar(-1.0));
//! recorder.write(record);
//! assert_eq!(recorder.scalars("episode_reward"), vec![-1.0]);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;

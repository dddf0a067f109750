#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use journal_log_sink::error::BoxError;
use journal_log_sink::sink::JournalSink;

pub type Frames = Vec<(String, Vec<u8>)>;

/// Split a batch into records, each a list of `(key, value)` frames.
pub fn parse_batch(mut data: &[u8]) -> Vec<Frames> {
    let mut records: Vec<Frames> = Vec::new();
    if data.is_empty() {
        return records;
    }
    records.push(Vec::new());

    while !data.is_empty() {
        if data[0] == b'\n' {
            records.push(Vec::new());
            data = &data[1..];
            continue;
        }

        let nl = data
            .iter()
            .position(|&b| b == b'\n')
            .expect("key must be terminated by a newline");
        let key = String::from_utf8(data[..nl].to_vec()).expect("keys are ASCII");
        data = &data[nl + 1..];

        let mut size = [0u8; 8];
        size.copy_from_slice(&data[..8]);
        let len = u64::from_le_bytes(size) as usize;
        let value = data[8..8 + len].to_vec();
        assert_eq!(data[8 + len], b'\n', "value of {} must end with a newline", key);
        data = &data[9 + len..];

        records.last_mut().unwrap().push((key, value));
    }
    records
}

/// Value frames as `(key, utf8 text)` for readable assertions.
pub fn text_frames(frames: &Frames) -> Vec<(String, String)> {
    frames
        .iter()
        .map(|(k, v)| (k.clone(), String::from_utf8_lossy(v).into_owned()))
        .collect()
}

pub fn frame(key: &str, value: &[u8]) -> Vec<u8> {
    let mut out = key.as_bytes().to_vec();
    out.push(b'\n');
    out.extend_from_slice(&(value.len() as u64).to_le_bytes());
    out.extend_from_slice(value);
    out.push(b'\n');
    out
}

/// Sink that keeps a copy of every batch.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub batches: Arc<Mutex<Vec<Vec<u8>>>>,
    pub closed: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn batches(&self) -> Vec<Vec<u8>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

impl JournalSink for RecordingSink {
    fn write(&mut self, batch: &[u8]) -> Result<(), BoxError> {
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Sink whose writes always fail.
#[derive(Clone, Default)]
pub struct FailingSink {
    pub attempts: Arc<Mutex<usize>>,
}

impl JournalSink for FailingSink {
    fn write(&mut self, _batch: &[u8]) -> Result<(), BoxError> {
        *self.attempts.lock().unwrap() += 1;
        Err("journal unavailable".into())
    }
}

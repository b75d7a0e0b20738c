//! Entropy harvested from Linux input event devices.
//!
//! One reader thread per `event*` device decodes fixed-size `input_event`
//! records and offers extracted bytes to a shared [`HarvestPool`].

use super::pool::HarvestPool;
use super::source::{EntropyError, EntropySource};
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Size of one `input_event` record on 64-bit Linux.
pub const EVENT_SIZE: usize = 24;

/// Event type of key presses and releases.
pub const EV_KEY: u16 = 0x01;

/// Wait between reads when a device has no complete record ready.
const POLL_PERIOD: Duration = Duration::from_millis(100);

/// A decoded input event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub time_sec: i64,
    pub time_usec: i64,
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    /// Decodes a native-endian record.
    pub fn parse(record: &[u8; EVENT_SIZE]) -> Self {
        let mut sec = [0u8; 8];
        let mut usec = [0u8; 8];
        let mut kind = [0u8; 2];
        let mut code = [0u8; 2];
        let mut value = [0u8; 4];
        sec.copy_from_slice(&record[0..8]);
        usec.copy_from_slice(&record[8..16]);
        kind.copy_from_slice(&record[16..18]);
        code.copy_from_slice(&record[18..20]);
        value.copy_from_slice(&record[20..24]);

        Self {
            time_sec: i64::from_ne_bytes(sec),
            time_usec: i64::from_ne_bytes(usec),
            kind: u16::from_ne_bytes(kind),
            code: u16::from_ne_bytes(code),
            value: i32::from_ne_bytes(value),
        }
    }

    /// Encodes the record in native byte order.
    pub fn to_bytes(&self) -> [u8; EVENT_SIZE] {
        let mut record = [0u8; EVENT_SIZE];
        record[0..8].copy_from_slice(&self.time_sec.to_ne_bytes());
        record[8..16].copy_from_slice(&self.time_usec.to_ne_bytes());
        record[16..18].copy_from_slice(&self.kind.to_ne_bytes());
        record[18..20].copy_from_slice(&self.code.to_ne_bytes());
        record[20..24].copy_from_slice(&self.value.to_ne_bytes());
        record
    }
}

/// How seed bytes are pulled out of raw events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// Low byte then high byte of every event's value field.
    #[default]
    ValueBytes,
    /// Low nibble of each key event's microsecond timestamp, two per byte.
    KeyTimestampNibbles,
}

/// Per-device extraction state.
#[derive(Debug)]
struct Extractor {
    policy: ExtractionPolicy,
    pending_nibble: Option<u8>,
}

impl Extractor {
    fn new(policy: ExtractionPolicy) -> Self {
        Self {
            policy,
            pending_nibble: None,
        }
    }

    fn extract(&mut self, event: &InputEvent, out: &mut Vec<u8>) {
        match self.policy {
            ExtractionPolicy::ValueBytes => {
                out.push((event.value & 0xFF) as u8);
                out.push(((event.value >> 8) & 0xFF) as u8);
            }
            ExtractionPolicy::KeyTimestampNibbles => {
                if event.kind != EV_KEY {
                    return;
                }
                let nibble = (event.time_usec & 0x0F) as u8;
                match self.pending_nibble.take() {
                    Some(high) => out.push((high << 4) | nibble),
                    None => self.pending_nibble = Some(nibble),
                }
            }
        }
    }
}

/// Reader threads feeding a [`HarvestPool`].
///
/// [`close`](Self::close) stops the readers and cancels the pool. A thread
/// blocked inside a device read exits after its next record arrives.
pub struct Harvester {
    pool: HarvestPool,
    stop: Arc<AtomicBool>,
    readers: Vec<JoinHandle<()>>,
}

impl Harvester {
    /// Starts one reader thread per named device stream.
    pub fn spawn<R>(devices: Vec<(String, R)>, policy: ExtractionPolicy, pool: HarvestPool) -> Self
    where
        R: Read + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let readers = devices
            .into_iter()
            .map(|(name, reader)| {
                let pool = pool.clone();
                let stop = Arc::clone(&stop);
                thread::spawn(move || read_device(&name, reader, policy, &pool, &stop))
            })
            .collect::<Vec<_>>();

        tracing::info!(devices = readers.len(), ?policy, "Harvester started");

        Self {
            pool,
            stop,
            readers,
        }
    }

    /// Opens every readable `event*` device under `dir`.
    pub fn open(
        dir: impl AsRef<Path>,
        policy: ExtractionPolicy,
        pool: HarvestPool,
    ) -> Result<Self, EntropyError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| EntropyError::Io(e.to_string()))?;

        let mut devices = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with("event") {
                continue;
            }
            match std::fs::File::open(entry.path()) {
                Ok(file) => devices.push((name, file)),
                Err(e) => tracing::debug!(device = %name, error = %e, "Skipping unreadable device"),
            }
        }

        if devices.is_empty() {
            return Err(EntropyError::NoDevices(dir.display().to_string()));
        }

        Ok(Self::spawn(devices, policy, pool))
    }

    /// Returns the pool the readers feed.
    pub fn pool(&self) -> &HarvestPool {
        &self.pool
    }

    /// Number of reader threads started.
    pub fn device_count(&self) -> usize {
        self.readers.len()
    }

    /// Stops harvesting and cancels the pool.
    pub fn close(&mut self) {
        if self.stop.swap(true, Ordering::SeqCst) {
            return;
        }
        self.pool.cancel();
        let finished = self.readers.iter().filter(|r| r.is_finished()).count();
        tracing::info!(
            devices = self.readers.len(),
            finished,
            "Harvester stopped"
        );
    }
}

impl Drop for Harvester {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_device<R: Read>(
    name: &str,
    mut reader: R,
    policy: ExtractionPolicy,
    pool: &HarvestPool,
    stop: &AtomicBool,
) {
    let mut extractor = Extractor::new(policy);
    let mut record = [0u8; EVENT_SIZE];
    let mut filled = 0;
    let mut extracted = Vec::with_capacity(2);

    while !stop.load(Ordering::SeqCst) {
        match reader.read(&mut record[filled..]) {
            Ok(0) => thread::sleep(POLL_PERIOD),
            Ok(n) => {
                filled += n;
                if filled < EVENT_SIZE {
                    continue;
                }
                filled = 0;
                let event = InputEvent::parse(&record);
                extractor.extract(&event, &mut extracted);
                for byte in extracted.drain(..) {
                    pool.offer(byte);
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!(device = %name, error = %e, "Device read failed");
                thread::sleep(POLL_PERIOD);
            }
        }
    }

    tracing::debug!(device = %name, "Device reader exited");
}

/// Entropy source backed by harvested device events.
pub struct DeviceSource {
    harvester: Harvester,
}

impl DeviceSource {
    pub fn new(harvester: Harvester) -> Self {
        Self { harvester }
    }

    /// Opens every input device under `dir`, buffering up to `capacity` bytes.
    pub fn open(
        dir: impl AsRef<Path>,
        policy: ExtractionPolicy,
        capacity: usize,
    ) -> Result<Self, EntropyError> {
        Harvester::open(dir, policy, HarvestPool::new(capacity)).map(Self::new)
    }

    /// Handle for cancelling consumers from another thread.
    pub fn pool(&self) -> HarvestPool {
        self.harvester.pool().clone()
    }
}

impl EntropySource for DeviceSource {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.harvester.pool().take_into(dest)
    }

    fn close(&mut self) {
        self.harvester.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn event(kind: u16, usec: i64, value: i32) -> InputEvent {
        InputEvent {
            time_sec: 1_700_000_000,
            time_usec: usec,
            kind,
            code: 30,
            value,
        }
    }

    fn stream(events: &[InputEvent]) -> Cursor<Vec<u8>> {
        Cursor::new(events.iter().flat_map(|e| e.to_bytes()).collect())
    }

    #[test]
    fn test_record_decoding() {
        let original = event(EV_KEY, 123_456, -2);
        assert_eq!(InputEvent::parse(&original.to_bytes()), original);
    }

    #[test]
    fn test_value_bytes_policy() {
        let mut extractor = Extractor::new(ExtractionPolicy::ValueBytes);
        let mut out = Vec::new();
        extractor.extract(&event(0x02, 0, 0x1234), &mut out);
        assert_eq!(out, vec![0x34, 0x12]);
    }

    #[test]
    fn test_nibble_policy_packs_key_events() {
        let mut extractor = Extractor::new(ExtractionPolicy::KeyTimestampNibbles);
        let mut out = Vec::new();
        extractor.extract(&event(EV_KEY, 0x1A, 1), &mut out);
        extractor.extract(&event(0x00, 0x1F, 0), &mut out);
        assert!(out.is_empty());
        extractor.extract(&event(EV_KEY, 0x23, 0), &mut out);
        assert_eq!(out, vec![0xA3]);
    }

    #[test]
    fn test_source_reads_harvested_bytes() {
        let events: Vec<_> = (0..4).map(|i| event(EV_KEY, 0, 0x0100 * i + i)).collect();
        let harvester = Harvester::spawn(
            vec![("event0".to_string(), stream(&events))],
            ExtractionPolicy::ValueBytes,
            HarvestPool::new(16),
        );
        let mut source = DeviceSource::new(harvester);

        assert_eq!(
            source.next_bytes(8).unwrap(),
            vec![0, 0, 1, 1, 2, 2, 3, 3]
        );

        source.close();
        assert_eq!(source.next_bytes(1), Err(EntropyError::Cancelled));
    }

    #[test]
    fn test_missing_device_dir() {
        let result = Harvester::open(
            "/nonexistent/input",
            ExtractionPolicy::default(),
            HarvestPool::default(),
        );
        assert!(matches!(result, Err(EntropyError::Io(_))));
    }
}

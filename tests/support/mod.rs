//! Shared fixtures: in-memory PNGs and fake removal services

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use nobg::{BackgroundRemover, RemoteError, SharedQueue, Upload};
use nobg_common::{ArtifactSlot, InputFile, RecordId};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn image_input(name: &str, width: u32, height: u32) -> InputFile {
    InputFile::new(name, "image/png", png(width, height))
}

pub fn dimensions(bytes: &[u8]) -> (u32, u32) {
    nobg_common::transform::dimensions(bytes).unwrap()
}

/// Pixel size of a record's current source or result
pub async fn artifact_size(queue: &SharedQueue, id: RecordId, slot: ArtifactSlot) -> (u32, u32) {
    let store = queue.lock().await;
    let artifact = store.get(id).and_then(|r| r.artifact(slot)).unwrap();
    dimensions(artifact.bytes())
}

/// Removal service that records call order and concurrency
#[derive(Clone, Default)]
pub struct MockRemover {
    failing: Arc<Vec<String>>,
    delays: Arc<HashMap<String, u64>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<String>>>,
}

impl MockRemover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, names: &[&str]) -> Self {
        self.failing = Arc::new(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn delays(mut self, delays: &[(&str, u64)]) -> Self {
        self.delays = Arc::new(delays.iter().map(|(n, ms)| (n.to_string(), *ms)).collect());
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> usize {
        self.log()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{} not in log", entry))
    }
}

impl BackgroundRemover for MockRemover {
    async fn remove_background(&self, upload: Upload) -> Result<Vec<u8>, RemoteError> {
        let name = upload.file_name;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("start:{}", name));

        let delay = self.delays.get(&name).copied().unwrap_or(10);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("end:{}", name));

        if self.failing.contains(&name) {
            Err(RemoteError::Status { status: 500 })
        } else {
            Ok(png(3, 2))
        }
    }
}

/// Removal service that holds every call until released
#[derive(Clone, Default)]
pub struct GateRemover {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl BackgroundRemover for GateRemover {
    async fn remove_background(&self, _upload: Upload) -> Result<Vec<u8>, RemoteError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(png(3, 2))
    }
}

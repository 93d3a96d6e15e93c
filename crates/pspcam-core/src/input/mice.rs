//! `/dev/input/mice` pointer source.
//!
//! The aggregate mouse device emits 3-byte PS/2 packets: a flags byte
//! followed by signed dx and dy. The source integrates the relative
//! packets into a virtual absolute position (origin at startup) and
//! reports that position to the tracker, which turns it back into
//! deltas. dy is sign-flipped so positive y means "down", matching
//! screen coordinates.

use std::fs::OpenOptions;
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::input::{PointerSource, PointerTracker};

const PACKET_LEN: usize = 3;
const IDLE_POLL: Duration = Duration::from_millis(2);

pub struct MiceSource {
    device: PathBuf,
    position: Arc<Mutex<(i32, i32)>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MiceSource {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            position: Arc::new(Mutex::new((0, 0))),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

/// Decode one PS/2 packet into a (dx, dy) screen-space delta.
fn decode_packet(packet: [u8; PACKET_LEN]) -> (i32, i32) {
    let dx = packet[1] as i8 as i32;
    // Device y grows upward, screen y grows downward
    let dy = -(packet[2] as i8 as i32);
    (dx, dy)
}

impl PointerSource for MiceSource {
    fn position(&self) -> Result<(i32, i32)> {
        Ok(*self.position.lock().unwrap())
    }

    fn start(&mut self, tracker: Arc<PointerTracker>) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        // Non-blocking so the reader thread can notice the stop flag
        let mut device = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.device)?;

        debug!("Reading pointer input from {}", self.device.display());

        self.stop.store(false, Ordering::SeqCst);
        let stop = Arc::clone(&self.stop);
        let position = Arc::clone(&self.position);

        let worker = thread::spawn(move || {
            let mut packet = [0u8; PACKET_LEN];
            let mut filled = 0usize;

            while !stop.load(Ordering::SeqCst) {
                match device.read(&mut packet[filled..]) {
                    Ok(0) => break,
                    Ok(n) => {
                        filled += n;
                        if filled < PACKET_LEN {
                            continue;
                        }
                        filled = 0;

                        let (dx, dy) = decode_packet(packet);
                        let (x, y) = {
                            let mut pos = position.lock().unwrap();
                            pos.0 += dx;
                            pos.1 += dy;
                            *pos
                        };
                        tracker.observe(x, y);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(IDLE_POLL);
                    }
                    Err(e) => {
                        warn!("Pointer device read failed: {e}");
                        break;
                    }
                }
            }
        });

        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for MiceSource {
    fn drop(&mut self) {
        self.stop();
    }
}

//! The injection session: attach, discover, then poll at a fixed rate.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use pspcam_core::layout::guest::{DISC_ID_SCAN_LIMIT, MOHH_DISC_ID};
use pspcam_core::{
    CameraInjector, CameraParams, Config, DeltaAccumulator, GuestMemory, InjectOutcome,
    MiceSource, PointerSource, PointerTracker, ProcessHandle, ProcfsProvider, scanner,
};
use tracing::{debug, info, warn};

use crate::shutdown::ShutdownSignal;

pub fn run(config: &Config) -> Result<()> {
    let shutdown = Arc::new(ShutdownSignal::new());
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.trigger())
            .context("Failed to install Ctrl+C handler")?;
    }

    // Attach: no candidate matching a live process is terminal here,
    // there is nothing to inject into.
    let mut process = ProcessHandle::attach(&ProcfsProvider, &config.process_names)
        .context("No PPSSPP process found. Make sure PPSSPP is running")?;

    // Discover the guest RAM base, once per session.
    let Some(base) = scanner::discover(&process)? else {
        process.close();
        bail!("Could not find guest RAM. Make sure a game is loaded in PPSSPP");
    };
    info!("Guest memory base: {base:#x}");

    let guest = GuestMemory::with_base(&process, base);

    // Best-effort check that the right game is running.
    match guest.find_signature(MOHH_DISC_ID, DISC_ID_SCAN_LIMIT) {
        Ok(Some(offset)) => debug!("Disc ID found at guest offset {offset:#x}"),
        Ok(None) => warn!("Disc ID ULUS-1014 not found; is Medal of Honor Heroes loaded?"),
        Err(e) => warn!("Disc ID scan failed: {e}"),
    }

    let deltas = Arc::new(DeltaAccumulator::new());
    let mut source = MiceSource::new(&config.mouse_device);
    let initial = source.position()?;
    let tracker = Arc::new(PointerTracker::new(Arc::clone(&deltas), initial));
    source
        .start(tracker)
        .context("Failed to open the pointer device (try adding yourself to the input group)")?;

    info!("Injector running at {} Hz, press Ctrl+C to exit", 1000 / config.poll_interval_ms.max(1));

    let injector = CameraInjector::new(CameraParams {
        sensitivity: config.sensitivity,
        invert_pitch: config.invert_pitch,
    });
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    let error_backoff = Duration::from_millis(config.error_backoff_ms);

    while !shutdown.is_shutdown() {
        let (dx, dy) = deltas.drain();

        if dx != 0.0 || dy != 0.0 {
            match injector.inject(&guest, dx, dy) {
                Ok(InjectOutcome::Applied { .. }) | Ok(InjectOutcome::Idle) => {}
                Ok(InjectOutcome::CameraUnavailable) => {
                    debug!("Camera not resolvable, skipping tick");
                }
                Err(e) => {
                    // Tick-local failure: report, back off, keep polling.
                    // No automatic re-attach is attempted.
                    warn!("Injection failed: {e}");
                    if shutdown.wait(error_backoff) {
                        break;
                    }
                }
            }
        }

        if shutdown.wait(poll_interval) {
            break;
        }
    }

    info!("Stopping injector");
    source.stop();
    drop(guest);
    process.close();
    Ok(())
}

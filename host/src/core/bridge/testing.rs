//! In-memory media element for tests

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::channel::Bootstrap;
use super::config::BridgeConfig;
use super::surface::{MediaElement, MediaSlot, PlayerSurface, SurfaceHandle};
use crate::core::{CoreError, CoreResult, ImageFormat, TimeSec};

#[derive(Debug, Default)]
struct FakeMediaState {
    time: TimeSec,
    paused: bool,
    ended: bool,
    seeks: Vec<TimeSec>,
    plays: usize,
    fail_capture: bool,
}

/// Scriptable media element; clones share state
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeMedia {
    state: Arc<Mutex<FakeMediaState>>,
}

impl FakeMedia {
    pub(crate) fn paused_at(time: TimeSec) -> Self {
        let media = Self::default();
        {
            let mut state = media.state.lock().unwrap();
            state.time = time;
            state.paused = true;
        }
        media
    }

    pub(crate) fn playing_at(time: TimeSec) -> Self {
        let media = Self::paused_at(time);
        media.state.lock().unwrap().paused = false;
        media
    }

    pub(crate) fn seeks(&self) -> Vec<TimeSec> {
        self.state.lock().unwrap().seeks.clone()
    }

    pub(crate) fn plays(&self) -> usize {
        self.state.lock().unwrap().plays
    }

    pub(crate) fn fail_capture(&self) {
        self.state.lock().unwrap().fail_capture = true;
    }
}

impl MediaElement for FakeMedia {
    fn current_time(&self) -> TimeSec {
        self.state.lock().unwrap().time
    }

    fn set_current_time(&mut self, time: TimeSec) {
        let mut state = self.state.lock().unwrap();
        state.time = time;
        state.ended = false;
        state.seeks.push(time);
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn is_ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }

    fn play(&mut self) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.paused = false;
        state.plays += 1;
        Ok(())
    }

    fn capture_frame(&mut self, format: ImageFormat, _quality: f64) -> CoreResult<Vec<u8>> {
        let state = self.state.lock().unwrap();
        if state.fail_capture {
            return Err(CoreError::CaptureFailed("canvas is tainted".into()));
        }
        let mut bytes = format.mime_type().as_bytes().to_vec();
        bytes.extend_from_slice(&state.time.to_le_bytes());
        Ok(bytes)
    }
}

/// Spawns a surface over `media` and returns the bootstrap sender to connect with
pub(crate) fn spawn_surface(
    media: Option<FakeMedia>,
    config: BridgeConfig,
) -> (mpsc::UnboundedSender<Bootstrap>, SurfaceHandle) {
    let slot = MediaSlot::new();
    if let Some(media) = media {
        slot.insert(media);
    }
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = PlayerSurface::new(slot, config).spawn(rx);
    (tx, handle)
}

//! In-process player demo
//!
//! Opens a session for a media path, hands the bridge to a surface whose
//! media element appears late, buffers a seek, replays a few time updates
//! and captures a screenshot. Every view event is printed as a JSON line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};

use lockstep_lib::core::bridge::{BridgeEvent, MediaElement, PlayerSurface};
use lockstep_lib::core::selection::{HighlightColor, HighlightContext};
use lockstep_lib::core::session::{
    FsAttachmentStore, LocalFileResolver, PlayerSession, SessionContext, SidecarSrtSource,
};
use lockstep_lib::core::settings::PlayerSettings;
use lockstep_lib::core::{CoreError, CoreResult, ImageFormat, TimeSec};
use lockstep_lib::ipc::{EventEmitter, ViewEvent};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

#[derive(Args)]
pub struct DemoArgs {
    /// Media path; captions are read from the sibling `.srt` file
    media: String,

    /// Seek requested before the player is ready
    #[arg(long, default_value_t = 1.5)]
    seek: TimeSec,

    /// Delay before the simulated media element appears
    #[arg(long, default_value_t = 250)]
    media_delay_ms: u64,

    /// Number of half-second time updates to replay after the seek
    #[arg(long, default_value_t = 4)]
    ticks: u32,

    /// Directory for captured screenshots
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Media element that only moves when told to
struct SimulatedMedia {
    time: TimeSec,
    paused: bool,
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> TimeSec {
        self.time
    }

    fn set_current_time(&mut self, time: TimeSec) {
        self.time = time.max(0.0);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_ended(&self) -> bool {
        false
    }

    fn play(&mut self) -> CoreResult<()> {
        self.paused = false;
        Ok(())
    }

    fn capture_frame(&mut self, format: ImageFormat, _quality: f64) -> CoreResult<Vec<u8>> {
        if format != ImageFormat::Png {
            return Err(CoreError::CaptureFailed(format!(
                "simulated media cannot encode {}",
                format.mime_type()
            )));
        }
        // Signature plus the frame time; enough to exercise the transfer path.
        let mut frame = PNG_SIGNATURE.to_vec();
        frame.extend_from_slice(&self.time.to_be_bytes());
        Ok(frame)
    }
}

fn print_events(rx: &mut broadcast::Receiver<ViewEvent>) -> Result<()> {
    while let Ok(event) = rx.try_recv() {
        let line = json!({ "event": event.name(), "data": event });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

pub async fn run(args: DemoArgs, mut settings: PlayerSettings) -> Result<()> {
    settings.normalize();
    let out_dir = match args.out {
        Some(dir) => dir,
        None => std::env::temp_dir().join("lockstep-demo"),
    };

    let events = EventEmitter::default();
    let mut rx = events.subscribe();
    let context = SessionContext {
        captions: Arc::new(SidecarSrtSource),
        resolver: Arc::new(LocalFileResolver),
        attachments: Arc::new(FsAttachmentStore::new(&out_dir)),
        highlight: HighlightContext::with_color(HighlightColor::new("#ffd54f")),
        events,
    };

    let mut session = PlayerSession::open(context, &args.media, &settings)
        .with_context(|| format!("failed to open {}", args.media))?;
    tracing::info!(
        "Loaded {} cues, {} track(s)",
        session.cues().len(),
        session.tracks().len()
    );

    let (bootstrap_tx, bootstrap_rx) = mpsc::unbounded_channel();
    let surface = PlayerSurface::new(Default::default(), settings.bridge_config())
        .spawn(bootstrap_rx);

    session.connect(bootstrap_tx)?;
    session.seek_to(args.seek).await?;

    tokio::time::sleep(Duration::from_millis(args.media_delay_ms)).await;
    surface.media().insert(SimulatedMedia {
        time: 0.0,
        paused: true,
    });

    match session.process_next_event().await {
        Some(BridgeEvent::Ready) => {}
        Some(BridgeEvent::HandshakeFailed { attempts }) => {
            print_events(&mut rx)?;
            bail!("player did not become ready after {attempts} attempts");
        }
        other => bail!("unexpected bridge event {other:?}"),
    }

    // Let the buffered seek land before reporting positions.
    let target = args.seek.max(0.0);
    for _ in 0..50 {
        let at_target = surface
            .media()
            .with(|m| (m.current_time() - target).abs() < f64::EPSILON)
            .unwrap_or(false);
        if at_target {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for tick in 0..args.ticks {
        let time = target + f64::from(tick) * 0.5;
        surface.media().with(|m| m.set_current_time(time))?;
        surface.report_time(time);
        session.process_next_event().await;
        print_events(&mut rx)?;
    }

    let capture = session.capture_screenshot().await;
    print_events(&mut rx)?;
    match capture {
        Ok(path) => println!("{}", json!({ "screenshot": path })),
        Err(e) => tracing::warn!("Screenshot failed: {}", e),
    }

    session.close();
    surface.shutdown();
    print_events(&mut rx)?;
    Ok(())
}

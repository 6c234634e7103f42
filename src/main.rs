use anyhow::Result;
use std::time::Duration;
use swing_config::AppConfig;
use swing_game::{GameEvent, SwingGame, SwingProfile};
use swing_imu::SensorSample;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Everything the host loop reacts to, in arrival order.
enum HostEvent {
    Sample(SensorSample),
    /// The player confirmed the club is behind the ball.
    SetBall { now_ms: f64 },
    Frame { now_ms: f64 },
}

/// Render ticks per second.
const FRAME_RATE_HZ: f64 = 60.0;

/// Frames sent after the swing before the replay gives up on a landing.
const MAX_TAIL_FRAMES: usize = 60 * 40;

/// Replay a synthetic swing in real time: sensor samples interleaved with
/// frame ticks, and a tee-up at the end of the address hold.
async fn replay_swing(tx: mpsc::UnboundedSender<HostEvent>, profile: SwingProfile) {
    let samples = profile.generate(0.0);
    let sample_period = 1.0 / profile.sample_rate_hz as f64;
    let frame_ms = 1000.0 / FRAME_RATE_HZ;
    let set_ball_ms = profile.address_s as f64 * 1000.0;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(sample_period));
    let mut next_frame_ms = 0.0;
    let mut ball_set = false;

    for sample in samples {
        ticker.tick().await;
        let now_ms = sample.timestamp_ms;
        if tx.send(HostEvent::Sample(sample)).is_err() {
            return;
        }
        if !ball_set && now_ms >= set_ball_ms {
            ball_set = true;
            if tx.send(HostEvent::SetBall { now_ms }).is_err() {
                return;
            }
        }
        if now_ms >= next_frame_ms {
            if tx.send(HostEvent::Frame { now_ms }).is_err() {
                return;
            }
            next_frame_ms += frame_ms;
        }
    }

    // Keep ticking frames while the ball flies.
    let mut frames = tokio::time::interval(Duration::from_secs_f64(1.0 / FRAME_RATE_HZ));
    for _ in 0..MAX_TAIL_FRAMES {
        frames.tick().await;
        if tx.send(HostEvent::Frame { now_ms: next_frame_ms }).is_err() {
            return;
        }
        next_frame_ms += frame_ms;
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::StateChanged { from, to } => {
            info!(from = from.name(), to = to.name(), "State changed");
        }
        GameEvent::Hit {
            impact_velocity,
            impact_speed,
            estimate,
        } => {
            info!(?impact_velocity, impact_speed, ?estimate, "Hit");
        }
        GameEvent::Timeout => info!("Time's up, set the ball again"),
        GameEvent::Landed(shot) => {
            info!(
                distance = shot.landing_distance,
                lateral = shot.lateral_offset,
                max_height = shot.max_height,
                flight_time_s = shot.flight_time_s,
                launch_angle_deg = shot.launch_angle_deg,
                launch_speed = shot.launch_speed,
                backspin = shot.backspin,
                sidespin = shot.sidespin,
                "Shot landed"
            );
        }
    }
}

fn save_last_shot(game: &SwingGame) -> Result<()> {
    let Some(shot) = game.last_shot() else {
        return Ok(());
    };
    let path = swing_config::last_shot_path()?;
    std::fs::write(&path, toml::to_string_pretty(shot)?)?;
    info!(?path, "Saved last shot");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swing_sim=info,swing_game=info,swing_imu=info".into()),
        )
        .init();

    info!("Golf swing simulator starting");

    let config = swing_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    let profile = SwingProfile {
        gravity: config.physics.gravity,
        ..SwingProfile::default()
    };
    let mut game = SwingGame::new(config)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let replay = tokio::spawn(replay_swing(tx, profile));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    warn!("Replay ended before the ball landed");
                    break;
                };
                match event {
                    HostEvent::Sample(sample) => game.handle_sample(&sample),
                    HostEvent::SetBall { now_ms } => {
                        game.set_ball_position(now_ms);
                    }
                    HostEvent::Frame { now_ms } => game.handle_frame(now_ms),
                }

                let mut landed = false;
                for event in game.drain_events() {
                    log_event(&event);
                    landed |= matches!(event, GameEvent::Landed(_));
                }
                if landed {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }
    }

    replay.abort();
    if let Err(e) = save_last_shot(&game) {
        warn!(?e, "Failed to save last shot");
    }

    info!("Golf swing simulator shut down");
    Ok(())
}

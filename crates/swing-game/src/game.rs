use crate::events::GameEvent;
use crate::state::{is_hit, GameState, SwingSession};
use glam::{Quat, Vec3};
use swing_config::{AppConfig, ConfigError};
use swing_imu::{FrameAdapter, Orientation, SensorFusion, SensorSample};
use swing_physics::{resolve_impact, FlightState, ShotResult};
use swing_tracker::{TipTracker, TrackingParams};
use tracing::{debug, info, trace, warn};

/// The swing game context: orientation filter, tip tracker, state machine
/// and ball flight behind one owner.
///
/// The host feeds it sensor samples with [`SwingGame::handle_sample`] and
/// render ticks with [`SwingGame::handle_frame`], then drains
/// [`GameEvent`]s. All times are host milliseconds.
pub struct SwingGame {
    config: AppConfig,
    fusion: SensorFusion,
    tracker: TipTracker,
    state: GameState,
    session: Option<SwingSession>,
    flight: Option<FlightState>,
    last_shot: Option<ShotResult>,
    events: Vec<GameEvent>,
    /// Device-frame accelerometer reading from the latest sample.
    last_accel: Vec3,
    last_sample_ms: Option<f64>,
    last_frame_ms: Option<f64>,
}

fn tracking_params(config: &AppConfig) -> TrackingParams {
    TrackingParams {
        motion_threshold: config.swing.motion_threshold,
        max_duration_s: config.swing.max_tracking_duration_s,
    }
}

impl SwingGame {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fusion = SensorFusion::new(config.imu.madgwick_beta, config.imu.calibration_samples);
        let tracker = TipTracker::new(FrameAdapter::new(config.imu.grip), tracking_params(&config));

        Ok(Self {
            config,
            fusion,
            tracker,
            state: GameState::ReadyToSetBall,
            session: None,
            flight: None,
            last_shot: None,
            events: Vec::new(),
            last_accel: Vec3::ZERO,
            last_sample_ms: None,
            last_frame_ms: None,
        })
    }

    /// Replace the configuration between sessions.
    ///
    /// Returns `Ok(false)` without applying anything while a swing or flight
    /// is in progress.
    pub fn apply_config(&mut self, config: AppConfig) -> Result<bool, ConfigError> {
        config.validate()?;
        if matches!(
            self.state,
            GameState::BallSetReadyToSwing | GameState::Swinging | GameState::BallFlying
        ) {
            warn!(state = self.state.name(), "Config change deferred until the shot ends");
            return Ok(false);
        }

        self.fusion.set_beta(config.imu.madgwick_beta);
        self.tracker
            .set_params(FrameAdapter::new(config.imu.grip), tracking_params(&config));
        self.config = config;
        info!("Config applied");
        Ok(true)
    }

    /// Fold one sensor sample into the orientation, tip, and swing state.
    pub fn handle_sample(&mut self, sample: &SensorSample) {
        if !sample.timestamp_ms.is_finite() {
            trace!(
                timestamp_ms = sample.timestamp_ms,
                "Skipping sample without a usable timestamp"
            );
            return;
        }
        let dt = self
            .last_sample_ms
            .map_or(0.0, |last| ((sample.timestamp_ms - last) / 1000.0) as f32);
        self.last_sample_ms = Some(sample.timestamp_ms);

        self.fusion
            .update(sample.rotation_rate, sample.acceleration, dt, sample.heading);
        let attitude = self.course_attitude();
        self.tracker.update(attitude, self.config.club.length_m);
        if sample.acceleration.is_finite() {
            self.last_accel = sample.acceleration;
        }

        if !self.state.is_swing_window() {
            return;
        }

        let motion = (self.last_accel.length() - self.config.physics.gravity).abs();
        self.tracker.track(motion, sample.timestamp_ms);
        if self.state == GameState::BallSetReadyToSwing && self.tracker.is_tracking() {
            self.transition(GameState::Swinging);
        }

        if self.check_timeout(sample.timestamp_ms) {
            return;
        }
        self.detect_hit(sample.timestamp_ms);
    }

    /// Advance timers and the ball by one render tick.
    pub fn handle_frame(&mut self, now_ms: f64) {
        if !now_ms.is_finite() {
            trace!(now_ms, "Skipping frame without a usable timestamp");
            return;
        }
        let dt = self
            .last_frame_ms
            .map(|last| ((now_ms - last) / 1000.0) as f32);
        self.last_frame_ms = Some(now_ms);

        match self.state {
            GameState::BallSetReadyToSwing | GameState::Swinging => {
                self.check_timeout(now_ms);
            }
            GameState::BallFlying => {
                let Some(dt) = dt else {
                    return;
                };
                let landed = match self.flight.as_mut() {
                    Some(flight) => flight.step(dt, &self.config.physics),
                    None => false,
                };
                if landed {
                    self.finish_flight();
                }
            }
            GameState::ReadyToSetBall | GameState::ShowingResults => {}
        }
    }

    /// Tee up: the current tip position becomes the ball and the swing timer starts.
    ///
    /// Only valid when no shot is in progress. Returns whether it took effect.
    pub fn set_ball_position(&mut self, now_ms: f64) -> bool {
        if !matches!(
            self.state,
            GameState::ReadyToSetBall | GameState::ShowingResults
        ) {
            warn!(state = self.state.name(), "Cannot set ball now");
            return false;
        }
        if !now_ms.is_finite() {
            warn!(now_ms, "Cannot set ball without a usable timestamp");
            return false;
        }

        let yaw_reference = self.fusion.yaw_reference().unwrap_or_else(|| {
            warn!("Device yaw undefined at tee-up, keeping the filter's heading");
            Quat::IDENTITY
        });
        self.flight = None;
        self.session = Some(SwingSession::new(
            now_ms,
            self.config.swing.timeout_s,
            yaw_reference,
        ));
        // Re-place the tip in the new course frame before zeroing it.
        let attitude = self.course_attitude();
        self.tracker.update(attitude, self.config.club.length_m);
        self.tracker.calibrate();
        info!(now_ms, timeout_s = self.config.swing.timeout_s, "Ball set");
        self.transition(GameState::BallSetReadyToSwing);
        true
    }

    /// Update the swing timer. Returns `true` on the call that expires it.
    ///
    /// Expiry happens once per session: the timer is marked expired, tracking
    /// stops, and the game returns to [`GameState::ReadyToSetBall`].
    pub fn check_timeout(&mut self, now_ms: f64) -> bool {
        if !self.state.is_swing_window() {
            return false;
        }
        if !now_ms.is_finite() {
            trace!(now_ms, "Timer not advanced without a usable timestamp");
            return false;
        }
        let timeout_s = self.config.swing.timeout_s;
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.timer.expired {
            return false;
        }

        let elapsed_s = ((now_ms - session.timer.start_ms) / 1000.0) as f32;
        let remaining_s = timeout_s - elapsed_s;
        session.timer.remaining_s = remaining_s.max(0.0);
        if remaining_s > 0.0 {
            return false;
        }

        session.timer.expired = true;
        self.tracker.stop_tracking();
        info!(elapsed_s, "Swing timed out");
        self.events.push(GameEvent::Timeout);
        self.transition(GameState::ReadyToSetBall);
        true
    }

    /// Check the latest sample for a strike and launch the ball if there is one.
    ///
    /// At most one hit per session; nothing happens after the timer expired.
    pub fn detect_hit(&mut self, now_ms: f64) -> bool {
        if !self.state.is_swing_window() || !now_ms.is_finite() {
            return false;
        }
        match &self.session {
            Some(session) if !session.timer.expired && !session.hit.detected => {}
            _ => return false,
        }

        let tip = self.tracker.position();
        let accel_magnitude = self.last_accel.length();
        if !is_hit(tip, accel_magnitude, self.tracker.history(), &self.config) {
            return false;
        }

        let impact = resolve_impact(
            self.tracker.history(),
            self.linear_acceleration(),
            &self.config,
        );
        if let Some(session) = self.session.as_mut() {
            session.hit.detected = true;
            session.hit.time_ms = now_ms;
            session.hit.impact_velocity = impact.club_velocity;
        }
        info!(
            tip_distance = tip.length(),
            accel_magnitude,
            impact_speed = impact.impact_speed(),
            "Hit detected"
        );

        self.flight = Some(FlightState::launch(&impact, &self.config, now_ms));
        self.tracker.stop_tracking();
        self.events.push(GameEvent::Hit {
            impact_velocity: impact.club_velocity,
            impact_speed: impact.impact_speed(),
            estimate: impact.estimate,
        });
        self.transition(GameState::BallFlying);
        true
    }

    /// Clear filter, tracker, session and flight. The last shot survives.
    pub fn reset(&mut self) {
        self.fusion.reset();
        self.tracker.reset();
        self.session = None;
        self.flight = None;
        self.events.clear();
        self.last_accel = Vec3::ZERO;
        self.last_sample_ms = None;
        self.last_frame_ms = None;
        self.transition(GameState::ReadyToSetBall);
        info!("Game reset");
    }

    /// Restart gyro bias calibration with the configured sample count.
    pub fn recalibrate_gyro(&mut self) {
        self.fusion.recalibrate(self.config.imu.calibration_samples);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&SwingSession> {
        self.session.as_ref()
    }

    pub fn orientation(&self) -> Orientation {
        self.fusion.orientation()
    }

    /// Club tip relative to the ball, course frame.
    pub fn tip_position(&self) -> Vec3 {
        self.tracker.position()
    }

    pub fn tracker(&self) -> &TipTracker {
        &self.tracker
    }

    /// Ball position: in flight, at its landing spot, or on the tee.
    pub fn ball_position(&self) -> Vec3 {
        self.flight.as_ref().map_or(Vec3::ZERO, |f| f.position())
    }

    pub fn trajectory(&self) -> &[Vec3] {
        self.flight
            .as_ref()
            .map(|f| f.trajectory())
            .unwrap_or(&[])
    }

    pub fn flight(&self) -> Option<&FlightState> {
        self.flight.as_ref()
    }

    pub fn last_shot(&self) -> Option<&ShotResult> {
        self.last_shot.as_ref()
    }

    /// Yaw captured at tee-up, identity without a session.
    pub fn yaw_reference(&self) -> Quat {
        self.session
            .as_ref()
            .map_or(Quat::IDENTITY, |s| s.yaw_reference)
    }

    /// Seconds left on the swing timer, if a session is running.
    pub fn remaining_time(&self) -> Option<f32> {
        self.session
            .as_ref()
            .filter(|s| !s.timer.expired && self.state.is_swing_window())
            .map(|s| s.timer.remaining_s)
    }

    /// Filter attitude with the tee-up yaw taken out. Gravity stays on +Z.
    fn course_attitude(&self) -> Quat {
        self.yaw_reference().conjugate() * self.fusion.orientation().quaternion
    }

    /// Latest accelerometer reading as course-frame acceleration with gravity removed.
    fn linear_acceleration(&self) -> Vec3 {
        let world = self.course_attitude() * self.last_accel;
        self.tracker.adapter().to_course(world) - Vec3::new(0.0, self.config.physics.gravity, 0.0)
    }

    fn finish_flight(&mut self) {
        if let Some(result) = self.flight.as_ref().and_then(|f| f.result()).cloned() {
            info!(
                distance = result.landing_distance,
                lateral = result.lateral_offset,
                max_height = result.max_height,
                "Shot complete"
            );
            self.last_shot = Some(result.clone());
            self.events.push(GameEvent::Landed(result));
        }
        self.transition(GameState::ShowingResults);
    }

    fn transition(&mut self, to: GameState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(from = from.name(), to = to.name(), "State transition");
        self.events.push(GameEvent::StateChanged { from, to });
    }
}

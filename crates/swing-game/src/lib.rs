//! Golf swing game: turns phone motion samples into hits and ball flights.
//!
//! [`SwingGame`] owns the orientation filter, the club tip tracker, the
//! swing state machine and the flight simulation. Hosts drive it with
//! sensor samples and render ticks and react to [`GameEvent`]s.

pub mod events;
pub mod game;
pub mod state;
pub mod trace;

pub use events::GameEvent;
pub use game::SwingGame;
pub use state::{
    is_hit, GameState, HitRecord, SwingSession, SwingTimer, BACKSWING_SAMPLES, MIN_BACKSWING_M,
};
pub use trace::SwingProfile;

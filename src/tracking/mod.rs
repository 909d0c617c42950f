pub mod clock;
pub mod controller;
pub mod repository;
pub mod state;

pub use clock::ElapsedClock;
pub use controller::{StartOutcome, TrackingController, TrackingEvent};
pub use repository::TimeEntryRepository;
pub use state::{SessionState, TrackingSnapshot};

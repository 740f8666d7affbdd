mod ids;
mod track;
mod transport;

pub use ids::{SessionId, TrackId, UserId};
pub use track::Track;
pub use transport::{PlayState, TransportIntent, TransportState, MAX_VOLUME};

pub mod events;
pub mod flag;
pub mod moderation;
pub mod requests;
pub mod stats;
pub mod submission;
pub mod verification;

pub use events::*;
pub use flag::*;
pub use moderation::*;
pub use requests::*;
pub use stats::*;
pub use submission::*;
pub use verification::*;

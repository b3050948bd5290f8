// Domain layer: marketplace records, typed ids, statuses and ports (interfaces).

pub mod clock;
pub mod ids;
pub mod model;
pub mod ports;
pub mod status;

pub use clock::{Clock, FixedClock, SteppingClock, SystemClock};
pub use ids::{ListingId, MessageId, UserId, VehicleId};
pub use model::{Accident, Listing, MaintenanceEvent, Message, Repair, User, Vehicle, VehicleHistory};
pub use status::{AccidentSeverity, AccountType, ListingStatus, VehicleStatus};

pub mod booking;
pub mod clock;
pub mod inventory;
pub mod seasonal;

pub use booking::{BookingWorkflow, Quote};
pub use clock::{Clock, FixedClock, SystemClock};
pub use inventory::InventoryLedger;
pub use seasonal::SeasonalPricingService;

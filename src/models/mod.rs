pub mod user;
pub mod category;
pub mod seasonal_pricing;
pub mod booking;
pub mod payment;

pub use user::{Customer, Role};
pub use category::Category;
pub use seasonal_pricing::{NewSeasonalPricing, SeasonalPricing};
pub use booking::{Booking, NewBooking, StayRange};
pub use payment::{NewPayment, Payment, PaymentStatus};

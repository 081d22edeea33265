//! Screen controllers.
//!
//! One controller per screen, owning its form state and composing the
//! collaborator contracts, the query cache and the notice bus. Actions
//! publish notices for their outcomes and return the navigation they
//! cause, if any; failed mutations leave form state untouched so the user
//! can retry manually. The landing and not-found screens have no logic
//! beyond the route gate and so no controller.

pub mod dashboard;
pub mod login;
pub mod marketplace;
pub mod profile;
pub mod register;

pub use dashboard::DashboardScreen;
pub use login::LoginScreen;
pub use marketplace::MarketplaceScreen;
pub use profile::{ProfileScreen, ProfileView};
pub use register::RegisterScreen;

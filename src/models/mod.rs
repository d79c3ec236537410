pub mod appointment;
pub mod availability;
pub mod enums;
pub mod filters;
pub mod profile;
pub mod treatment;
pub mod user;

pub use appointment::*;
pub use availability::*;
pub use enums::*;
pub use filters::*;
pub use profile::*;
pub use treatment::*;
pub use user::*;

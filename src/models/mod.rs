pub mod appointment;
pub mod display;
pub mod doctor;
pub mod enums;
pub mod filters;
pub mod patient;
pub mod schedule;
pub mod service;
pub mod user;

pub use appointment::*;
pub use doctor::*;
pub use enums::*;
pub use filters::*;
pub use patient::*;
pub use schedule::*;
pub use service::*;
pub use user::*;

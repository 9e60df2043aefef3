pub mod config;
pub mod enums;
pub mod error;
pub mod badge;
pub mod storage;
pub mod services;
pub mod api;

pub use config::{ BadgeConfig, Config };
pub use enums::{ Color, ErrorCorrection, FontWeight, LabelAlign };
pub use error::{ AppError, Result };
pub use badge::{ generate_badge, BadgeImage, BadgeRequest };

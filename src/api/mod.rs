//! Typed wrappers for the photo service endpoints.

pub mod auth;
pub mod feedback;
pub mod photos;
pub mod profile;

pub use auth::{LoginResponse, SignupResponse, demo_login, login, logout, signup};
pub use feedback::{FeedbackResponse, send_feedback};
pub use photos::{DemoPhotos, NewPhoto, PhotoService, RemotePhotos};
pub use profile::{ProfileResponse, ProfileUpdate, update_demo_profile, update_profile};

#[cfg(test)]
pub use photos::MockPhotoService;

//! Data models for the Funil Digital backend.
//!
//! - `User`, `LoginResponse`: the operator and the auth payloads
//! - `Funnel`, `FunnelStep`: funnels and their ordered pages
//! - `Credential`: integration secrets
//! - `CheckoutConfig`, `Payment`, `RevenueStats`: checkout and revenue
//! - `Visitor`, `VisitorEvent`, `DashboardStats`: live monitoring
//! - `TrackingPixel`: ad-platform pixels

pub mod checkout;
pub mod credential;
pub mod funnel;
pub mod monitoring;
pub mod payment;
pub mod timestamp;
pub mod tracking;
pub mod user;

pub use checkout::{CheckoutConfig, CheckoutConfigInput, CheckoutPreview};
pub use credential::{Credential, CredentialInput};
pub use funnel::{
    CloneFunnelRequest, Funnel, FunnelDetail, FunnelInput, FunnelStep, ReorderStepsRequest,
    StepInput,
};
pub use monitoring::{DashboardStats, Visitor, VisitorEvent};
pub use payment::{Payment, PaymentStats, RevenueStats};
pub use tracking::{PixelInput, TrackingPixel};
pub use user::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest, User};

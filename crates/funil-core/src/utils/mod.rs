//! Display formatting shared by the models and the terminal UI.

pub mod format;

pub use format::{
    format_count, format_currency, format_date, format_duration, format_percentage,
    truncate_string,
};

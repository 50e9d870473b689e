//! CLI subcommand implementations.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;

/// Pretty-print any serializable API response.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

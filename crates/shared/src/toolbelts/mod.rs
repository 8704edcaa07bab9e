pub mod bookings;
pub mod calculator;
pub mod kitchen;
pub mod weather;

pub use bookings::Bookings;
pub use calculator::Calculator;
pub use kitchen::Kitchen;
pub use weather::Weather;

use crate::registry::{RegistryError, ToolRegistry};

/// Weather, calculator and the (fragile) bookings tool.
pub fn default_registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::builder()
        .toolbelt(Weather)
        .toolbelt(Calculator)
        .toolbelt(Bookings)
        .build()
}

pub fn kitchen_registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::builder().toolbelt(Kitchen).build()
}

/// Every demo toolbelt in one registry.
pub fn full_registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::builder()
        .toolbelt(Weather)
        .toolbelt(Calculator)
        .toolbelt(Bookings)
        .toolbelt(Kitchen)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Toolbelt;

    #[test]
    fn demo_registries_have_unique_names() {
        assert_eq!(
            default_registry().unwrap().names(),
            vec!["get_weather", "calculate", "get_bookings"]
        );
        assert_eq!(kitchen_registry().unwrap().len(), 5);
        assert_eq!(full_registry().unwrap().len(), 8);
        assert!(full_registry().unwrap().contains("menu_search"));
        assert!(!default_registry().unwrap().contains("menu_search"));
        assert_eq!(Weather.description(), "Current weather lookups");
    }
}

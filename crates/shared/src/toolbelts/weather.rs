// crates/shared/src/toolbelts/weather.rs
use anyhow::Result;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::register_toolbelt;

static FORECASTS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Paris", "15°C, cloudy"),
        ("London", "12°C, rainy"),
        ("Tokyo", "22°C, sunny"),
        ("New York", "18°C, partly cloudy"),
    ])
});

#[derive(Default)]
pub struct Weather;

register_toolbelt! {
    Weather {
        description: "Current weather lookups",
        tools: {
            "get_weather" => get_weather {
                description: "Get the current weather for a given city.",
                params: [
                    "city": "string" => "The city name, e.g. 'Paris'"
                ]
            }
        }
    }
}

impl Weather {
    fn get_weather(&self, args: &Map<String, Value>) -> Result<String> {
        let city = args.get("city").and_then(Value::as_str).unwrap_or("").trim();
        if city.is_empty() {
            return Ok("Error: city cannot be empty".to_string());
        }

        Ok(FORECASTS
            .get(city)
            .map(|forecast| forecast.to_string())
            .unwrap_or_else(|| format!("No weather data available for {}", city)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ToolRegistry;

    #[test]
    fn known_and_unknown_cities() {
        let registry = ToolRegistry::builder().toolbelt(Weather).build().unwrap();
        assert_eq!(registry.invoke("get_weather", r#"{"city":"Paris"}"#).text(), "15°C, cloudy");
        assert_eq!(
            registry.invoke("get_weather", r#"{"city":"Lyon"}"#).text(),
            "No weather data available for Lyon"
        );
    }
}

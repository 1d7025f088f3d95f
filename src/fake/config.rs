// Configuration for fake instance generation

use serde::Deserialize;

/// Largest usable `float_bound`
pub const MAX_FLOAT_BOUND: f64 = f64::MAX / 2.0;

/// Policy knobs for the fake generator
///
/// Deserializable so callers can keep generator settings next to their model
/// files; any missing key takes its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// How many times one record may appear on the active record chain.
    /// A reference beyond this resolves to its terminal case (null, empty collection).
    pub max_self_reference_depth: usize,

    /// Hard limit on descriptor nesting during one generation
    pub max_nesting_depth: usize,

    /// Probability of generating null for a nullable union (0.0 - 1.0)
    pub optional_null_probability: f64,

    /// Minimum number of array elements / map entries
    pub min_items: usize,

    /// Maximum number of array elements / map entries
    pub max_items: usize,

    /// Minimum string length
    pub min_string_length: usize,

    /// Maximum string length
    pub max_string_length: usize,

    /// Minimum length of bytes values
    pub min_bytes_length: usize,

    /// Maximum length of bytes values
    pub max_bytes_length: usize,

    /// Floats are drawn from `[-float_bound, float_bound)`
    pub float_bound: f64,

    /// First year of the calendar range for dates and timestamps
    pub start_year: i32,

    /// Last year (inclusive) of the calendar range for dates and timestamps
    pub end_year: i32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_self_reference_depth: 1,
            max_nesting_depth: 32,
            optional_null_probability: 0.0,
            min_items: 1,
            max_items: 3,
            min_string_length: 1,
            max_string_length: 20,
            min_bytes_length: 1,
            max_bytes_length: 16,
            float_bound: 1.0e6,
            start_year: 2000,
            end_year: 2030,
        }
    }
}

impl GeneratorConfig {
    /// Checks that every range and probability is usable.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_self_reference_depth == 0 {
            return Err("max_self_reference_depth must be at least 1".into());
        }
        if self.max_nesting_depth == 0 {
            return Err("max_nesting_depth must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.optional_null_probability) {
            return Err(format!(
                "optional_null_probability must be within 0.0 - 1.0, got {}",
                self.optional_null_probability
            ));
        }
        if self.min_items > self.max_items {
            return Err("min_items exceeds max_items".into());
        }
        if self.min_string_length > self.max_string_length {
            return Err("min_string_length exceeds max_string_length".into());
        }
        if self.min_bytes_length > self.max_bytes_length {
            return Err("min_bytes_length exceeds max_bytes_length".into());
        }
        if !(self.float_bound.is_finite() && self.float_bound > 0.0) {
            return Err("float_bound must be a positive finite number".into());
        }
        // The draw range spans twice the bound
        if self.float_bound > MAX_FLOAT_BOUND {
            return Err(format!("float_bound must not exceed {:e}", MAX_FLOAT_BOUND));
        }
        if self.start_year > self.end_year {
            return Err("start_year is after end_year".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"max_self_reference_depth": 2, "optional_null_probability": 0.25}"#).unwrap();
        assert_eq!(config.max_self_reference_depth, 2);
        assert_eq!(config.optional_null_probability, 0.25);
        assert_eq!(config.max_items, 3);
    }

    #[test]
    fn test_invalid_ranges() {
        let config = GeneratorConfig {
            min_items: 4,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GeneratorConfig {
            optional_null_probability: 1.5,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_float_bound_capped() {
        let config = GeneratorConfig {
            float_bound: f64::MAX,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GeneratorConfig {
            float_bound: MAX_FLOAT_BOUND,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}

//! Configuration access port trait.
//!
//! Lookups are by INI section and key. Numeric getters fall back to
//! `default` when the key is absent or does not parse.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Trimmed, lower-cased value, or `default` when absent.
    fn get_choice(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_else(|| default.to_string())
    }
}

use std::{env, fmt::Display, str::FromStr};

use log::*;

/// Reads `name` from the environment and parses it. Unset or unparseable values are logged and replaced with
/// `default`.
pub fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) if !s.trim().is_empty() => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        _ => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}

/// Reads an optional, free-text environment variable. Blank values count as unset.
pub fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn env_values_fall_back_to_defaults() {
        env::set_var("OTD_TEST_HELPER_PORT", "not-a-number");
        assert_eq!(env_or_default("OTD_TEST_HELPER_PORT", 42u16), 42);
        env::set_var("OTD_TEST_HELPER_PORT", " 8080 ");
        assert_eq!(env_or_default("OTD_TEST_HELPER_PORT", 42u16), 8080);
        env::remove_var("OTD_TEST_HELPER_PORT");
        assert_eq!(env_or_default("OTD_TEST_HELPER_PORT", 42u16), 42);
        env::set_var("OTD_TEST_HELPER_NAME", "   ");
        assert_eq!(optional_env("OTD_TEST_HELPER_NAME"), None);
        env::remove_var("OTD_TEST_HELPER_NAME");
    }
}

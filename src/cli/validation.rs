//! Value parsers for CLI arguments.

use std::fs;
use std::path::PathBuf;

use reqwest::Url;

/// Validate port number is within valid range (1-65535)
pub fn validate_port(port_str: &str) -> Result<u16, String> {
    match port_str.parse::<u16>() {
        Ok(0) => Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!(
            "Port must be a valid number between 1 and 65535, got: '{}'",
            port_str
        )),
    }
}

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }
    fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read configuration file '{}': {}", path_str, e))
}

/// Validate rollback steps is a positive number
pub fn validate_rollback_steps(steps_str: &str) -> Result<u32, String> {
    let steps: u32 = steps_str.parse().map_err(|_| {
        format!(
            "Rollback steps must be a valid positive number, got: '{}'",
            steps_str
        )
    })?;

    if steps == 0 {
        return Err("Rollback steps must be greater than 0".to_string());
    }
    if steps > 100 {
        return Err("Rollback steps cannot exceed 100 for safety reasons".to_string());
    }

    Ok(steps)
}

/// Validate host address format (basic validation)
pub fn validate_host_address(host_str: &str) -> Result<String, String> {
    let host = host_str.trim();

    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.contains(' ') {
        return Err("Host address cannot contain spaces".to_string());
    }
    if host.len() > 253 {
        return Err("Host address is too long (maximum 253 characters)".to_string());
    }

    // Dotted digits must be a real IPv4 address; anything else is a hostname.
    if host.chars().all(|c| c.is_ascii_digit() || c == '.')
        && host.parse::<std::net::Ipv4Addr>().is_err()
    {
        return Err(format!("Invalid IPv4 address format: '{}'", host_str));
    }

    Ok(host.to_string())
}

/// Validate the server root used by `watch`: absolute http(s) URL
pub fn validate_api_url(url_str: &str) -> Result<String, String> {
    let url = Url::parse(url_str.trim())
        .map_err(|e| format!("Invalid API URL '{}': {}", url_str, e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("API URL must use http or https, got: '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("API URL has no host: '{}'", url_str));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_port_bounds() {
        for ok in ["1", "3000", "65535"] {
            assert!(validate_port(ok).is_ok(), "port {ok} should be valid");
        }
        for bad in ["0", "65536", "-1", "abc", ""] {
            assert!(validate_port(bad).is_err(), "port '{bad}' should be invalid");
        }
    }

    #[test]
    fn test_host_addresses() {
        for ok in ["localhost", "127.0.0.1", "0.0.0.0", "10.0.0.1", "api.agency.example"] {
            assert!(validate_host_address(ok).is_ok(), "host {ok} should be valid");
        }
        let too_long = "x".repeat(300);
        for bad in ["", "   ", "my host", "999.999.999.999", "1.2.3", too_long.as_str()] {
            assert!(validate_host_address(bad).is_err(), "host '{bad}' should be invalid");
        }
    }

    #[test]
    fn test_rollback_steps_bounds() {
        assert_eq!(validate_rollback_steps("1"), Ok(1));
        assert_eq!(validate_rollback_steps("100"), Ok(100));
        for bad in ["0", "101", "-1", "abc", ""] {
            assert!(validate_rollback_steps(bad).is_err(), "steps '{bad}' should be invalid");
        }
    }

    #[test]
    fn test_config_file_must_be_a_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_config_file_path(dir.path().to_str().unwrap()).is_err());

        let missing = dir.path().join("missing.toml");
        assert!(validate_config_file_path(missing.to_str().unwrap()).is_err());

        let file_path = dir.path().join("agency.toml");
        let mut file = fs::File::create(&file_path).unwrap();
        writeln!(file, "[server]\nport = 3000").unwrap();
        assert_eq!(
            validate_config_file_path(file_path.to_str().unwrap()).unwrap(),
            file_path
        );
    }

    #[test]
    fn test_api_url_validation() {
        assert_eq!(
            validate_api_url("http://localhost:3000/").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            validate_api_url("https://agency.example/backend").unwrap(),
            "https://agency.example/backend"
        );
        for bad in ["", "localhost:3000", "ftp://agency.example", "not a url"] {
            assert!(validate_api_url(bad).is_err(), "{bad} should be invalid");
        }
    }
}

// Package name validation for the npm registry

use std::sync::LazyLock;

use regex::Regex;

/// npm's "new package" naming rules: optional scope, lowercase URL-safe body
static NPM_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[a-z0-9][a-z0-9._~-]*/)?[a-z0-9][a-z0-9._~-]*$")
        .expect("npm package name pattern is valid")
});

/// Check a package name before it is sent to the registry
pub fn validate_npm_package_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Package name cannot be empty".to_string());
    }

    if name.len() > 214 {
        return Err(format!(
            "npm package name '{name}' is too long (max 214 characters)"
        ));
    }

    if name.starts_with('.') || name.starts_with('_') {
        return Err(format!("npm package name '{name}' cannot start with '.' or '_'"));
    }

    if !NPM_NAME.is_match(name) {
        return Err(format!(
            "npm package name '{name}' may only contain lowercase letters, digits and '-._~', with an optional @scope/ prefix"
        ));
    }

    Ok(())
}

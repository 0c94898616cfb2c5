//! Platform detection.

/// Check if running in a CI environment.
///
/// Used by `main()` to pick the non-interactive UI. Checks common CI
/// environment variables: `CI`, `GITHUB_ACTIONS`, `GITLAB_CI`, `CIRCLECI`,
/// `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Whether environment layouts follow the Windows conventions
/// (`Scripts\`, `Lib\site-packages`).
pub fn is_windows() -> bool {
    cfg!(windows)
}

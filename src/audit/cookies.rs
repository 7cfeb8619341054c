use tracing::debug;

use crate::types::{Category, Cookie, Issue, IssueSource, SameSite, Severity};

use super::patterns::PatternSet;
use super::sink::IssueSink;

/// Run every cookie check. Checks are independent; one cookie may raise several issues.
pub fn check_cookies(
    patterns: &PatternSet,
    cookies: &[Cookie],
    encrypted_transport: bool,
    sink: &IssueSink,
) {
    debug!("Checking {} cookies", cookies.len());

    for cookie in cookies {
        check_cookie(patterns, cookie, encrypted_transport, sink);
    }
}

fn check_cookie(patterns: &PatternSet, cookie: &Cookie, encrypted_transport: bool, sink: &IssueSink) {
    let source = || IssueSource::Cookie {
        name: cookie.name.clone(),
    };

    // One issue per matching pattern
    for pattern in patterns.matches_any(&[cookie.name.as_str(), cookie.value.as_str()]) {
        sink.append(
            Issue::new(
                Category::Cookies,
                "Sensitive data in cookie",
                Severity::Critical,
                format!("Potential sensitive data in cookie: {}", cookie.name),
                source(),
            )
            .with_pattern(pattern.name),
        );
    }

    if encrypted_transport && !cookie.secure {
        sink.append(Issue::new(
            Category::Cookies,
            "Missing Secure flag",
            Severity::High,
            format!("Cookie \"{}\" missing Secure flag on HTTPS site", cookie.name),
            source(),
        ));
    }

    if !cookie.http_only {
        sink.append(Issue::new(
            Category::Cookies,
            "Missing HttpOnly flag",
            Severity::Medium,
            format!("Cookie \"{}\" is accessible to JavaScript", cookie.name),
            source(),
        ));
    }

    match cookie.same_site() {
        None => sink.append(Issue::new(
            Category::Cookies,
            "Missing SameSite attribute",
            Severity::Medium,
            format!("Cookie \"{}\" missing SameSite attribute", cookie.name),
            source(),
        )),
        Some(SameSite::NoRestriction) if !cookie.secure => sink.append(Issue::new(
            Category::Cookies,
            "Insecure SameSite=None without Secure",
            Severity::High,
            format!("Cookie \"{}\" has SameSite=None but no Secure flag", cookie.name),
            source(),
        )),
        Some(_) => {}
    }
}

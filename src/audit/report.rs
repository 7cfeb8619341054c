use crate::types::{AuditReport, Category, Severity};

/// Generate a markdown summary of an audit run
pub fn render_markdown(report: &AuditReport) -> String {
    let mut md = String::new();

    // ========== HEADER ==========
    md.push_str(&format!(
        r#"# Page Security Audit

**{}**

**Audited on {} | Transport: {} | Report `{}`**

---

"#,
        report.page_url.as_deref().unwrap_or("Unknown page"),
        report.created_at,
        if report.encrypted_transport { "encrypted" } else { "plain" },
        report.id
    ));

    // ========== COUNTS ==========
    md.push_str("## Summary\n\n| Severity | Issues |\n|----------|--------|\n");
    for severity in Severity::ALL {
        md.push_str(&format!(
            "| {} {} | {} |\n",
            severity_emoji(severity),
            severity,
            report.counts.get(severity)
        ));
    }
    md.push_str(&format!("| **Total** | **{}** |\n\n", report.counts.total()));

    // ========== ISSUES ==========
    for category in Category::ALL {
        let issues: Vec<_> = report.issues_in(category).collect();
        md.push_str(&format!("## {}\n\n", category_title(category)));

        if issues.is_empty() {
            md.push_str("No issues found.\n\n");
            continue;
        }

        for issue in issues {
            md.push_str(&format!(
                "- **[{}]** {}: {}\n",
                issue.severity.as_str().to_uppercase(),
                issue.title,
                issue.description
            ));
        }
        md.push('\n');
    }

    // ========== CONSOLE LEAKS ==========
    if !report.leaks.is_empty() {
        md.push_str("## Console Excerpts\n\n");
        for leak in &report.leaks {
            md.push_str(&format!(
                "- `console.{}` ({})\n\n  ```\n  {}\n  ```\n",
                leak.level,
                leak.patterns.join(", "),
                leak.excerpt.replace('\n', "\n  ")
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n\n*Heuristic scan. Findings indicate potential exposure, not confirmed vulnerabilities.*\n");

    md
}

fn category_title(category: Category) -> &'static str {
    match category {
        Category::Headers => "Security Headers",
        Category::Cookies => "Cookies",
        Category::Storage => "Storage",
        Category::Console => "Console Output",
    }
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴",
        Severity::High => "🟠",
        Severity::Medium => "🟡",
        Severity::Low => "🔵",
    }
}

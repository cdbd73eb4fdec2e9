use crate::engine::{CheckResult, EvaluationResult, Outcome};

/// One `<testsuite>` per input document, one `<testcase>` per rule result.
pub(super) fn render(results: &[EvaluationResult], hide_messages: bool) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str("<testsuites>\n");

    for suite in results {
        let failures = suite.count(Outcome::Fail);
        let skipped = suite.count(Outcome::Warn) + suite.count(Outcome::Exception);
        xml.push_str(&format!(
            r#"  <testsuite name="{}" tests="{}" failures="{}" skipped="{}">"#,
            escape(&suite.filename),
            suite.results.len(),
            failures,
            skipped
        ));
        xml.push('\n');

        for check in &suite.results {
            xml.push_str(&format!(
                r#"    <testcase name="{}" classname="{}">"#,
                escape(&check.rule_id),
                escape(&suite.namespace)
            ));
            match check.outcome {
                Outcome::Pass => {}
                Outcome::Fail => xml.push_str(&element("failure", check, hide_messages)),
                Outcome::Warn | Outcome::Exception => {
                    xml.push_str(&element("skipped", check, hide_messages))
                }
            }
            xml.push_str("</testcase>\n");
        }

        xml.push_str("  </testsuite>\n");
    }

    xml.push_str("</testsuites>\n");
    xml
}

fn element(tag: &str, check: &CheckResult, hide_messages: bool) -> String {
    let message = escape(&check.message);
    if hide_messages {
        format!(r#"<{tag} message="{message}"/>"#)
    } else {
        format!(r#"<{tag} message="{message}">{message}</{tag}>"#)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

use crate::engine::{EvaluationResult, Outcome};

const HEADERS: [&str; 4] = ["OUTCOME", "FILE", "RULE", "MESSAGE"];

const RESET: &str = "\x1b[0m";

fn color(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Pass => "\x1b[32m",
        Outcome::Fail => "\x1b[31m",
        Outcome::Warn => "\x1b[33m",
        Outcome::Exception => "\x1b[36m",
    }
}

/// Aligned columns, one row per rule result.
pub(super) fn render(results: &[EvaluationResult], colored: bool) -> String {
    let rows: Vec<(Outcome, [String; 4])> = results
        .iter()
        .flat_map(|suite| {
            suite.results.iter().map(move |check| {
                (
                    check.outcome,
                    [
                        check.outcome.to_string().to_uppercase(),
                        suite.filename.clone(),
                        check.rule_id.clone(),
                        check.message.clone(),
                    ],
                )
            })
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for (_, cells) in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths, None);
    for (outcome, cells) in &rows {
        push_row(&mut out, cells, &widths, colored.then(|| color(*outcome)));
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4], color: Option<&str>) {
    let mut line = String::new();
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        // Message column is last and left unpadded.
        if i == cells.len() - 1 {
            line.push_str(cell);
            continue;
        }
        let padding = widths[i].saturating_sub(cell.chars().count());
        if i == 0 {
            if let Some(code) = color {
                line.push_str(code);
                line.push_str(cell);
                line.push_str(RESET);
                line.push_str(&" ".repeat(padding));
                continue;
            }
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(padding));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

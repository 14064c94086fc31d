use serde_json::json;

use crate::report::errors::Errors;
use crate::report::LogReport;

/// Log the report in JSON format.
pub fn log_report_json(errors: &mut Errors, report: &LogReport) {
    let pointers: Vec<_> = report
        .pointers
        .iter()
        .map(|pointer| {
            json!({
                "path": pointer.loc.pathname(),
                "linenr": if pointer.loc.line == 0 { None } else { Some(pointer.loc.line) },
                "column": if pointer.loc.column == 0 { None } else { Some(pointer.loc.column) },
                "offset": pointer.loc.offset,
                "length": pointer.length,
                "line": errors.get_line(&pointer.loc),
                "tag": pointer.msg,
            })
        })
        .collect();
    let report = json!({
        "severity": report.severity,
        "confidence": report.confidence,
        "key": report.key.to_string(),
        "message": &report.msg,
        "info": &report.info,
        "locations": pointers,
    });

    if let Err(e) = serde_json::to_writer_pretty(&mut errors.output, &report) {
        eprintln!("JSON error: {e:#}");
    }
}

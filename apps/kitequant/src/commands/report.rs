use crate::output::{write_line, ConsoleReportSink};
use kitequant_application::reporting::generate_report;
use kitequant_application::shared::DEFAULT_CURRENCY;
use kitequant_infrastructure::artifacts::FilesystemArtifactReader;
use std::io::Write;
use std::path::Path;

pub fn run(input: &Path, currency: Option<&str>, out: &mut dyn Write) -> Result<(), String> {
    let reader = FilesystemArtifactReader::new();
    let currency = currency.unwrap_or(DEFAULT_CURRENCY);

    let mut sink = ConsoleReportSink::new(&mut *out, currency);
    let result = generate_report(input, &reader, &mut sink)?;
    sink.finish()?;

    write_line(out, &format!("run_id: {}", result.run_id))
}

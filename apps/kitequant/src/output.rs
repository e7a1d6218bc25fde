use kitequant_domain::repositories::report_sink::ReportSink;
use kitequant_domain::services::report::{FinalReport, TradeReport};
use std::io::Write;

pub const BANNER_TITLE: &str = "KITEQUANT FOR TEENS";
pub const BANNER_SUBTITLE: &str = "(Like Zerodha, but simpler!)";
const BANNER_WIDTH: usize = 50;

/// Centres `text` in `width` columns, padding with `fill`.
///
/// An odd margin puts the extra fill character on the right, except when both
/// the margin and the width are odd.
pub fn center(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let margin = width - len;
    let left = margin / 2 + (margin & width & 1);
    let right = margin - left;
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(text);
    out.extend(std::iter::repeat(fill).take(right));
    out
}

pub fn write_line(out: &mut dyn Write, line: &str) -> Result<(), String> {
    writeln!(out, "{line}").map_err(|err| format!("failed to write output: {err}"))
}

pub fn print_banner(out: &mut dyn Write) -> Result<(), String> {
    write_line(out, "")?;
    write_line(out, &center(BANNER_TITLE, BANNER_WIDTH, '-'))?;
    write_line(out, BANNER_SUBTITLE)?;
    write_line(out, "")
}

/// `1234567.891` -> `1,234,567.89`.
pub fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed != "0.00";
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

pub fn trade_line(currency: &str, report: &TradeReport) -> String {
    format!(
        "Trade {}: {}{:.2} ({})",
        report.trade_index,
        currency,
        report.pnl_after_commission,
        if report.is_profit { "Profit" } else { "Loss" }
    )
}

/// Prints the run report to a terminal-like writer.
pub struct ConsoleReportSink<W: Write> {
    out: W,
    currency: String,
    failed: Option<String>,
}

impl<W: Write> ConsoleReportSink<W> {
    pub fn new(out: W, currency: impl Into<String>) -> Self {
        Self {
            out,
            currency: currency.into(),
            failed: None,
        }
    }

    /// First write error seen, if any.
    pub fn finish(self) -> Result<(), String> {
        match self.failed {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn emit(&mut self, line: String) {
        if self.failed.is_some() {
            return;
        }
        if let Err(err) = write_line(&mut self.out, &line) {
            self.failed = Some(err);
        }
    }
}

impl<W: Write> ReportSink for ConsoleReportSink<W> {
    fn trade_closed(&mut self, report: &TradeReport) {
        let line = trade_line(&self.currency, report);
        self.emit(line);
    }

    fn finished(&mut self, report: &FinalReport) {
        let ending = format!(
            "\nEnding with: {}{}",
            self.currency,
            format_money(report.final_value)
        );
        let total = format!(
            "Total Profit: {}{} from {} trades",
            self.currency,
            format_money(report.profit_total),
            report.trade_count
        );
        self.emit(ending);
        self.emit(total);
    }
}

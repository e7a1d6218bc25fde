use crate::services::report::{FinalReport, TradeReport};

pub trait ReportSink {
    fn trade_closed(&mut self, report: &TradeReport);
    fn finished(&mut self, report: &FinalReport);
}

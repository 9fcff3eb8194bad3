use crate::domain::pricing;
use crate::domain::quote::{Quote, QuoteRequest};
use crate::domain::tier::ServiceTier;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct QuoteLine<'a> {
    email: &'a str,
    tier: ServiceTier,
    billed_hours: Decimal,
    total_minor: u64,
    total: Decimal,
}

/// Writes priced requests as CSV.
pub struct QuoteWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> QuoteWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_quote(&mut self, request: &QuoteRequest, quote: &Quote) -> Result<()> {
        self.writer.serialize(QuoteLine {
            email: &request.email,
            tier: quote.tier,
            billed_hours: quote.billed_hours.round_dp(2).normalize(),
            total_minor: quote.total.value(),
            total: quote.total.to_major(),
        })?;
        Ok(())
    }

    /// Prices each request and writes one line per request.
    pub fn write_requests<I>(&mut self, requests: I) -> Result<()>
    where
        I: IntoIterator<Item = QuoteRequest>,
    {
        for request in requests {
            let quote = pricing::price(&request);
            self.write_quote(&request, &quote)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_output() {
        let mut buffer = Vec::new();
        {
            let mut writer = QuoteWriter::new(&mut buffer);
            let basic = QuoteRequest {
                email: "a@b.co".to_string(),
                ..Default::default()
            };
            let partial = QuoteRequest {
                email: "c@d.co".to_string(),
                start: "06:00".parse().unwrap(),
                end: "09:20".parse().unwrap(),
                dangerous_location: true,
                ..Default::default()
            };
            writer.write_requests(vec![basic, partial]).unwrap();
        }

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "email,tier,billed_hours,total_minor,total");
        assert_eq!(lines[1], "a@b.co,Basic,12,120000,1200");
        assert_eq!(lines[2], "c@d.co,Basic,3.33,46667,466.67");
    }
}

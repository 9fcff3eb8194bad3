use crate::domain::flow::MISSING_EMAIL_MESSAGE;
use crate::domain::quote::QuoteRequest;
use crate::error::{CheckoutError, Result};
use std::io::Read;

/// Reads quote requests from a CSV source.
///
/// Expects an `email, tier, start, end` header, optionally followed by the
/// `dangerous, weather, emergency, special_equipment` flag columns. Missing
/// or blank flags read as `false`. A row without an email is rejected.
pub struct QuoteReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> QuoteReader<R> {
    /// Creates a new `QuoteReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes requests.
    pub fn requests(self) -> impl Iterator<Item = Result<QuoteRequest>> {
        self.reader
            .into_deserialize::<QuoteRequest>()
            .map(|result| match result {
                Ok(request) if !request.has_email() => Err(CheckoutError::Validation(
                    MISSING_EMAIL_MESSAGE.to_string(),
                )),
                other => other.map_err(CheckoutError::from),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tier::ServiceTier;

    #[test]
    fn test_reader_valid_stream() {
        let data = "email, tier, start, end, dangerous, weather, emergency, special_equipment\n\
                    a@b.co, Basic, 06:00, 18:00, true, false, false, false\n\
                    c@d.co, Advanced, 00:00, 03:00, , , 1, 0";
        let reader = QuoteReader::new(data.as_bytes());
        let results: Vec<Result<QuoteRequest>> = reader.requests().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.email, "a@b.co");
        assert!(first.dangerous_location);
        assert!(!first.adverse_weather);

        let second = results[1].as_ref().unwrap();
        assert_eq!(second.tier, ServiceTier::Advanced);
        assert!(!second.dangerous_location);
        assert!(second.emergency);
        assert!(!second.special_equipment);
    }

    #[test]
    fn test_reader_missing_flag_columns() {
        let data = "email, tier, start, end\nops@site.co, Intermediate, 20:00, 23:00";
        let reader = QuoteReader::new(data.as_bytes());
        let request = reader.requests().next().unwrap().unwrap();
        assert_eq!(request.tier, ServiceTier::Intermediate);
        assert!(!request.dangerous_location && !request.emergency);
    }

    #[test]
    fn test_reader_malformed_lines() {
        let data = "email, tier, start, end\n\
                    a@b.co, Platinum, 06:00, 18:00\n\
                    a@b.co, Basic, 6pm, 18:00\n\
                    a@b.co, Basic, 06:00, 18:00";
        let reader = QuoteReader::new(data.as_bytes());
        let results: Vec<Result<QuoteRequest>> = reader.requests().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_reader_rejects_blank_email() {
        let data = "email, tier, start, end
                    , Basic, 06:00, 18:00
                    a@b.co, Basic, 06:00, 18:00";
        let reader = QuoteReader::new(data.as_bytes());
        let results: Vec<Result<QuoteRequest>> = reader.requests().collect();

        assert!(matches!(
            &results[0],
            Err(CheckoutError::Validation(message)) if message == MISSING_EMAIL_MESSAGE
        ));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_reader_lowercase_tier() {
        let data = "email, tier, start, end
a@b.co, advanced, 06:00, 18:00";
        let reader = QuoteReader::new(data.as_bytes());
        let request = reader.requests().next().unwrap().unwrap();
        assert_eq!(request.tier, ServiceTier::Advanced);
    }
}

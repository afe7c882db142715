use super::normalizer::normalize_header;
use super::record::RawShipment;
use std::io::Read;

/// Reads a shipment export, keeping non-blank cells keyed by normalized header.
pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<RawShipment>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect::<RawShipment>();
        rows.push(row);
    }

    Ok(rows)
}

fn strip_invisible(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "")
}

/// Canonical column name: invisible characters removed, lowercase, words joined by `_`.
pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = strip_invisible(value);
    let collapsed = cleaned
        .split(|ch: char| ch.is_whitespace() || ch == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    collapsed.to_ascii_lowercase()
}

/// Key used to match an awarded forwarder name against its quote column.
pub(crate) fn forwarder_key(name: &str) -> String {
    let cleaned = strip_invisible(name).to_ascii_lowercase();
    cleaned
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_snake_cased() {
        assert_eq!(normalize_header("\u{feff}Request Reference"), "request_reference");
        assert_eq!(normalize_header("  weight-kg "), "weight_kg");
        assert_eq!(
            normalize_header("final_quote_awarded_freight_forwader_Carrier"),
            "final_quote_awarded_freight_forwader_carrier"
        );
    }

    #[test]
    fn forwarder_names_map_to_quote_columns() {
        assert_eq!(forwarder_key("Kuehne Nagel"), "kuehne_nagel");
        assert_eq!(forwarder_key("DHL  Express "), "dhl_express");
        assert_eq!(forwarder_key("Scan-Global Logistics"), "scan_global_logistics");
    }
}

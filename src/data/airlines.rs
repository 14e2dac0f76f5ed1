//! IATA carrier codes for the airlines most often seen on watched routes

/// Known carrier codes and their airline names
const AIRLINES: &[(&str, &str)] = &[
    ("QF", "Qantas"),
    ("VA", "Virgin Australia"),
    ("JQ", "Jetstar"),
    ("BA", "British Airways"),
    ("SQ", "Singapore Airlines"),
    ("EK", "Emirates"),
    ("QR", "Qatar Airways"),
    ("CX", "Cathay Pacific"),
    ("TG", "Thai Airways"),
    ("MH", "Malaysia Airlines"),
    ("GA", "Garuda Indonesia"),
    ("AA", "American Airlines"),
    ("UA", "United Airlines"),
    ("DL", "Delta Air Lines"),
    ("AF", "Air France"),
    ("LH", "Lufthansa"),
    ("KL", "KLM"),
];

/// Returns the airline name for a carrier code, or a labelled fallback
///
/// # Examples
/// ```
/// assert_eq!(farewatch::data::airline_name("QF"), "Qantas");
/// assert_eq!(farewatch::data::airline_name("ZZ"), "Unknown airline (ZZ)");
/// ```
pub fn airline_name(code: &str) -> String {
    let code = code.trim().to_uppercase();
    AIRLINES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Unknown airline ({})", code))
}

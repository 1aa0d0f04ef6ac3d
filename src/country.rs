//! Country name → ISO 3166-1 alpha-2 normalization for CRM address fields.

/// Fallback when the input is empty or unrecognized.
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// Upper-cased full names and common aliases.
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("UNITED STATES", "US"),
    ("UNITED STATES OF AMERICA", "US"),
    ("USA", "US"),
    ("U.S.A.", "US"),
    ("U.S.", "US"),
    ("AMERICA", "US"),
    ("CANADA", "CA"),
    ("MEXICO", "MX"),
    ("UNITED KINGDOM", "GB"),
    ("GREAT BRITAIN", "GB"),
    ("UK", "GB"),
    ("ENGLAND", "GB"),
    ("SCOTLAND", "GB"),
    ("WALES", "GB"),
    ("NORTHERN IRELAND", "GB"),
    ("IRELAND", "IE"),
    ("FRANCE", "FR"),
    ("GERMANY", "DE"),
    ("SPAIN", "ES"),
    ("PORTUGAL", "PT"),
    ("ITALY", "IT"),
    ("NETHERLANDS", "NL"),
    ("THE NETHERLANDS", "NL"),
    ("HOLLAND", "NL"),
    ("BELGIUM", "BE"),
    ("LUXEMBOURG", "LU"),
    ("SWITZERLAND", "CH"),
    ("AUSTRIA", "AT"),
    ("DENMARK", "DK"),
    ("NORWAY", "NO"),
    ("SWEDEN", "SE"),
    ("FINLAND", "FI"),
    ("ICELAND", "IS"),
    ("POLAND", "PL"),
    ("CZECH REPUBLIC", "CZ"),
    ("CZECHIA", "CZ"),
    ("GREECE", "GR"),
    ("TURKEY", "TR"),
    ("ISRAEL", "IL"),
    ("UNITED ARAB EMIRATES", "AE"),
    ("UAE", "AE"),
    ("SAUDI ARABIA", "SA"),
    ("QATAR", "QA"),
    ("INDIA", "IN"),
    ("CHINA", "CN"),
    ("JAPAN", "JP"),
    ("SOUTH KOREA", "KR"),
    ("KOREA", "KR"),
    ("SINGAPORE", "SG"),
    ("PHILIPPINES", "PH"),
    ("AUSTRALIA", "AU"),
    ("NEW ZEALAND", "NZ"),
    ("SOUTH AFRICA", "ZA"),
    ("BRAZIL", "BR"),
    ("ARGENTINA", "AR"),
    ("CHILE", "CL"),
    ("COLOMBIA", "CO"),
    ("PERU", "PE"),
    ("PUERTO RICO", "PR"),
    ("BAHAMAS", "BS"),
    ("THE BAHAMAS", "BS"),
    ("BERMUDA", "BM"),
    ("JAMAICA", "JM"),
    ("DOMINICAN REPUBLIC", "DO"),
    ("COSTA RICA", "CR"),
    ("PANAMA", "PA"),
    ("GUAM", "GU"),
    ("VIRGIN ISLANDS", "VI"),
    ("U.S. VIRGIN ISLANDS", "VI"),
];

fn known_code(candidate: &str) -> Option<&'static str> {
    COUNTRY_NAMES
        .iter()
        .map(|(_, code)| *code)
        .find(|code| *code == candidate)
}

/// Maps a country name, alias, or code to a 2-letter code.
///
/// Known 2-letter codes pass through upper-cased; everything unrecognized
/// (including empty input) becomes [`DEFAULT_COUNTRY_CODE`].
pub fn country_code(name: Option<&str>) -> &'static str {
    let normalized = match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_uppercase(),
        _ => return DEFAULT_COUNTRY_CODE,
    };

    if let Some((_, code)) = COUNTRY_NAMES.iter().find(|(n, _)| *n == normalized) {
        return *code;
    }

    if normalized.len() == 2 {
        if let Some(code) = known_code(&normalized) {
            return code;
        }
    }

    tracing::debug!("Unrecognized country '{}', defaulting to US", normalized);
    DEFAULT_COUNTRY_CODE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_names_any_case() {
        assert_eq!(country_code(Some("UNITED STATES")), "US");
        assert_eq!(country_code(Some("canada")), "CA");
        assert_eq!(country_code(Some("United Kingdom")), "GB");
    }

    #[test]
    fn test_usa_variations() {
        assert_eq!(country_code(Some("USA")), "US");
        assert_eq!(country_code(Some("UNITED STATES OF AMERICA")), "US");
        assert_eq!(country_code(Some(" u.s.a. ")), "US");
    }

    #[test]
    fn test_two_letter_passthrough() {
        assert_eq!(country_code(Some("US")), "US");
        assert_eq!(country_code(Some("ca")), "CA");
        assert_eq!(country_code(Some("GB")), "GB");
    }

    #[test]
    fn test_defaults_to_us() {
        assert_eq!(country_code(None), "US");
        assert_eq!(country_code(Some("")), "US");
        assert_eq!(country_code(Some("MADE UP COUNTRY")), "US");
        assert_eq!(country_code(Some("XYZ")), "US");
        assert_eq!(country_code(Some("ZZ")), "US");
    }
}

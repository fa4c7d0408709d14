use async_trait::async_trait;

/// Currency code for a country, `USD` when unmapped.
pub fn currency_for_country(country: &str) -> &'static str {
    match country {
        "United States" | "Ecuador" | "El Salvador" | "Panama" | "Timor-Leste" | "Palau"
        | "Marshall Islands" | "Micronesia" => "USD",
        "Canada" => "CAD",
        "United Kingdom" => "GBP",
        "Germany" | "France" | "Italy" | "Spain" | "Netherlands" | "Belgium" | "Austria"
        | "Portugal" | "Finland" | "Ireland" | "Luxembourg" | "Greece" | "Slovenia"
        | "Cyprus" | "Malta" | "Slovakia" | "Estonia" | "Latvia" | "Lithuania" | "Croatia"
        | "Andorra" | "Monaco" | "Montenegro" | "Kosovo" | "San Marino" | "Vatican City" => "EUR",
        "Japan" => "JPY",
        "Australia" | "Kiribati" | "Nauru" | "Tuvalu" => "AUD",
        "New Zealand" => "NZD",
        "Switzerland" | "Liechtenstein" => "CHF",
        "Singapore" => "SGD",
        "Hong Kong" => "HKD",
        "China" => "CNY",
        "India" => "INR",
        "South Korea" => "KRW",
        "Brazil" => "BRL",
        "Mexico" => "MXN",
        "Russia" => "RUB",
        "South Africa" => "ZAR",
        "Norway" => "NOK",
        "Sweden" => "SEK",
        "Denmark" => "DKK",
        "Poland" => "PLN",
        "Czech Republic" => "CZK",
        "Hungary" => "HUF",
        "Romania" => "RON",
        "Bulgaria" => "BGN",
        "Israel" | "Palestine" => "ILS",
        "Turkey" => "TRY",
        "Egypt" => "EGP",
        "Nigeria" => "NGN",
        "Kenya" => "KES",
        "Morocco" => "MAD",
        "Ghana" => "GHS",
        "Tunisia" => "TND",
        "Algeria" => "DZD",
        "Ethiopia" => "ETB",
        "Uganda" => "UGX",
        "Tanzania" => "TZS",
        "Argentina" => "ARS",
        "Bolivia" => "BOB",
        "Chile" => "CLP",
        "Colombia" => "COP",
        "Paraguay" => "PYG",
        "Peru" => "PEN",
        "Uruguay" => "UYU",
        "Venezuela" => "VES",
        "Costa Rica" => "CRC",
        "Guatemala" => "GTQ",
        "Jamaica" => "JMD",
        "Dominican Republic" => "DOP",
        "Trinidad and Tobago" => "TTD",
        "Bahrain" => "BHD",
        "Bangladesh" => "BDT",
        "Cambodia" => "KHR",
        "Georgia" => "GEL",
        "Indonesia" => "IDR",
        "Iraq" => "IQD",
        "Jordan" => "JOD",
        "Kazakhstan" => "KZT",
        "Kuwait" => "KWD",
        "Lebanon" => "LBP",
        "Malaysia" => "MYR",
        "Maldives" => "MVR",
        "Mongolia" => "MNT",
        "Nepal" => "NPR",
        "Oman" => "OMR",
        "Pakistan" => "PKR",
        "Philippines" => "PHP",
        "Qatar" => "QAR",
        "Saudi Arabia" => "SAR",
        "Sri Lanka" => "LKR",
        "Thailand" => "THB",
        "United Arab Emirates" => "AED",
        "Uzbekistan" => "UZS",
        "Vietnam" => "VND",
        "Albania" => "ALL",
        "Belarus" => "BYN",
        "Bosnia and Herzegovina" => "BAM",
        "Iceland" => "ISK",
        "Moldova" => "MDL",
        "North Macedonia" => "MKD",
        "Serbia" => "RSD",
        "Ukraine" => "UAH",
        "Fiji" => "FJD",
        "Papua New Guinea" => "PGK",
        "Samoa" => "WST",
        "Tonga" => "TOP",
        "Vanuatu" => "VUV",
        _ => "USD",
    }
}

fn symbol_for(code: &str) -> Option<&'static str> {
    let symbol = match code {
        "AED" => "د.إ",
        "ALL" => "L",
        "ARS" | "CLP" | "COP" | "DOP" | "JMD" | "MXN" | "TTD" | "UYU" => "$",
        "AUD" => "A$",
        "BAM" => "КМ",
        "BDT" => "৳",
        "BGN" => "лв",
        "BHD" => ".د.ب",
        "BOB" => "Bs.",
        "BRL" => "R$",
        "BYN" => "Br",
        "CAD" => "C$",
        "CHF" => "Fr",
        "CNY" | "JPY" => "¥",
        "CRC" => "₡",
        "CZK" => "Kč",
        "DKK" | "ISK" | "NOK" | "SEK" => "kr",
        "DZD" => "د.ج",
        "EGP" | "GBP" => "£",
        "ETB" => "Br",
        "EUR" => "€",
        "FJD" => "$",
        "GEL" => "₾",
        "GHS" => "₵",
        "GTQ" => "Q",
        "HKD" => "HK$",
        "HUF" => "Ft",
        "IDR" => "Rp",
        "ILS" => "₪",
        "INR" => "₹",
        "IQD" => "ع.د",
        "JOD" => "د.ا",
        "KES" | "TZS" | "UGX" => "Sh",
        "KHR" => "៛",
        "KRW" => "₩",
        "KWD" => "د.ك",
        "KZT" => "₸",
        "LBP" => "ل.ل",
        "LKR" => "Rs",
        "MAD" => "د.م.",
        "MDL" => "L",
        "MKD" => "ден",
        "MNT" => "₮",
        "MVR" => ".ރ",
        "MYR" => "RM",
        "NGN" => "₦",
        "NPR" | "PKR" => "₨",
        "NZD" => "NZ$",
        "OMR" => "ر.ع.",
        "PEN" => "S/",
        "PGK" => "K",
        "PHP" => "₱",
        "PLN" => "zł",
        "PYG" => "₲",
        "QAR" => "ر.ق",
        "RON" => "lei",
        "RSD" => "дин.",
        "RUB" => "₽",
        "SAR" => "ر.س",
        "SGD" => "S$",
        "THB" => "฿",
        "TND" => "د.ت",
        "TOP" => "T$",
        "TRY" => "₺",
        "UAH" => "₴",
        "USD" => "$",
        "UZS" => "so'm",
        "VES" => "Bs.S",
        "VND" => "₫",
        "VUV" => "Vt",
        "WST" => "T",
        "ZAR" => "R",
        _ => return None,
    };
    Some(symbol)
}

/// Display glyph for a currency code, or the code itself when unmapped.
pub fn currency_symbol(code: &str) -> String {
    match symbol_for(&code.to_uppercase()) {
        Some(symbol) => symbol.to_string(),
        None => code.to_string(),
    }
}

/// Currencies with no minor unit.
const ZERO_DECIMAL: [&str; 3] = ["JPY", "KRW", "VND"];

/// Currencies quoted to three decimal places.
const THREE_DECIMAL: [&str; 5] = ["BHD", "IQD", "JOD", "KWD", "OMR"];

/// Format an amount with its currency glyph and the currency's decimal
/// convention.
pub fn format_price(amount: f64, code: &str) -> String {
    let upper = code.to_uppercase();
    let symbol = currency_symbol(code);

    if ZERO_DECIMAL.contains(&upper.as_str()) {
        return format!("{}{}", symbol, group_thousands(amount.round() as i64));
    }
    if THREE_DECIMAL.contains(&upper.as_str()) {
        return format!("{}{:.3}", symbol, amount);
    }
    format!("{}{:.2}", symbol, amount)
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Remote amount conversion. Implementations return `None` on any failure
/// (and log it); callers fall back to the unconverted amount rather than
/// blocking the flow.
#[async_trait]
pub trait CurrencyConverter: Send + Sync {
    async fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64>;
}

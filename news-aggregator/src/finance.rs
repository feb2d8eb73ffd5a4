//! Finance vocabulary: company lookup, keyword bias and domain tiers.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Company {
    pub ticker: &'static str,
    pub cik: &'static str,
}

const AMAZON: Company = Company { ticker: "AMZN", cik: "0001018724" };
const NVIDIA: Company = Company { ticker: "NVDA", cik: "0001045810" };
const TESLA: Company = Company { ticker: "TSLA", cik: "0001318605" };
const APPLE: Company = Company { ticker: "AAPL", cik: "0000320193" };
const MICROSOFT: Company = Company { ticker: "MSFT", cik: "0000789019" };
const ALPHABET: Company = Company { ticker: "GOOGL", cik: "0001652044" };
const META: Company = Company { ticker: "META", cik: "0001326801" };

const COMPANIES: &[(&str, Company)] = &[
    ("amazon", AMAZON),
    ("amazon.com", AMAZON),
    ("nvidia", NVIDIA),
    ("tesla", TESLA),
    ("apple", APPLE),
    ("microsoft", MICROSOFT),
    ("alphabet", ALPHABET),
    ("google", ALPHABET),
    ("meta", META),
    ("meta platforms", META),
    ("facebook", META),
];

/// Finance outlets, matched as substrings of the host.
pub const FINANCE_DOMAINS: &[&str] = &[
    "reuters.com",
    "bloomberg.com",
    "wsj.com",
    "ft.com",
    "cnbc.com",
    "marketwatch.com",
    "businesswire.com",
    "prnewswire.com",
    "sec.gov",
    "investors.businesswire.com",
    "ir.aboutamazon.com",
    "ir.microsoft.com",
    "ir.apple.com",
];

pub const TRUSTED_DOMAINS: &[&str] = &[
    "apnews.com",
    "bbc.co.uk",
    "bbc.com",
    "nytimes.com",
    "washingtonpost.com",
    "theguardian.com",
    "arstechnica.com",
    "theverge.com",
    "techcrunch.com",
];

/// Retail advice and opinion, kept out of finance results.
pub const OPINION_DOMAINS: &[&str] = &[
    "investopedia.com",
    "ibtimes.com",
    "thestreet.com",
    "fool.com",
    "investors.com",
];

pub const FINANCE_KEYWORDS: &[&str] = &[
    "earnings",
    "revenue",
    "guidance",
    "outlook",
    "forecast",
    "margin",
    "EBIT",
    "EBITDA",
    "free cash flow",
    "FCF",
    "buyback",
    "dividend",
    "downgrade",
    "upgrade",
    "price target",
    "rating",
    "M&A",
    "acquisition",
    "merger",
    "antitrust",
    "regulator",
    "SEC",
    "FTC",
    "strike",
    "layoffs",
    "restructuring",
    "spin-off",
    "catalyst",
];

const KEYWORD_BUCKET_SIZE: usize = 16;

/// Company by name ("Apple", "meta platforms") or ticker ("aapl", "GOOGL").
pub fn lookup_company(query: &str) -> Option<Company> {
    let key = query.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }
    COMPANIES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, company)| *company)
        .or_else(|| {
            COMPANIES
                .iter()
                .map(|(_, company)| *company)
                .find(|company| company.ticker.eq_ignore_ascii_case(&key))
        })
}

/// `<query> (earnings OR revenue OR ...)`, with the ticker
/// OR-ed into the subject when the company is known.
pub fn finance_query(query: &str) -> String {
    let query = query.trim();
    let subject = match lookup_company(query) {
        Some(company) if !company.ticker.eq_ignore_ascii_case(query) => {
            format!("({} OR {})", query, company.ticker)
        }
        _ => query.to_string(),
    };
    let bucket = FINANCE_KEYWORDS
        .iter()
        .take(KEYWORD_BUCKET_SIZE)
        .map(|k| if k.contains(' ') { format!("\"{}\"", k) } else { k.to_string() })
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{} ({})", subject, bucket)
}

pub fn sec_atom_url(base: &str, cik: &str) -> String {
    format!(
        "{}?action=getcompany&CIK={}&type=&owner=exclude&count=40&output=atom",
        base, cik
    )
}

fn host_matches(domain: &str, list: &[&str]) -> bool {
    !domain.is_empty() && list.iter().any(|d| domain.contains(d))
}

pub fn is_finance_domain(domain: &str) -> bool {
    host_matches(domain, FINANCE_DOMAINS)
}

pub fn is_trusted_domain(domain: &str) -> bool {
    host_matches(domain, TRUSTED_DOMAINS)
}

pub fn is_opinion_domain(domain: &str) -> bool {
    host_matches(domain, OPINION_DOMAINS)
}

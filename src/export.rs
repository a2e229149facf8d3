//! Read-only reports over the subscriber store, used by `newsletter-export`.

use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Write;

use crate::domain::SubscriberRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Confirmed,
    Pending,
}

impl StatusFilter {
    pub fn accepts(
        self,
        record: &SubscriberRecord,
    ) -> bool {
        match self {
            Self::All => true,
            Self::Confirmed => record.confirmed,
            Self::Pending => !record.confirmed,
        }
    }
}

pub fn filter_records(
    records: &[SubscriberRecord],
    status: StatusFilter,
) -> Vec<&SubscriberRecord> {
    records.iter().filter(|r| status.accepts(r)).collect()
}

/// One address per line, in store order. Duplicates are kept, so the output
/// mirrors the store.
pub fn render_email_list(records: &[&SubscriberRecord]) -> String {
    records.iter().fold(String::new(), |mut out, r| {
        out.push_str(r.email.trim());
        out.push('\n');
        out
    })
}

pub fn render_csv(records: &[&SubscriberRecord]) -> String {
    let mut out = String::from("email,subscribed_at,confirmed,confirmed_at\n");
    for r in records {
        let confirmed_at = r.confirmed_at.map(|t| t.to_rfc3339()).unwrap_or_default();
        // writing to a String cannot fail
        let _ = writeln!(
            out,
            "{},{},{},{}",
            csv_field(r.email.trim()),
            r.subscribed_at.to_rfc3339(),
            r.confirmed,
            confirmed_at,
        );
    }
    out
}

/// Quote a field per RFC 4180 when it contains a separator, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Store-wide counts. `distinct_emails` compares normalized addresses, so
/// `total - distinct_emails` is the number of duplicate records.
#[derive(Debug, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub distinct_emails: usize,
}

impl Summary {
    pub fn from_records(records: &[SubscriberRecord]) -> Self {
        let confirmed = records.iter().filter(|r| r.confirmed).count();
        let distinct_emails = records
            .iter()
            .map(|r| r.email.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .len();
        Self {
            total: records.len(),
            confirmed,
            pending: records.len() - confirmed,
            distinct_emails,
        }
    }

    pub fn duplicates(&self) -> usize { self.total - self.distinct_emails }
}

impl Display for Summary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "total:      {}", self.total)?;
        writeln!(f, "confirmed:  {}", self.confirmed)?;
        writeln!(f, "pending:    {}", self.pending)?;
        writeln!(f, "distinct:   {}", self.distinct_emails)?;
        writeln!(f, "duplicates: {}", self.duplicates())
    }
}

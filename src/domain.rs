//! Backend domains fronted by the gateway.
//!
//! A domain is both the route group a request is dispatched under and the key of
//! the structured log sink that request writes to.

use std::fmt;

/// One of the subsystems the gateway fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Auth,
    Club,
    Outing,
    Schedule,
    Announcement,
    /// External open APIs called directly by the gateway.
    OpenApi,
}

impl Domain {
    /// Every domain, in log-file creation order.
    pub const ALL: [Domain; 6] = [
        Domain::Auth,
        Domain::Club,
        Domain::Outing,
        Domain::Schedule,
        Domain::Announcement,
        Domain::OpenApi,
    ];

    /// Name used as the `service` tag and as the log file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Auth => "auth",
            Domain::Club => "club",
            Domain::Outing => "outing",
            Domain::Schedule => "schedule",
            Domain::Announcement => "announcement",
            Domain::OpenApi => "open-api",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_domain_names_are_unique() {
        let names: HashSet<_> = Domain::ALL.iter().map(|d| d.as_str()).collect();
        assert_eq!(names.len(), Domain::ALL.len());
        assert_eq!(Domain::OpenApi.to_string(), "open-api");
    }
}

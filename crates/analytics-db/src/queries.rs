//! Fixed SQL statements, keyed by the operation they serve.

/// A named, parameterized statement against `qr_requests`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedQuery {
    Insert,
    InsertAt,
    Total,
    Color,
    Logo,
    Both,
    AvgSize,
    AvgResponse,
    Since,
}

impl NamedQuery {
    pub const ALL: [NamedQuery; 9] = [
        Self::Insert,
        Self::InsertAt,
        Self::Total,
        Self::Color,
        Self::Logo,
        Self::Both,
        Self::AvgSize,
        Self::AvgResponse,
        Self::Since,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::InsertAt => "insert_at",
            Self::Total => "total",
            Self::Color => "color",
            Self::Logo => "logo",
            Self::Both => "both",
            Self::AvgSize => "avg_size",
            Self::AvgResponse => "avg_response",
            Self::Since => "since",
        }
    }

    pub const fn sql(self) -> &'static str {
        match self {
            Self::Insert => {
                "INSERT INTO qr_requests (has_color, has_logo, size, response_time_ms)
                 VALUES (?1, ?2, ?3, ?4)"
            }
            Self::InsertAt => {
                "INSERT INTO qr_requests (has_color, has_logo, size, response_time_ms, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            }
            Self::Total => "SELECT COUNT(*) FROM qr_requests",
            Self::Color => "SELECT COUNT(*) FROM qr_requests WHERE has_color = 1",
            Self::Logo => "SELECT COUNT(*) FROM qr_requests WHERE has_logo = 1",
            Self::Both => "SELECT COUNT(*) FROM qr_requests WHERE has_color = 1 AND has_logo = 1",
            Self::AvgSize => "SELECT AVG(size) FROM qr_requests",
            Self::AvgResponse => "SELECT AVG(response_time_ms) FROM qr_requests",
            Self::Since => "SELECT COUNT(*) FROM qr_requests WHERE created_at >= ?1",
        }
    }
}

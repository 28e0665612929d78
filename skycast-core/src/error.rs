use thiserror::Error;

/// Why an automatic position lookup failed. Codes match the three
/// geolocation failure kinds a position API can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    PositionUnavailable(String),
    #[error("Location request timed out")]
    Timeout,
}

impl GeolocationError {
    pub fn code(&self) -> u8 {
        match self {
            GeolocationError::PermissionDenied => 1,
            GeolocationError::PositionUnavailable(_) => 2,
            GeolocationError::Timeout => 3,
        }
    }

    /// Map a numeric code back to an error; unknown codes count as unavailable.
    pub fn from_code(code: u8, detail: impl Into<String>) -> Self {
        match code {
            1 => GeolocationError::PermissionDenied,
            3 => GeolocationError::Timeout,
            _ => GeolocationError::PositionUnavailable(detail.into()),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::PermissionDenied => {
                "Location access is turned off. Enable it with `skycast configure` or search for a place by name."
            }
            GeolocationError::PositionUnavailable(_) => {
                "Your position could not be determined. Check your network connection or search for a place by name."
            }
            GeolocationError::Timeout => {
                "Finding your position took too long. Try again or search for a place by name."
            }
        }
    }
}

/// Something the user should be told about a substituted result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Geocoding returned no candidates for the query.
    NotFound { query: String, fallback: String },
    /// Geocoding failed outright (network, status, parse, timeout).
    LookupFailed { query: String, fallback: String },
    /// Automatic positioning failed.
    Geolocation { error: GeolocationError, fallback: String },
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::NotFound { .. } => "City not found",
            Notice::LookupFailed { .. } => "Location search failed",
            Notice::Geolocation { .. } => "Using default location",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::NotFound { query, fallback } => {
                format!("\"{query}\" was not found. Showing weather for {fallback} instead.")
            }
            Notice::LookupFailed { query, fallback } => {
                format!(
                    "Could not search for \"{query}\" right now. Showing weather for {fallback} instead."
                )
            }
            Notice::Geolocation { error, fallback } => {
                format!("{} Showing weather for {fallback} instead.", error.user_message())
            }
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title(), self.message())
    }
}

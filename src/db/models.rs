use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Ordinary,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Ordinary => "ordinary",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::Ordinary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Safe,
    NotSerious,
    Serious,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "SAFE",
            Severity::NotSerious => "NOT_SERIOUS",
            Severity::Serious => "SERIOUS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SAFE" => Some(Severity::Safe),
            "NOT_SERIOUS" => Some(Severity::NotSerious),
            "SERIOUS" => Some(Severity::Serious),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    Confirm,
    False,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Confirm => "CONFIRM",
            VoteType::False => "FALSE",
        }
    }

    /// Strict parse. The original backend coerced anything other than the
    /// CONFIRM literal into a FALSE vote; unrecognized input is rejected
    /// here instead so a typo'd client cannot record a vote it never cast.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CONFIRM" => Some(VoteType::Confirm),
            "FALSE" => Some(VoteType::False),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub bio: String,
    pub role: Role,
    pub points: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub image_path: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    /// Frozen at creation time along with `severity`; never recomputed,
    /// even if the detection model changes later.
    pub pothole_count: i64,
    pub severity: Severity,
    pub caption: String,
    pub created_at: String,
}

/// Per-post vote tally, computed on demand from the verification ledger.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub valid: i64,
    #[serde(rename = "false")]
    pub false_: i64,
}

/// A post as served by the feed: the row plus its current tally.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithTally {
    #[serde(flatten)]
    pub post: Post,
    pub username: String,
    pub verification: VoteTally,
}

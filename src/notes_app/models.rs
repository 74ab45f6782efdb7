use serde::{Deserialize, Deserializer, Serialize};

const MAX_TITLE_CHARS: usize = 60;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Note {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct NewNote<'a> {
    pub title: String,
    pub content: &'a str,
}

impl<'a> NewNote<'a> {
    /// The backend requires a title, so the first line of the draft doubles as one.
    pub fn from_draft(draft: &'a str) -> Self {
        let first_line = draft.lines().next().unwrap_or_default().trim();
        NewNote {
            title: first_line.chars().take(MAX_TITLE_CHARS).collect(),
            content: draft,
        }
    }
}

#[derive(Deserialize)]
pub struct UpgradeResponse {
    pub plan: String,
}

#[derive(Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Login preset shown on the logged-out screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub label: String,
    pub email: String,
    pub password: String,
}

impl Account {
    pub fn new(label: &str, email: &str, password: &str) -> Self {
        Account {
            label: label.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Tenants are keyed by the first label of the email domain:
    /// `admin@acme.test` belongs to `acme`.
    pub fn tenant_slug(email: &str) -> Option<String> {
        let (_, domain) = email.rsplit_once('@')?;
        let slug = domain.split('.').next()?.trim();
        if slug.is_empty() {
            None
        } else {
            Some(slug.to_lowercase())
        }
    }

    pub fn demo_accounts() -> Vec<Account> {
        vec![
            Account::new("Login as Acme Admin", "admin@acme.test", "password"),
            Account::new("Login as Acme User", "user@acme.test", "password"),
            Account::new("Login as Globex Admin", "admin@globex.test", "password"),
            Account::new("Login as Globex User", "user@globex.test", "password"),
        ]
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

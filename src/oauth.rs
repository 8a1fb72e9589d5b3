use color_eyre::{
    eyre::{bail, eyre, OptionExt},
    Result,
};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use ulid::Ulid;

use crate::{config::Config, names, utils};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Github,
    Twitter,
    Google,
    Linkedin,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Github,
        Provider::Twitter,
        Provider::Google,
        Provider::Linkedin,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Twitter => "twitter",
            Provider::Google => "google",
            Provider::Linkedin => "linkedin",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.slug() == slug)
    }

    pub fn label(self) -> &'static str {
        match self {
            Provider::Github => "GitHub",
            Provider::Twitter => "Twitter",
            Provider::Google => "Google",
            Provider::Linkedin => "LinkedIn",
        }
    }

    /// Stored in `users.account_type_id`. Local accounts use 0.
    pub fn account_type_id(self) -> i64 {
        match self {
            Provider::Github => 1,
            Provider::Twitter => 2,
            Provider::Google => 3,
            Provider::Linkedin => 4,
        }
    }

    pub fn from_account_type(account_type_id: i64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.account_type_id() == account_type_id)
    }

    fn authorize_endpoint(self) -> &'static str {
        match self {
            Provider::Github => "https://github.com/login/oauth/authorize",
            Provider::Twitter => "https://twitter.com/i/oauth2/authorize",
            Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Provider::Linkedin => "https://www.linkedin.com/oauth/v2/authorization",
        }
    }

    fn token_endpoint(self) -> &'static str {
        match self {
            Provider::Github => "https://github.com/login/oauth/access_token",
            Provider::Twitter => "https://api.twitter.com/2/oauth2/token",
            Provider::Google => "https://oauth2.googleapis.com/token",
            Provider::Linkedin => "https://www.linkedin.com/oauth/v2/accessToken",
        }
    }

    fn profile_endpoint(self) -> &'static str {
        match self {
            Provider::Github => "https://api.github.com/user",
            Provider::Twitter => "https://api.twitter.com/2/users/me",
            Provider::Google => "https://openidconnect.googleapis.com/v1/userinfo",
            Provider::Linkedin => "https://api.linkedin.com/v2/userinfo",
        }
    }

    fn scope(self) -> &'static str {
        match self {
            Provider::Github => "read:user",
            Provider::Twitter => "users.read tweet.read",
            Provider::Google | Provider::Linkedin => "openid profile",
        }
    }

    fn uses_pkce(self) -> bool {
        self == Provider::Twitter
    }

    /// Pulls `(profile_id, name)` out of the provider's profile document.
    fn parse_profile(self, body: &Value) -> Option<Profile> {
        let (id, name) = match self {
            Provider::Github => (&body["id"], &body["login"]),
            Provider::Twitter => (&body["data"]["id"], &body["data"]["username"]),
            Provider::Google | Provider::Linkedin => (&body["sub"], &body["name"]),
        };

        let id = match id {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let name = name.as_str().filter(|s| !s.is_empty()).unwrap_or(&id).to_string();

        Some(Profile { id, name })
    }
}

/// The user as the provider knows them.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: String,
    pub name: String,
}

impl Profile {
    /// Local username for a first login, e.g. `octocat@github`.
    pub fn username(&self, provider: Provider) -> String {
        format!("{}@{}", self.name, provider.slug())
    }
}

/// A login redirect and the values to check on the callback.
pub struct Authorization {
    pub url: String,
    pub state: String,
    pub verifier: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct OAuthClient {
    pub provider: Provider,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl OAuthClient {
    pub fn authorize(&self) -> Result<Authorization> {
        let state = Ulid::new().to_string();
        let verifier = self
            .provider
            .uses_pkce()
            .then(|| format!("{}{}", Ulid::new(), Ulid::new()));

        let mut params = vec![
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", self.provider.scope()),
            ("state", state.as_str()),
        ];
        if let Some(verifier) = &verifier {
            params.push(("code_challenge", verifier.as_str()));
            params.push(("code_challenge_method", "plain"));
        }

        let url = Url::parse_with_params(self.provider.authorize_endpoint(), &params)?;
        Ok(Authorization {
            url: url.to_string(),
            state,
            verifier,
        })
    }

    /// Trades the callback `code` for an access token and fetches the profile.
    pub async fn exchange(
        &self,
        http: &reqwest::Client,
        code: &str,
        verifier: Option<&str>,
    ) -> Result<Profile> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(verifier) = verifier {
            form.push(("code_verifier", verifier));
        }

        let mut request = http
            .post(self.provider.token_endpoint())
            .header(reqwest::header::ACCEPT, "application/json");
        request = if self.provider == Provider::Twitter {
            request.basic_auth(&self.client_id, Some(&self.client_secret))
        } else {
            form.push(("client_secret", self.client_secret.as_str()));
            request
        };

        let token = request
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;

        let body = http
            .get(self.provider.profile_endpoint())
            .bearer_auth(&token.access_token)
            .header(reqwest::header::USER_AGENT, format!("quizzery/{}", utils::VERSION))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        self.provider
            .parse_profile(&body)
            .ok_or_else(|| eyre!("{} profile has no id", self.provider.label()))
    }
}

/// The providers with configured credentials.
pub struct OAuthClients {
    clients: Vec<OAuthClient>,
    http: reqwest::Client,
}

impl OAuthClients {
    pub fn from_config(config: &Config) -> Self {
        let credentials = [
            (Provider::Github, &config.github_client_id, &config.github_client_secret),
            (Provider::Twitter, &config.twitter_client_id, &config.twitter_client_secret),
            (Provider::Google, &config.google_client_id, &config.google_client_secret),
            (Provider::Linkedin, &config.linkedin_client_id, &config.linkedin_client_secret),
        ];

        let clients = credentials
            .into_iter()
            .filter_map(|(provider, id, secret)| {
                let (Some(id), Some(secret)) = (id, secret) else {
                    return None;
                };
                tracing::info!("{} login enabled", provider.label());
                Some(OAuthClient {
                    provider,
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                    redirect_uri: names::oauth_callback_url(&config.base_url, provider.slug()),
                })
            })
            .collect();

        Self {
            clients,
            http: reqwest::Client::new(),
        }
    }

    pub fn get(&self, provider: Provider) -> Option<&OAuthClient> {
        self.clients.iter().find(|c| c.provider == provider)
    }

    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.clients.iter().map(|c| c.provider)
    }

    pub async fn exchange(
        &self,
        provider: Provider,
        code: &str,
        verifier: Option<&str>,
    ) -> Result<Profile> {
        let client = self.get(provider).ok_or_eyre("provider is not configured")?;
        if provider.uses_pkce() && verifier.is_none() {
            bail!("missing PKCE verifier for {}", provider.label());
        }
        client.exchange(&self.http, code, verifier).await
    }
}

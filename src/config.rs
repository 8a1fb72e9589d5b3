use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Config {
    /// SQLite database URL.
    #[arg(long, env, default_value = "sqlite:quizzery.sqlite?mode=rwc")]
    pub database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:3000")]
    pub address: String,

    /// Public base URL, used for OAuth callbacks and API pagination links.
    #[arg(long, env, default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Mark cookies as `Secure` (requires https).
    #[arg(long, env, default_value_t = false)]
    pub secure_cookies: bool,

    /// Allow anyone to register. When off, only admins can create users.
    #[arg(long, env = "QUIZ_OPEN_REGISTER", default_value_t = false)]
    pub open_register: bool,

    /// Directory for locally stored uploads, served under `/uploads`.
    #[arg(long, env, default_value = "public/uploads")]
    pub uploads_dir: PathBuf,

    /// `cloudinary://<api_key>:<api_secret>@<cloud_name>`. Local storage is used when absent.
    #[arg(long, env)]
    pub cloudinary_url: Option<String>,

    /// Password of the `admin` account seeded at startup.
    #[arg(long, env)]
    pub admin_password: Option<String>,

    #[arg(long, env)]
    pub github_client_id: Option<String>,
    #[arg(long, env)]
    pub github_client_secret: Option<String>,

    #[arg(long, env)]
    pub twitter_client_id: Option<String>,
    #[arg(long, env)]
    pub twitter_client_secret: Option<String>,

    #[arg(long, env)]
    pub google_client_id: Option<String>,
    #[arg(long, env)]
    pub google_client_secret: Option<String>,

    #[arg(long, env)]
    pub linkedin_client_id: Option<String>,
    #[arg(long, env)]
    pub linkedin_client_secret: Option<String>,
}

impl Config {
    /// Defaults only, ignoring the process environment. Used by tests.
    pub fn for_tests(uploads_dir: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            address: "127.0.0.1:0".to_string(),
            base_url: "http://localhost".to_string(),
            secure_cookies: false,
            open_register: true,
            uploads_dir,
            cloudinary_url: None,
            admin_password: None,
            github_client_id: None,
            github_client_secret: None,
            twitter_client_id: None,
            twitter_client_secret: None,
            google_client_id: None,
            google_client_secret: None,
            linkedin_client_id: None,
            linkedin_client_secret: None,
        }
    }
}

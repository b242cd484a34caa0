use clap::Parser;

/// Process configuration, sourced from environment variables.
///
/// `clap`'s `env` derive feature binds each field to its variable, with
/// `ENV > default` precedence (there is no CLI-flag surface for this
/// proxy's core, unlike the admin tooling it sits under).
#[derive(Parser, Debug, Clone)]
#[command(name = "gproxy")]
pub struct Settings {
    /// Path to the JSON document that seeds the initial provider/credential
    /// snapshot. Empty means boot with an empty snapshot and wait for the
    /// admin publish RPC.
    #[arg(long, env = "DATABASE_URL", default_value = "")]
    pub db_url: String,

    /// Shared secret for the admin publish-snapshot RPC.
    #[arg(long, env = "ADMIN_KEY")]
    pub admin_key: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8787)]
    pub port: u16,

    /// Prefix stripped from incoming model names before resolution,
    /// e.g. a value of `Proxy` strips the `Proxy/` prefix.
    #[arg(long, env = "PROVIDER_SUFFIX")]
    pub provider_suffix: Option<String>,

    /// Overall per-request deadline.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Max wait for the first upstream byte.
    #[arg(long, env = "TTFT_TIMEOUT_SECS", default_value_t = 15)]
    pub ttft_timeout_secs: u64,

    /// TLS verification toggle for upstream connections.
    #[arg(long, env = "VERIFY_SSL", default_value_t = true)]
    pub verify_ssl: bool,

    /// Optional JSONL request-log sink path.
    #[arg(long, env = "LOG_PATH")]
    pub log_path: Option<String>,

    #[arg(long, env = "LANGFUSE_PUBLIC_KEY")]
    pub langfuse_public_key: Option<String>,

    #[arg(long, env = "LANGFUSE_SECRET_KEY")]
    pub langfuse_secret_key: Option<String>,

    #[arg(long, env = "LANGFUSE_SAMPLE_RATE", default_value_t = 1.0)]
    pub langfuse_sample_rate: f64,
}

impl Settings {
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ttft_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.ttft_timeout_secs)
    }

    /// A missing admin key should abort startup with a non-zero exit code
    /// rather than run with the admin RPC unprotected.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admin_key.trim().is_empty() {
            anyhow::bail!("ADMIN_KEY must not be empty");
        }
        Ok(())
    }
}

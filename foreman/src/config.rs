use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "::")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3305")]
    pub port: u16,

    // When unset, the worker falls back to the in-memory store, which only
    // makes sense for local runs
    #[envconfig(from = "DATABASE_URL")]
    pub database_url: Option<String>,

    // Workers connect directly to postgres, not via pgbouncer, so we keep this low
    #[envconfig(default = "4")]
    pub max_pg_connections: u32,

    // How long to sleep when no unstarted job is available
    #[envconfig(from = "IDLE_POLL_SECONDS", default = "5")]
    pub idle_poll_seconds: u64,

    #[envconfig(
        from = "ARRAY_EXPRESS_API_URL",
        default = "https://www.ebi.ac.uk/arrayexpress/json/v3/experiments"
    )]
    pub array_express_api_url: String,

    #[envconfig(from = "CATALOG_TIMEOUT_SECONDS", default = "30")]
    pub catalog_timeout_seconds: u64,
}

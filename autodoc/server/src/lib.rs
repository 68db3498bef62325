pub mod config {
    use std::time::Duration;

    use config::ConfigBuilder;
    use config::builder::DefaultState;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        /// Origin of the external store, e.g. `https://store.example.com`.
        pub api_base_url: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_request_timeout_secs")]
        pub request_timeout_secs: u64,
        /// Lifetime of the reference snapshot. Unset keeps it for the whole
        /// process.
        #[serde(default)]
        pub reference_ttl_secs: Option<u64>,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_builder(
                config::Config::builder().add_source(config::Environment::default()),
            )
        }

        pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
            let settings = builder.build()?;
            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        pub fn request_timeout(&self) -> Duration {
            Duration::from_secs(self.request_timeout_secs)
        }

        pub fn reference_ttl(&self) -> Option<Duration> {
            self.reference_ttl_secs.map(Duration::from_secs)
        }
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_secs() -> u64 {
        10
    }

}

pub mod assignment;
pub mod calendar;
pub mod references;
pub mod schedule;
pub mod store;
pub mod web;

use crate::db::gateway::DatabaseConfig;
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use std::{env, path::PathBuf};

const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api/imageHandler";

/// Command-line entry point.
#[derive(Parser, Debug)]
#[command(author, version, about = "Image gallery API and client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// List every image with its comments
    List(ClientArgs),
    /// Upload an image file and record it in the gallery
    Upload {
        #[command(flatten)]
        client: ClientArgs,
        /// jpg, jpeg or png, at most 5 MB
        path: PathBuf,
    },
    /// Add a comment to an image
    Comment {
        #[command(flatten)]
        client: ClientArgs,
        image_id: String,
        text: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Host to bind to (overrides GALLERY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides GALLERY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database location root (overrides GALLERY_DATABASE_URI)
    #[arg(long)]
    pub database_uri: Option<String>,

    /// Database name (overrides GALLERY_DATABASE_NAME)
    #[arg(long)]
    pub database_name: Option<String>,

    /// Apply the schema and exit
    #[arg(long)]
    pub migrate: bool,
}

#[derive(Args, Debug, Default)]
pub struct ClientArgs {
    /// Gallery endpoint (overrides GALLERY_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Media host cloud name (overrides GALLERY_MEDIA_CLOUD_NAME)
    #[arg(long)]
    pub cloud_name: Option<String>,

    /// Media host upload preset (overrides GALLERY_MEDIA_UPLOAD_PRESET)
    #[arg(long)]
    pub upload_preset: Option<String>,
}

/// Server configuration. Both database values are required.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn from_env_and_args(args: &ServeArgs) -> Result<Self> {
        Self::resolve(args, |key| env::var(key).ok())
    }

    /// Merge CLI args over values from `lookup`. Blank values count as unset.
    pub fn resolve(args: &ServeArgs, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = args
            .host
            .clone()
            .or_else(|| lookup("GALLERY_HOST"))
            .unwrap_or_else(|| "0.0.0.0".into());
        let port = match args.port {
            Some(port) => port,
            None => match lookup("GALLERY_PORT") {
                Some(value) => value
                    .parse::<u16>()
                    .with_context(|| format!("parsing GALLERY_PORT value `{}`", value))?,
                None => 3000,
            },
        };

        let Some(uri) = args
            .database_uri
            .clone()
            .or_else(|| lookup("GALLERY_DATABASE_URI"))
        else {
            bail!("GALLERY_DATABASE_URI must be set (or pass --database-uri)");
        };
        let Some(name) = args
            .database_name
            .clone()
            .or_else(|| lookup("GALLERY_DATABASE_NAME"))
        else {
            bail!("GALLERY_DATABASE_NAME must be set (or pass --database-name)");
        };

        Ok(Self {
            host,
            port,
            database: DatabaseConfig::new(uri, name),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

/// Client configuration. Media settings are only needed for uploads.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub media: Option<MediaConfig>,
}

impl ClientConfig {
    pub fn from_env_and_args(args: &ClientArgs) -> Self {
        Self::resolve(args, |key| env::var(key).ok())
    }

    pub fn resolve(args: &ClientArgs, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = args
            .api_url
            .clone()
            .or_else(|| lookup("GALLERY_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        let cloud_name = args
            .cloud_name
            .clone()
            .or_else(|| lookup("GALLERY_MEDIA_CLOUD_NAME"));
        let upload_preset = args
            .upload_preset
            .clone()
            .or_else(|| lookup("GALLERY_MEDIA_UPLOAD_PRESET"));

        let media = match (cloud_name, upload_preset) {
            (Some(cloud_name), Some(upload_preset)) => Some(MediaConfig {
                cloud_name,
                upload_preset,
            }),
            _ => None,
        };

        Self { api_url, media }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn serve_config_requires_database_uri_and_name() {
        let err = AppConfig::resolve(&ServeArgs::default(), env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("GALLERY_DATABASE_URI"));

        let err = AppConfig::resolve(
            &ServeArgs::default(),
            env_of(&[("GALLERY_DATABASE_URI", "sqlite://./data")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GALLERY_DATABASE_NAME"));

        let err = AppConfig::resolve(
            &ServeArgs::default(),
            env_of(&[
                ("GALLERY_DATABASE_URI", "sqlite://./data"),
                ("GALLERY_DATABASE_NAME", "  "),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GALLERY_DATABASE_NAME"));
    }

    #[test]
    fn serve_config_defaults_and_overrides() {
        let env = env_of(&[
            ("GALLERY_DATABASE_URI", "sqlite://./data"),
            ("GALLERY_DATABASE_NAME", "gallery"),
            ("GALLERY_PORT", "8080"),
        ]);
        let cfg = AppConfig::resolve(&ServeArgs::default(), &env).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:8080");
        assert_eq!(cfg.database.name, "gallery");

        let args = ServeArgs {
            host: Some("127.0.0.1".into()),
            port: Some(9000),
            database_name: Some("other".into()),
            ..ServeArgs::default()
        };
        let cfg = AppConfig::resolve(&args, &env).unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:9000");
        assert_eq!(cfg.database.name, "other");
        assert_eq!(cfg.database.uri, "sqlite://./data");
    }

    #[test]
    fn bad_port_is_an_error() {
        let env = env_of(&[
            ("GALLERY_DATABASE_URI", "sqlite://./data"),
            ("GALLERY_DATABASE_NAME", "gallery"),
            ("GALLERY_PORT", "http"),
        ]);
        assert!(AppConfig::resolve(&ServeArgs::default(), env).is_err());
    }

    #[test]
    fn client_media_needs_both_values() {
        let cfg = ClientConfig::resolve(
            &ClientArgs::default(),
            env_of(&[("GALLERY_MEDIA_CLOUD_NAME", "demo")]),
        );
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert!(cfg.media.is_none());

        let args = ClientArgs {
            upload_preset: Some("preset".into()),
            ..ClientArgs::default()
        };
        let cfg = ClientConfig::resolve(&args, env_of(&[("GALLERY_MEDIA_CLOUD_NAME", "demo")]));
        let media = cfg.media.unwrap();
        assert_eq!(media.cloud_name, "demo");
        assert_eq!(media.upload_preset, "preset");
    }
}
